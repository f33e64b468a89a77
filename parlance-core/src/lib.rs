//! # Parlance Core
//!
//! Domain logic and persistence for the Parlance language-learning API.
//!
//! - [`query`]: the filter/sort/paginate layer every list endpoint uses
//! - [`privacy`]: visibility rules for texts and collections
//! - [`parsing`]: word segmentation for texts and vocab normalization
//! - [`auth`]: password hashing, session tokens and accounts
//! - [`database`]: repository ports and their PostgreSQL adapters
//! - [`application`]: the unit of work composing those repositories
#![allow(missing_docs)]

pub mod application;
pub mod auth;
pub mod database;
pub mod error;
pub mod parsing;
pub mod privacy;
pub mod query;
pub mod validation;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub use application::{AppUnitOfWork, AppUnitOfWorkBuilder};
pub use error::{CoreError, Result};
pub use validation::FieldErrors;

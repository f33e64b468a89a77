//! Password hashing, session tokens and the account service.

pub mod crypto;
pub mod service;

pub use crypto::{AuthCrypto, AuthCryptoError};
pub use service::AuthService;

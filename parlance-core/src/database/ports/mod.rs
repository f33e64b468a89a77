//! Repository ports grouped by bounded context. Postgres adapters live in
//! `database::infrastructure::postgres`.

pub mod collections;
pub mod languages;
pub mod meanings;
pub mod sessions;
pub mod texts;
pub mod users;
pub mod vocabs;

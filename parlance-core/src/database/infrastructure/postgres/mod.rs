//! PostgreSQL infrastructure adapters implementing the database ports.

pub mod repositories;

pub use repositories::collections::PostgresCollectionsRepository;
pub use repositories::languages::PostgresLanguagesRepository;
pub use repositories::meanings::PostgresMeaningsRepository;
pub use repositories::sessions::PostgresSessionsRepository;
pub use repositories::texts::PostgresTextsRepository;
pub use repositories::users::PostgresUsersRepository;
pub use repositories::vocabs::PostgresVocabsRepository;

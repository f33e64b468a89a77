//! Server configuration: defaults, then a TOML file, then the environment,
//! then command-line overrides.

pub mod loader;
pub mod sources;

use std::net::SocketAddr;
use std::path::PathBuf;

pub use loader::{
    ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions,
    ConfigOverrides, ConfigWarning, ConfigWarnings,
};

pub const DEFAULT_PASSWORD_PEPPER: &str = "parlance-dev-password-pepper";
pub const DEFAULT_TOKEN_KEY: &str = "parlance-dev-token-key";
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 30;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
    pub dev_mode: bool,
    pub metadata: ConfigMetadata,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub password_pepper: String,
    pub token_key: String,
    pub session_ttl_days: i64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("password_pepper", &"<redacted>")
            .field("token_key", &"<redacted>")
            .field("session_ttl_days", &self.session_ttl_days)
            .finish()
    }
}

impl AuthConfig {
    pub fn is_default_pepper(&self) -> bool {
        self.password_pepper == DEFAULT_PASSWORD_PEPPER
    }

    pub fn is_default_token_key(&self) -> bool {
        self.token_key == DEFAULT_TOKEN_KEY
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.session_ttl_days)
    }
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn is_wildcard(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }
}

/// Where the effective configuration came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}

impl Config {
    /// Development defaults with the given database URL.
    pub fn for_dev(database_url: Option<String>) -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: DEFAULT_MAX_CONNECTIONS,
            },
            auth: AuthConfig {
                password_pepper: DEFAULT_PASSWORD_PEPPER.into(),
                token_key: DEFAULT_TOKEN_KEY.into(),
                session_ttl_days: DEFAULT_SESSION_TTL_DAYS,
            },
            cors: CorsConfig {
                allowed_origins: Vec::new(),
            },
            dev_mode: true,
            metadata: ConfigMetadata::default(),
        }
    }
}

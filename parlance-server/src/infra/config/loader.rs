use once_cell::sync::Lazy;
use std::{fs, path::PathBuf};
use thiserror::Error;

use super::{
    AuthConfig, Config, ConfigMetadata, CorsConfig, DEFAULT_MAX_CONNECTIONS,
    DEFAULT_PASSWORD_PEPPER, DEFAULT_SESSION_TTL_DAYS, DEFAULT_TOKEN_KEY,
    DatabaseConfig, ServerConfig,
    sources::{EnvConfig, FileConfig},
};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("parlance.toml"),
        PathBuf::from("config/parlance.toml"),
    ]
});

const MIN_SECRET_LENGTH: usize = 32;

/// Values given on the command line; they win over every other source.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_url: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.options.overrides = overrides;
        self
    }

    /// Loads `.env`, reads the process environment and composes the result.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => {
                dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?
            }
        };

        let mut load = self.load_from(EnvConfig::gather())?;
        load.config.metadata.env_file_loaded = env_file_loaded;
        Ok(load)
    }

    /// Composes configuration from an already gathered environment.
    pub fn load_from(&self, env: EnvConfig) -> Result<ConfigLoad, ConfigLoadError> {
        let (file_config, config_path) = self.load_file_config(&env)?;
        self.compose_config(file_config, env, config_path)
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let (path, explicit) = match (&self.options.config_path, &env.config_path)
        {
            (Some(path), _) | (None, Some(path)) => (Some(path.clone()), true),
            (None, None) => (
                DEFAULT_CONFIG_LOCATIONS
                    .iter()
                    .find(|candidate| candidate.exists())
                    .cloned(),
                false,
            ),
        };

        let Some(path) = path else {
            return Ok((None, None));
        };
        if !path.exists() {
            if explicit {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        let contents =
            fs::read_to_string(&path).map_err(|source| ConfigLoadError::Io {
                path: path.clone(),
                source,
            })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|source| {
                ConfigLoadError::Parse {
                    path: path.clone(),
                    source,
                }
            })?;

        Ok((Some(file_config), Some(path)))
    }

    fn compose_config(
        &self,
        file_config: Option<FileConfig>,
        env: EnvConfig,
        config_path: Option<PathBuf>,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let mut warnings = ConfigWarnings::default();

        if config_path.is_none() {
            warnings.push_with_hint(
                "No parlance.toml detected; using environment and defaults",
                "Pass --config or set PARLANCE_CONFIG to use a configuration file",
            );
        }

        let FileConfig {
            server: file_server,
            database: file_database,
            auth: file_auth,
            cors: file_cors,
            dev_mode: file_dev_mode,
        } = file_config.unwrap_or_default();
        let overrides = &self.options.overrides;

        let server = ServerConfig {
            host: overrides
                .host
                .clone()
                .or(env.server_host)
                .or(file_server.host)
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            port: overrides
                .port
                .or(env.server_port)
                .or(file_server.port)
                .unwrap_or(3000),
        };

        let database = DatabaseConfig {
            url: overrides
                .database_url
                .clone()
                .or(env.database_url)
                .or(file_database.url)
                .filter(|url| !url.trim().is_empty()),
            max_connections: env
                .database_max_connections
                .or(file_database.max_connections)
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
        };
        if database.max_connections == 0 {
            return Err(ConfigLoadError::Invalid {
                field: "database.max_connections",
                reason: "must be at least 1".into(),
            });
        }

        let auth = AuthConfig {
            password_pepper: env
                .auth_password_pepper
                .or(file_auth.password_pepper)
                .unwrap_or_else(|| DEFAULT_PASSWORD_PEPPER.to_string()),
            token_key: env
                .auth_token_key
                .or(file_auth.token_key)
                .unwrap_or_else(|| DEFAULT_TOKEN_KEY.to_string()),
            session_ttl_days: env
                .auth_session_ttl_days
                .or(file_auth.session_ttl_days)
                .unwrap_or(DEFAULT_SESSION_TTL_DAYS),
        };
        if auth.session_ttl_days < 1 {
            return Err(ConfigLoadError::Invalid {
                field: "auth.session_ttl_days",
                reason: "must be at least 1".into(),
            });
        }
        if auth.password_pepper.is_empty() || auth.token_key.is_empty() {
            return Err(ConfigLoadError::Invalid {
                field: "auth",
                reason: "secrets must not be empty".into(),
            });
        }

        let cors = CorsConfig {
            allowed_origins: env
                .cors_allowed_origins
                .or(file_cors.allowed_origins)
                .unwrap_or_else(default_cors_origins),
        };

        let dev_mode = env.dev_mode.or(file_dev_mode).unwrap_or(false);

        let config = Config {
            server,
            database,
            auth,
            cors,
            dev_mode,
            metadata: ConfigMetadata {
                config_path,
                env_file_loaded: false,
            },
        };

        warnings.extend(guard_rails(&config));
        Ok(ConfigLoad { config, warnings })
    }
}

/// Production-posture checks. They warn rather than refuse to start.
fn guard_rails(config: &Config) -> ConfigWarnings {
    let mut warnings = ConfigWarnings::default();
    if config.dev_mode {
        return warnings;
    }

    if config.auth.is_default_pepper() {
        warnings.push_with_hint(
            "AUTH_PASSWORD_PEPPER uses the default placeholder value",
            "Set a random secret of at least 32 characters",
        );
    } else if config.auth.password_pepper.len() < MIN_SECRET_LENGTH {
        warnings.push(format!(
            "AUTH_PASSWORD_PEPPER is shorter than {MIN_SECRET_LENGTH} characters"
        ));
    }

    if config.auth.is_default_token_key() {
        warnings.push_with_hint(
            "AUTH_TOKEN_KEY uses the default placeholder value",
            "Set a random secret of at least 32 characters",
        );
    } else if config.auth.token_key.len() < MIN_SECRET_LENGTH {
        warnings.push(format!(
            "AUTH_TOKEN_KEY is shorter than {MIN_SECRET_LENGTH} characters"
        ));
    }

    if config.cors.is_wildcard() {
        warnings.push(
            "CORS allows any origin while DEV_MODE is false; session cookies \
             will be sent cross-site",
        );
    }

    warnings
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
    ]
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }

    pub fn mentions(&self, needle: &str) -> bool {
        self.items.iter().any(|w| w.message.contains(needle))
    }
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_apply_without_any_source() {
        let load = ConfigLoader::new().load_from(EnvConfig::default()).unwrap();
        assert_eq!(load.config.server.port, 3000);
        assert_eq!(load.config.database.url, None);
        assert_eq!(load.config.database.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert!(!load.config.dev_mode);
        assert!(load.warnings.mentions("No parlance.toml"));
    }

    #[test]
    fn explicit_config_path_must_exist() {
        let load = ConfigLoader::new()
            .load_from(EnvConfig {
                config_path: Some(PathBuf::from("/nonexistent/parlance.toml")),
                ..EnvConfig::default()
            });
        assert!(matches!(load, Err(ConfigLoadError::MissingConfig { .. })));
    }

    #[test]
    fn environment_overrides_file_and_cli_overrides_both() {
        let file = write_config(
            r#"
            dev_mode = true

            [server]
            host = "10.0.0.1"
            port = 4000

            [database]
            url = "postgres://file/db"
            max_connections = 3
            "#,
        );

        let load = ConfigLoader::new()
            .with_config_path(file.path())
            .with_overrides(ConfigOverrides {
                port: Some(5000),
                ..ConfigOverrides::default()
            })
            .load_from(EnvConfig {
                server_host: Some("127.0.0.1".into()),
                server_port: Some(4500),
                ..EnvConfig::default()
            })
            .unwrap();

        let config = load.config;
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.database.url.as_deref(), Some("postgres://file/db"));
        assert_eq!(config.database.max_connections, 3);
        assert!(config.dev_mode);
        assert_eq!(config.metadata.config_path.as_deref(), Some(file.path()));
    }

    #[test]
    fn default_secrets_warn_outside_dev_mode() {
        let file = write_config("dev_mode = false\n");
        let load = ConfigLoader::new()
            .with_config_path(file.path())
            .load_from(EnvConfig::default())
            .unwrap();
        assert!(load.warnings.mentions("AUTH_PASSWORD_PEPPER"));
        assert!(load.warnings.mentions("AUTH_TOKEN_KEY"));
    }

    #[test]
    fn dev_mode_silences_secret_warnings() {
        let file = write_config("dev_mode = true\n");
        let load = ConfigLoader::new()
            .with_config_path(file.path())
            .load_from(EnvConfig::default())
            .unwrap();
        assert!(load.warnings.is_empty());
        assert_eq!(load.config.auth.session_ttl_days, DEFAULT_SESSION_TTL_DAYS);
    }

    #[test]
    fn strong_secrets_do_not_warn() {
        let load = ConfigLoader::new()
            .with_config_path(write_config("").path())
            .load_from(EnvConfig {
                auth_password_pepper: Some("p".repeat(40)),
                auth_token_key: Some("k".repeat(40)),
                cors_allowed_origins: Some(vec!["https://parlance.test".into()]),
                ..EnvConfig::default()
            })
            .unwrap();
        assert!(load.warnings.is_empty(), "{:?}", load.warnings);
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let load = ConfigLoader::new()
            .with_config_path(write_config("[auth]\nsession_ttl_days = 0\n").path())
            .load_from(EnvConfig::default());
        assert!(matches!(
            load,
            Err(ConfigLoadError::Invalid {
                field: "auth.session_ttl_days",
                ..
            })
        ));
    }

    #[test]
    fn malformed_toml_names_the_file() {
        let file = write_config("[server\nport = 1");
        let err = ConfigLoader::new()
            .with_config_path(file.path())
            .load_from(EnvConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }
}

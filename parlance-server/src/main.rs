//! # Parlance Server
//!
//! Serves the `/api/v1` REST API. With a subcommand it instead applies the
//! database migrations or registers a language, then exits.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use parlance_core::auth::AuthCrypto;
use parlance_core::database::PostgresDatabase;
use parlance_core::database::ports::languages::NewLanguage;
use parlance_core::validation::is_language_code;
use parlance_server::{
    AppState, create_app,
    infra::config::{
        Config, ConfigLoad, ConfigLoader, ConfigLoaderOptions, ConfigOverrides,
    },
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "parlance-server")]
#[command(about = "Language-learning content API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct ServeArgs {
    /// Path to a TOML configuration file
    #[arg(long, env = "PARLANCE_CONFIG")]
    config: Option<PathBuf>,

    /// Server port (overrides config)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,

    /// PostgreSQL connection URL (overrides config)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(subcommand)]
    Db(DbCommand),
    #[command(subcommand)]
    Language(LanguageCommand),
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    /// Apply database migrations and exit
    Migrate,
}

#[derive(Debug, Subcommand)]
enum LanguageCommand {
    /// Register a language learners can pick
    Add {
        /// Two or three letter lowercase code, e.g. `es`
        #[arg(long)]
        code: String,
        /// Display name, e.g. `Spanish`
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        greeting: String,
        #[arg(long)]
        flag: Option<String>,
        /// Known to the catalogue but closed to new content
        #[arg(long, default_value_t = false)]
        unsupported: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_runtime_config(&cli.serve)?;

    match cli.command {
        Some(Command::Db(DbCommand::Migrate)) => run_db_migrate(&config).await,
        Some(Command::Language(LanguageCommand::Add {
            code,
            name,
            greeting,
            flag,
            unsupported,
        })) => {
            let language = NewLanguage {
                code,
                name,
                greeting,
                flag,
                is_supported: !unsupported,
            };
            run_language_add(&config, language).await
        }
        None => run_server(config).await,
    }
}

fn load_runtime_config(args: &ServeArgs) -> anyhow::Result<Config> {
    let ConfigLoad { config, warnings } =
        ConfigLoader::with_options(ConfigLoaderOptions {
            config_path: args.config.clone(),
            env_file: None,
            overrides: ConfigOverrides {
                host: args.host.clone(),
                port: args.port,
                database_url: args.database_url.clone(),
            },
        })
        .load()
        .context("failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.config_path {
        info!(path = %path.display(), "configuration file loaded");
    }

    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }

    Ok(config)
}

async fn connect(config: &Config) -> anyhow::Result<Arc<PostgresDatabase>> {
    let Some(url) = config.database.url.as_deref() else {
        error!("DATABASE_URL must be provided");
        return Err(anyhow::anyhow!("No PostgreSQL connection configured"));
    };
    if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
        return Err(anyhow::anyhow!(
            "Invalid database URL: must start with postgres:// or postgresql://"
        ));
    }

    let db = PostgresDatabase::connect(url, config.database.max_connections)
        .await
        .context("failed to connect to PostgreSQL")?;
    info!("Successfully connected to PostgreSQL");
    Ok(Arc::new(db))
}

async fn run_db_migrate(config: &Config) -> anyhow::Result<()> {
    let db = connect(config).await?;
    db.run_migrations()
        .await
        .context("database migration failed")?;
    info!("Database migrations applied successfully");
    Ok(())
}

async fn run_language_add(
    config: &Config,
    language: NewLanguage,
) -> anyhow::Result<()> {
    if !is_language_code(&language.code) {
        return Err(anyhow::anyhow!(
            "Invalid language code {:?}: expected 2-3 lowercase letters",
            language.code
        ));
    }

    let db = connect(config).await?;
    db.run_migrations()
        .await
        .context("database migration failed")?;
    let state = build_state(db, config.clone())?;
    let created = state
        .unit_of_work()
        .languages
        .create_language(&language)
        .await
        .with_context(|| format!("failed to add language {}", language.code))?;
    info!(
        code = %created.code,
        supported = created.is_supported,
        "Language {} added",
        created.name
    );
    Ok(())
}

fn build_state(
    db: Arc<PostgresDatabase>,
    config: Config,
) -> anyhow::Result<AppState> {
    let crypto =
        AuthCrypto::new(&config.auth.password_pepper, &config.auth.token_key)
            .context("invalid authentication secrets")?;
    AppState::new(db, crypto, config)
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    let addr = config
        .server
        .socket_addr()
        .context("invalid server host or port")?;

    let db = connect(&config).await?;
    db.run_migrations()
        .await
        .context("database migration failed")?;

    let state = build_state(db, config)?;
    match state.auth_service().purge_expired_sessions().await {
        Ok(0) => {}
        Ok(purged) => info!("Purged {} expired sessions", purged),
        Err(err) => warn!(error = %err, "failed to purge expired sessions"),
    }

    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Parlance API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
    }
}

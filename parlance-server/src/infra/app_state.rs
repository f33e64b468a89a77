use std::{fmt, sync::Arc};

use parlance_core::application::AppUnitOfWork;
use parlance_core::auth::{AuthCrypto, AuthService};
use parlance_core::database::PostgresDatabase;

use crate::infra::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub unit_of_work: Arc<AppUnitOfWork>,
    pub postgres: Arc<PostgresDatabase>,
    pub auth_service: Arc<AuthService>,
    pub config: Arc<Config>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    /// Wires repositories and the auth service over one connection pool.
    pub fn new(
        postgres: Arc<PostgresDatabase>,
        crypto: AuthCrypto,
        config: Config,
    ) -> anyhow::Result<Self> {
        let unit_of_work = AppUnitOfWork::from_postgres(postgres.clone())
            .map_err(anyhow::Error::msg)?;
        let auth_service = AuthService::new(
            Arc::new(crypto),
            &unit_of_work,
            config.auth.session_ttl(),
        );

        Ok(Self {
            unit_of_work: Arc::new(unit_of_work),
            postgres,
            auth_service: Arc::new(auth_service),
            config: Arc::new(config),
        })
    }

    pub fn unit_of_work(&self) -> &AppUnitOfWork {
        &self.unit_of_work
    }

    pub fn auth_service(&self) -> &AuthService {
        &self.auth_service
    }
}

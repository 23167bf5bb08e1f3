//! Shared application state for all routes.

use crate::config::AppConfig;
use crate::db::Database;
use crate::service::{CredentialProvider, CrudController, HeaderCredentials, SecurityRule};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Connects on first use; closed by the binary after shutdown.
    pub database: Arc<Database>,
    pub credentials: Arc<dyn CredentialProvider>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let database = Arc::new(Database::new(config.database.clone()));
        AppState {
            config: Arc::new(config),
            database,
            credentials: Arc::new(HeaderCredentials),
        }
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Controller for a feature, sharing this state's credential provider.
    pub fn controller(&self, rules: Vec<SecurityRule>) -> CrudController {
        CrudController::new(rules, self.credentials.clone())
    }
}

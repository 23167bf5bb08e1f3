//! Process-wide connection pool, created on first use and closed on shutdown.

use crate::config::DatabaseConfig;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use std::str::FromStr;
use tokio::sync::OnceCell;

/// Owns the pool for the whole process. Share it through `Arc` in
/// [`crate::AppState`]; concurrent first callers wait on a single connect.
pub struct Database {
    config: DatabaseConfig,
    pool: OnceCell<PgPool>,
}

impl Database {
    pub fn new(config: DatabaseConfig) -> Self {
        Database {
            config,
            pool: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.pool.initialized()
    }

    /// Returns the pool, connecting on the first call. A failed connect leaves
    /// the cell empty so the next call retries.
    pub async fn pool(&self) -> Result<&PgPool, sqlx::Error> {
        self.pool
            .get_or_try_init(|| async {
                let options = connect_options(&self.config)?;
                let pool = PgPoolOptions::new()
                    .max_connections(self.config.max_connections)
                    .connect_with(options)
                    .await?;
                tracing::info!(
                    host = %self.config.host,
                    port = self.config.port,
                    database = %self.config.database,
                    "database pool connected"
                );
                Ok::<_, sqlx::Error>(pool)
            })
            .await
    }

    /// Shutdown hook: waits for checked-out connections and closes the pool.
    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
            tracing::info!("database pool closed");
        }
    }
}

pub(crate) fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions, sqlx::Error> {
    let mut options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .database(&config.database);
    if !config.password.is_empty() {
        options = options.password(&config.password);
    }
    let mut runtime_params = Vec::new();
    for (key, value) in &config.options {
        match key.as_str() {
            "sslmode" => options = options.ssl_mode(PgSslMode::from_str(value)?),
            "application_name" => options = options.application_name(value),
            _ => runtime_params.push((key.as_str(), value.as_str())),
        }
    }
    if !runtime_params.is_empty() {
        options = options.options(runtime_params);
    }
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn config(options: &[(&str, &str)]) -> DatabaseConfig {
        DatabaseConfig {
            host: "db.internal".into(),
            port: 6543,
            user: "app".into(),
            password: "secret".into(),
            database: "appdb".into(),
            options: options.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<BTreeMap<_, _>>(),
            max_connections: 4,
        }
    }

    #[test]
    fn options_map_onto_connect_options() {
        let opts = connect_options(&config(&[("application_name", "scaffold"), ("statement_timeout", "5000")])).unwrap();
        assert_eq!(opts.get_host(), "db.internal");
        assert_eq!(opts.get_port(), 6543);
        assert_eq!(opts.get_username(), "app");
        assert_eq!(opts.get_database(), Some("appdb"));
        assert_eq!(opts.get_application_name(), Some("scaffold"));
        assert!(opts.get_options().unwrap_or_default().contains("statement_timeout=5000"));
    }

    #[test]
    fn bad_ssl_mode_is_an_error() {
        assert!(connect_options(&config(&[("sslmode", "sometimes")])).is_err());
        assert!(connect_options(&config(&[("sslmode", "require")])).is_ok());
    }

    #[tokio::test]
    async fn pool_is_lazy_and_close_is_safe_before_use() {
        let db = Database::new(config(&[]));
        assert!(!db.is_connected());
        db.close().await;
        assert!(!db.is_connected());
    }
}

//! Load [`AppConfig`] from the environment (after `.env`) or from any key lookup.

use super::{AppConfig, DatabaseConfig, RuntimeMode, ServerConfig};
use crate::error::ConfigError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

impl AppConfig {
    /// Reads `.env` if present, then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("ignoring unreadable .env: {}", e);
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mode = match get("APP_ENV").or_else(|| get("NODE_ENV")) {
            Some(v) if v.eq_ignore_ascii_case("development") => RuntimeMode::Development,
            _ => RuntimeMode::Production,
        };

        let server = ServerConfig {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&get, "PORT", 3000)?,
            body_limit_bytes: parse_or(&get, "BODY_LIMIT_BYTES", DEFAULT_BODY_LIMIT)?,
        };

        let options = match get("DB_OPTIONS") {
            Some(raw) => parse_options(&raw)?,
            None => BTreeMap::new(),
        };

        let database = DatabaseConfig {
            host: get("DB_HOST").unwrap_or_else(|| "localhost".into()),
            port: parse_or(&get, "DB_PORT", 5432)?,
            user: get("DB_USER").ok_or(ConfigError::Missing("DB_USER"))?,
            // An empty password is legitimate (trust auth), so read it untrimmed.
            password: lookup("DB_PASSWORD").unwrap_or_default(),
            database: get("DB_NAME").ok_or(ConfigError::Missing("DB_NAME"))?,
            options,
            max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 10)?,
        };
        if database.max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "DB_MAX_CONNECTIONS",
                reason: "must be at least 1".into(),
            });
        }

        Ok(AppConfig { mode, server, database })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// `DB_OPTIONS` is a JSON object of scalars, e.g. `{"sslmode":"require","statement_timeout":5000}`.
fn parse_options(raw: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid { key: "DB_OPTIONS", reason };
    let parsed: BTreeMap<String, Value> = serde_json::from_str(raw).map_err(|e| invalid(e.to_string()))?;
    parsed
        .into_iter()
        .map(|(k, v)| match v {
            Value::String(s) => Ok((k, s)),
            Value::Bool(b) => Ok((k, b.to_string())),
            Value::Number(n) => Ok((k, n.to_string())),
            _ => Err(invalid(format!("option {} must be a string, number or boolean", k))),
        })
        .collect()
}

//! Runtime configuration read from the environment

use std::net::SocketAddr;
use thiserror::Error;

const DEV_JWT_SECRET: &str = "dev-secret-key";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Settings for the API process
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string; `None` selects the in-memory store
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub db_max_connections: u32,
}

impl Config {
    /// Reads the configuration from process environment variables
    ///
    /// Call `dotenv::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        if database_url.is_none() {
            tracing::warn!("DATABASE_URL not set, using the in-memory store");
        }

        let bind_addr = match lookup("BIND_ADDR") {
            Some(raw) => raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                name: "BIND_ADDR",
                reason: e.to_string(),
            })?,
            None => SocketAddr::from(([0, 0, 0, 0], 3000)),
        };

        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                name: "DB_MAX_CONNECTIONS",
                reason: e.to_string(),
            })?,
            None => 5,
        };

        Ok(Self {
            database_url,
            bind_addr,
            jwt_secret,
            db_max_connections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config(&[]).unwrap();

        assert!(config.database_url.is_none());
        assert_eq!(config.bind_addr, SocketAddr::from(([0, 0, 0, 0], 3000)));
        assert_eq!(config.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(config.db_max_connections, 5);
    }

    #[test]
    fn values_are_read() {
        let config = config(&[
            ("DATABASE_URL", "postgres://localhost/registry"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("JWT_SECRET", "s3cret"),
            ("DB_MAX_CONNECTIONS", "12"),
        ])
        .unwrap();

        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/registry"));
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.db_max_connections, 12);
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        assert!(matches!(
            config(&[("DB_MAX_CONNECTIONS", "many")]),
            Err(ConfigError::Invalid { name: "DB_MAX_CONNECTIONS", .. })
        ));
        assert!(config(&[("BIND_ADDR", "nowhere")]).is_err());
    }
}

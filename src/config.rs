//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to deserialize environment variables into a type-safe struct.

use serde::Deserialize;
use std::time::Duration;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `DATABASE_MAX_CONNECTIONS` (optional): pool size, defaults to 5
/// - `LOCK_TIMEOUT_MS` (optional): how long a transfer may wait on a row lock, defaults to 5000
/// - `DEFAULT_RACE` / `DEFAULT_CLASS` (optional): links for newly created characters
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    #[serde(default = "default_race")]
    pub default_race: String,

    #[serde(default = "default_class")]
    pub default_class: String,
}

fn default_port() -> u16 {
    3000
}

fn default_max_connections() -> u32 {
    5
}

fn default_lock_timeout_ms() -> u64 {
    5000
}

fn default_race() -> String {
    "Human".to_string()
}

fn default_class() -> String {
    "Fighter".to_string()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();

        // Field names are converted automatically: lock_timeout_ms -> LOCK_TIMEOUT_MS
        envy::from_env::<Config>()
    }

    /// Upper bound on a single row-lock wait.
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config: Config =
            envy::from_iter(vars(&[("DATABASE_URL", "postgres://localhost/dnd")])).unwrap();

        assert_eq!(config.database_url, "postgres://localhost/dnd");
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.lock_timeout(), Duration::from_millis(5000));
        assert_eq!(config.default_race, "Human");
        assert_eq!(config.default_class, "Fighter");
    }

    #[test]
    fn overrides_are_parsed() {
        let config: Config = envy::from_iter(vars(&[
            ("DATABASE_URL", "postgres://db/dnd"),
            ("SERVER_PORT", "8080"),
            ("LOCK_TIMEOUT_MS", "250"),
            ("DEFAULT_CLASS", "Wizard"),
        ]))
        .unwrap();

        assert_eq!(config.server_port, 8080);
        assert_eq!(config.lock_timeout_ms, 250);
        assert_eq!(config.default_class, "Wizard");
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let result = envy::from_iter::<_, Config>(vars(&[("SERVER_PORT", "8080")]));
        assert!(result.is_err());
    }
}

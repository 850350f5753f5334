//! Application configuration loaded from environment variables.

use std::time::Duration;

use domain::ExecutionStrategy;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL connection string; unset selects the in-memory store
/// - `DB_MAX_CONNECTIONS`: pool size (default: `5`)
/// - `RETRY_MAX_ATTEMPTS`: retries of a unit of work after transient failures (default: `6`)
/// - `RETRY_MAX_DELAY_MS`: backoff cap between retries (default: `30000`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub retry_max_attempts: u32,
    pub retry_max_delay: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(lookup("PORT"), defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            db_max_connections: parse_or(lookup("DB_MAX_CONNECTIONS"), defaults.db_max_connections),
            retry_max_attempts: parse_or(lookup("RETRY_MAX_ATTEMPTS"), defaults.retry_max_attempts),
            retry_max_delay: lookup("RETRY_MAX_DELAY_MS")
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_max_delay),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the retry strategy units of work run under.
    pub fn execution_strategy(&self) -> ExecutionStrategy {
        ExecutionStrategy::retrying(self.retry_max_attempts, self.retry_max_delay)
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            db_max_connections: 5,
            retry_max_attempts: 6,
            retry_max_delay: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert!(config.database_url.is_none());
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.retry_max_attempts, 6);
        assert_eq!(config.retry_max_delay, Duration::from_secs(30));
    }

    #[test]
    fn test_reads_overrides() {
        let config = from_pairs(&[
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/requests"),
            ("DB_MAX_CONNECTIONS", "20"),
            ("RETRY_MAX_ATTEMPTS", "2"),
            ("RETRY_MAX_DELAY_MS", "250"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/requests")
        );
        assert_eq!(config.db_max_connections, 20);
        assert_eq!(config.execution_strategy().max_retries(), 2);
        assert_eq!(config.retry_max_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = from_pairs(&[("PORT", "http"), ("RETRY_MAX_ATTEMPTS", "-1")]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.retry_max_attempts, 6);
    }

    #[test]
    fn test_blank_database_url_selects_memory() {
        let config = from_pairs(&[("DATABASE_URL", "  ")]);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }
}

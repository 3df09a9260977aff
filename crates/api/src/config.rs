use std::path::PathBuf;

use vstack_core::import::MAX_IMPORT_FILE_SIZE;
use vstack_core::search::DEFAULT_GLOBAL_SEARCH_LIMIT;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Largest accepted CSV upload in bytes (default: `137072`).
    pub import_max_upload_bytes: usize,
    /// Cap on global search hits (default: `100`).
    pub global_search_max_results: usize,
    /// Pending import jobs before submitters are told to retry (default: `64`).
    pub import_queue_capacity: usize,
    /// PostgreSQL URL; the in-memory store is used when absent.
    pub database_url: Option<String>,
    /// Resource manifest JSON file.
    pub resources_path: Option<PathBuf>,
}

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
#[error("{name} must be a valid {expected}, got {value:?}")]
pub struct ConfigError {
    name: &'static str,
    expected: &'static str,
    value: String,
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

fn parse_var<T: std::str::FromStr>(
    name: &'static str,
    default: &str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    let value = var_or(name, default);
    value.trim().parse().map_err(|_| ConfigError {
        name,
        expected,
        value,
    })
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                 |
    /// |-----------------------------|-------------------------|
    /// | `HOST`                      | `0.0.0.0`               |
    /// | `PORT`                      | `3000`                  |
    /// | `CORS_ORIGINS`              | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                    |
    /// | `IMPORT_MAX_UPLOAD_BYTES`   | `137072`                |
    /// | `GLOBAL_SEARCH_MAX_RESULTS` | `100`                   |
    /// | `IMPORT_QUEUE_CAPACITY`     | `64`                    |
    /// | `DATABASE_URL`              | unset (in-memory store) |
    /// | `RESOURCES_PATH`            | unset                   |
    pub fn from_env() -> Result<Self, ConfigError> {
        let cors_origins = var_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host: var_or("HOST", "0.0.0.0"),
            port: parse_var("PORT", "3000", "u16")?,
            cors_origins,
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", "30", "u64")?,
            import_max_upload_bytes: parse_var(
                "IMPORT_MAX_UPLOAD_BYTES",
                &MAX_IMPORT_FILE_SIZE.to_string(),
                "byte count",
            )?,
            global_search_max_results: parse_var(
                "GLOBAL_SEARCH_MAX_RESULTS",
                &DEFAULT_GLOBAL_SEARCH_LIMIT.to_string(),
                "usize",
            )?,
            import_queue_capacity: parse_var("IMPORT_QUEUE_CAPACITY", "64", "usize")?,
            database_url: optional_var("DATABASE_URL"),
            resources_path: optional_var("RESOURCES_PATH").map(PathBuf::from),
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            cors_origins: vec!["http://localhost:5173".into()],
            request_timeout_secs: 30,
            import_max_upload_bytes: MAX_IMPORT_FILE_SIZE,
            global_search_max_results: DEFAULT_GLOBAL_SEARCH_LIMIT,
            import_queue_capacity: 64,
            database_url: None,
            resources_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variable_uses_default() {
        let port: u16 = parse_var("VSTACK_TEST_UNSET_PORT", "3000", "u16").unwrap();
        assert_eq!(port, 3000);
    }

    #[test]
    fn malformed_variable_is_reported() {
        std::env::set_var("VSTACK_TEST_BAD_TIMEOUT", "soon");
        let err = parse_var::<u64>("VSTACK_TEST_BAD_TIMEOUT", "30", "u64").unwrap_err();
        assert_eq!(
            err.to_string(),
            "VSTACK_TEST_BAD_TIMEOUT must be a valid u64, got \"soon\""
        );
    }

    #[test]
    fn blank_optional_variable_is_none() {
        std::env::set_var("VSTACK_TEST_BLANK_URL", "  ");
        assert_eq!(optional_var("VSTACK_TEST_BLANK_URL"), None);
    }

    #[test]
    fn defaults_match_import_and_search_limits() {
        let config = ServerConfig::default();
        assert_eq!(config.import_max_upload_bytes, 137_072);
        assert_eq!(config.global_search_max_results, 100);
        assert!(config.database_url.is_none());
    }
}

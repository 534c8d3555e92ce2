//! Service configuration read from the environment.

use std::env;

/// Default port for the API server.
pub const DEFAULT_PORT: u16 = 8081;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Port to listen on (`PORT`)
    pub port: u16,
    /// Tracing filter directives (`RUST_LOG`)
    pub log_filter: String,
    /// Log output format (`LOG_FORMAT`)
    pub log_format: LogFormat,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            log_filter: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Missing or unparsable values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_filter: lookup("RUST_LOG")
                .filter(|filter| !filter.trim().is_empty())
                .unwrap_or(defaults.log_filter),
            log_format: lookup("LOG_FORMAT")
                .map(|format| LogFormat::parse(&format))
                .unwrap_or(defaults.log_format),
        }
    }
}

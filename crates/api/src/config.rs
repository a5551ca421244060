//! Service Configuration
//!
//! Layered as: built-in defaults, then an optional TOML file, then
//! `TELEMETRY__SECTION__KEY` environment variables.

use config::{Config, ConfigError, Environment, File};
use data_validator::ValidationConfig;
use sample_generator::GeneratorConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::rate_limit::RateLimitConfig;

/// Default config file, overridable with `TELEMETRY_CONFIG`
pub const DEFAULT_CONFIG_FILE: &str = "telemetry.toml";

/// Top-level settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub query: QuerySettings,
    pub generator: GeneratorSettings,
    pub validation: ValidationConfig,
    pub auth: AuthSettings,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite file, created if missing
    pub path: String,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: "telemetry.db".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    /// Rows in the live view
    pub live_limit: u32,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            live_limit: query_engine::DEFAULT_LIVE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 10,
        }
    }
}

impl GeneratorSettings {
    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            interval: Duration::from_secs(self.interval_secs.max(1)),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Shared key expected in `X-API-Key`; routes are open when unset
    pub api_key: Option<String>,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter used when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Settings {
    /// Load from `TELEMETRY_CONFIG` (or `telemetry.toml`) and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("TELEMETRY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_with(&path, None)
    }

    /// Load from `path`; `env` replaces the process environment when given
    pub fn load_with(path: &str, env: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        let environment = Environment::with_prefix("TELEMETRY")
            .separator("__")
            .try_parsing(true)
            .source(env);

        Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(environment)
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_file() {
        let settings = Settings::load_with("/nonexistent/telemetry.toml", Some(HashMap::new())).unwrap();
        assert_eq!(settings.server.bind_addr, "127.0.0.1:5000");
        assert_eq!(settings.query.live_limit, 10);
        assert!(!settings.generator.enabled);
        assert!(settings.auth.api_key.is_none());
        assert_eq!(settings.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_file_and_env_layers() {
        let file = config_file(
            r#"
            [server]
            bind_addr = "0.0.0.0:8080"

            [generator]
            enabled = true
            interval_secs = 5

            [logging]
            format = "json"
            "#,
        );

        let mut env = HashMap::new();
        env.insert("TELEMETRY__GENERATOR__INTERVAL_SECS".to_string(), "30".to_string());
        env.insert("TELEMETRY__AUTH__API_KEY".to_string(), "s3cret".to_string());

        let settings = Settings::load_with(file.path().to_str().unwrap(), Some(env)).unwrap();
        assert_eq!(settings.server.bind_addr, "0.0.0.0:8080");
        assert!(settings.generator.enabled);
        assert_eq!(settings.generator.interval_secs, 30);
        assert_eq!(settings.auth.api_key.as_deref(), Some("s3cret"));
        assert_eq!(settings.logging.format, LogFormat::Json);
        assert_eq!(settings.generator.generator_config().interval, Duration::from_secs(30));
    }
}

//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `somahub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use serde::Deserialize;

use somahub_adapter_virtual::VirtualConfig;
use somahub_app::config::{BridgeConfig, CoordinatorConfig};
use somahub_domain::error::ValidationError;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bridge address.
    pub bridge: BridgeConfig,
    /// Poll timing.
    pub coordinator: CoordinatorConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Shades served by the virtual bridge.
    #[serde(rename = "virtual")]
    pub virtual_bridge: VirtualConfig,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "somahubd=info,somahub_app=info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `somahub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("somahub.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("SOMAHUB_BRIDGE_HOST") {
            self.bridge.host = val;
        }
        if let Some(port) = var("SOMAHUB_BRIDGE_PORT").and_then(|val| val.parse().ok()) {
            self.bridge.port = port;
        }
        if let Some(val) = var("SOMAHUB_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.bridge.validate()?;
        self.coordinator.validate()?;
        self.virtual_bridge.validate()?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration")]
    Validation(#[from] ValidationError),
}

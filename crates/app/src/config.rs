//! Bridge and coordinator configuration.

use std::time::Duration;

use serde::Deserialize;

use somahub_domain::error::ValidationError;

/// Where to reach the SOMA Connect bridge.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Bridge hostname or IP address.
    pub host: String,
    /// Bridge HTTP port.
    pub port: u16,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3000,
        }
    }
}

impl BridgeConfig {
    /// Check that the host is non-empty and the port non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyHost`] or [`ValidationError::InvalidPort`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.host.trim().is_empty() {
            return Err(ValidationError::EmptyHost);
        }
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }

    /// Return the `host:port` address of the bridge.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Poll timing for a [`ShadeCoordinator`](crate::coordinator::ShadeCoordinator).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Interval between periodic poll cycles, in seconds.
    pub update_interval_secs: u64,
    /// Quiet period before a requested refresh runs, in milliseconds.
    pub refresh_cooldown_ms: u64,
    /// Upper bound on a single bridge request during a cycle, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            update_interval_secs: 10,
            refresh_cooldown_ms: 1000,
            request_timeout_secs: 10,
        }
    }
}

impl CoordinatorConfig {
    /// Check that no duration is zero.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ZeroDuration`] naming the first zero field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("update_interval_secs", self.update_interval_secs),
            ("refresh_cooldown_ms", self.refresh_cooldown_ms),
            ("request_timeout_secs", self.request_timeout_secs),
        ];
        match fields.iter().find(|(_, value)| *value == 0) {
            Some(&(field, _)) => Err(ValidationError::ZeroDuration { field }),
            None => Ok(()),
        }
    }

    #[must_use]
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    #[must_use]
    pub fn refresh_cooldown(&self) -> Duration {
        Duration::from_millis(self.refresh_cooldown_ms)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let bridge = BridgeConfig::default();
        assert_eq!(bridge.host, "localhost");
        assert_eq!(bridge.port, 3000);

        let coordinator = CoordinatorConfig::default();
        assert_eq!(coordinator.update_interval(), Duration::from_secs(10));
        assert_eq!(coordinator.refresh_cooldown(), Duration::from_secs(1));
        assert_eq!(coordinator.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn should_deserialize_bridge_from_toml() {
        let toml = r#"
            host = "192.168.1.40"
            port = 3001
        "#;
        let config: BridgeConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.address(), "192.168.1.40:3001");
    }

    #[test]
    fn should_use_defaults_for_missing_fields() {
        let config: CoordinatorConfig = toml::from_str("update_interval_secs = 30").unwrap();
        assert_eq!(config.update_interval_secs, 30);
        assert_eq!(config.refresh_cooldown_ms, 1000);
    }

    #[test]
    fn should_reject_empty_host() {
        let config = BridgeConfig {
            host: "  ".to_string(),
            port: 3000,
        };
        assert_eq!(config.validate(), Err(ValidationError::EmptyHost));
    }

    #[test]
    fn should_reject_zero_port() {
        let config = BridgeConfig {
            host: "soma.local".to_string(),
            port: 0,
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidPort));
    }

    #[test]
    fn should_reject_out_of_range_port_when_parsing() {
        let result: Result<BridgeConfig, _> = toml::from_str("port = 70000");
        assert!(result.is_err());
    }

    #[test]
    fn should_reject_zero_durations() {
        let config = CoordinatorConfig {
            refresh_cooldown_ms: 0,
            ..CoordinatorConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::ZeroDuration {
                field: "refresh_cooldown_ms"
            })
        );
    }

    #[test]
    fn should_accept_default_configs() {
        assert!(BridgeConfig::default().validate().is_ok());
        assert!(CoordinatorConfig::default().validate().is_ok());
    }
}

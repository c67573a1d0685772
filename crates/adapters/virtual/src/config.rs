//! Seed configuration for the simulated bridge.

use serde::Deserialize;

use somahub_domain::error::ValidationError;
use somahub_domain::mac::Mac;
use somahub_domain::shade::Position;

/// Configuration of the virtual bridge (`[virtual]` table).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VirtualConfig {
    /// Firmware version the bridge reports.
    pub version: String,
    /// Shades paired with the bridge.
    pub shades: Vec<VirtualShadeConfig>,
}

/// One simulated shade.
#[derive(Debug, Clone, Deserialize)]
pub struct VirtualShadeConfig {
    pub name: String,
    pub mac: Mac,
    /// Bridge device type (`"shade"` or `"tilt"`).
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default = "default_generation")]
    pub generation: String,
    /// Initial raw position, bridge convention (`0` = open).
    #[serde(default)]
    pub position: u8,
    /// Raw battery level (`360` = empty, `410` = full).
    #[serde(default = "default_battery_level")]
    pub battery_level: f64,
    /// Light level reported by the solar sensor, if the shade has one.
    #[serde(default)]
    pub light_level: Option<u32>,
}

fn default_kind() -> String {
    "shade".to_string()
}

fn default_generation() -> String {
    "2".to_string()
}

fn default_battery_level() -> f64 {
    410.0
}

impl Default for VirtualConfig {
    fn default() -> Self {
        Self {
            version: "2.3.1".to_string(),
            shades: vec![
                VirtualShadeConfig {
                    name: "Living Room".to_string(),
                    mac: Mac::from_octets([0xd8, 0xf1, 0x5b, 0x1a, 0x00, 0x01]),
                    kind: default_kind(),
                    generation: default_generation(),
                    position: 0,
                    battery_level: 402.5,
                    light_level: Some(230),
                },
                VirtualShadeConfig {
                    name: "Office".to_string(),
                    mac: Mac::from_octets([0xd8, 0xf1, 0x5b, 0x1a, 0x00, 0x02]),
                    kind: "tilt".to_string(),
                    generation: default_generation(),
                    position: 60,
                    battery_level: 381.0,
                    light_level: None,
                },
            ],
        }
    }
}

impl VirtualConfig {
    /// Check that positions are in range and MACs are unique.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::PositionOutOfRange`] for a position above
    /// 100, or [`ValidationError::DuplicateMac`] for a MAC used twice.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = std::collections::HashSet::new();
        for shade in &self.shades {
            if shade.position > Position::MAX {
                return Err(ValidationError::PositionOutOfRange(shade.position));
            }
            if !seen.insert(&shade.mac) {
                return Err(ValidationError::DuplicateMac(shade.mac.to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_seed_two_shades_by_default() {
        let config = VirtualConfig::default();
        assert_eq!(config.shades.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_deserialize_shades_with_defaults() {
        let toml = r#"
            version = "3.0.0"

            [[shades]]
            name = "Kitchen"
            mac = "D8:F1:5B:AA:BB:CC"

            [[shades]]
            name = "Attic"
            mac = "d8:f1:5b:aa:bb:cd"
            kind = "tilt"
            position = 100
            light_level = 12
        "#;
        let config: VirtualConfig = toml::from_str(toml).unwrap();

        assert_eq!(config.version, "3.0.0");
        assert_eq!(config.shades[0].mac.as_str(), "d8:f1:5b:aa:bb:cc");
        assert_eq!(config.shades[0].kind, "shade");
        assert!((config.shades[0].battery_level - 410.0).abs() < f64::EPSILON);
        assert_eq!(config.shades[1].light_level, Some(12));
    }

    #[test]
    fn should_reject_invalid_mac_when_parsing() {
        let toml = r#"
            [[shades]]
            name = "Kitchen"
            mac = "not-a-mac"
        "#;
        assert!(toml::from_str::<VirtualConfig>(toml).is_err());
    }

    #[test]
    fn should_reject_position_above_hundred() {
        let mut config = VirtualConfig::default();
        config.shades[0].position = 120;
        assert_eq!(
            config.validate(),
            Err(ValidationError::PositionOutOfRange(120))
        );
    }

    #[test]
    fn should_reject_duplicate_mac() {
        let mut config = VirtualConfig::default();
        config.shades[1].mac = config.shades[0].mac.clone();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::DuplicateMac(_))
        ));
    }
}

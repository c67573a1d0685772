//! Raw bridge responses and the rules that turn them into derived values.
//!
//! Every field is optional: the bridge answers with `"result": "error"` and
//! no payload when a shade is out of radio range, and the coordinator has
//! to tell a missing value apart from a real zero.

use serde::{Deserialize, Serialize};

use crate::mac::Mac;
use crate::shade::{DeviceKind, Shade};

/// Raw battery level at which the motor can no longer operate (0%).
pub const MIN_BATTERY_LEVEL: f64 = 360.0;

/// Derive a battery percentage from a raw battery level.
///
/// `360` maps to 0% and `410` (or above) to 100%, linear in between:
/// `clamp(round(2 * (level - 360)), 0, 100)`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn battery_percentage_from_level(level: f64) -> u8 {
    (2.0 * (level - MIN_BATTERY_LEVEL)).round().clamp(0.0, 100.0) as u8
}

/// One entry of the bridge device listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedDevice {
    pub name: String,
    pub mac: Mac,
    /// Bridge device type (`"shade"`, `"tilt"`).
    #[serde(rename = "type")]
    pub device_type: String,
    /// Hardware generation.
    #[serde(rename = "gen")]
    pub generation: String,
}

impl ListedDevice {
    /// Build the shade identity for this listing entry.
    #[must_use]
    pub fn to_shade(&self) -> Shade {
        Shade {
            mac: self.mac.clone(),
            name: self.name.clone(),
            kind: DeviceKind::from_bridge_type(&self.device_type),
            generation: self.generation.clone(),
        }
    }
}

/// Result of a full device listing.
///
/// Decoding keeps every entry with a valid MAC. Entries whose MAC does not
/// parse end up in `skipped_macs` instead of failing the whole listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawDeviceListing")]
pub struct DeviceListing {
    /// Bridge firmware version.
    #[serde(default)]
    pub version: String,
    #[serde(default, rename = "shades")]
    pub devices: Vec<ListedDevice>,
    /// MACs of listed entries that were dropped because they do not parse.
    #[serde(skip_serializing)]
    pub skipped_macs: Vec<String>,
}

#[derive(Deserialize)]
struct RawListedDevice {
    name: String,
    mac: String,
    #[serde(rename = "type")]
    device_type: String,
    #[serde(rename = "gen")]
    generation: String,
}

#[derive(Deserialize)]
struct RawDeviceListing {
    #[serde(default)]
    version: String,
    #[serde(default)]
    shades: Vec<RawListedDevice>,
}

impl From<RawDeviceListing> for DeviceListing {
    fn from(raw: RawDeviceListing) -> Self {
        let mut devices = Vec::with_capacity(raw.shades.len());
        let mut skipped_macs = Vec::new();
        for entry in raw.shades {
            match Mac::parse(&entry.mac) {
                Ok(mac) => devices.push(ListedDevice {
                    name: entry.name,
                    mac,
                    device_type: entry.device_type,
                    generation: entry.generation,
                }),
                Err(_) => skipped_macs.push(entry.mac),
            }
        }

        Self {
            version: raw.version,
            devices,
            skipped_macs,
        }
    }
}

/// Current position as reported by the bridge (`0` = fully open).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionReading {
    #[serde(default)]
    pub position: Option<u8>,
}

/// Battery state as reported by the bridge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BatteryReading {
    /// Raw voltage-like level.
    #[serde(default)]
    pub battery_level: Option<f64>,
    /// Percentage computed by newer bridge firmware.
    #[serde(default)]
    pub battery_percentage: Option<u8>,
}

impl BatteryReading {
    /// Battery percentage, preferring the bridge's own value over the
    /// derivation from the raw level.
    #[must_use]
    pub fn percentage(&self) -> Option<u8> {
        self.battery_percentage
            .or_else(|| self.battery_level.map(battery_percentage_from_level))
    }
}

/// Ambient light level measured by a shade's solar/light sensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightReading {
    #[serde(default)]
    pub light_level: Option<u32>,
}

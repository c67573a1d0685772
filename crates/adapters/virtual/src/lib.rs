//! # somahub-adapter-virtual
//!
//! Simulated SOMA Connect bridge that answers the
//! [`BridgeClient`] port from memory, for demos and end-to-end tests.
//!
//! ## Behaviour
//!
//! | Request | Answer |
//! |---------|--------|
//! | `list_devices` | every configured shade, plus the configured firmware version |
//! | `get_position` / `get_battery` | current raw values, or no payload while the shade is offline |
//! | `get_light_level` | configured light level, or no payload |
//! | `open` / `close` / `set_position` | move instantly to the target |
//! | `stop` | no-op |
//!
//! Commands for a MAC the bridge does not know are rejected.
//!
//! ## Dependency rule
//!
//! Depends on `somahub-app` (port traits) and `somahub-domain` only.

pub mod config;
mod shade;

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use somahub_app::error::BridgeError;
use somahub_app::ports::BridgeClient;
use somahub_domain::mac::Mac;
use somahub_domain::reading::{BatteryReading, DeviceListing, LightReading, PositionReading};
use somahub_domain::shade::MotionOptions;

pub use config::{VirtualConfig, VirtualShadeConfig};
use shade::VirtualShade;

/// Raw position of a fully open shade.
const OPEN: u8 = 0;
/// Raw position of a fully closed shade.
const CLOSED: u8 = 100;

/// In-memory bridge with a fixed set of shades.
pub struct VirtualBridge {
    version: String,
    shades: Mutex<BTreeMap<Mac, VirtualShade>>,
}

impl Default for VirtualBridge {
    fn default() -> Self {
        Self::from_config(&VirtualConfig::default())
    }
}

impl VirtualBridge {
    /// Build a bridge seeded from configuration.
    #[must_use]
    pub fn from_config(config: &VirtualConfig) -> Self {
        let shades = config
            .shades
            .iter()
            .map(VirtualShade::from_config)
            .map(|shade| (shade.mac().clone(), shade))
            .collect();

        Self {
            version: config.version.clone(),
            shades: Mutex::new(shades),
        }
    }

    /// Current raw position of a shade (`0` = open).
    #[must_use]
    pub fn raw_position(&self, mac: &Mac) -> Option<u8> {
        self.lock().get(mac).map(VirtualShade::raw_position)
    }

    /// Motion flags of the last `set_position` or `open`/`close` command.
    #[must_use]
    pub fn last_motion(&self, mac: &Mac) -> Option<MotionOptions> {
        self.lock().get(mac).and_then(VirtualShade::last_motion)
    }

    /// Take a shade out of (or back into) radio range.
    ///
    /// Returns `false` if the MAC is unknown.
    pub fn set_offline(&self, mac: &Mac, offline: bool) -> bool {
        match self.lock().get_mut(mac) {
            Some(shade) => {
                tracing::debug!(%mac, offline, "virtual shade reachability changed");
                shade.set_offline(offline);
                true
            }
            None => false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<Mac, VirtualShade>> {
        self.shades.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read<T: Default>(&self, mac: &Mac, read: impl FnOnce(&VirtualShade) -> T) -> T {
        self.lock().get(mac).map(read).unwrap_or_default()
    }

    fn command(
        &self,
        mac: &Mac,
        target: Option<u8>,
        options: MotionOptions,
    ) -> Result<(), BridgeError> {
        let mut shades = self.lock();
        let shade = shades
            .get_mut(mac)
            .ok_or_else(|| BridgeError::Rejected(mac.clone()))?;
        if let Some(target) = target {
            tracing::debug!(%mac, target, "virtual shade moving");
            shade.move_to(target, options);
        }
        Ok(())
    }
}

impl BridgeClient for VirtualBridge {
    async fn list_devices(&self) -> Result<DeviceListing, BridgeError> {
        let devices = self.lock().values().map(VirtualShade::listing).collect();
        Ok(DeviceListing {
            version: self.version.clone(),
            devices,
            skipped_macs: Vec::new(),
        })
    }

    async fn get_position(&self, mac: &Mac) -> Result<PositionReading, BridgeError> {
        Ok(self.read(mac, VirtualShade::position))
    }

    async fn get_battery(&self, mac: &Mac) -> Result<BatteryReading, BridgeError> {
        Ok(self.read(mac, VirtualShade::battery))
    }

    async fn get_light_level(&self, mac: &Mac) -> Result<LightReading, BridgeError> {
        Ok(self.read(mac, VirtualShade::light))
    }

    async fn open(&self, mac: &Mac) -> Result<(), BridgeError> {
        self.command(mac, Some(OPEN), MotionOptions::default())
    }

    async fn close(&self, mac: &Mac) -> Result<(), BridgeError> {
        self.command(mac, Some(CLOSED), MotionOptions::default())
    }

    async fn stop(&self, mac: &Mac) -> Result<(), BridgeError> {
        self.command(mac, None, MotionOptions::default())
    }

    async fn set_position(
        &self,
        mac: &Mac,
        target: u8,
        options: MotionOptions,
    ) -> Result<(), BridgeError> {
        self.command(mac, Some(target.min(CLOSED)), options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_mac(bridge: &VirtualBridge) -> Mac {
        bridge.lock().keys().next().unwrap().clone()
    }

    #[tokio::test]
    async fn should_list_configured_shades() {
        let bridge = VirtualBridge::default();
        let listing = bridge.list_devices().await.unwrap();

        assert_eq!(listing.version, "2.3.1");
        assert_eq!(listing.devices.len(), 2);
        assert!(listing.devices.iter().any(|d| d.device_type == "tilt"));
    }

    #[tokio::test]
    async fn should_report_raw_readings() {
        let bridge = VirtualBridge::default();
        let mac = first_mac(&bridge);

        let position = bridge.get_position(&mac).await.unwrap();
        let battery = bridge.get_battery(&mac).await.unwrap();
        let light = bridge.get_light_level(&mac).await.unwrap();

        assert_eq!(position.position, Some(0));
        assert_eq!(battery.percentage(), Some(85));
        assert_eq!(light.light_level, Some(230));
    }

    #[tokio::test]
    async fn should_answer_without_payload_when_offline() {
        let bridge = VirtualBridge::default();
        let mac = first_mac(&bridge);

        assert!(bridge.set_offline(&mac, true));

        assert_eq!(bridge.get_position(&mac).await.unwrap().position, None);
        assert_eq!(bridge.get_battery(&mac).await.unwrap().percentage(), None);
        assert_eq!(bridge.get_light_level(&mac).await.unwrap().light_level, None);
    }

    #[tokio::test]
    async fn should_answer_without_payload_for_unknown_shade() {
        let bridge = VirtualBridge::default();
        let unknown = Mac::from_octets([0, 0, 0, 0, 0, 0]);

        assert_eq!(bridge.get_position(&unknown).await.unwrap().position, None);
        assert!(!bridge.set_offline(&unknown, true));
    }

    #[tokio::test]
    async fn should_move_when_commanded() {
        let bridge = VirtualBridge::default();
        let mac = first_mac(&bridge);

        bridge.close(&mac).await.unwrap();
        assert_eq!(bridge.raw_position(&mac), Some(100));

        bridge.open(&mac).await.unwrap();
        assert_eq!(bridge.raw_position(&mac), Some(0));
    }

    #[tokio::test]
    async fn should_keep_position_when_stopped() {
        let bridge = VirtualBridge::default();
        let mac = first_mac(&bridge);
        bridge.set_position(&mac, 35, MotionOptions::default()).await.unwrap();

        bridge.stop(&mac).await.unwrap();

        assert_eq!(bridge.raw_position(&mac), Some(35));
    }

    #[tokio::test]
    async fn should_record_motion_flags_when_setting_position() {
        let bridge = VirtualBridge::default();
        let mac = first_mac(&bridge);
        let options = MotionOptions {
            close_upward: true,
            morning_mode: false,
        };

        bridge.set_position(&mac, 70, options).await.unwrap();

        assert_eq!(bridge.raw_position(&mac), Some(70));
        assert_eq!(bridge.last_motion(&mac), Some(options));
    }

    #[tokio::test]
    async fn should_reject_commands_for_unknown_shade() {
        let bridge = VirtualBridge::default();
        let unknown = Mac::from_octets([0, 0, 0, 0, 0, 0]);

        let err = bridge.open(&unknown).await.unwrap_err();

        assert!(matches!(err, BridgeError::Rejected(mac) if mac == unknown));
    }
}

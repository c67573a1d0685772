//! A single simulated shade motor.

use somahub_domain::mac::Mac;
use somahub_domain::reading::{BatteryReading, ListedDevice, LightReading, PositionReading};
use somahub_domain::shade::MotionOptions;

use crate::config::VirtualShadeConfig;

/// In-memory state of one simulated motor, in bridge convention.
#[derive(Debug, Clone)]
pub(crate) struct VirtualShade {
    listing: ListedDevice,
    /// Raw position (`0` = open).
    position: u8,
    battery_level: f64,
    light_level: Option<u32>,
    last_motion: Option<MotionOptions>,
    /// Out of radio range: the bridge answers without a payload.
    offline: bool,
}

impl VirtualShade {
    pub(crate) fn from_config(config: &VirtualShadeConfig) -> Self {
        Self {
            listing: ListedDevice {
                name: config.name.clone(),
                mac: config.mac.clone(),
                device_type: config.kind.clone(),
                generation: config.generation.clone(),
            },
            position: config.position,
            battery_level: config.battery_level,
            light_level: config.light_level,
            last_motion: None,
            offline: false,
        }
    }

    pub(crate) fn mac(&self) -> &Mac {
        &self.listing.mac
    }

    pub(crate) fn listing(&self) -> ListedDevice {
        self.listing.clone()
    }

    pub(crate) fn position(&self) -> PositionReading {
        PositionReading {
            position: (!self.offline).then_some(self.position),
        }
    }

    pub(crate) fn battery(&self) -> BatteryReading {
        BatteryReading {
            battery_level: (!self.offline).then_some(self.battery_level),
            battery_percentage: None,
        }
    }

    pub(crate) fn light(&self) -> LightReading {
        LightReading {
            light_level: self.light_level.filter(|_| !self.offline),
        }
    }

    pub(crate) fn raw_position(&self) -> u8 {
        self.position
    }

    pub(crate) fn last_motion(&self) -> Option<MotionOptions> {
        self.last_motion
    }

    pub(crate) fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// Move instantly to `target`.
    pub(crate) fn move_to(&mut self, target: u8, options: MotionOptions) {
        self.position = target;
        self.last_motion = Some(options);
    }
}

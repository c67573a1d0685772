//! Scriptable in-memory [`BridgeClient`] for coordinator tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use somahub_domain::mac::Mac;
use somahub_domain::reading::{
    BatteryReading, DeviceListing, LightReading, ListedDevice, PositionReading,
};
use somahub_domain::shade::MotionOptions;

use crate::error::BridgeError;
use crate::ports::BridgeClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Open(Mac),
    Close(Mac),
    Stop(Mac),
    SetPosition(Mac, u8, MotionOptions),
}

#[derive(Default)]
struct Script {
    version: String,
    devices: Vec<ListedDevice>,
    skipped_macs: Vec<String>,
    positions: HashMap<Mac, PositionReading>,
    batteries: HashMap<Mac, BatteryReading>,
    lights: HashMap<Mac, LightReading>,
    hanging: HashSet<Mac>,
    unreachable: bool,
    reject_commands: bool,
    listing_delay: Duration,
}

#[derive(Default)]
struct Inner {
    script: Mutex<Script>,
    commands: Mutex<Vec<Command>>,
    list_calls: AtomicUsize,
    position_calls: AtomicUsize,
    light_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[derive(Clone, Default)]
pub(crate) struct FakeBridge {
    inner: Arc<Inner>,
}

pub(crate) fn mac(last: u8) -> Mac {
    Mac::parse(&format!("d8:f1:5b:00:00:{last:02x}")).unwrap()
}

impl FakeBridge {
    pub(crate) fn with_version(version: &str) -> Self {
        let bridge = Self::default();
        bridge.script().version = version.to_string();
        bridge
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.inner.script.lock().unwrap()
    }

    /// Add a shade answering with the given raw position and battery level.
    pub(crate) fn add_shade(&self, mac: &Mac, name: &str, kind: &str, position: u8, level: f64) {
        let mut script = self.script();
        script.devices.push(ListedDevice {
            name: name.to_string(),
            mac: mac.clone(),
            device_type: kind.to_string(),
            generation: "2".to_string(),
        });
        script.positions.insert(
            mac.clone(),
            PositionReading {
                position: Some(position),
            },
        );
        script.batteries.insert(
            mac.clone(),
            BatteryReading {
                battery_level: Some(level),
                battery_percentage: None,
            },
        );
    }

    /// List an entry whose MAC the decoder could not parse.
    pub(crate) fn add_unparsable_entry(&self, mac: &str) {
        self.script().skipped_macs.push(mac.to_string());
    }

    pub(crate) fn remove_shade(&self, mac: &Mac) {
        self.script().devices.retain(|d| &d.mac != mac);
    }

    pub(crate) fn set_position(&self, mac: &Mac, position: Option<u8>) {
        self.script()
            .positions
            .insert(mac.clone(), PositionReading { position });
    }

    pub(crate) fn set_battery(&self, mac: &Mac, reading: BatteryReading) {
        self.script().batteries.insert(mac.clone(), reading);
    }

    pub(crate) fn set_light(&self, mac: &Mac, level: u32) {
        self.script().lights.insert(
            mac.clone(),
            LightReading {
                light_level: Some(level),
            },
        );
    }

    pub(crate) fn hang_position(&self, mac: &Mac) {
        self.script().hanging.insert(mac.clone());
    }

    pub(crate) fn set_unreachable(&self, unreachable: bool) {
        self.script().unreachable = unreachable;
    }

    pub(crate) fn reject_commands(&self) {
        self.script().reject_commands = true;
    }

    pub(crate) fn set_listing_delay(&self, delay: Duration) {
        self.script().listing_delay = delay;
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.inner.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn position_calls(&self) -> usize {
        self.inner.position_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn light_calls(&self) -> usize {
        self.inner.light_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.inner.max_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn commands(&self) -> Vec<Command> {
        self.inner.commands.lock().unwrap().clone()
    }

    fn command(&self, command: Command) -> Result<(), BridgeError> {
        if self.script().reject_commands {
            let mac = match &command {
                Command::Open(mac)
                | Command::Close(mac)
                | Command::Stop(mac)
                | Command::SetPosition(mac, _, _) => mac.clone(),
            };
            return Err(BridgeError::Rejected(mac));
        }
        self.inner.commands.lock().unwrap().push(command);
        Ok(())
    }
}

impl BridgeClient for FakeBridge {
    async fn list_devices(&self) -> Result<DeviceListing, BridgeError> {
        let current = self.inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.max_in_flight.fetch_max(current, Ordering::SeqCst);
        self.inner.list_calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.script().listing_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);

        let script = self.script();
        if script.unreachable {
            return Err(BridgeError::Unreachable(Box::new(std::io::Error::other(
                "connection refused",
            ))));
        }
        Ok(DeviceListing {
            version: script.version.clone(),
            devices: script.devices.clone(),
            skipped_macs: script.skipped_macs.clone(),
        })
    }

    async fn get_position(&self, mac: &Mac) -> Result<PositionReading, BridgeError> {
        self.inner.position_calls.fetch_add(1, Ordering::SeqCst);
        let hanging = self.script().hanging.contains(mac);
        if hanging {
            std::future::pending::<()>().await;
        }
        Ok(self.script().positions.get(mac).copied().unwrap_or_default())
    }

    async fn get_battery(&self, mac: &Mac) -> Result<BatteryReading, BridgeError> {
        Ok(self.script().batteries.get(mac).copied().unwrap_or_default())
    }

    async fn get_light_level(&self, mac: &Mac) -> Result<LightReading, BridgeError> {
        self.inner.light_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.script().lights.get(mac).copied().unwrap_or_default())
    }

    async fn open(&self, mac: &Mac) -> Result<(), BridgeError> {
        self.command(Command::Open(mac.clone()))
    }

    async fn close(&self, mac: &Mac) -> Result<(), BridgeError> {
        self.command(Command::Close(mac.clone()))
    }

    async fn stop(&self, mac: &Mac) -> Result<(), BridgeError> {
        self.command(Command::Stop(mac.clone()))
    }

    async fn set_position(
        &self,
        mac: &Mac,
        target: u8,
        options: MotionOptions,
    ) -> Result<(), BridgeError> {
        self.command(Command::SetPosition(mac.clone(), target, options))
    }
}

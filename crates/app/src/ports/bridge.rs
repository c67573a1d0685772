//! Bridge port: request/response contract with a SOMA Connect bridge.
//!
//! The coordinator never speaks HTTP itself: a transport adapter implements
//! [`BridgeClient`] and the coordinator drives it. Per-shade reads return
//! readings whose fields are all optional, so an adapter can map a bridge
//! `"result": "error"` response to an empty reading instead of an error.

use std::future::Future;

use somahub_domain::mac::Mac;
use somahub_domain::reading::{BatteryReading, DeviceListing, LightReading, PositionReading};
use somahub_domain::shade::MotionOptions;

use crate::error::BridgeError;

/// Transport to a single SOMA Connect bridge.
///
/// Implementations live in adapter crates (e.g. `adapter_virtual`).
/// All methods issue exactly one request; retries are the caller's concern.
pub trait BridgeClient: Send + Sync {
    /// List every shade paired with the bridge, together with the bridge
    /// firmware version.
    ///
    /// Entries with an unparsable MAC go to
    /// [`DeviceListing::skipped_macs`] rather than failing the call.
    fn list_devices(&self) -> impl Future<Output = Result<DeviceListing, BridgeError>> + Send;

    /// Read the current raw position of a shade (`0` = fully open).
    fn get_position(
        &self,
        mac: &Mac,
    ) -> impl Future<Output = Result<PositionReading, BridgeError>> + Send;

    /// Read the battery state of a shade.
    fn get_battery(
        &self,
        mac: &Mac,
    ) -> impl Future<Output = Result<BatteryReading, BridgeError>> + Send;

    /// Read the ambient light level measured by a shade.
    fn get_light_level(
        &self,
        mac: &Mac,
    ) -> impl Future<Output = Result<LightReading, BridgeError>> + Send;

    /// Fully open a shade.
    fn open(&self, mac: &Mac) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Fully close a shade.
    fn close(&self, mac: &Mac) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Stop any motion in progress.
    fn stop(&self, mac: &Mac) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Move a shade to a raw bridge position (`0` = fully open).
    fn set_position(
        &self,
        mac: &Mac,
        target: u8,
        options: MotionOptions,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;
}

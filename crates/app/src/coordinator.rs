//! Shade update coordinator: the single owner of per-shade state.
//!
//! A poll cycle lists the bridge devices, then reads position and battery
//! (and light level, for shades with an active light subscription) for each
//! shade in turn, with the reads for one shade issued concurrently. Values
//! are merged into state shade by shade, so readers keep seeing the last
//! known values of shades that fail. A cycle fails if the listing fails or
//! if any shade ends up unavailable.
//!
//! Readers use the synchronous accessors; the state lock is never held
//! across an `.await`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use serde::Serialize;
use tokio::sync::broadcast;

use somahub_domain::mac::Mac;
use somahub_domain::reading::{DeviceListing, LightReading};
use somahub_domain::shade::{DeviceKind, MotionOptions, Position, Shade};
use somahub_domain::status::{self, UpdateStatus};

use crate::config::CoordinatorConfig;
use crate::error::{BridgeError, PartialDataError, PartialDataReason, UpdateError};
use crate::event_bus::UpdateBus;
use crate::ports::BridgeClient;
use crate::scheduler::{
    self, AlreadyStartedError, PollHandle, PollTarget, RefreshRequester, RefreshRequests, Schedule,
};

const UPDATE_BUS_CAPACITY: usize = 16;

#[derive(Debug, Default)]
struct State {
    bridge_version: String,
    shades: BTreeMap<Mac, Shade>,
    availability: HashMap<Mac, bool>,
    /// Number of live light subscriptions per shade.
    light_subscribers: HashMap<Mac, usize>,
    positions: HashMap<Mac, Position>,
    batteries: HashMap<Mac, u8>,
    light_levels: HashMap<Mac, u32>,
    last_update: Option<UpdateStatus>,
}

fn read_state(state: &RwLock<State>) -> RwLockReadGuard<'_, State> {
    state.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_state(state: &RwLock<State>) -> RwLockWriteGuard<'_, State> {
    state.write().unwrap_or_else(PoisonError::into_inner)
}

/// Point-in-time view of one shade, for presentation adapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShadeSnapshot {
    pub shade: Shade,
    pub available: bool,
    pub position: Option<Position>,
    pub battery: Option<u8>,
    pub light_level: Option<u32>,
    pub bridge_version: String,
}

/// Raw results of one shade's reads within a cycle.
struct ShadeReads {
    position: Result<Option<u8>, BridgeError>,
    battery: Result<Option<u8>, BridgeError>,
    light: Option<Result<LightReading, BridgeError>>,
}

/// Polls one bridge and owns the derived state of all its shades.
pub struct ShadeCoordinator<B> {
    bridge: B,
    config: CoordinatorConfig,
    state: Arc<RwLock<State>>,
    cycle: tokio::sync::Mutex<()>,
    requester: RefreshRequester,
    requests: Mutex<Option<RefreshRequests>>,
    updates: UpdateBus,
}

impl<B: BridgeClient> ShadeCoordinator<B> {
    /// Create a coordinator for `bridge`. No request is issued until the
    /// first [`refresh`](Self::refresh).
    pub fn new(bridge: B, config: CoordinatorConfig) -> Self {
        let (requester, requests) = scheduler::refresh_channel();
        Self {
            bridge,
            config,
            state: Arc::new(RwLock::new(State::default())),
            cycle: tokio::sync::Mutex::new(()),
            requester,
            requests: Mutex::new(Some(requests)),
            updates: UpdateBus::new(UPDATE_BUS_CAPACITY),
        }
    }

    // ── Accessors ──────────────────────────────────────────────────────

    /// The bridge this coordinator polls.
    #[must_use]
    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    /// Bridge firmware version from the last successful listing.
    #[must_use]
    pub fn bridge_version(&self) -> String {
        read_state(&self.state).bridge_version.clone()
    }

    /// Every shade from the last listing, ordered by MAC.
    #[must_use]
    pub fn shades(&self) -> Vec<Shade> {
        read_state(&self.state).shades.values().cloned().collect()
    }

    /// Whether the shade answered with a position and a battery value in
    /// the last cycle. Unknown shades are unavailable.
    #[must_use]
    pub fn is_available(&self, mac: &Mac) -> bool {
        read_state(&self.state)
            .availability
            .get(mac)
            .copied()
            .unwrap_or(false)
    }

    /// Last known position (`100` = fully open).
    #[must_use]
    pub fn position(&self, mac: &Mac) -> Option<Position> {
        read_state(&self.state).positions.get(mac).copied()
    }

    /// Last known battery percentage.
    #[must_use]
    pub fn battery(&self, mac: &Mac) -> Option<u8> {
        read_state(&self.state).batteries.get(mac).copied()
    }

    /// Last known light level. Only populated while light polling is enabled
    /// (or was enabled at some point) for the shade.
    #[must_use]
    pub fn light_level(&self, mac: &Mac) -> Option<u32> {
        read_state(&self.state).light_levels.get(mac).copied()
    }

    /// Whether light levels are currently polled for the shade.
    #[must_use]
    pub fn is_light_polling(&self, mac: &Mac) -> bool {
        read_state(&self.state).light_subscribers.contains_key(mac)
    }

    /// Everything known about one shade, or `None` if it is not listed.
    #[must_use]
    pub fn snapshot(&self, mac: &Mac) -> Option<ShadeSnapshot> {
        let state = read_state(&self.state);
        let shade = state.shades.get(mac)?.clone();
        Some(ShadeSnapshot {
            shade,
            available: state.availability.get(mac).copied().unwrap_or(false),
            position: state.positions.get(mac).copied(),
            battery: state.batteries.get(mac).copied(),
            light_level: state.light_levels.get(mac).copied(),
            bridge_version: state.bridge_version.clone(),
        })
    }

    /// Outcome of the most recent cycle.
    #[must_use]
    pub fn last_update(&self) -> Option<UpdateStatus> {
        read_state(&self.state).last_update.clone()
    }

    /// Receive the outcome of every cycle completed from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<UpdateStatus> {
        self.updates.subscribe()
    }

    // ── Refresh ────────────────────────────────────────────────────────

    /// Ask for a debounced refresh. Requests made before the poll loop is
    /// [started](Self::start) are served once it runs.
    pub fn request_refresh(&self) {
        self.requester.request();
    }

    /// Run one poll cycle now, waiting for any cycle already in progress.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::Listing`] if the bridge could not list its
    /// devices (state untouched), or [`UpdateError::ShadesUnavailable`] if
    /// one or more shades did not return a position or battery value (data
    /// from every other shade is merged regardless).
    pub async fn refresh(&self) -> Result<(), UpdateError> {
        let _cycle = self.cycle.lock().await;

        let result = self.poll_cycle().await;
        let status = match &result {
            Ok(()) => UpdateStatus::succeeded(status::now()),
            Err(err) => UpdateStatus::failed(status::now(), err.unavailable()),
        };

        write_state(&self.state).last_update = Some(status.clone());
        self.updates.publish(status);
        result
    }

    async fn poll_cycle(&self) -> Result<(), UpdateError> {
        let listing = self
            .with_timeout(self.bridge.list_devices())
            .await
            .map_err(UpdateError::Listing)?;

        write_state(&self.state).bridge_version.clone_from(&listing.version);
        for raw in &listing.skipped_macs {
            tracing::warn!(mac = %raw, "skipping listed device with invalid MAC");
        }

        let mut failures = Vec::new();
        for device in &listing.devices {
            let shade = device.to_shade();

            let poll_light = {
                let mut state = write_state(&self.state);
                state.shades.insert(shade.mac.clone(), shade.clone());
                state.availability.insert(shade.mac.clone(), true);
                state.light_subscribers.contains_key(&shade.mac)
            };

            tracing::debug!(
                name = %shade.name,
                mac = %shade.mac,
                light = poll_light,
                "updating shade"
            );

            let reads = self.read_shade(&shade.mac, poll_light).await;
            failures.extend(self.merge(&shade, reads));
        }

        self.prune(&listing);

        if failures.is_empty() {
            Ok(())
        } else {
            Err(UpdateError::ShadesUnavailable(failures))
        }
    }

    async fn read_shade(&self, mac: &Mac, poll_light: bool) -> ShadeReads {
        let (position, battery, light) = tokio::join!(
            self.with_timeout(self.bridge.get_position(mac)),
            self.with_timeout(self.bridge.get_battery(mac)),
            async {
                if poll_light {
                    Some(self.with_timeout(self.bridge.get_light_level(mac)).await)
                } else {
                    None
                }
            },
        );

        ShadeReads {
            position: position.map(|reading| reading.position),
            battery: battery.map(|reading| reading.percentage()),
            light,
        }
    }

    fn merge(&self, shade: &Shade, reads: ShadeReads) -> Vec<PartialDataError> {
        let mac = &shade.mac;
        let mut failures = Vec::new();

        let position = required(mac, "position", reads.position, &mut failures)
            .map(|raw| shade.kind.to_host(raw));
        let battery = required(mac, "battery", reads.battery, &mut failures);

        let light_level = match reads.light {
            Some(Ok(LightReading {
                light_level: Some(level),
            })) => Some(level),
            Some(Ok(LightReading { light_level: None })) => {
                tracing::debug!(%mac, "no light level in bridge response");
                None
            }
            Some(Err(err)) => {
                tracing::debug!(%err, %mac, "light level request failed");
                None
            }
            None => None,
        };

        let mut state = write_state(&self.state);
        if let Some(position) = position {
            tracing::debug!(%mac, %position, "shade position");
            state.positions.insert(mac.clone(), position);
        }
        if let Some(battery) = battery {
            tracing::debug!(%mac, battery, "shade battery level");
            state.batteries.insert(mac.clone(), battery);
        }
        if let Some(level) = light_level {
            tracing::debug!(%mac, level, "shade light level");
            state.light_levels.insert(mac.clone(), level);
        }
        if !failures.is_empty() {
            tracing::debug!(name = %shade.name, %mac, "no data returned for shade");
            state.availability.insert(mac.clone(), false);
        }

        failures
    }

    /// Drop every entry for shades that are no longer listed.
    ///
    /// Light subscriptions belong to their guards and are left alone, so a
    /// shade that is listed again resumes light polling.
    fn prune(&self, listing: &DeviceListing) {
        let listed: HashSet<&Mac> = listing.devices.iter().map(|d| &d.mac).collect();

        let mut state = write_state(&self.state);
        let removed: Vec<Mac> = state
            .shades
            .keys()
            .filter(|mac| !listed.contains(mac))
            .cloned()
            .collect();

        for mac in removed {
            tracing::debug!(%mac, "shade no longer listed, dropping state");
            state.shades.remove(&mac);
            state.availability.remove(&mac);
            state.positions.remove(&mac);
            state.batteries.remove(&mac);
            state.light_levels.remove(&mac);
        }
    }

    async fn with_timeout<T>(
        &self,
        request: impl Future<Output = Result<T, BridgeError>>,
    ) -> Result<T, BridgeError> {
        match tokio::time::timeout(self.config.request_timeout(), request).await {
            Ok(result) => result,
            Err(_elapsed) => Err(BridgeError::Timeout),
        }
    }

    // ── Commands ───────────────────────────────────────────────────────

    /// Fully open a shade, then request a refresh.
    ///
    /// # Errors
    ///
    /// Returns the bridge error unchanged; no refresh is requested then.
    #[tracing::instrument(skip(self), fields(mac = %mac))]
    pub async fn open(&self, mac: &Mac) -> Result<(), BridgeError> {
        self.bridge.open(mac).await?;
        self.request_refresh();
        Ok(())
    }

    /// Fully close a shade, then request a refresh.
    ///
    /// # Errors
    ///
    /// Returns the bridge error unchanged; no refresh is requested then.
    #[tracing::instrument(skip(self), fields(mac = %mac))]
    pub async fn close(&self, mac: &Mac) -> Result<(), BridgeError> {
        self.bridge.close(mac).await?;
        self.request_refresh();
        Ok(())
    }

    /// Stop a moving shade, then request a refresh.
    ///
    /// # Errors
    ///
    /// Returns the bridge error unchanged; no refresh is requested then.
    #[tracing::instrument(skip(self), fields(mac = %mac))]
    pub async fn stop(&self, mac: &Mac) -> Result<(), BridgeError> {
        self.bridge.stop(mac).await?;
        self.request_refresh();
        Ok(())
    }

    /// Move a shade to `target` (`100` = fully open), then request a refresh.
    ///
    /// The target is converted to the bridge convention using the shade's
    /// kind; shades missing from the last listing are treated as roller
    /// shades.
    ///
    /// # Errors
    ///
    /// Returns the bridge error unchanged; no refresh is requested then.
    #[tracing::instrument(skip(self), fields(mac = %mac, target = %target))]
    pub async fn set_position(
        &self,
        mac: &Mac,
        target: Position,
        options: MotionOptions,
    ) -> Result<(), BridgeError> {
        let kind = read_state(&self.state)
            .shades
            .get(mac)
            .map_or(DeviceKind::default(), |shade| shade.kind);

        self.bridge
            .set_position(mac, kind.to_bridge(target), options)
            .await?;
        self.request_refresh();
        Ok(())
    }

    // ── Light level gating ─────────────────────────────────────────────

    /// Start polling the light level of a shade.
    ///
    /// Fetches the light level once right away, then on every cycle for as
    /// long as the returned subscription is alive. A failed first fetch is
    /// logged and left to the next cycle.
    pub async fn enable_light_polling(&self, mac: &Mac) -> LightSubscription {
        match self.with_timeout(self.bridge.get_light_level(mac)).await {
            Ok(LightReading {
                light_level: Some(level),
            }) => {
                write_state(&self.state)
                    .light_levels
                    .insert(mac.clone(), level);
            }
            Ok(LightReading { light_level: None }) => {
                tracing::debug!(%mac, "no light level in bridge response");
            }
            Err(err) => {
                tracing::warn!(%err, %mac, "failed to fetch light level");
            }
        }

        *write_state(&self.state)
            .light_subscribers
            .entry(mac.clone())
            .or_insert(0) += 1;

        LightSubscription {
            state: Arc::downgrade(&self.state),
            mac: mac.clone(),
        }
    }
}

impl<B: BridgeClient + 'static> ShadeCoordinator<B> {
    /// Spawn the poll loop: a cycle every `update_interval`, plus debounced
    /// cycles for [`request_refresh`](Self::request_refresh).
    ///
    /// The loop runs until the returned handle is shut down or dropped.
    ///
    /// # Errors
    ///
    /// Returns [`AlreadyStartedError`] if the loop was started before.
    pub fn start(self: &Arc<Self>) -> Result<PollHandle, AlreadyStartedError> {
        let requests = self
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(AlreadyStartedError)?;

        let schedule = Schedule {
            interval: self.config.update_interval(),
            cooldown: self.config.refresh_cooldown(),
        };
        Ok(scheduler::spawn(Arc::clone(self), requests, schedule))
    }
}

impl<B: BridgeClient + 'static> PollTarget for ShadeCoordinator<B> {
    type Error = UpdateError;

    fn poll_once(&self) -> impl Future<Output = Result<(), Self::Error>> + Send {
        self.refresh()
    }
}

/// Record a failure if a mandatory field is missing or its request failed.
fn required<T>(
    mac: &Mac,
    field: &'static str,
    result: Result<Option<T>, BridgeError>,
    failures: &mut Vec<PartialDataError>,
) -> Option<T> {
    let reason = match result {
        Ok(Some(value)) => return Some(value),
        Ok(None) => PartialDataReason::Missing(field),
        Err(source) => PartialDataReason::Request { field, source },
    };
    failures.push(PartialDataError {
        mac: mac.clone(),
        reason,
    });
    None
}

/// Keeps light-level polling enabled for one shade while alive.
///
/// Dropping it (or calling [`disable`](Self::disable)) stops the polling
/// once no other subscription for the same shade remains.
#[must_use = "light polling stops as soon as the subscription is dropped"]
#[derive(Debug)]
pub struct LightSubscription {
    state: Weak<RwLock<State>>,
    mac: Mac,
}

impl LightSubscription {
    /// Shade this subscription polls.
    #[must_use]
    pub fn mac(&self) -> &Mac {
        &self.mac
    }

    /// Stop polling. Equivalent to dropping the subscription.
    pub fn disable(self) {
        drop(self);
    }
}

impl Drop for LightSubscription {
    fn drop(&mut self) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let mut state = write_state(&state);
        if let Some(count) = state.light_subscribers.get_mut(&self.mac) {
            *count -= 1;
            if *count == 0 {
                state.light_subscribers.remove(&self.mac);
                tracing::debug!(mac = %self.mac, "light level polling disabled");
            }
        }
    }
}

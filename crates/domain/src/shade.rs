//! Shade: a motorized covering reachable through the bridge.
//!
//! The bridge and the host disagree on which end of the travel is "100":
//! the bridge reports `0` for fully open, while everything exposed from
//! somahub treats `100` as fully open. [`DeviceKind`] owns the conversion in
//! both directions so callers never do the arithmetic themselves.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::mac::Mac;

/// Manufacturer reported for every shade behind a SOMA Connect bridge.
pub const MANUFACTURER: &str = "Wazombi Labs";

/// Hardware family of a shade, as reported in the bridge device listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Roller shade driven by a Smart Shades motor.
    #[default]
    Shade,
    /// Venetian blind driven by a Tilt motor.
    Tilt,
}

impl DeviceKind {
    /// Map the bridge's `type` string to a kind.
    ///
    /// Anything the bridge does not explicitly label as a tilt device is
    /// treated as a roller shade.
    #[must_use]
    pub fn from_bridge_type(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("tilt") {
            Self::Tilt
        } else {
            Self::Shade
        }
    }

    /// Human readable label used in model strings.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Shade => "Shade",
            Self::Tilt => "Tilt",
        }
    }

    /// Convert a raw bridge position (`0` = open) to the host convention.
    ///
    /// Raw values above 100 are clamped first. Tilt motors report slat angle
    /// on the same `0` = open scale and use the roller-shade inversion
    /// `100 - raw`. The older per-entity tilt arithmetic is not applied.
    #[must_use]
    pub fn to_host(self, raw: u8) -> Position {
        let raw = raw.min(Position::MAX);
        match self {
            Self::Shade | Self::Tilt => Position(Position::MAX - raw),
        }
    }

    /// Convert a host position back to the value the bridge expects.
    ///
    /// Inverse of [`to_host`](Self::to_host), with the same mapping for
    /// both kinds.
    #[must_use]
    pub fn to_bridge(self, position: Position) -> u8 {
        match self {
            Self::Shade | Self::Tilt => Position::MAX - position.0,
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Host-convention position: `0` is fully closed, `100` fully open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Position(u8);

impl Position {
    /// Upper bound of the position range.
    pub const MAX: u8 = 100;
    /// Fully open.
    pub const OPEN: Self = Self(100);
    /// Fully closed.
    pub const CLOSED: Self = Self(0);

    /// Build a position, rejecting values above 100.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::PositionOutOfRange`] when `value > 100`.
    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if value > Self::MAX {
            return Err(ValidationError::PositionOutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Raw percentage value.
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Position {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Position> for u8 {
    fn from(position: Position) -> Self {
        position.0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Motor-control flags forwarded verbatim with a set-position command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionOptions {
    /// Close tilt slats upward instead of downward.
    pub close_upward: bool,
    /// Move slowly and quietly.
    pub morning_mode: bool,
}

/// Identity of a shade as listed by the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shade {
    pub mac: Mac,
    pub name: String,
    pub kind: DeviceKind,
    /// Hardware generation string (e.g. `"2"`, `"3"`).
    pub generation: String,
}

impl Shade {
    /// Model label, e.g. `"Shade 2"` or `"Tilt 3"`.
    #[must_use]
    pub fn model(&self) -> String {
        format!("{} {}", self.kind.label(), self.generation)
    }

    /// Manufacturer label.
    #[must_use]
    pub fn manufacturer(&self) -> &'static str {
        MANUFACTURER
    }
}

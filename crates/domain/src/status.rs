//! Outcome of a poll cycle, as seen by readers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mac::Mac;

/// UTC timestamp attached to poll outcomes.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Summary of the most recent poll cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStatus {
    /// When the cycle finished.
    pub at: Timestamp,
    /// Whether the device listing succeeded and every shade answered.
    pub success: bool,
    /// Shades that did not return a position or battery value.
    pub unavailable: Vec<Mac>,
}

impl UpdateStatus {
    /// A cycle where every listed shade answered.
    #[must_use]
    pub fn succeeded(at: Timestamp) -> Self {
        Self {
            at,
            success: true,
            unavailable: Vec::new(),
        }
    }

    /// A cycle that failed, optionally naming the shades responsible.
    #[must_use]
    pub fn failed(at: Timestamp, unavailable: Vec<Mac>) -> Self {
        Self {
            at,
            success: false,
            unavailable,
        }
    }
}

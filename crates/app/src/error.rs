//! Application-level error types.

use somahub_domain::mac::Mac;

/// Transport-level failure talking to the bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The bridge could not be reached.
    #[error("bridge unreachable")]
    Unreachable(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The bridge answered with something that could not be decoded.
    #[error("malformed bridge response")]
    Malformed(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The request did not complete within the configured timeout.
    #[error("bridge request timed out")]
    Timeout,

    /// The bridge refused a command for the given shade.
    #[error("bridge rejected the request for shade {0}")]
    Rejected(Mac),
}

/// Why a shade could not be fully read during a poll cycle.
#[derive(Debug, thiserror::Error)]
pub enum PartialDataReason {
    /// The bridge answered but the mandatory field was absent.
    #[error("no {0} value in bridge response")]
    Missing(&'static str),

    /// The request for the field failed outright.
    #[error("{field} request failed")]
    Request {
        field: &'static str,
        #[source]
        source: BridgeError,
    },
}

/// A shade returned no position or no battery value. The shade is marked
/// unavailable but the cycle carries on with the remaining shades.
#[derive(Debug, thiserror::Error)]
#[error("shade {mac} returned partial data")]
pub struct PartialDataError {
    pub mac: Mac,
    #[source]
    pub reason: PartialDataReason,
}

/// A poll cycle failed.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    /// The device listing failed; nothing was merged.
    #[error("failed to list bridge devices")]
    Listing(#[source] BridgeError),

    /// At least one shade is unavailable; data from the others was merged.
    #[error("{} shade read(s) failed", .0.len())]
    ShadesUnavailable(Vec<PartialDataError>),
}

impl UpdateError {
    /// Distinct MACs of the shades responsible for the failure.
    #[must_use]
    pub fn unavailable(&self) -> Vec<Mac> {
        match self {
            Self::Listing(_) => Vec::new(),
            Self::ShadesUnavailable(failures) => {
                let mut macs: Vec<Mac> = failures.iter().map(|f| f.mac.clone()).collect();
                macs.sort();
                macs.dedup();
                macs
            }
        }
    }
}

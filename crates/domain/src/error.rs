//! Domain validation errors.
//!
//! Each layer defines its own typed errors; callers wrap these with
//! `#[from]` where they cross a layer boundary.

/// Domain invariant violations.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The bridge host is empty.
    #[error("bridge host must not be empty")]
    EmptyHost,

    /// The bridge port is zero.
    #[error("bridge port must be non-zero")]
    InvalidPort,

    /// A duration setting is zero.
    #[error("{field} must be non-zero")]
    ZeroDuration {
        /// Name of the offending setting.
        field: &'static str,
    },

    /// The string is not a colon-separated six-octet MAC address.
    #[error("invalid MAC address {0:?}")]
    InvalidMac(String),

    /// The same MAC address is configured for two shades.
    #[error("MAC address {0} is used more than once")]
    DuplicateMac(String),

    /// A position outside `0..=100` was requested.
    #[error("position {0} is outside 0..=100")]
    PositionOutOfRange(u8),
}

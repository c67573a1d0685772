//! # somahub-domain
//!
//! Pure domain model for the somahub shade integration.
//!
//! ## Responsibilities
//! - Foundational types: MAC addresses, error conventions, timestamps
//! - Define **Shades** (motorized coverings reachable through a SOMA Connect bridge)
//! - Define **Readings** (raw per-shade responses returned by the bridge)
//! - Contain the derivation rules: inverted positions, battery percentage
//!   from raw battery levels, tilt vs. roller mapping
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod mac;
pub mod reading;
pub mod shade;
pub mod status;

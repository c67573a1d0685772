//! # somahub-app
//!
//! Application layer: the shade update coordinator and the **port
//! definition** for the bridge it talks to.
//!
//! ## Responsibilities
//! - Define the [`BridgeClient`](ports::BridgeClient) port that transports implement
//! - Run poll cycles against the bridge and derive per-shade state
//!   ([`ShadeCoordinator`](coordinator::ShadeCoordinator))
//! - Schedule polls: fixed interval, trailing-edge debounced refresh
//!   requests, never two cycles at once ([`scheduler`])
//! - Broadcast cycle outcomes to in-process listeners ([`event_bus`])
//!
//! ## Dependency rule
//! Depends on `somahub-domain` only (plus `tokio` for timers and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod event_bus;
pub mod ports;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

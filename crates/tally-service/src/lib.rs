//! Ingestion façade for the Tally event collector.
//!
//! Exposes a [`Collector`] backed by any [`tally_core::store::EventStore`].
//! The transport that carries calls to it (and process lifecycle in
//! general) is the caller's responsibility; every entry point here is
//! fire-and-forget and absorbs its own failures, because a collector must
//! never be a stability risk to the process hosting it.

pub mod collector;
pub mod readiness;

pub use collector::{Collector, ServiceState, dump_line};
pub use readiness::{AlwaysReady, BootMarker, Readiness};

#[cfg(test)]
mod tests;

//! [`Collector`] — the single ingestion entry point.
//!
//! Routes each inbound call through decode → normalise → capacity-gated
//! persistence. Nothing here is allowed to raise an error back across the
//! call boundary: every failure path is a typed value consumed by logging.

use tally_core::{
  event::{DataEvent, EventBundle, EventKind, EventRecord},
  normalize::{normalize, package_record},
  store::{EventStore, InsertOutcome},
};

use crate::readiness::Readiness;

// ─── State ───────────────────────────────────────────────────────────────────

/// The façade's observable state, derived fresh per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
  /// The host has not signalled boot-complete; ingestion calls are no-ops.
  NotReady,
  Ready,
  /// The store failed to open at composition time; all calls are logged
  /// no-ops for the lifetime of the process.
  Failed,
}

// ─── Collector ───────────────────────────────────────────────────────────────

/// The ingestion façade.
///
/// Constructed with its store and readiness probe injected; holds no global
/// state. Safe to invoke from any number of concurrent callers — writes
/// serialise inside the store.
pub struct Collector<S, R> {
  store:     Option<S>,
  readiness: R,
}

impl<S: EventStore, R: Readiness> Collector<S, R> {
  /// A collector over an opened store.
  pub fn new(store: S, readiness: R) -> Self {
    Self { store: Some(store), readiness }
  }

  /// A permanently failed collector, for hosts whose store did not open.
  /// Every call is safe and returns successfully; nothing is recorded.
  pub fn failed(readiness: R) -> Self {
    tracing::error!("event store unavailable; collector starting failed");
    Self { store: None, readiness }
  }

  /// Current state; the readiness probe is polled on every call.
  pub fn state(&self) -> ServiceState {
    match &self.store {
      None => ServiceState::Failed,
      Some(_) if !self.readiness.booted() => ServiceState::NotReady,
      Some(_) => ServiceState::Ready,
    }
  }

  /// Feature-gating hook; a stable surface with no persisted effect yet.
  pub fn enable(&self) {
    tracing::info!("data collection enabled");
  }

  /// Feature-gating hook; a stable surface with no persisted effect yet.
  pub fn disable(&self) {
    tracing::info!("data collection disabled");
  }

  /// Record a single package name under `kind`.
  ///
  /// Fire-and-forget: drops (unready, full table, storage failure) are
  /// logged, never surfaced.
  pub async fn collect(&self, kind: EventKind, package: &str) {
    let Some(store) = self.gate("collect") else { return };

    let record = package_record(kind, package);
    match store.insert(record).await {
      Ok(InsertOutcome::Stored(id)) => {
        tracing::debug!(id, kind = kind.code(), package, "recorded package");
      }
      Ok(InsertOutcome::Dropped(reason)) => {
        tracing::debug!(?reason, package, "dropped package record");
      }
      Err(e) => {
        tracing::warn!(error = %e, package, "store rejected collect call");
      }
    }
  }

  /// Generic event path: decode the wire bundle, normalise, persist.
  ///
  /// Unknown kind codes and malformed bundles are recoverable decode
  /// failures — logged and dropped, with the call still succeeding.
  pub async fn notify_event(&self, code: i64, bundle: EventBundle) {
    let Some(store) = self.gate("notify_event") else { return };

    let event = match DataEvent::decode(code, bundle) {
      Ok(event) => event,
      Err(e) => {
        tracing::warn!(error = %e, code, "ignoring undecodable data event");
        return;
      }
    };

    let records = normalize(&event);
    if records.is_empty() {
      tracing::debug!(kind = event.kind().code(), "event normalised to no records");
      return;
    }

    match store.insert_many(records).await {
      Ok(outcomes) => {
        let stored = outcomes.iter().filter(|o| o.is_stored()).count();
        let dropped = outcomes.len() - stored;
        tracing::debug!(stored, dropped, kind = event.kind().code(), "persisted data event");
      }
      Err(e) => {
        tracing::warn!(error = %e, code, "store rejected data event");
      }
    }
  }

  /// Render every stored row as a log line, in insertion order.
  pub async fn dump(&self) {
    let Some(store) = self.store.as_ref() else {
      tracing::debug!("dump skipped; store unavailable");
      return;
    };

    match store.scan_all().await {
      Ok(rows) => {
        for row in &rows {
          tracing::info!("{}", dump_line(row));
        }
      }
      Err(e) => tracing::warn!(error = %e, "dump scan failed"),
    }
  }

  /// Resolve the store for an ingestion call, logging the skip reason when
  /// the service is not `Ready`.
  fn gate(&self, call: &str) -> Option<&S> {
    match self.state() {
      ServiceState::Ready => self.store.as_ref(),
      ServiceState::NotReady => {
        tracing::debug!(call, "system not booted; ignoring ingestion call");
        None
      }
      ServiceState::Failed => {
        tracing::debug!(call, "store unavailable; ignoring ingestion call");
        None
      }
    }
  }
}

/// The diagnostic dump rendering of one record:
/// `<event_kind> <subject> <state> <created_at>`, space-joined.
pub fn dump_line(record: &EventRecord) -> String {
  format!(
    "{} {} {} {}",
    record.kind.code(),
    record.subject,
    record.state.as_str(),
    record.created_at.to_rfc3339(),
  )
}

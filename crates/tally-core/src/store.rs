//! The `EventStore` trait and write-outcome types.
//!
//! The trait is implemented by storage backends (e.g. `tally-store-sqlite`).
//! Higher layers (`tally-service`, `tally-cli`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use crate::event::{EventRecord, NewRecord};

// ─── Write outcomes ──────────────────────────────────────────────────────────

/// Why a write was dropped instead of stored.
///
/// Dropped writes are permanently lost: there is no retry logic and no
/// failure indication for callers beyond logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
  /// The table already holds its configured ceiling of rows.
  CapacityExceeded,
  /// The backing storage rejected the row; the error was logged by the
  /// store. Losing a record is preferable to destabilising the host.
  StorageFailed,
}

/// Result of a single insert attempt.
///
/// Failure to store is deliberately a value, not an error: the drop paths
/// are ordinary control flow that the caller consumes by logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
  /// The row was written; carries the store-assigned id.
  Stored(i64),
  Dropped(DropReason),
}

impl InsertOutcome {
  pub const fn is_stored(self) -> bool {
    matches!(self, Self::Stored(_))
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an append-only, capacity-bounded event store backend.
///
/// Records are never individually updated or deleted; the only destructive
/// operation is [`reset`](Self::reset), which clears the whole table and is
/// not reachable from the ingestion path.
///
/// All mutating operations are serialised through a single logical writer
/// per open store; implementations either lock internally or lean on the
/// backing engine's single-writer guarantee.
///
/// All methods return `Send` futures so the trait can be used from
/// multi-threaded async runtimes.
pub trait EventStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Insert one record, assigning the next id and the creation timestamp.
  ///
  /// Returns `Dropped` (never an error) when the capacity gate reports the
  /// table full, or when the storage engine rejects the individual row.
  fn insert(
    &self,
    record: NewRecord,
  ) -> impl Future<Output = Result<InsertOutcome, Self::Error>> + Send + '_;

  /// Insert records in the given order, gating each one individually.
  ///
  /// Not a transaction: if the gate fills mid-sequence, the remaining
  /// records are dropped one by one and partial success is expected.
  fn insert_many(
    &self,
    records: Vec<NewRecord>,
  ) -> impl Future<Output = Result<Vec<InsertOutcome>, Self::Error>> + Send + '_;

  /// Full-table scan in insertion (id) order.
  fn scan_all(
    &self,
  ) -> impl Future<Output = Result<Vec<EventRecord>, Self::Error>> + Send + '_;

  /// Current number of stored rows.
  fn row_count(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Delete all rows, preserving schema/version metadata. Dev/test only.
  fn reset(
    &self,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

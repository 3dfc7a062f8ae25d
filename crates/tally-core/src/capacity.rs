//! The capacity gate: a fixed row-count ceiling on the event table.
//!
//! Consulted immediately before every write commits. Once the table holds
//! `ceiling` rows, further inserts are dropped — not queued, not errored.

use serde::{Deserialize, Serialize};

/// Maximum number of rows the event table may hold.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Capacity {
  /// No ceiling; writes are never dropped for capacity reasons.
  #[default]
  Unbounded,
  /// Drop writes once the table holds this many rows.
  Bounded(u64),
}

impl Capacity {
  /// True iff a table currently holding `rows` rows may not accept another.
  pub const fn is_full(self, rows: u64) -> bool {
    match self {
      Self::Unbounded => false,
      Self::Bounded(ceiling) => rows >= ceiling,
    }
  }
}

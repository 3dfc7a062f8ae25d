//! Error type for `tally-store-sqlite`.
//!
//! Errors here surface only for open/migration failures and for scans; the
//! write path converts per-row storage errors into dropped-write outcomes
//! instead (see [`tally_core::store::InsertOutcome`]).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// A migration step failed; startup must abort rather than run against a
  /// half-upgraded table.
  #[error("migration to schema version {version} failed: {source}")]
  Migration {
    version: i64,
    source:  rusqlite::Error,
  },

  /// A stored row carries an event-kind code this build does not know.
  #[error("stored row {id} has unknown event kind code {code}")]
  UnknownEventKind { id: i64, code: i64 },

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

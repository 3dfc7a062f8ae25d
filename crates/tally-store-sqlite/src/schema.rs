//! Schema registry for the Tally SQLite store.
//!
//! The event table is versioned via `PRAGMA user_version`, which doubles as
//! the persisted migration run record: on open, every step between the
//! stored version and [`TARGET_VERSION`] is applied in order, exactly once.
//! Re-opening at the same target applies nothing.
//!
//! Steps after v1 must be strictly additive (new columns with defaults, new
//! indexes). No step may delete or retype an existing column; historical
//! rows must remain readable.

/// Pragmas applied on every open, before any migration step.
pub const OPEN_PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// A single schema upgrade step. `version` is the `user_version` the
/// database holds after the step has been applied.
pub struct Migration {
  pub version: i64,
  pub ddl:     &'static str,
}

/// All migration steps, ascending by version.
pub const MIGRATIONS: &[Migration] = &[
  Migration {
    version: 1,
    ddl:     "
CREATE TABLE IF NOT EXISTS events (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    event_kind  INTEGER NOT NULL,
    subject     TEXT NOT NULL,
    state       TEXT NOT NULL,
    created_at  TEXT NOT NULL
);
",
  },
  Migration {
    version: 2,
    ddl:     "CREATE INDEX IF NOT EXISTS events_kind_idx ON events(event_kind);",
  },
  Migration {
    version: 3,
    ddl:     "CREATE INDEX IF NOT EXISTS events_created_idx ON events(created_at);",
  },
];

/// The schema version this build of the store runs against.
pub const TARGET_VERSION: i64 = 3;

/// The ordered steps still to apply to a database at `stored` version.
pub fn pending(stored: i64) -> &'static [Migration] {
  let first = MIGRATIONS
    .iter()
    .position(|m| m.version > stored)
    .unwrap_or(MIGRATIONS.len());
  &MIGRATIONS[first..]
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn versions_are_ascending_and_end_at_target() {
    let versions: Vec<_> = MIGRATIONS.iter().map(|m| m.version).collect();
    assert!(versions.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(versions.last(), Some(&TARGET_VERSION));
  }

  #[test]
  fn pending_is_empty_at_target() {
    assert!(pending(TARGET_VERSION).is_empty());
    assert!(pending(TARGET_VERSION + 1).is_empty());
  }

  #[test]
  fn pending_from_fresh_database_is_everything() {
    assert_eq!(pending(0).len(), MIGRATIONS.len());
  }

  #[test]
  fn pending_resumes_mid_range() {
    let rest = pending(1);
    assert_eq!(rest.first().map(|m| m.version), Some(2));
    assert_eq!(rest.len(), 2);
  }
}

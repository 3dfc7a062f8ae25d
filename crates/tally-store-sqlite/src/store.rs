//! [`SqliteStore`] — the SQLite implementation of [`EventStore`].

use std::path::Path;

use chrono::Utc;
use tally_core::{
  capacity::Capacity,
  event::{EventRecord, NewRecord},
  store::{DropReason, EventStore, InsertOutcome},
};

use crate::{
  encode::{RawRecord, encode_dt},
  schema::{self, OPEN_PRAGMAS},
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tally event store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All access
/// runs on the connection's dedicated thread, which serialises every write
/// (and the capacity check that gates it) through one logical writer.
#[derive(Clone)]
pub struct SqliteStore {
  conn:     tokio_rusqlite::Connection,
  capacity: Capacity,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and bring the schema up to the
  /// target version.
  ///
  /// # Errors
  ///
  /// Fails if the database cannot be opened at all, or if any pending
  /// migration step fails; a half-upgraded table must abort startup.
  pub async fn open(path: impl AsRef<Path>, capacity: Capacity) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, capacity };
    store.migrate().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory(capacity: Capacity) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, capacity };
    store.migrate().await?;
    Ok(store)
  }

  /// Apply every migration step between the stored version and
  /// [`schema::TARGET_VERSION`], in order. A no-op when already current.
  async fn migrate(&self) -> Result<()> {
    self.conn.call(|conn| Ok(run_migrations(conn))).await?
  }

  /// The schema version currently persisted in the database.
  pub async fn schema_version(&self) -> Result<i64> {
    let version = self
      .conn
      .call(|conn| {
        let v: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
        Ok(v)
      })
      .await?;
    Ok(version)
  }

  /// The configured row ceiling.
  pub fn capacity(&self) -> Capacity {
    self.capacity
  }
}

// ─── Connection-thread helpers ───────────────────────────────────────────────

fn db(e: rusqlite::Error) -> Error {
  Error::Database(e.into())
}

fn run_migrations(conn: &mut rusqlite::Connection) -> Result<()> {
  conn.execute_batch(OPEN_PRAGMAS).map_err(db)?;

  let stored: i64 = conn
    .query_row("PRAGMA user_version", [], |r| r.get(0))
    .map_err(db)?;

  for step in schema::pending(stored) {
    tracing::info!(version = step.version, "applying schema migration");
    conn
      .execute_batch(step.ddl)
      .and_then(|()| conn.pragma_update(None, "user_version", step.version))
      .map_err(|e| Error::Migration { version: step.version, source: e })?;
  }

  Ok(())
}

fn count_rows(conn: &rusqlite::Connection) -> rusqlite::Result<u64> {
  let n: i64 = conn.query_row("SELECT COUNT(*) FROM events", [], |r| r.get(0))?;
  Ok(u64::try_from(n).unwrap_or(0))
}

/// Gate-then-insert for a single record. Runs entirely on the connection
/// thread, so no other writer can interleave between the count and the
/// INSERT. Ordinary storage errors are logged and become dropped writes.
fn insert_row(
  conn: &rusqlite::Connection,
  capacity: Capacity,
  record: &NewRecord,
  created_at: &str,
) -> InsertOutcome {
  match count_rows(conn) {
    Ok(rows) if capacity.is_full(rows) => {
      tracing::debug!(rows, "event table is full; dropping record");
      return InsertOutcome::Dropped(DropReason::CapacityExceeded);
    }
    Ok(_) => {}
    Err(e) => {
      tracing::warn!(error = %e, "row count failed; dropping record");
      return InsertOutcome::Dropped(DropReason::StorageFailed);
    }
  }

  let written = conn.execute(
    "INSERT INTO events (event_kind, subject, state, created_at)
     VALUES (?1, ?2, ?3, ?4)",
    rusqlite::params![
      record.kind.code(),
      record.subject,
      record.state.as_str(),
      created_at,
    ],
  );

  match written {
    Ok(_) => InsertOutcome::Stored(conn.last_insert_rowid()),
    Err(e) => {
      tracing::warn!(error = %e, subject = %record.subject, "insert failed; dropping record");
      InsertOutcome::Dropped(DropReason::StorageFailed)
    }
  }
}

// ─── EventStore impl ─────────────────────────────────────────────────────────

impl EventStore for SqliteStore {
  type Error = Error;

  async fn insert(&self, record: NewRecord) -> Result<InsertOutcome> {
    let capacity = self.capacity;
    let created_at = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| Ok(insert_row(conn, capacity, &record, &created_at)))
      .await?;
    Ok(outcome)
  }

  async fn insert_many(
    &self,
    records: Vec<NewRecord>,
  ) -> Result<Vec<InsertOutcome>> {
    let capacity = self.capacity;
    let created_at = encode_dt(Utc::now());

    let outcomes = self
      .conn
      .call(move |conn| {
        Ok(
          records
            .iter()
            .map(|record| insert_row(conn, capacity, record, &created_at))
            .collect::<Vec<_>>(),
        )
      })
      .await?;
    Ok(outcomes)
  }

  async fn scan_all(&self) -> Result<Vec<EventRecord>> {
    let raws: Vec<RawRecord> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT id, event_kind, subject, state, created_at
           FROM events ORDER BY id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawRecord {
              id:         row.get(0)?,
              kind_code:  row.get(1)?,
              subject:    row.get(2)?,
              state:      row.get(3)?,
              created_at: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }

  async fn row_count(&self) -> Result<u64> {
    let n = self
      .conn
      .call(|conn| Ok(count_rows(conn)?))
      .await?;
    Ok(n)
  }

  async fn reset(&self) -> Result<()> {
    // DELETE leaves `user_version` and the AUTOINCREMENT sequence alone, so
    // the schema survives and ids are never reused.
    self
      .conn
      .call(|conn| {
        conn.execute("DELETE FROM events", [])?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

//! Encoding and decoding helpers between Rust domain types and the
//! plain-text/integer representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, event kinds as their integer
//! wire codes, and states as free text.

use chrono::{DateTime, Utc};
use tally_core::event::{EventKind, EventRecord, SubjectState};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339()
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Rows ────────────────────────────────────────────────────────────────────

/// Column values exactly as read from the `events` table, before domain
/// decoding.
pub struct RawRecord {
  pub id:         i64,
  pub kind_code:  i64,
  pub subject:    String,
  pub state:      String,
  pub created_at: String,
}

impl RawRecord {
  pub fn into_record(self) -> Result<EventRecord> {
    let kind = EventKind::from_code(self.kind_code).ok_or(
      Error::UnknownEventKind { id: self.id, code: self.kind_code },
    )?;
    Ok(EventRecord {
      id: self.id,
      kind,
      subject: self.subject,
      state: SubjectState::from_str(&self.state),
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

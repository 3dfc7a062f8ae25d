//! Event types — the fundamental unit of the Tally collector.
//!
//! A collected event is normalised into one or more append-only records.
//! Records are never updated; the only destructive operation is a
//! whole-table reset, which is a dev/test affordance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Event kind ──────────────────────────────────────────────────────────────

/// Enumerated category of a collected signal.
///
/// The integer codes are the stable wire form used across the call boundary
/// and in the `event_kind` column; they must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
  DeviceAdmin,
  Accessibility,
  UsageStats,
}

impl EventKind {
  /// The integer code stored in the `event_kind` column.
  pub const fn code(self) -> i64 {
    match self {
      Self::DeviceAdmin => 0,
      Self::Accessibility => 1,
      Self::UsageStats => 2,
    }
  }

  /// Decode a wire code. Returns `None` for codes outside the enumeration.
  pub const fn from_code(code: i64) -> Option<Self> {
    match code {
      0 => Some(Self::DeviceAdmin),
      1 => Some(Self::Accessibility),
      2 => Some(Self::UsageStats),
      _ => None,
    }
  }
}

// ─── Subject state ───────────────────────────────────────────────────────────

/// Status tag for a collected subject at collection time.
///
/// Stored as free text rather than a boolean so that future states can be
/// introduced without a schema migration. `Other` round-trips any state
/// string this version does not know about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectState {
  Enabled,
  Disabled,
  Other(String),
}

impl SubjectState {
  /// The text stored in the `state` column.
  pub fn as_str(&self) -> &str {
    match self {
      Self::Enabled => "enabled",
      Self::Disabled => "disabled",
      Self::Other(s) => s,
    }
  }

  /// Inverse of [`as_str`](Self::as_str); never fails.
  pub fn from_str(s: &str) -> Self {
    match s {
      "enabled" => Self::Enabled,
      "disabled" => Self::Disabled,
      other => Self::Other(other.to_owned()),
    }
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A stored event record. Once written, no field is ever updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
  /// Store-assigned, strictly increasing in insertion order, never reused.
  pub id:         i64,
  pub kind:       EventKind,
  /// The collected item — a package name, or a sentinel marker.
  pub subject:    String,
  pub state:      SubjectState,
  /// Store-assigned timestamp; never changes after creation.
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::EventStore::insert`].
/// `id` and `created_at` are always assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
  pub kind:    EventKind,
  pub subject: String,
  pub state:   SubjectState,
}

impl NewRecord {
  pub fn new(
    kind: EventKind,
    subject: impl Into<String>,
    state: SubjectState,
  ) -> Self {
    Self { kind, subject: subject.into(), state }
  }
}

// ─── Wire payload ────────────────────────────────────────────────────────────

/// The loosely-typed payload bundle as it crosses the call boundary.
///
/// Decoded exactly once, at the boundary, into a [`DataEvent`]; nothing past
/// the façade ever sees this shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventBundle {
  /// Ordered list of currently enabled accessibility services.
  #[serde(default)]
  pub enabled_service_list: Option<Vec<String>>,
}

impl EventBundle {
  /// Parse a bundle from its JSON wire form.
  pub fn from_json(s: &str) -> Result<Self> {
    Ok(serde_json::from_str(s)?)
  }
}

// ─── DataEvent ───────────────────────────────────────────────────────────────

/// A fully-decoded inbound event, one variant per recognised kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataEvent {
  /// Recognised but not yet mapped to any records.
  DeviceAdmin,
  /// Snapshot of the enabled accessibility service list, in reported order.
  Accessibility { enabled_services: Vec<String> },
  /// Recognised but not yet mapped to any records.
  UsageStats,
}

impl DataEvent {
  /// Decode a wire `(code, bundle)` pair into a typed event.
  ///
  /// # Errors
  ///
  /// [`Error::UnknownEventKind`] for codes outside the enumeration and
  /// [`Error::MissingServiceList`] for an accessibility bundle without a
  /// service list. Both are recoverable decode failures: callers log them
  /// and drop the event rather than surfacing an error across the boundary.
  pub fn decode(code: i64, bundle: EventBundle) -> Result<Self> {
    match EventKind::from_code(code) {
      Some(EventKind::DeviceAdmin) => Ok(Self::DeviceAdmin),
      Some(EventKind::Accessibility) => {
        let enabled_services =
          bundle.enabled_service_list.ok_or(Error::MissingServiceList)?;
        Ok(Self::Accessibility { enabled_services })
      }
      Some(EventKind::UsageStats) => Ok(Self::UsageStats),
      None => Err(Error::UnknownEventKind(code)),
    }
  }

  /// The kind this event normalises under.
  pub const fn kind(&self) -> EventKind {
    match self {
      Self::DeviceAdmin => EventKind::DeviceAdmin,
      Self::Accessibility { .. } => EventKind::Accessibility,
      Self::UsageStats => EventKind::UsageStats,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kind_codes_roundtrip() {
    for kind in [
      EventKind::DeviceAdmin,
      EventKind::Accessibility,
      EventKind::UsageStats,
    ] {
      assert_eq!(EventKind::from_code(kind.code()), Some(kind));
    }
    assert_eq!(EventKind::from_code(3), None);
    assert_eq!(EventKind::from_code(-1), None);
  }

  #[test]
  fn subject_state_text_roundtrip() {
    assert_eq!(SubjectState::from_str("enabled"), SubjectState::Enabled);
    assert_eq!(SubjectState::from_str("disabled"), SubjectState::Disabled);
    assert_eq!(
      SubjectState::from_str("quarantined"),
      SubjectState::Other("quarantined".into())
    );
    assert_eq!(SubjectState::Other("quarantined".into()).as_str(), "quarantined");
  }

  #[test]
  fn decode_accessibility_event() {
    let bundle = EventBundle {
      enabled_service_list: Some(vec!["svc.A".into(), "svc.B".into()]),
    };
    let event = DataEvent::decode(1, bundle).unwrap();
    assert_eq!(
      event,
      DataEvent::Accessibility {
        enabled_services: vec!["svc.A".into(), "svc.B".into()],
      }
    );
    assert_eq!(event.kind(), EventKind::Accessibility);
  }

  #[test]
  fn decode_accessibility_without_list_fails() {
    let err = DataEvent::decode(1, EventBundle::default()).unwrap_err();
    assert!(matches!(err, Error::MissingServiceList));
  }

  #[test]
  fn decode_unknown_code_fails() {
    let err = DataEvent::decode(42, EventBundle::default()).unwrap_err();
    assert!(matches!(err, Error::UnknownEventKind(42)));
  }

  #[test]
  fn bundle_from_json() {
    let bundle =
      EventBundle::from_json(r#"{"enabled_service_list": ["svc.A"]}"#).unwrap();
    assert_eq!(bundle.enabled_service_list.as_deref(), Some(&["svc.A".to_owned()][..]));

    // An empty object is a valid bundle with no list.
    let empty = EventBundle::from_json("{}").unwrap();
    assert_eq!(empty.enabled_service_list, None);
  }
}

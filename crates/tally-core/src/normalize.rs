//! Normalisation of decoded events into storable records.
//!
//! A pure mapping stage: no side effects, no I/O. Each recognised event kind
//! maps to zero or more [`NewRecord`]s; the store assigns ids and timestamps
//! later.

use crate::event::{DataEvent, EventKind, NewRecord, SubjectState};

/// Subject written when an accessibility event reports an empty service
/// list, so that "everything was switched off" survives as a row.
pub const ALL_DISABLED_SENTINEL: &str = "all-disabled";

/// Map a decoded event onto its normalised rows.
///
/// - Accessibility with an empty list ⇒ exactly one sentinel row, disabled.
/// - Accessibility with N services ⇒ N enabled rows, list order preserved.
/// - Device-admin and usage-stats are recognised but produce no rows yet;
///   their mappings are reserved.
pub fn normalize(event: &DataEvent) -> Vec<NewRecord> {
  match event {
    DataEvent::DeviceAdmin | DataEvent::UsageStats => Vec::new(),
    DataEvent::Accessibility { enabled_services } => {
      if enabled_services.is_empty() {
        vec![NewRecord::new(
          EventKind::Accessibility,
          ALL_DISABLED_SENTINEL,
          SubjectState::Disabled,
        )]
      } else {
        enabled_services
          .iter()
          .map(|service| {
            NewRecord::new(
              EventKind::Accessibility,
              service.clone(),
              SubjectState::Enabled,
            )
          })
          .collect()
      }
    }
  }
}

/// The direct "record this package name" path.
///
/// Always enabled: this call path only ever reports additions.
pub fn package_record(kind: EventKind, package: &str) -> NewRecord {
  NewRecord::new(kind, package, SubjectState::Enabled)
}

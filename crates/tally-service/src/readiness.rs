//! The host readiness signal.
//!
//! Ingestion is only honoured once the host environment reports that boot
//! has completed. The signal is polled at call time, never pushed, and the
//! collector treats it as read-only input.

use std::path::PathBuf;

/// A boolean "system fully booted" probe, polled before each ingestion call.
pub trait Readiness: Send + Sync {
  fn booted(&self) -> bool;
}

impl<T: Readiness + ?Sized> Readiness for Box<T> {
  fn booted(&self) -> bool {
    (**self).booted()
  }
}

/// Probe that always reports booted. For hosts without a boot phase, and
/// for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReady;

impl Readiness for AlwaysReady {
  fn booted(&self) -> bool {
    true
  }
}

/// Probe that reports booted once a marker file exists.
///
/// Stands in for a host boot-completed property: the host composition
/// touches the marker when initialisation finishes.
#[derive(Debug, Clone)]
pub struct BootMarker {
  path: PathBuf,
}

impl BootMarker {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }
}

impl Readiness for BootMarker {
  fn booted(&self) -> bool {
    self.path.exists()
  }
}

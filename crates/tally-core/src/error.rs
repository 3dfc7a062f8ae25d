//! Error types for `tally-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// An event arrived with a kind code outside the known enumeration.
  #[error("unknown event kind code: {0}")]
  UnknownEventKind(i64),

  /// An accessibility event bundle carried no service list at all.
  /// Distinct from an empty list, which is a valid "everything off" signal.
  #[error("accessibility event bundle is missing the enabled service list")]
  MissingServiceList,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

//! SQLite backend for the Tally event store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! connection thread without blocking the async runtime. That single thread
//! is also the single logical writer: the capacity check and the insert it
//! gates always execute back to back on it.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

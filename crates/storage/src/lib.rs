//! Durable state for the bounce pipeline.
//!
//! - [`SnapshotStore`]: single-slot snapshot of the latest run plus the
//!   append-only fetch log, backed by SQLite.

pub mod error;
pub mod snapshot_store;

pub use error::StorageError;
pub use snapshot_store::{SnapshotStore, SnapshotView};

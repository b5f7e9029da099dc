//! Bounce ingestion pipeline.
//!
//! Leaves first:
//! - [`recency`]: trailing-window timestamp filter
//! - [`source`]: the [`BounceSource`] transport trait and raw provider entries
//! - [`smartlead`]: `reqwest` implementation of [`BounceSource`]
//! - [`fetcher`]: one statistics page, response-shape normalization
//! - [`paginator`]: walks one campaign's pages until exhausted or aborted
//! - [`enumerator`]: the campaign list
//! - [`orchestrator`]: one full run, committed to the snapshot store

pub mod enumerator;
pub mod error;
pub mod fetcher;
pub mod orchestrator;
pub mod paginator;
pub mod recency;
pub mod smartlead;
pub mod source;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{ErrorScope, IngestError};
pub use orchestrator::{IngestSettings, IngestionOrchestrator, RunReport, TriggerKind};
pub use recency::RecencyWindow;
pub use smartlead::SmartleadClient;
pub use source::{BounceSource, PageRequest, RawBounceEntry};

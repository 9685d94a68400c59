//! Background roster synchronization.
//!
//! A single [`SyncAgent`] task periodically fetches the full enrollment
//! catalog from the upstream source of truth and atomically swaps the
//! decoded result into the shared roster. It is the sole writer; match
//! requests only ever read snapshots.
//!
//! Every failure here is recoverable by definition: the cycle is abandoned,
//! the previous snapshot stays in place, and the next tick retries.

mod agent;
mod catalog;
mod error;

pub use agent::SyncAgent;
pub use catalog::{CatalogClient, CatalogRecord, HttpCatalogClient};
pub use error::SyncError;

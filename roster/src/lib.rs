//! In-memory roster of enrolled identities.
//!
//! The roster is a refreshable projection of an upstream catalog, not a
//! system of record. Readers always see one complete [`Snapshot`]; the sync
//! task replaces the whole snapshot atomically, never individual entries.

mod roster;

pub use roster::{Enrollment, Roster, Snapshot};

use std::sync::{Arc, RwLock};

/// One enrolled identity.
///
/// Created only by a full-catalog refresh and never mutated field-by-field.
/// `zones` lists the recognition contexts (rooms) the identity may be
/// matched within.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrollment {
    pub id: String,
    pub descriptor: Vec<f32>,
    pub zones: Vec<String>,
}

impl Enrollment {
    pub fn in_zone(&self, zone: &str) -> bool {
        self.zones.iter().any(|z| z == zone)
    }
}

/// An immutable point-in-time view of every enrolled identity.
#[derive(Debug, Default)]
pub struct Snapshot {
    entries: Vec<Enrollment>,
}

impl Snapshot {
    pub fn new(entries: Vec<Enrollment>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[Enrollment] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identities eligible in `zone`, in snapshot order. May be empty.
    pub fn in_zone(&self, zone: &str) -> Vec<&Enrollment> {
        self.entries.iter().filter(|e| e.in_zone(zone)).collect()
    }
}

/// Shared enrollment cache.
///
/// The current snapshot lives behind a single `Arc` that readers clone and
/// the sync task swaps wholesale. A reader holding a snapshot keeps it alive
/// across a concurrent [`Roster::replace`]; it never observes a mixture of
/// old and new entries.
#[derive(Debug)]
pub struct Roster {
    current: RwLock<Arc<Snapshot>>,
}

impl Roster {
    /// Creates a roster holding an empty snapshot.
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Snapshot::default())),
        }
    }

    /// Returns the snapshot visible at call time.
    pub fn current(&self) -> Arc<Snapshot> {
        self.current.read().unwrap().clone()
    }

    /// Atomically installs `snapshot` as current. Concurrent `replace`
    /// calls serialize on the lock; last writer wins.
    pub fn replace(&self, snapshot: Snapshot) {
        *self.current.write().unwrap() = Arc::new(snapshot);
    }

    /// Number of identities in the current snapshot.
    pub fn len(&self) -> usize {
        self.current().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}

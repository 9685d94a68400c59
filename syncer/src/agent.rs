use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use facegate_descriptor::decode_transport;
use facegate_roster::{Enrollment, Roster, Snapshot};

use crate::catalog::CatalogClient;
use crate::error::SyncError;

/// Periodically rebuilds the roster from the upstream catalog.
///
/// The agent alternates between idle (waiting for the next tick) and
/// refreshing; it always returns to idle whether the cycle succeeded or
/// failed. Failed cycles leave the existing snapshot untouched and are
/// retried by the timer only, so upstream load stays bounded.
pub struct SyncAgent {
    roster: Arc<Roster>,
    client: Arc<dyn CatalogClient>,
    dim: usize,

    refreshing: AtomicBool,
    completed_cycles: AtomicU64,
    failed_cycles: AtomicU64,
}

impl SyncAgent {
    pub fn new(roster: Arc<Roster>, client: Arc<dyn CatalogClient>, dim: usize) -> Self {
        Self {
            roster,
            client,
            dim,
            refreshing: AtomicBool::new(false),
            completed_cycles: AtomicU64::new(0),
            failed_cycles: AtomicU64::new(0),
        }
    }

    /// True while a refresh cycle is in flight.
    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Relaxed)
    }

    /// Successful cycles since startup.
    pub fn completed_cycles(&self) -> u64 {
        self.completed_cycles.load(Ordering::Relaxed)
    }

    /// Failed cycles since startup.
    pub fn failed_cycles(&self) -> u64 {
        self.failed_cycles.load(Ordering::Relaxed)
    }

    /// Runs one full refresh cycle: fetch, decode, atomic swap.
    ///
    /// Returns the number of identities in the installed snapshot. On
    /// error, nothing is installed.
    pub async fn refresh_once(&self) -> Result<usize, SyncError> {
        self.refreshing.store(true, Ordering::Relaxed);
        let result = self.refresh_inner().await;
        self.refreshing.store(false, Ordering::Relaxed);

        match &result {
            Ok(_) => self.completed_cycles.fetch_add(1, Ordering::Relaxed),
            Err(_) => self.failed_cycles.fetch_add(1, Ordering::Relaxed),
        };
        result
    }

    async fn refresh_inner(&self) -> Result<usize, SyncError> {
        let records = self.client.fetch_catalog().await?;

        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            // An identity without a usable descriptor is skipped, never fatal.
            let Some(text) = record.descriptor else {
                debug!(id = %record.id, "sync: record has no descriptor, skipping");
                continue;
            };
            match decode_transport(&text, self.dim) {
                Ok(descriptor) => entries.push(Enrollment {
                    id: record.id,
                    descriptor,
                    zones: record.zones,
                }),
                Err(e) => {
                    warn!(id = %record.id, "sync: undecodable descriptor, skipping: {e}");
                }
            }
        }

        let count = entries.len();
        self.roster.replace(Snapshot::new(entries));
        Ok(count)
    }

    /// Timer loop. Ticks immediately on start, then every `interval`, until
    /// `cancel` fires. Cycle failures are logged and never escape the loop.
    pub async fn run(self: Arc<Self>, interval: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("sync: stopped");
                    return;
                }
                _ = ticker.tick() => {
                    match self.refresh_once().await {
                        Ok(count) => info!(enrolled = count, "sync: roster refreshed"),
                        Err(e) => warn!("sync: cycle failed, retrying next tick: {e}"),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogRecord;
    use facegate_descriptor::encode_transport;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const DIM: usize = 8;

    /// Replays a scripted sequence of fetch outcomes, then serves empty
    /// catalogs.
    struct ScriptedClient {
        script: Mutex<VecDeque<Result<Vec<CatalogRecord>, SyncError>>>,
        calls: AtomicU64,
    }

    impl ScriptedClient {
        fn new(script: Vec<Result<Vec<CatalogRecord>, SyncError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicU64::new(0),
            }
        }

        fn calls(&self) -> u64 {
            self.calls.load(Ordering::Relaxed)
        }
    }

    #[async_trait::async_trait]
    impl CatalogClient for ScriptedClient {
        async fn fetch_catalog(&self) -> Result<Vec<CatalogRecord>, SyncError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            let mut script = self.script.lock().unwrap();
            match script.pop_front() {
                Some(outcome) => outcome,
                None => Ok(vec![]),
            }
        }
    }

    fn record(id: &str, descriptor: Option<String>, zones: &[&str]) -> CatalogRecord {
        CatalogRecord {
            id: id.to_string(),
            descriptor,
            zones: zones.iter().map(|z| z.to_string()).collect(),
        }
    }

    fn valid_descriptor() -> Option<String> {
        Some(encode_transport(&[0.5; DIM]))
    }

    #[tokio::test]
    async fn refresh_installs_decoded_records() {
        let roster = Arc::new(Roster::new());
        let client = Arc::new(ScriptedClient::new(vec![Ok(vec![
            record("a", valid_descriptor(), &["room-1"]),
            record("b", valid_descriptor(), &["room-2"]),
        ])]));
        let agent = SyncAgent::new(Arc::clone(&roster), client, DIM);

        let count = agent.refresh_once().await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(roster.len(), 2);
        assert_eq!(agent.completed_cycles(), 1);
        assert!(!agent.is_refreshing());
    }

    #[tokio::test]
    async fn records_without_usable_descriptors_are_skipped() {
        // Scenario: 3 records, one with no descriptor — cycle still succeeds
        // with the 2 usable identities.
        let roster = Arc::new(Roster::new());
        let client = Arc::new(ScriptedClient::new(vec![Ok(vec![
            record("a", valid_descriptor(), &["room-1"]),
            record("b", None, &["room-1"]),
            record("c", valid_descriptor(), &["room-1"]),
        ])]));
        let agent = SyncAgent::new(Arc::clone(&roster), client, DIM);

        let count = agent.refresh_once().await.unwrap();
        assert_eq!(count, 2);
        let snapshot = roster.current();
        let ids: Vec<&str> = snapshot.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn undecodable_descriptor_is_skipped_not_fatal() {
        let roster = Arc::new(Roster::new());
        let client = Arc::new(ScriptedClient::new(vec![Ok(vec![
            record("a", Some("!!not-base64!!".to_string()), &[]),
            record("b", Some(encode_transport(&[0.5; 3])), &[]), // wrong dim
            record("c", valid_descriptor(), &[]),
        ])]));
        let agent = SyncAgent::new(Arc::clone(&roster), client, DIM);

        let count = agent.refresh_once().await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(roster.current().entries()[0].id, "c");
    }

    #[tokio::test]
    async fn failed_cycle_leaves_snapshot_untouched() {
        let roster = Arc::new(Roster::new());
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(vec![record("a", valid_descriptor(), &["room-1"])]),
            Err(SyncError::Upstream("connection timed out".to_string())),
            Ok(vec![
                record("a", valid_descriptor(), &["room-1"]),
                record("b", valid_descriptor(), &["room-1"]),
            ]),
        ]));
        let agent = SyncAgent::new(Arc::clone(&roster), client, DIM);

        agent.refresh_once().await.unwrap();
        assert_eq!(roster.len(), 1);

        // The timeout cycle fails; the previous snapshot survives.
        assert!(agent.refresh_once().await.is_err());
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.current().entries()[0].id, "a");
        assert_eq!(agent.failed_cycles(), 1);

        // The next tick retries and succeeds.
        agent.refresh_once().await.unwrap();
        assert_eq!(roster.len(), 2);
    }

    #[tokio::test]
    async fn empty_catalog_installs_an_empty_snapshot() {
        let roster = Arc::new(Roster::new());
        roster.replace(Snapshot::new(vec![Enrollment {
            id: "stale".to_string(),
            descriptor: vec![0.0; DIM],
            zones: vec![],
        }]));
        let client = Arc::new(ScriptedClient::new(vec![Ok(vec![])]));
        let agent = SyncAgent::new(Arc::clone(&roster), client, DIM);

        let count = agent.refresh_once().await.unwrap();
        assert_eq!(count, 0);
        assert!(roster.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn run_ticks_and_stops_on_cancel() {
        let roster = Arc::new(Roster::new());
        // Enough scripted responses to cover every tick in the test window.
        let script = (0..16)
            .map(|_| Ok(vec![record("a", valid_descriptor(), &["room-1"])]))
            .collect();
        let client = Arc::new(ScriptedClient::new(script));
        let agent = Arc::new(SyncAgent::new(
            Arc::clone(&roster),
            Arc::clone(&client) as Arc<dyn CatalogClient>,
            DIM,
        ));

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(Arc::clone(&agent).run(
            Duration::from_secs(60),
            cancel.clone(),
        ));

        // First tick fires immediately; let a few more elapse.
        tokio::time::sleep(Duration::from_secs(200)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert!(client.calls() >= 2);
        assert_eq!(roster.len(), 1);
        assert!(!agent.is_refreshing());
    }
}

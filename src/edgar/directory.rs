//! Cached entity directory (ticker / name / registry ID)
//!
//! The whole directory is held as one immutable snapshot. Refreshes build a
//! new snapshot and swap the `Arc`, so readers see either the old or the new
//! set, never a mix. Only one refresh runs at a time; callers that already
//! hold a stale snapshot keep using it while another caller refreshes.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::edgar::client::Fetch;
use crate::edgar::types::CompanyTickerEntry;
use crate::errors::{FilingError, Result};
use crate::models::IdentifierRecord;

/// Minimum wait after a failed refresh before the next attempt
pub const REFRESH_RETRY_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub struct Snapshot {
    records: Vec<IdentifierRecord>,
    by_registry_id: HashMap<String, usize>,
    loaded_at: Instant,
}

impl Snapshot {
    pub fn new(records: Vec<IdentifierRecord>) -> Self {
        let mut by_registry_id = HashMap::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            // First entry wins; the directory lists an entity's primary ticker first
            by_registry_id.entry(record.registry_id.clone()).or_insert(index);
        }
        Self {
            records,
            by_registry_id,
            loaded_at: Instant::now(),
        }
    }

    pub fn records(&self) -> &[IdentifierRecord] {
        &self.records
    }

    pub fn lookup(&self, registry_id: &str) -> Option<&IdentifierRecord> {
        self.by_registry_id
            .get(registry_id)
            .map(|&index| &self.records[index])
    }

    pub fn age(&self) -> Duration {
        self.loaded_at.elapsed()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub struct IdentifierIndex {
    fetch: Arc<dyn Fetch>,
    url: String,
    ttl: Duration,
    current: RwLock<Option<Arc<Snapshot>>>,
    refresh_gate: Mutex<()>,
    last_failure: parking_lot::Mutex<Option<Instant>>,
}

impl IdentifierIndex {
    pub fn new(fetch: Arc<dyn Fetch>, url: String, ttl: Duration) -> Self {
        Self {
            fetch,
            url,
            ttl,
            current: RwLock::new(None),
            refresh_gate: Mutex::new(()),
            last_failure: parking_lot::Mutex::new(None),
        }
    }

    /// Current snapshot, refreshing it first when older than the TTL
    pub async fn snapshot(&self) -> Result<Arc<Snapshot>> {
        let cached = self.current.read().clone();

        match cached {
            Some(snapshot) if snapshot.age() < self.ttl => Ok(snapshot),
            Some(stale) => {
                if self.failed_recently() {
                    debug!("Directory refresh failed recently, serving stale snapshot");
                    return Ok(stale);
                }
                let Ok(_guard) = self.refresh_gate.try_lock() else {
                    debug!("Directory refresh already in flight, serving stale snapshot");
                    return Ok(stale);
                };
                if let Some(fresh) = self.fresh_snapshot() {
                    return Ok(fresh);
                }
                match self.load().await {
                    Ok(snapshot) => Ok(snapshot),
                    Err(e) => {
                        *self.last_failure.lock() = Some(Instant::now());
                        warn!(
                            "Directory refresh failed, keeping previous snapshot for {:?}: {}",
                            REFRESH_RETRY_INTERVAL, e
                        );
                        Ok(stale)
                    }
                }
            }
            None => {
                let _guard = self.refresh_gate.lock().await;
                // Another caller may have completed the load while we waited
                if let Some(loaded) = self.current.read().clone() {
                    return Ok(loaded);
                }
                self.load().await
            }
        }
    }

    /// Unconditionally reload the directory
    pub async fn refresh(&self) -> Result<Arc<Snapshot>> {
        let _guard = self.refresh_gate.lock().await;
        self.load().await
    }

    fn failed_recently(&self) -> bool {
        self.last_failure
            .lock()
            .is_some_and(|at| at.elapsed() < REFRESH_RETRY_INTERVAL)
    }

    fn fresh_snapshot(&self) -> Option<Arc<Snapshot>> {
        self.current
            .read()
            .as_ref()
            .filter(|snapshot| snapshot.age() < self.ttl)
            .cloned()
    }

    async fn load(&self) -> Result<Arc<Snapshot>> {
        debug!("Loading entity directory from {}", self.url);
        let body = self.fetch.get_text(&self.url).await.map_err(|e| match e {
            FilingError::UpstreamUnavailable(_) => e,
            other => FilingError::UpstreamUnavailable(format!("entity directory: {}", other)),
        })?;

        let records = parse_directory(&body)?;
        let snapshot = Arc::new(Snapshot::new(records));
        *self.current.write() = Some(Arc::clone(&snapshot));
        *self.last_failure.lock() = None;

        info!("Loaded {} directory entries", snapshot.len());
        Ok(snapshot)
    }
}

/// Convert the keyed directory document into records, keeping the upstream order
pub fn parse_directory(body: &str) -> Result<Vec<IdentifierRecord>> {
    let entries: HashMap<String, CompanyTickerEntry> = serde_json::from_str(body)
        .map_err(|e| FilingError::UpstreamUnavailable(format!("malformed entity directory: {}", e)))?;

    let mut keyed: Vec<(u64, CompanyTickerEntry)> = entries
        .into_iter()
        .map(|(key, entry)| (key.parse().unwrap_or(u64::MAX), entry))
        .collect();
    keyed.sort_by_key(|(key, entry)| (*key, entry.cik_str));

    let records = keyed
        .into_iter()
        .filter_map(|(_, entry)| {
            let ticker = Some(entry.ticker.trim().to_uppercase()).filter(|t| !t.is_empty());
            let title = entry.title.trim();
            let display_name = match (&ticker, title.is_empty()) {
                (_, false) => title.to_string(),
                (Some(ticker), true) => ticker.clone(),
                (None, true) => return None,
            };
            Some(IdentifierRecord {
                ticker,
                display_name,
                registry_id: format!("{:0>10}", entry.cik_str),
            })
        })
        .collect();

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edgar::client::testing::StaticFetch;
    use async_trait::async_trait;
    use std::collections::VecDeque;

    const URL: &str = "https://www.sec.gov/files/company_tickers.json";
    const DIRECTORY: &str = r#"{
        "0": {"cik_str": 1045810, "ticker": "NVDA", "title": "NVIDIA CORP"},
        "1": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."},
        "2": {"cik_str": 1067983, "ticker": "BRK-B", "title": "BERKSHIRE HATHAWAY INC"},
        "3": {"cik_str": 1067983, "ticker": "BRK-A", "title": "BERKSHIRE HATHAWAY INC"},
        "4": {"cik_str": 99999, "ticker": "", "title": "Foreign Issuer PLC"},
        "5": {"cik_str": 88888, "ticker": "", "title": ""}
    }"#;

    fn index(fetch: Arc<StaticFetch>, ttl: Duration) -> IdentifierIndex {
        IdentifierIndex::new(fetch, URL.to_string(), ttl)
    }

    /// Replays scripted outcomes in order; an exhausted script is an outage
    struct ScriptedFetch {
        script: parking_lot::Mutex<VecDeque<(Duration, Result<String>)>>,
        calls: parking_lot::Mutex<usize>,
    }

    impl ScriptedFetch {
        fn new(script: Vec<(Duration, Result<String>)>) -> Self {
            Self {
                script: parking_lot::Mutex::new(script.into()),
                calls: parking_lot::Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock()
        }
    }

    #[async_trait]
    impl Fetch for ScriptedFetch {
        async fn get_text(&self, url: &str) -> Result<String> {
            *self.calls.lock() += 1;
            let next = self.script.lock().pop_front();
            match next {
                Some((delay, outcome)) => {
                    tokio::time::sleep(delay).await;
                    outcome
                }
                None => Err(FilingError::UpstreamUnavailable(format!("HTTP 503 for {}", url))),
            }
        }
    }

    fn scripted_index(fetch: Arc<ScriptedFetch>) -> IdentifierIndex {
        IdentifierIndex::new(fetch, URL.to_string(), Duration::from_secs(60))
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_serves_stale_snapshot() {
        let fetch = Arc::new(ScriptedFetch::new(vec![(Duration::ZERO, Ok(DIRECTORY.to_string()))]));
        let index = scripted_index(Arc::clone(&fetch));

        let first = index.snapshot().await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;

        for _ in 0..5 {
            let served = index.snapshot().await.unwrap();
            assert!(Arc::ptr_eq(&first, &served));
            assert_eq!(served.len(), 5);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_waits_before_retrying() {
        let fetch = Arc::new(ScriptedFetch::new(vec![(Duration::ZERO, Ok(DIRECTORY.to_string()))]));
        let index = scripted_index(Arc::clone(&fetch));

        index.snapshot().await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        for _ in 0..5 {
            index.snapshot().await.unwrap();
        }
        assert_eq!(fetch.calls(), 2);

        tokio::time::advance(REFRESH_RETRY_INTERVAL).await;
        index.snapshot().await.unwrap();
        assert_eq!(fetch.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_readers_do_not_wait_for_inflight_refresh() {
        let fetch = Arc::new(ScriptedFetch::new(vec![
            (Duration::ZERO, Ok(DIRECTORY.to_string())),
            (Duration::from_secs(10), Ok(DIRECTORY.to_string())),
        ]));
        let index = Arc::new(scripted_index(Arc::clone(&fetch)));

        let first = index.snapshot().await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;

        let refresher = {
            let index = Arc::clone(&index);
            tokio::spawn(async move { index.snapshot().await })
        };
        // Let the refresher take the gate and start its slow fetch
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(fetch.calls(), 2);

        let started = Instant::now();
        let served = index.snapshot().await.unwrap();
        assert!(Arc::ptr_eq(&first, &served));
        assert!(started.elapsed() < Duration::from_secs(1));

        let refreshed = refresher.await.unwrap().unwrap();
        assert!(!Arc::ptr_eq(&first, &refreshed));
        assert_eq!(fetch.calls(), 2);
    }

    #[test]
    fn test_parse_directory() {
        let records = parse_directory(DIRECTORY).unwrap();
        assert_eq!(records.len(), 5);
        assert_eq!(records[0].registry_id, "0001045810");
        assert_eq!(records[0].ticker.as_deref(), Some("NVDA"));
        assert_eq!(records[4].ticker, None);
        assert_eq!(records[4].display_name, "Foreign Issuer PLC");
    }

    #[test]
    fn test_lookup_prefers_first_listing() {
        let snapshot = Snapshot::new(parse_directory(DIRECTORY).unwrap());
        let record = snapshot.lookup("0001067983").unwrap();
        assert_eq!(record.ticker.as_deref(), Some("BRK-B"));
        assert!(snapshot.lookup("0000000001").is_none());
    }

    #[tokio::test]
    async fn test_snapshot_is_cached_within_ttl() {
        let fetch = Arc::new(StaticFetch::new().with(URL, DIRECTORY));
        let index = index(Arc::clone(&fetch), Duration::from_secs(3600));

        let first = index.snapshot().await.unwrap();
        let second = index.snapshot().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetch.request_count(URL), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_refreshes_after_ttl() {
        let fetch = Arc::new(StaticFetch::new().with(URL, DIRECTORY));
        let index = index(Arc::clone(&fetch), Duration::from_secs(60));

        let first = index.snapshot().await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        let second = index.snapshot().await.unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(fetch.request_count(URL), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_cold_callers_fetch_once() {
        let fetch = Arc::new(
            StaticFetch::new()
                .with(URL, DIRECTORY)
                .with_delay(URL, Duration::from_millis(500)),
        );
        let index = Arc::new(index(Arc::clone(&fetch), Duration::from_secs(3600)));

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let index = Arc::clone(&index);
                tokio::spawn(async move { index.snapshot().await.map(|s| s.len()) })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 5);
        }

        assert_eq!(fetch.request_count(URL), 1);
    }

    #[tokio::test]
    async fn test_cold_failure_is_fatal() {
        let fetch = Arc::new(StaticFetch::new().with_status(URL, 503));
        let index = index(fetch, Duration::from_secs(3600));

        let err = index.snapshot().await.unwrap_err();
        assert!(matches!(err, FilingError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_malformed_directory_is_upstream_error() {
        let fetch = Arc::new(StaticFetch::new().with(URL, "<html>maintenance</html>"));
        let index = index(fetch, Duration::from_secs(3600));

        assert!(matches!(
            index.refresh().await.unwrap_err(),
            FilingError::UpstreamUnavailable(_)
        ));
    }
}

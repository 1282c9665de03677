//! Debounced, cancellable search scheduling
//!
//! Every submitted query restarts a quiet period. When the period elapses
//! without further input, the latest query is scanned after an additional
//! deferral. A new submission cancels a scan that has been scheduled but not
//! delivered yet, so at most one result per burst of typing reaches the
//! receiver, and never a stale one.

use crate::cache::{SearchCache, SearchKey};
use crate::error::LectioError;
use crate::search::{normalize_query, SearchEngine, SearchFilters, SearchResults};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub const DEFAULT_QUIET_PERIOD_MS: u64 = 500;
pub const DEFAULT_SCAN_DELAY_MS: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerTiming {
    /// Input must be quiet this long before a scan is scheduled.
    pub quiet_period: Duration,
    /// Extra deferral between scheduling and running the scan.
    pub scan_delay: Duration,
}

impl Default for SchedulerTiming {
    fn default() -> Self {
        Self {
            quiet_period: Duration::from_millis(DEFAULT_QUIET_PERIOD_MS),
            scan_delay: Duration::from_millis(DEFAULT_SCAN_DELAY_MS),
        }
    }
}

#[derive(Debug)]
struct SearchRequest {
    generation: u64,
    query: String,
    filters: SearchFilters,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub generation: u64,
    pub results: Arc<SearchResults>,
}

/// Submits queries to a running scheduler. Cloneable; the scheduler stops
/// once every handle is dropped.
#[derive(Clone)]
pub struct SearchHandle {
    tx: mpsc::UnboundedSender<SearchRequest>,
    latest: Arc<AtomicU64>,
}

impl SearchHandle {
    /// Queue a query and return its generation number.
    pub fn submit(&self, query: &str, filters: SearchFilters) -> Result<u64, LectioError> {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        self.tx
            .send(SearchRequest {
                generation,
                query: query.to_string(),
                filters,
            })
            .map_err(|_| LectioError::Search("Search scheduler has stopped".to_string()))?;
        Ok(generation)
    }

    pub fn latest_generation(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }
}

pub struct SearchScheduler {
    engine: SearchEngine,
    cache: Arc<SearchCache>,
    timing: SchedulerTiming,
    latest: Arc<AtomicU64>,
    out: mpsc::UnboundedSender<SearchOutcome>,
}

impl SearchScheduler {
    /// Start the scheduler on the current tokio runtime.
    pub fn spawn(
        engine: SearchEngine,
        cache: Arc<SearchCache>,
        timing: SchedulerTiming,
    ) -> Result<(SearchHandle, mpsc::UnboundedReceiver<SearchOutcome>), LectioError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| LectioError::Other(format!("No tokio runtime for search scheduler: {}", e)))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let (out, outcomes) = mpsc::unbounded_channel();
        let latest = Arc::new(AtomicU64::new(0));

        let scheduler = Self {
            engine,
            cache,
            timing,
            latest: Arc::clone(&latest),
            out,
        };
        runtime.spawn(scheduler.run(rx));

        Ok((SearchHandle { tx, latest }, outcomes))
    }

    async fn run(self, mut rx: mpsc::UnboundedReceiver<SearchRequest>) {
        let mut pending: Option<SearchRequest> = None;
        let mut deadline: Option<Instant> = None;
        let mut in_flight: Option<JoinHandle<()>> = None;

        loop {
            let event = match deadline {
                Some(deadline_) => match tokio::time::timeout_at(deadline_, rx.recv()).await {
                    Ok(event) => event,
                    Err(_) => {
                        deadline = None;
                        if let Some(request) = pending.take() {
                            in_flight = Some(self.schedule_scan(request));
                        }
                        continue;
                    }
                },
                None => rx.recv().await,
            };

            let Some(request) = event else {
                break;
            };
            if let Some(scan) = in_flight.take() {
                scan.abort();
            }
            tracing::trace!(generation = request.generation, "Search input received");
            pending = Some(request);
            deadline = Some(Instant::now() + self.timing.quiet_period);
        }

        if let Some(scan) = in_flight.take() {
            scan.abort();
        }
        tracing::debug!("Search scheduler stopped");
    }

    fn schedule_scan(&self, request: SearchRequest) -> JoinHandle<()> {
        let engine = self.engine.clone();
        let cache = Arc::clone(&self.cache);
        let latest = Arc::clone(&self.latest);
        let out = self.out.clone();
        let scan_delay = self.timing.scan_delay;

        tokio::spawn(async move {
            tokio::time::sleep(scan_delay).await;

            let generation = request.generation;
            let scan = tokio::task::spawn_blocking(move || {
                let key = SearchKey::new(normalize_query(&request.query), &request.filters);
                cache.get_or_insert_with(key, || {
                    engine.search_filtered(&request.query, &request.filters)
                })
            })
            .await;

            match scan {
                Ok(results) => {
                    if latest.load(Ordering::SeqCst) != generation {
                        tracing::trace!(generation, "Dropping stale search results");
                        return;
                    }
                    let _ = out.send(SearchOutcome { generation, results });
                }
                Err(e) => tracing::warn!(generation, error = %e, "Search task failed"),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DEFAULT_CACHE_CAPACITY;
    use crate::corpus::Corpus;
    use crate::search::{SearchOptions, SearchStatus};
    use crate::verse::Verse;

    fn engine() -> SearchEngine {
        let verses = ["love", "lobe", "dove"]
            .iter()
            .enumerate()
            .map(|(i, text)| Verse {
                book_id: 1,
                chapter: 1,
                verse: i as u16 + 1,
                text: text.to_string(),
            })
            .collect();
        SearchEngine::new(
            Arc::new(Corpus::from_verses(verses).unwrap()),
            SearchOptions::default(),
        )
    }

    fn spawn() -> (SearchHandle, mpsc::UnboundedReceiver<SearchOutcome>) {
        SearchScheduler::spawn(
            engine(),
            Arc::new(SearchCache::new(DEFAULT_CACHE_CAPACITY)),
            SchedulerTiming::default(),
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_input_collapses_to_last_query() {
        let (handle, mut rx) = spawn();
        let start = Instant::now();

        handle.submit("lo", SearchFilters::default()).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.submit("lov", SearchFilters::default()).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let last = handle.submit("love", SearchFilters::default()).unwrap();
        assert_eq!(last, 3);

        let outcome = rx.recv().await.unwrap();
        assert_eq!(outcome.generation, 3);
        assert_eq!(outcome.results.query, "love");
        assert_eq!(outcome.results.status, SearchStatus::Ok);
        assert!(start.elapsed() >= Duration::from_millis(1200));

        let extra = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
        assert!(extra.is_err(), "only one outcome per burst");
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_input_cancels_deferred_scan() {
        let (handle, mut rx) = spawn();

        handle.submit("love", SearchFilters::default()).unwrap();
        // Past the quiet period, inside the scan deferral.
        tokio::time::sleep(Duration::from_millis(700)).await;
        handle.submit("lo?e", SearchFilters::default()).unwrap();

        let outcome = rx.recv().await.unwrap();
        assert_eq!(outcome.generation, 2);
        assert_eq!(outcome.results.query, "lo?e");
        assert_eq!(outcome.results.total_hits, 2);

        let extra = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
        assert!(extra.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_each_deliver() {
        let (handle, mut rx) = spawn();

        handle.submit("dove", SearchFilters::default()).unwrap();
        assert_eq!(rx.recv().await.unwrap().generation, 1);

        handle.submit("ab", SearchFilters::default()).unwrap();
        let outcome = rx.recv().await.unwrap();
        assert_eq!(outcome.generation, 2);
        assert_eq!(outcome.results.status, SearchStatus::TooShort);
        assert_eq!(handle.latest_generation(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handles_stops_scheduler() {
        let (handle, mut rx) = spawn();
        let clone = handle.clone();
        drop(handle);
        clone.submit("love", SearchFilters::default()).unwrap();
        drop(clone);
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_spawn_outside_runtime_fails() {
        let result = SearchScheduler::spawn(
            engine(),
            Arc::new(SearchCache::new(1)),
            SchedulerTiming::default(),
        );
        assert!(matches!(result, Err(LectioError::Other(_))));
    }
}

//! Application state management

use crate::cache::{SearchCache, SearchKey};
use crate::config::Config;
use crate::corpus::{CorpusSource, CorpusStore, StoreStatus};
use crate::error::{LectioError, LoadError};
use crate::navigator::Navigator;
use crate::scheduler::{SchedulerTiming, SearchHandle, SearchOutcome, SearchScheduler};
use crate::search::{normalize_query, SearchEngine, SearchFilters, SearchOptions, SearchResults};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Corpus store plus everything built on top of it
pub struct AppState {
    pub store: Arc<CorpusStore>,
    pub cache: Arc<SearchCache>,
    pub source: CorpusSource,
    pub search_options: SearchOptions,
    pub timing: SchedulerTiming,
}

impl AppState {
    /// State with an empty store; call [`AppState::load`] to populate it.
    pub fn new(config: &Config) -> Self {
        Self {
            store: Arc::new(CorpusStore::new()),
            cache: Arc::new(SearchCache::new(config.cache_capacity)),
            source: config.source.clone(),
            search_options: config.search.clone(),
            timing: config.timing,
        }
    }

    /// State around an already-populated store.
    pub fn with_store(store: CorpusStore, config: &Config) -> Self {
        Self {
            store: Arc::new(store),
            ..Self::new(config)
        }
    }

    /// The one load attempt for this process.
    pub async fn load(&self) -> Result<(), LoadError> {
        self.store.load(&self.source).await.map(|_| ())
    }

    pub fn status(&self) -> StoreStatus {
        self.store.status()
    }

    pub fn navigator(&self) -> Result<Navigator, LectioError> {
        Ok(Navigator::new(self.store.require()?))
    }

    pub fn search_engine(&self) -> Result<SearchEngine, LectioError> {
        Ok(SearchEngine::new(
            self.store.require()?,
            self.search_options.clone(),
        ))
    }

    /// Cached search; runs on the calling thread.
    pub fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Arc<SearchResults>, LectioError> {
        let engine = self.search_engine()?;
        let key = SearchKey::new(normalize_query(query), filters);
        Ok(self
            .cache
            .get_or_insert_with(key, || engine.search_filtered(query, filters)))
    }

    /// Debounced search stream for interactive input.
    pub fn spawn_scheduler(
        &self,
    ) -> Result<(SearchHandle, mpsc::UnboundedReceiver<SearchOutcome>), LectioError> {
        SearchScheduler::spawn(self.search_engine()?, Arc::clone(&self.cache), self.timing)
    }
}

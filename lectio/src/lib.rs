//! Lectio - verse corpus index, navigation and wildcard search
//!
//! Backend library for a browser-based reader of a 66-book verse corpus.

// Books and verses come first as everything else is keyed on them
pub mod books;
pub mod verse;
pub mod error;
pub mod corpus;
pub mod navigator;
pub mod pattern;
pub mod search;
pub mod cache;
pub mod scheduler;
pub mod config;
pub mod state;

pub use books::{book_name, Book, BOOKS, BOOK_COUNT};
pub use cache::{SearchCache, SearchKey};
pub use config::{get_data_dir, Config};
pub use corpus::{Corpus, CorpusSource, CorpusStore, StoreStatus};
pub use error::{LectioError, LoadError};
pub use navigator::Navigator;
pub use pattern::Pattern;
pub use scheduler::{SchedulerTiming, SearchHandle, SearchOutcome, SearchScheduler};
pub use search::{
    HighlightSpan, SearchEngine, SearchFilters, SearchOptions, SearchResult, SearchResults,
    SearchStatus,
};
pub use state::AppState;
pub use verse::{Verse, VerseKey};

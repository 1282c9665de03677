//! Free-text search over the corpus

use crate::books::book_name;
use crate::corpus::Corpus;
use crate::pattern::{fold, has_wildcard, Pattern};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;

pub const DEFAULT_MAX_RESULTS: usize = 100;
pub const DEFAULT_MIN_QUERY_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Queries shorter than this (in characters) are rejected unless they use a wildcard.
    pub min_query_len: usize,
    pub max_results: usize,
    pub highlight_open: String,
    pub highlight_close: String,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            min_query_len: DEFAULT_MIN_QUERY_LEN,
            max_results: DEFAULT_MAX_RESULTS,
            highlight_open: "<span class=\"highlight\">".to_string(),
            highlight_close: "</span>".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchFilters {
    pub book_ids: Option<Vec<u8>>,
}

impl SearchFilters {
    pub fn books(ids: impl IntoIterator<Item = u8>) -> Self {
        Self {
            book_ids: Some(ids.into_iter().collect()),
        }
    }

    /// An empty id list restricts nothing, same as no list at all.
    fn allows(&self, book_id: u8) -> bool {
        match &self.book_ids {
            Some(ids) if !ids.is_empty() => ids.contains(&book_id),
            _ => true,
        }
    }

    /// Sorted and deduplicated, so equivalent filters compare equal.
    pub fn canonical(&self) -> Self {
        Self {
            book_ids: self
                .book_ids
                .as_ref()
                .filter(|ids| !ids.is_empty())
                .map(|ids| {
                    let mut ids = ids.clone();
                    ids.sort_unstable();
                    ids.dedup();
                    ids
                }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    TooShort,
    Empty,
    Ok,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightSpan {
    pub start: usize,
    pub end: usize,
}

impl From<Range<usize>> for HighlightSpan {
    fn from(r: Range<usize>) -> Self {
        Self { start: r.start, end: r.end }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub book_id: u8,
    pub book_name: String,
    pub chapter: u16,
    pub verse: u16,
    pub text: String,
    /// `text` with every occurrence wrapped in the highlight markers.
    pub highlighted: String,
    /// Byte offsets into `text`.
    pub spans: Vec<HighlightSpan>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    pub query: String,
    pub status: SearchStatus,
    /// Number of results returned, after the cap.
    pub total_hits: usize,
    /// More verses matched than were returned.
    pub truncated: bool,
    pub results: Vec<SearchResult>,
    /// Duration of the scan that produced these results. A cached copy keeps
    /// the value from that first scan.
    pub elapsed_ms: u64,
}

impl SearchResults {
    fn too_short(query: String) -> Self {
        Self {
            query,
            status: SearchStatus::TooShort,
            total_hits: 0,
            truncated: false,
            results: Vec::new(),
            elapsed_ms: 0,
        }
    }
}

/// Trim, then lowercase one character at a time exactly as verse text is folded.
pub fn normalize_query(raw: &str) -> String {
    raw.trim().chars().map(fold).collect()
}

/// Whether a normalized query is long enough, or intentional enough, to scan for.
pub fn is_searchable(normalized: &str, min_len: usize) -> bool {
    normalized.chars().count() >= min_len || has_wildcard(normalized)
}

pub fn highlight(text: &str, spans: &[HighlightSpan], open: &str, close: &str) -> String {
    let mut out = String::with_capacity(text.len() + spans.len() * (open.len() + close.len()));
    let mut pos = 0;
    for span in spans {
        out.push_str(&text[pos..span.start]);
        out.push_str(open);
        out.push_str(&text[span.start..span.end]);
        out.push_str(close);
        pos = span.end;
    }
    out.push_str(&text[pos..]);
    out
}

#[derive(Clone)]
pub struct SearchEngine {
    corpus: Arc<Corpus>,
    options: SearchOptions,
}

impl SearchEngine {
    pub fn new(corpus: Arc<Corpus>, options: SearchOptions) -> Self {
        Self { corpus, options }
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn search(&self, raw_query: &str) -> SearchResults {
        self.search_filtered(raw_query, &SearchFilters::default())
    }

    /// Scan in corpus order and keep the first `max_results` hits.
    pub fn search_filtered(&self, raw_query: &str, filters: &SearchFilters) -> SearchResults {
        let start = Instant::now();
        let query = normalize_query(raw_query);

        if !is_searchable(&query, self.options.min_query_len) {
            return SearchResults::too_short(query);
        }

        let pattern = Pattern::compile(&query);
        let cap = self.options.max_results;

        let mut matched = self
            .corpus
            .verses()
            .iter()
            .filter(|v| filters.allows(v.book_id))
            .filter(|v| pattern.is_match(&v.text))
            .take(cap.saturating_add(1));

        let results: Vec<SearchResult> = matched
            .by_ref()
            .take(cap)
            .map(|v| {
                let spans: Vec<HighlightSpan> = pattern
                    .find_iter(&v.text)
                    .into_iter()
                    .filter(|r| !r.is_empty())
                    .map(HighlightSpan::from)
                    .collect();
                SearchResult {
                    book_id: v.book_id,
                    book_name: book_name(v.book_id).unwrap_or_default().to_string(),
                    chapter: v.chapter,
                    verse: v.verse,
                    highlighted: highlight(
                        &v.text,
                        &spans,
                        &self.options.highlight_open,
                        &self.options.highlight_close,
                    ),
                    text: v.text.clone(),
                    spans,
                }
            })
            .collect();
        let truncated = matched.next().is_some();

        let status = if results.is_empty() {
            SearchStatus::Empty
        } else {
            SearchStatus::Ok
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(query = %query, hits = results.len(), truncated, elapsed_ms, "Search finished");

        SearchResults {
            query,
            status,
            total_hits: results.len(),
            truncated,
            results,
            elapsed_ms,
        }
    }
}

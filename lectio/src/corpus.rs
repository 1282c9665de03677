//! Corpus loading and the load-once corpus store
//!
//! The corpus arrives as a single JSON export shaped like
//! `{ "resultset": { "row": [ { "field": [id, book, chapter, verse, text] } ] } }`.
//! It is validated once, indexed by key, and then shared read-only.

use crate::books::BOOK_COUNT;
use crate::error::{LectioError, LoadError};
use crate::verse::{Verse, VerseKey};
use anyhow::{bail, Context};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Instant;

#[derive(Debug, Deserialize)]
struct RawDocument {
    resultset: RawResultSet,
}

#[derive(Debug, Deserialize)]
struct RawResultSet {
    #[serde(default)]
    row: Vec<RawRow>,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    field: Vec<Value>,
}

impl RawRow {
    fn into_verse(self, row: usize) -> Result<Verse, LoadError> {
        let invalid = |reason: String| LoadError::Invalid { row, reason };

        let [_, book, chapter, verse, text]: [Value; 5] = self
            .field
            .try_into()
            .map_err(|f: Vec<Value>| invalid(format!("expected 5 fields, found {}", f.len())))?;

        let book_id = number_field(&book, "book id").map_err(&invalid)?;
        let chapter = number_field(&chapter, "chapter").map_err(&invalid)?;
        let verse = number_field(&verse, "verse").map_err(&invalid)?;
        let text = match text {
            Value::String(s) => s,
            other => return Err(invalid(format!("text is not a string: {}", other))),
        };

        if !(1..=BOOK_COUNT as u64).contains(&book_id) {
            return Err(invalid(format!("book id {} out of range 1..={}", book_id, BOOK_COUNT)));
        }
        let chapter = u16::try_from(chapter)
            .ok()
            .filter(|c| *c >= 1)
            .ok_or_else(|| invalid(format!("chapter {} out of range", chapter)))?;
        let verse = u16::try_from(verse)
            .ok()
            .filter(|v| *v >= 1)
            .ok_or_else(|| invalid(format!("verse {} out of range", verse)))?;

        Ok(Verse {
            book_id: book_id as u8,
            chapter,
            verse,
            text,
        })
    }
}

/// Numbers show up both as JSON integers and as integer strings in exports.
fn number_field(value: &Value, what: &str) -> Result<u64, String> {
    match value {
        Value::Number(n) => n.as_u64().ok_or_else(|| format!("{} is not a non-negative integer: {}", what, n)),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| format!("{} is not an integer: {:?}", what, s)),
        other => Err(format!("{} has unexpected type: {}", what, other)),
    }
}

/// The complete verse collection, in source order.
#[derive(Debug, Default)]
pub struct Corpus {
    verses: Vec<Verse>,
    index: HashMap<VerseKey, usize>,
}

impl Corpus {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from already-parsed verses, rejecting duplicate keys.
    pub fn from_verses(verses: Vec<Verse>) -> Result<Self, LoadError> {
        let mut index = HashMap::with_capacity(verses.len());
        for (row, verse) in verses.iter().enumerate() {
            if let Some(first) = index.insert(verse.key(), row) {
                return Err(LoadError::Invalid {
                    row,
                    reason: format!("duplicate of row {} ({})", first, verse.reference()),
                });
            }
        }
        Ok(Self { verses, index })
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, LoadError> {
        let doc: RawDocument =
            serde_json::from_slice(bytes).map_err(|e| LoadError::Parse(e.to_string()))?;
        let verses = doc
            .resultset
            .row
            .into_iter()
            .enumerate()
            .map(|(i, row)| row.into_verse(i))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_verses(verses)
    }

    pub fn from_json_str(json: &str) -> Result<Self, LoadError> {
        Self::from_json_slice(json.as_bytes())
    }

    pub fn verses(&self) -> &[Verse] {
        &self.verses
    }

    pub fn len(&self) -> usize {
        self.verses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verses.is_empty()
    }

    pub fn get(&self, key: &VerseKey) -> Option<&Verse> {
        self.index.get(key).map(|&i| &self.verses[i])
    }
}

/// Where the corpus document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorpusSource {
    Path(PathBuf),
    Url(String),
}

impl CorpusSource {
    /// `http://` and `https://` locations are URLs, anything else is a file path.
    pub fn parse(location: &str) -> Self {
        let trimmed = location.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            CorpusSource::Url(trimmed.to_string())
        } else {
            CorpusSource::Path(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for CorpusSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorpusSource::Path(p) => write!(f, "{}", p.display()),
            CorpusSource::Url(u) => f.write_str(u),
        }
    }
}

async fn read_path(path: &Path) -> Result<Vec<u8>, LoadError> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read corpus at {}", path.display()))
        .map_err(|e| LoadError::Io(format!("{:#}", e)))
}

async fn fetch_bytes(url: &str) -> anyhow::Result<Vec<u8>> {
    let response = reqwest::Client::new()
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch {}", url))?;

    if !response.status().is_success() {
        bail!("Failed to fetch {}: HTTP {}", url, response.status());
    }

    let bytes = response
        .bytes()
        .await
        .with_context(|| format!("Failed to read body of {}", url))?;
    Ok(bytes.to_vec())
}

async fn fetch_url(url: &str) -> Result<Vec<u8>, LoadError> {
    fetch_bytes(url)
        .await
        .map_err(|e| LoadError::Network(format!("{:#}", e)))
}

/// Single attempt: read or fetch the document, then parse and validate it.
pub async fn load(source: &CorpusSource) -> Result<Corpus, LoadError> {
    let bytes = match source {
        CorpusSource::Path(path) => read_path(path).await?,
        CorpusSource::Url(url) => fetch_url(url).await?,
    };
    Corpus::from_json_slice(&bytes)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Loading,
    Ready,
    Failed,
}

enum LoadState {
    Pending,
    Ready(Arc<Corpus>),
    Failed(LoadError),
}

/// Holds the corpus for the process lifetime.
///
/// Starts empty and is populated by exactly one load attempt. A failed load is
/// remembered and returned to later callers instead of retrying.
pub struct CorpusStore {
    state: RwLock<LoadState>,
    load_lock: tokio::sync::Mutex<()>,
}

impl Default for CorpusStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CorpusStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LoadState::Pending),
            load_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// A store that is already populated, for fixtures and embedding.
    pub fn ready(corpus: Corpus) -> Self {
        Self {
            state: RwLock::new(LoadState::Ready(Arc::new(corpus))),
            load_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub async fn load(&self, source: &CorpusSource) -> Result<Arc<Corpus>, LoadError> {
        let _guard = self.load_lock.lock().await;

        if let Some(settled) = self.settled() {
            return settled;
        }

        let start = Instant::now();
        tracing::info!(%source, "Loading corpus");
        let result = load(source).await.map(Arc::new);
        let next = match &result {
            Ok(corpus) => {
                tracing::info!(
                    %source,
                    verses = corpus.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Corpus loaded"
                );
                LoadState::Ready(Arc::clone(corpus))
            }
            Err(e) => {
                tracing::error!(%source, error = %e, "Corpus load failed");
                LoadState::Failed(e.clone())
            }
        };

        *self.state.write().unwrap_or_else(|e| e.into_inner()) = next;
        result
    }

    fn settled(&self) -> Option<Result<Arc<Corpus>, LoadError>> {
        match &*self.state.read().unwrap_or_else(|e| e.into_inner()) {
            LoadState::Pending => None,
            LoadState::Ready(corpus) => Some(Ok(Arc::clone(corpus))),
            LoadState::Failed(e) => Some(Err(e.clone())),
        }
    }

    pub fn get(&self) -> Option<Arc<Corpus>> {
        self.settled().and_then(Result::ok)
    }

    /// The loaded corpus, or the reason it is unavailable.
    pub fn require(&self) -> Result<Arc<Corpus>, LectioError> {
        match self.settled() {
            Some(Ok(corpus)) => Ok(corpus),
            Some(Err(e)) => Err(LectioError::LoadFailed(e)),
            None => Err(LectioError::CorpusNotReady(
                "Corpus is still loading.".to_string(),
            )),
        }
    }

    pub fn status(&self) -> StoreStatus {
        match self.settled() {
            None => StoreStatus::Loading,
            Some(Ok(_)) => StoreStatus::Ready,
            Some(Err(_)) => StoreStatus::Failed,
        }
    }

    pub fn failure(&self) -> Option<LoadError> {
        self.settled().and_then(Result::err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves every connection on a local port with one canned response.
    async fn serve(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{}/kjv.json", addr)
    }

    const SAMPLE: &str = r#"{
        "resultset": { "row": [
            { "field": [1001001, 1, 1, 1, "In the beginning God created the heaven and the earth."] },
            { "field": [1001002, 1, 1, 2, "And the earth was without form, and void."] },
            { "field": ["43011035", "43", "11", "35", "Jesus wept."] }
        ] }
    }"#;

    #[test]
    fn test_parse_rows() {
        let corpus = Corpus::from_json_str(SAMPLE).unwrap();
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.verses()[0].book_id, 1);
        assert_eq!(corpus.verses()[1].verse, 2);
        let wept = corpus.get(&VerseKey::new(43, 11, 35)).unwrap();
        assert_eq!(wept.text, "Jesus wept.");
        assert!(corpus.get(&VerseKey::new(43, 11, 36)).is_none());
    }

    #[test]
    fn test_empty_row_list() {
        let corpus = Corpus::from_json_str(r#"{"resultset": {"row": []}}"#).unwrap();
        assert!(corpus.is_empty());
        let corpus = Corpus::from_json_str(r#"{"resultset": {}}"#).unwrap();
        assert!(corpus.is_empty());
    }

    #[test]
    fn test_malformed_json() {
        let err = Corpus::from_json_str("{\"resultset\": ").unwrap_err();
        assert!(matches!(err, LoadError::Parse(_)));
        let err = Corpus::from_json_str(r#"{"rows": []}"#).unwrap_err();
        assert!(matches!(err, LoadError::Parse(_)));
    }

    #[test]
    fn test_invalid_rows() {
        let short = r#"{"resultset": {"row": [{"field": [1, 1, 1, "x"]}]}}"#;
        assert!(matches!(
            Corpus::from_json_str(short),
            Err(LoadError::Invalid { row: 0, .. })
        ));

        let bad_book = r#"{"resultset": {"row": [
            {"field": [1, 1, 1, 1, "ok"]},
            {"field": [2, 67, 1, 1, "no such book"]}
        ]}}"#;
        assert!(matches!(
            Corpus::from_json_str(bad_book),
            Err(LoadError::Invalid { row: 1, .. })
        ));

        let zero_chapter = r#"{"resultset": {"row": [{"field": [1, 1, 0, 1, "x"]}]}}"#;
        assert!(Corpus::from_json_str(zero_chapter).is_err());
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let dup = r#"{"resultset": {"row": [
            {"field": [1, 1, 1, 1, "first"]},
            {"field": [2, 1, 1, 1, "again"]}
        ]}}"#;
        match Corpus::from_json_str(dup) {
            Err(LoadError::Invalid { row, reason }) => {
                assert_eq!(row, 1);
                assert!(reason.contains("Genesis 1:1"));
            }
            other => panic!("expected duplicate error, got {:?}", other),
        }
    }

    #[test]
    fn test_source_parse() {
        assert_eq!(
            CorpusSource::parse("https://example.org/kjv.json"),
            CorpusSource::Url("https://example.org/kjv.json".to_string())
        );
        assert_eq!(
            CorpusSource::parse("data/kjv.json"),
            CorpusSource::Path(PathBuf::from("data/kjv.json"))
        );
    }

    #[tokio::test]
    async fn test_store_loads_once_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let source = CorpusSource::Path(file.path().to_path_buf());

        let store = CorpusStore::new();
        assert_eq!(store.status(), StoreStatus::Loading);
        assert!(matches!(store.require(), Err(LectioError::CorpusNotReady(_))));

        let first = store.load(&source).await.unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(store.status(), StoreStatus::Ready);

        // The file going away does not matter once loaded.
        drop(file);
        let second = store.load(&source).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_failed_load_is_permanent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kjv.json");
        let source = CorpusSource::Path(path.clone());

        let store = CorpusStore::new();
        let err = store.load(&source).await.unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
        assert_eq!(store.status(), StoreStatus::Failed);
        assert!(store.get().is_none());

        // Even once the file exists, no second attempt is made.
        std::fs::write(&path, SAMPLE).unwrap();
        assert_eq!(store.load(&source).await.unwrap_err(), err);
        assert!(matches!(store.require(), Err(LectioError::LoadFailed(_))));
        assert_eq!(store.failure(), Some(err));
    }

    #[tokio::test]
    async fn test_url_not_found_fails_permanently() {
        let url = serve("404 Not Found", "").await;
        let source = CorpusSource::parse(&url);
        assert!(matches!(source, CorpusSource::Url(_)));

        let store = CorpusStore::new();
        let err = store.load(&source).await.unwrap_err();
        match &err {
            LoadError::Network(message) => {
                assert!(message.contains("404"));
                assert!(message.contains(&url));
            }
            other => panic!("expected network error, got {:?}", other),
        }
        assert_eq!(store.status(), StoreStatus::Failed);
        assert_eq!(store.load(&source).await.unwrap_err(), err);
        assert!(matches!(store.require(), Err(LectioError::LoadFailed(_))));
    }

    #[tokio::test]
    async fn test_load_from_url() {
        let url = serve("200 OK", SAMPLE).await;
        let store = CorpusStore::new();
        let corpus = store.load(&CorpusSource::Url(url)).await.unwrap();
        assert_eq!(corpus.len(), 3);
        assert_eq!(store.status(), StoreStatus::Ready);
    }

    #[tokio::test]
    async fn test_missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        match load(&CorpusSource::Path(path.clone())).await {
            Err(LoadError::Io(message)) => {
                assert!(message.contains(&path.display().to_string()));
            }
            other => panic!("expected io error, got {:?}", other.map(|c| c.len())),
        }
    }
}

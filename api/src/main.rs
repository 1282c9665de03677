mod error;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use error::ApiError;
use lectio_lib::{
    AppState, Book, Config, LectioError, SearchFilters, SearchResults, StoreStatus, Verse, VerseKey,
    BOOKS,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

type SharedState = Arc<AppState>;

// === Request/Response types ===

#[derive(Deserialize)]
struct SearchQuery {
    q: String,
    book_ids: Option<String>,
}

#[derive(Deserialize)]
struct VerseQuery {
    book: String,
    chapter: u16,
    verse: u16,
}

#[derive(Serialize)]
struct HealthResponse {
    status: StoreStatus,
    verses: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct VerseResponse {
    #[serde(flatten)]
    verse: Verse,
    book_name: &'static str,
    reference: String,
    citation: String,
}

#[derive(Debug, Serialize)]
struct CacheStatsResponse {
    entries: usize,
    capacity: usize,
}

fn resolve_book(id_or_name: &str) -> Result<&'static Book, LectioError> {
    Book::resolve(id_or_name)
        .ok_or_else(|| LectioError::NotFound(format!("Unknown book: {}", id_or_name)))
}

/// Comma-separated ids or names; blank entries are ignored and a list with
/// no entries at all means no book filter.
fn parse_book_ids(raw: &str) -> Result<Option<Vec<u8>>, LectioError> {
    let ids = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Book::resolve(s)
                .map(|b| b.id)
                .ok_or_else(|| LectioError::InvalidQuery(format!("Unknown book in book_ids: {}", s)))
        })
        .collect::<Result<Vec<u8>, _>>()?;
    Ok((!ids.is_empty()).then_some(ids))
}

// === Handlers ===

async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: state.status(),
        verses: state.store.get().map(|c| c.len()).unwrap_or(0),
        error: state.store.failure().map(|e| e.to_string()),
    })
}

async fn list_books() -> Json<Vec<Book>> {
    Json(BOOKS.to_vec())
}

async fn get_chapters(
    State(state): State<SharedState>,
    Path(book): Path<String>,
) -> Result<Json<Vec<u16>>, ApiError> {
    let book = resolve_book(&book)?;
    let navigator = state.navigator()?;
    Ok(Json(navigator.chapters_of(book.id)))
}

async fn get_verses(
    State(state): State<SharedState>,
    Path((book, chapter)): Path<(String, u16)>,
) -> Result<Json<Vec<Verse>>, ApiError> {
    let book = resolve_book(&book)?;
    let navigator = state.navigator()?;
    let verses = navigator
        .verses_of(book.id, chapter)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(verses))
}

async fn get_verse(
    State(state): State<SharedState>,
    Query(params): Query<VerseQuery>,
) -> Result<Json<VerseResponse>, ApiError> {
    let book = resolve_book(&params.book)?;
    let navigator = state.navigator()?;
    let key = VerseKey::new(book.id, params.chapter, params.verse);
    let verse = navigator.verse(&key).ok_or_else(|| {
        LectioError::NotFound(format!("No verse {} {}:{}", book.name, params.chapter, params.verse))
    })?;

    Ok(Json(VerseResponse {
        book_name: book.name,
        reference: verse.reference(),
        citation: verse.citation(),
        verse: verse.clone(),
    }))
}

async fn search(
    State(state): State<SharedState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResults>, ApiError> {
    let filters = SearchFilters {
        book_ids: match params.book_ids.as_deref() {
            Some(raw) => parse_book_ids(raw)?,
            None => None,
        },
    };

    // Run the scan on the blocking pool to keep the runtime responsive
    let results = tokio::task::spawn_blocking(move || state.search(&params.q, &filters))
        .await
        .map_err(|e| ApiError::internal(format!("Task join error: {}", e)))??;

    Ok(Json((*results).clone()))
}

async fn cache_stats(State(state): State<SharedState>) -> Json<CacheStatsResponse> {
    let (entries, capacity) = state.cache.stats();
    Json(CacheStatsResponse { entries, capacity })
}

async fn clear_cache(State(state): State<SharedState>) -> Json<CacheStatsResponse> {
    state.cache.clear();
    cache_stats(State(state)).await
}

fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/books", get(list_books))
        .route("/books/:book/chapters", get(get_chapters))
        .route("/books/:book/chapters/:chapter/verses", get(get_verses))
        .route("/verse", get(get_verse))
        .route("/search", get(search))
        .route("/cache/stats", get(cache_stats))
        .route("/cache/clear", post(clear_cache))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let state: SharedState = Arc::new(AppState::new(&config));

    // Serve immediately; search reports "not ready" until the corpus is in.
    let loader = Arc::clone(&state);
    tokio::spawn(async move {
        if loader.load().await.is_err() {
            tracing::warn!("Search and navigation are unavailable until restart");
        }
    });

    let app = build_router(state);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Listening on http://{}", config.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

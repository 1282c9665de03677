//! Runtime configuration
//!
//! Everything has a default; `LECTIO_*` environment variables override them.

use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::corpus::CorpusSource;
use crate::error::LectioError;
use crate::scheduler::SchedulerTiming;
use crate::search::SearchOptions;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const CORPUS_FILE_NAME: &str = "kjv.json";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub source: CorpusSource,
    pub bind_addr: SocketAddr,
    pub search: SearchOptions,
    pub cache_capacity: usize,
    pub timing: SchedulerTiming,
}

impl Config {
    pub fn from_env() -> Result<Self, LectioError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LectioError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = match lookup("LECTIO_DATA") {
            Some(location) if !location.trim().is_empty() => CorpusSource::parse(&location),
            _ => CorpusSource::Path(get_data_dir().join(CORPUS_FILE_NAME)),
        };

        let bind_addr: SocketAddr = match parse_var(&lookup, "LECTIO_BIND")? {
            Some(addr) => addr,
            None => DEFAULT_BIND_ADDR.parse().map_err(|e| {
                LectioError::Other(format!("Invalid default bind address {}: {}", DEFAULT_BIND_ADDR, e))
            })?,
        };

        let defaults = SearchOptions::default();
        let search = SearchOptions {
            max_results: parse_var(&lookup, "LECTIO_MAX_RESULTS")?.unwrap_or(defaults.max_results),
            min_query_len: parse_var(&lookup, "LECTIO_MIN_QUERY_LEN")?
                .unwrap_or(defaults.min_query_len),
            ..defaults
        };

        let cache_capacity =
            parse_var(&lookup, "LECTIO_CACHE_CAPACITY")?.unwrap_or(DEFAULT_CACHE_CAPACITY);

        let default_timing = SchedulerTiming::default();
        let timing = SchedulerTiming {
            quiet_period: parse_var(&lookup, "LECTIO_DEBOUNCE_MS")?
                .map(Duration::from_millis)
                .unwrap_or(default_timing.quiet_period),
            scan_delay: parse_var(&lookup, "LECTIO_SCAN_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(default_timing.scan_delay),
        };

        Ok(Self {
            source,
            bind_addr,
            search,
            cache_capacity,
            timing,
        })
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, LectioError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| LectioError::Other(format!("Invalid {}={:?}: {}", key, raw, e))),
    }
}

/// Get the data directory
///
/// - Development: `data/` in the working directory or a few levels above the executable
/// - Otherwise: `data/` next to the executable, then the platform data dir
pub fn get_data_dir() -> PathBuf {
    let dev_paths = [PathBuf::from("data"), PathBuf::from("../data")];
    for path in &dev_paths {
        if path.join(CORPUS_FILE_NAME).exists() {
            return path.canonicalize().unwrap_or_else(|_| path.clone());
        }
    }

    if let Ok(exe_path) = std::env::current_exe() {
        // Walk up from target/debug to find the project root
        let mut current = exe_path.parent();
        for _ in 0..5 {
            let Some(dir) = current else { break };
            let data_path = dir.join("data");
            if data_path.join(CORPUS_FILE_NAME).exists() {
                return data_path;
            }
            current = dir.parent();
        }
    }

    if let Some(data_dir) = dirs::data_dir() {
        let platform = data_dir.join("Lectio");
        if platform.join(CORPUS_FILE_NAME).exists() {
            return platform;
        }
    }

    // Fallback to current working directory
    PathBuf::from("data")
}

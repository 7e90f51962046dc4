//! TTL-cached table fetching.
//!
//! Wraps a [`TableSource`] with a time-to-live cache and transparent retry
//! logic. Callers use [`TableCache::get`] to obtain a fresh-or-cached
//! [`RawTable`]; the cache handles staleness checks, up to three fetch
//! attempts with back-off, and graceful fallback to the previous snapshot
//! on transient failure.

use std::thread;
use std::time::{Duration, Instant};

use viewstats_core::models::RawTable;

use crate::source::TableSource;

/// Maximum number of fetch attempts before giving up and returning stale
/// data.
const MAX_RETRY_ATTEMPTS: u32 = 3;

// ── TableCache ────────────────────────────────────────────────────────────────

/// TTL-cached wrapper around a [`TableSource`].
pub struct TableCache<S: TableSource> {
    source: S,
    /// Maximum age of a cached snapshot before it is considered stale.
    cache_ttl: Duration,
    /// Most recently fetched snapshot.
    cache: Option<RawTable>,
    /// When the cache was last populated.
    cache_timestamp: Option<Instant>,
    /// Human-readable description of the last error encountered.
    last_error: Option<String>,
}

impl<S: TableSource> TableCache<S> {
    /// Create a cache over `source` with the given TTL.
    pub fn new(source: S, cache_ttl_secs: u64) -> Self {
        Self {
            source,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            cache: None,
            cache_timestamp: None,
            last_error: None,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Return the current table, using the cache when it is still valid.
    ///
    /// When `force_refresh` is `true` the cache is bypassed and a fresh
    /// fetch is always attempted. On fetch failure the previous snapshot
    /// (if any) is returned as a best-effort fallback.
    pub fn get(&mut self, force_refresh: bool) -> Option<&RawTable> {
        if !force_refresh && self.is_cache_valid() {
            tracing::debug!("returning cached table snapshot");
            return self.cache.as_ref();
        }

        match self.fetch_with_retry() {
            Ok(table) => {
                tracing::debug!(
                    rows = table.rows.len(),
                    columns = table.column_count(),
                    "table cache updated"
                );
                self.cache = Some(table);
                self.cache_timestamp = Some(Instant::now());
                self.last_error = None;
                self.cache.as_ref()
            }
            Err(e) => {
                tracing::warn!(error = %e, "fetch failed; falling back to cached snapshot");
                self.last_error = Some(e);
                // Return whatever we have, even if stale.
                self.cache.as_ref()
            }
        }
    }

    /// Discard the current cache, forcing the next [`get`](Self::get) call
    /// to fetch.
    pub fn invalidate(&mut self) {
        self.cache = None;
        self.cache_timestamp = None;
        tracing::debug!("table cache invalidated");
    }

    /// Age of the current cache entry, or `None` if nothing has been
    /// fetched yet.
    pub fn cache_age(&self) -> Option<Duration> {
        self.cache_timestamp.map(|ts| ts.elapsed())
    }

    /// Human-readable description of the last fetch error, or `None`.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Where the underlying source reads from.
    pub fn describe_source(&self) -> String {
        self.source.describe()
    }

    // ── Private helpers ───────────────────────────────────────────────────

    /// `true` when the cache holds a snapshot still within its TTL.
    fn is_cache_valid(&self) -> bool {
        match (self.cache.as_ref(), self.cache_timestamp) {
            (Some(_), Some(ts)) => ts.elapsed() < self.cache_ttl,
            _ => false,
        }
    }

    /// Attempt up to [`MAX_RETRY_ATTEMPTS`] fetches with back-off.
    ///
    /// Back-off schedule: attempt 1 → 0 ms, attempt 2 → 100 ms,
    /// attempt 3 → 200 ms.
    fn fetch_with_retry(&mut self) -> Result<RawTable, String> {
        let mut last_err = String::new();

        for attempt in 0..MAX_RETRY_ATTEMPTS {
            if attempt > 0 {
                let sleep_ms = u64::from(attempt) * 100;
                tracing::debug!(attempt, sleep_ms, "retrying fetch after back-off");
                thread::sleep(Duration::from_millis(sleep_ms));
            }

            match self.source.fetch() {
                Ok(table) => return Ok(table),
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "fetch attempt failed");
                    last_err = e.to_string();
                }
            }
        }

        Err(last_err)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

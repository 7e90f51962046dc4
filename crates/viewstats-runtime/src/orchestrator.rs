//! Async refresh orchestrator.
//!
//! Coordinates the table cache and the analysis pipeline in a tokio task,
//! sending periodic [`Snapshot`] values through an `mpsc` channel so a
//! presentation layer can consume them without any shared mutable state.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time;

use viewstats_core::query::Query;
use viewstats_data::analysis::{analyze_table, AnalysisResult};

use crate::source::TableSource;
use crate::table_cache::TableCache;

// ── Public types ──────────────────────────────────────────────────────────────

/// One refresh result forwarded to the presentation layer.
///
/// This is the primary data contract between the background runtime and
/// whatever renders the tables.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Full analysis result for the configured query.
    pub analysis: AnalysisResult,
    /// Where the underlying table came from.
    pub source: String,
    /// Error text when this refresh served stale or no data.
    pub fetch_error: Option<String>,
}

// ── RefreshOrchestrator ───────────────────────────────────────────────────────

/// Background refresh coordinator.
///
/// Call [`RefreshOrchestrator::start`] to spin up the refresh loop in a
/// dedicated tokio task and receive a channel endpoint for [`Snapshot`]
/// updates.
pub struct RefreshOrchestrator<S: TableSource + 'static> {
    cache: TableCache<S>,
    /// How often to re-run the pipeline.
    refresh_interval: Duration,
    /// The query every refresh is aggregated under.
    query: Query,
}

impl<S: TableSource + 'static> RefreshOrchestrator<S> {
    /// Create a new orchestrator.
    ///
    /// # Parameters
    /// - `cache`                – TTL cache over the table source.
    /// - `refresh_interval_secs` – seconds between refreshes.
    /// - `query`               – date range and channel filter to apply.
    pub fn new(cache: TableCache<S>, refresh_interval_secs: u64, query: Query) -> Self {
        Self {
            cache,
            refresh_interval: Duration::from_secs(refresh_interval_secs),
            query,
        }
    }

    /// Start the refresh loop.
    ///
    /// Spawns a tokio task that runs the loop. Returns:
    /// - An `mpsc::Receiver<Snapshot>` for the caller to poll.
    /// - A [`RefreshHandle`] that can be used to abort the loop.
    pub fn start(self) -> (mpsc::Receiver<Snapshot>, RefreshHandle) {
        // Buffer a modest number of snapshots so slow consumers don't
        // stall the loop.
        let (tx, rx) = mpsc::channel(16);

        let handle = tokio::spawn(async move {
            self.refresh_loop(tx).await;
        });

        (rx, RefreshHandle { handle })
    }

    // ── Private implementation ────────────────────────────────────────────

    /// The main refresh loop.
    ///
    /// Performs an immediate fetch on startup, then repeats on
    /// `refresh_interval`. The loop exits when the receiver side of the
    /// channel is closed.
    async fn refresh_loop(mut self, tx: mpsc::Sender<Snapshot>) {
        // Initial fetch (force refresh to populate immediately).
        self.fetch_and_send(&tx, true).await;

        let mut interval = time::interval(self.refresh_interval);
        // Consume the first tick which fires immediately; we already
        // fetched above.
        interval.tick().await;

        loop {
            interval.tick().await;

            if tx.is_closed() {
                tracing::debug!("snapshot channel closed; exiting refresh loop");
                break;
            }

            self.fetch_and_send(&tx, false).await;
        }
    }

    /// Fetch, analyze and send one [`Snapshot`] to the channel.
    async fn fetch_and_send(&mut self, tx: &mpsc::Sender<Snapshot>, force: bool) {
        let table = match self.cache.get(force) {
            Some(t) => t.clone(),
            None => {
                tracing::warn!("no table snapshot available; skipping send");
                return;
            }
        };
        let fetch_error = self.cache.last_error().map(str::to_string);

        let analysis = match analyze_table(&table, &self.query) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, "analysis failed; skipping send");
                return;
            }
        };

        let snapshot = Snapshot {
            analysis,
            source: self.cache.describe_source(),
            fetch_error,
        };

        if let Err(e) = tx.send(snapshot).await {
            tracing::warn!(error = %e, "failed to send snapshot; receiver dropped");
        }
    }
}

// ── RefreshHandle ─────────────────────────────────────────────────────────────

/// A handle to the background refresh task.
///
/// Drop the receiver or call [`RefreshHandle::abort`] to stop the loop.
pub struct RefreshHandle {
    handle: tokio::task::JoinHandle<()>,
}

impl RefreshHandle {
    /// Immediately abort the refresh loop.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

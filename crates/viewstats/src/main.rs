mod bootstrap;
mod render;

use anyhow::Result;
use chrono::NaiveDate;
use tokio::sync::mpsc;

use viewstats_core::query::{ChannelFilter, DateRange, Query, ViewMode};
use viewstats_core::settings::Settings;
use viewstats_data::analysis::analyze_table;
use viewstats_runtime::orchestrator::{RefreshOrchestrator, Snapshot};
use viewstats_runtime::source::CsvFileSource;
use viewstats_runtime::table_cache::TableCache;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_saved_query();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("viewstats v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Input: {}, View: {}, Channel: {}",
        settings.input.display(),
        settings.view,
        settings.channel.as_deref().unwrap_or("(all)")
    );

    let view = ViewMode::from_cli(&settings.view)?;
    let query = build_query(&settings)?;

    let source = CsvFileSource::new(&settings.input);
    let mut cache = TableCache::new(source, settings.cache_ttl_secs);

    if settings.watch {
        tracing::info!(
            "Watching {} every {}s...",
            settings.input.display(),
            settings.refresh_secs
        );

        let orchestrator = RefreshOrchestrator::new(cache, settings.refresh_secs, query);
        let (rx, handle) = orchestrator.start();

        // Render each snapshot until Ctrl+C. Signals received while the
        // watch loop is idle are handled cleanly by the select below.
        tokio::select! {
            _ = watch_loop(rx, view) => {
                handle.abort();
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received; stopping watch");
                handle.abort();
            }
        }
    } else {
        let table = cache.get(false).cloned();
        let Some(table) = table else {
            anyhow::bail!(
                "could not load table from {}: {}",
                settings.input.display(),
                cache.last_error().unwrap_or("unknown error")
            );
        };

        let analysis = analyze_table(&table, &query)?;
        print!("{}", render::render_report(&analysis, view));
    }

    Ok(())
}

/// Build the aggregation query from CLI settings.
///
/// Missing dates default to an open range; the pipeline's date span tells
/// the user what the data actually covers.
fn build_query(settings: &Settings) -> Result<Query> {
    let range = DateRange::new(
        settings.start_date.unwrap_or(NaiveDate::MIN),
        settings.end_date.unwrap_or(NaiveDate::MAX),
    )?;
    let channel = settings
        .channel
        .clone()
        .map_or(ChannelFilter::All, ChannelFilter::Only);
    Ok(Query::new(range, channel))
}

/// Render every snapshot the orchestrator delivers.
async fn watch_loop(mut rx: mpsc::Receiver<Snapshot>, view: ViewMode) {
    while let Some(snapshot) = rx.recv().await {
        if let Some(error) = &snapshot.fetch_error {
            tracing::warn!("showing stale data: {}", error);
        }
        println!(
            "── {} ── {}",
            snapshot.analysis.metadata.generated_at, snapshot.source
        );
        print!("{}", render::render_report(&snapshot.analysis, view));
        println!();
    }
}

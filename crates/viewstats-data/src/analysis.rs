//! Full normalize-and-aggregate pipeline.
//!
//! One call per request: normalize the current table snapshot, derive the
//! channel list and sample date span (the bounds a date picker would use),
//! aggregate under the query, and report timing/count metadata.

use chrono::{NaiveDate, Utc};

use viewstats_core::error::Result;
use viewstats_core::models::{RawTable, Sample};
use viewstats_core::query::Query;

use crate::aggregator::{aggregate, AggregateReport};
use crate::normalizer::normalize;

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside the derived tables.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AnalysisMetadata {
    /// ISO-8601 timestamp when this result was generated.
    pub generated_at: String,
    /// Number of data rows in the raw table.
    pub rows_in: usize,
    /// Samples surviving normalization.
    pub samples: usize,
    /// Samples passing the query's date/channel filter.
    pub samples_in_range: usize,
    /// Distinct channels across all samples (unfiltered).
    pub channels: usize,
    /// Wall-clock seconds spent normalizing.
    pub normalize_time_seconds: f64,
    /// Wall-clock seconds spent aggregating.
    pub aggregate_time_seconds: f64,
}

/// The complete output of [`analyze_table`].
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// The three derived tables for the query.
    pub report: AggregateReport,
    /// Sorted distinct channel names across all samples (the channel
    /// selector's option list).
    pub channels: Vec<String>,
    /// Earliest and latest sample dates, or `None` for an empty dataset.
    pub date_span: Option<(NaiveDate, NaiveDate)>,
    /// Metadata about this analysis run.
    pub metadata: AnalysisMetadata,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the full pipeline against one raw table snapshot.
///
/// Fails only on a schema error from the normalizer; empty data flows
/// through to well-defined empty tables.
pub fn analyze_table(table: &RawTable, query: &Query) -> Result<AnalysisResult> {
    let normalize_start = std::time::Instant::now();
    let samples = normalize(table)?;
    let normalize_time = normalize_start.elapsed().as_secs_f64();

    let channels = channel_names(&samples);
    let date_span = date_span(&samples);

    let aggregate_start = std::time::Instant::now();
    let report = aggregate(&samples, query);
    let aggregate_time = aggregate_start.elapsed().as_secs_f64();

    let samples_in_range = samples
        .iter()
        .filter(|s| query.range.contains(s.date()) && query.channel.matches(&s.channel))
        .count();

    let metadata = AnalysisMetadata {
        generated_at: Utc::now().to_rfc3339(),
        rows_in: table.rows.len(),
        samples: samples.len(),
        samples_in_range,
        channels: channels.len(),
        normalize_time_seconds: normalize_time,
        aggregate_time_seconds: aggregate_time,
    };

    Ok(AnalysisResult {
        report,
        channels,
        date_span,
        metadata,
    })
}

/// Sorted, deduplicated channel names.
pub fn channel_names(samples: &[Sample]) -> Vec<String> {
    let mut names: Vec<String> = samples.iter().map(|s| s.channel.clone()).collect();
    names.sort();
    names.dedup();
    names
}

/// Earliest and latest sample dates, or `None` when there are no samples.
pub fn date_span(samples: &[Sample]) -> Option<(NaiveDate, NaiveDate)> {
    let first = samples.first()?.date();
    let (min, max) = samples
        .iter()
        .skip(1)
        .fold((first, first), |(min, max), sample| {
            let date = sample.date();
            (min.min(date), max.max(date))
        });
    Some((min, max))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

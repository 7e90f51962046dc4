//! Raw-table normalization into canonical long-format samples.
//!
//! Handles the two shapes the sheet has shipped in: a *wide* layout where
//! every column after the three identity columns is a timestamp header, and
//! a *long* layout that is already one row per sample. Shape detection is a
//! pure function over cleaned headers returning an explicit [`TableShape`];
//! all string heuristics live here and nowhere else.

use tracing::{debug, warn};

use viewstats_core::cells::{clean_header, parse_timestamp, parse_viewers};
use viewstats_core::error::{Result, StatsError};
use viewstats_core::models::{RawTable, Sample};

// ── Shape detection ───────────────────────────────────────────────────────────

/// Number of leading identity columns (link, channel name, video title) in
/// a wide-shape table.
const WIDE_IDENTITY_COLS: usize = 3;

/// Accepted labels for the long-shape timestamp column.
const TIME_LABELS: &[&str] = &["時間", "timestamp", "time"];

/// Accepted labels for the long-shape channel-name column.
const CHANNEL_LABELS: &[&str] = &["頻道名稱", "頻道", "channel"];

/// Accepted labels for the long-shape viewer-count column.
const VIEWER_LABELS: &[&str] = &["在線人數", "人數", "viewer_count", "viewers"];

/// Markers identifying the channel-name column among wide-shape identity
/// columns.
const CHANNEL_MARKERS: &[&str] = &["頻道", "名稱", "channel", "name"];

/// The recognized structure of a raw table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableShape {
    /// Already one row per sample, with the three named columns.
    Long {
        time_col: usize,
        channel_col: usize,
        viewers_col: usize,
    },
    /// Identity columns followed by one value column per timestamp.
    Wide {
        /// Which identity column (0..3) carries the channel name.
        channel_col: usize,
    },
}

/// Detect the shape of a table from its *cleaned* headers.
///
/// Long shape is tried first: all three role columns must resolve to
/// distinct columns. Otherwise the table is assumed wide, which requires at
/// least one value column after the identity columns and exactly one
/// identity column recognizable as the channel name; zero matches and
/// ambiguous matches are both schema errors.
pub fn detect_shape(headers: &[String]) -> Result<TableShape> {
    if headers.len() < WIDE_IDENTITY_COLS {
        return Err(StatsError::Schema(format!(
            "need at least {} columns, found {}",
            WIDE_IDENTITY_COLS,
            headers.len()
        )));
    }

    let time_col = find_role(headers, TIME_LABELS);
    let channel_col = find_role(headers, CHANNEL_LABELS);
    let viewers_col = find_role(headers, VIEWER_LABELS);
    if let (Some(time_col), Some(channel_col), Some(viewers_col)) =
        (time_col, channel_col, viewers_col)
    {
        if time_col != channel_col && channel_col != viewers_col && time_col != viewers_col {
            return Ok(TableShape::Long {
                time_col,
                channel_col,
                viewers_col,
            });
        }
    }

    if headers.len() < WIDE_IDENTITY_COLS + 1 {
        return Err(StatsError::Schema(
            "wide shape needs three identity columns plus at least one timestamp column"
                .to_string(),
        ));
    }

    let matches: Vec<usize> = headers[..WIDE_IDENTITY_COLS]
        .iter()
        .enumerate()
        .filter(|(_, header)| {
            let lowered = header.to_lowercase();
            CHANNEL_MARKERS.iter().any(|marker| lowered.contains(marker))
        })
        .map(|(idx, _)| idx)
        .collect();

    match matches[..] {
        [] => Err(StatsError::Schema(
            "channel-name column not found".to_string(),
        )),
        [channel_col] => Ok(TableShape::Wide { channel_col }),
        _ => Err(StatsError::Schema(format!(
            "multiple identity columns look like the channel name: {:?}",
            matches
                .iter()
                .map(|&i| headers[i].as_str())
                .collect::<Vec<_>>()
        ))),
    }
}

/// First column whose cleaned, lowercased header matches one of `labels`
/// exactly or contains it as a substring.
fn find_role(headers: &[String], labels: &[&str]) -> Option<usize> {
    headers.iter().position(|header| {
        let lowered = header.to_lowercase();
        labels
            .iter()
            .any(|label| lowered == *label || lowered.contains(label))
    })
}

// ── Normalization ─────────────────────────────────────────────────────────────

/// Normalize a raw table into canonical samples.
///
/// Unparseable timestamp or viewer-count cells are missing data and their
/// candidate samples are dropped; channel text is carried as-is (the empty
/// string is a valid label). A header-only table yields an empty vector. A
/// header that satisfies neither shape fails with [`StatsError::Schema`].
pub fn normalize(table: &RawTable) -> Result<Vec<Sample>> {
    let headers: Vec<String> = table.headers.iter().map(|h| clean_header(h)).collect();
    let shape = detect_shape(&headers)?;

    let samples = match shape {
        TableShape::Long {
            time_col,
            channel_col,
            viewers_col,
        } => normalize_long(table, time_col, channel_col, viewers_col),
        TableShape::Wide { channel_col } => normalize_wide(table, &headers, channel_col),
    };

    debug!(
        rows = table.rows.len(),
        samples = samples.len(),
        ?shape,
        "normalized table"
    );
    Ok(samples)
}

/// Long shape: each row is one candidate sample.
fn normalize_long(
    table: &RawTable,
    time_col: usize,
    channel_col: usize,
    viewers_col: usize,
) -> Vec<Sample> {
    let mut samples = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let Some(timestamp) = row.get(time_col).and_then(|c| parse_timestamp(c)) else {
            continue;
        };
        let Some(viewers) = row.get(viewers_col).and_then(|c| parse_viewers(c)) else {
            continue;
        };
        let channel = row.get(channel_col).cloned().unwrap_or_default();

        samples.push(Sample {
            channel,
            timestamp,
            viewers,
        });
    }

    samples
}

/// Wide shape: melt each (row, value column) pair into one candidate
/// sample, with the value column's header as the timestamp.
fn normalize_wide(table: &RawTable, headers: &[String], channel_col: usize) -> Vec<Sample> {
    // Parse every value-column header once; a header that is not a
    // timestamp makes the whole column missing data.
    let stamps: Vec<_> = headers[WIDE_IDENTITY_COLS..]
        .iter()
        .map(|h| parse_timestamp(h))
        .collect();
    for (offset, stamp) in stamps.iter().enumerate() {
        if stamp.is_none() {
            warn!(
                "skipping value column \"{}\": header is not a timestamp",
                headers[WIDE_IDENTITY_COLS + offset]
            );
        }
    }

    let mut samples = Vec::new();
    for row in &table.rows {
        let channel = row.get(channel_col).cloned().unwrap_or_default();

        for (offset, stamp) in stamps.iter().enumerate() {
            let Some(timestamp) = stamp else { continue };
            let Some(viewers) = row
                .get(WIDE_IDENTITY_COLS + offset)
                .and_then(|c| parse_viewers(c))
            else {
                continue;
            };

            samples.push(Sample {
                channel: channel.clone(),
                timestamp: *timestamp,
                viewers,
            });
        }
    }

    samples
}

// ── Tests ─────────────────────────────────────────────────────────────────────

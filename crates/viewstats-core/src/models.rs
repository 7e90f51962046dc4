use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ── RawTable ──────────────────────────────────────────────────────────────────

/// A raw tabular snapshot as delivered by the fetch layer.
///
/// Cell text is kept verbatim; header cleaning and cell parsing are the
/// normalizer's job, so a `RawTable` may carry padded headers, empty cells
/// and ragged rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    /// Header row, one string per column.
    pub headers: Vec<String>,
    /// Data rows. Rows may be shorter or longer than the header row.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Build a table from owned headers and rows.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Number of columns declared by the header row.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// `true` when the table has a header but no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell text at `(row, col)`, or `None` for cells past a short row.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}

// ── Sample ────────────────────────────────────────────────────────────────────

/// One canonical long-format observation: a channel's concurrent viewer
/// count at a point in time.
///
/// Timestamps are naive: the sheet carries local wall-clock time with no
/// zone information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Channel display name, carried through from the sheet as-is.
    /// The empty string is a valid label.
    pub channel: String,
    /// Local wall-clock time of the measurement.
    pub timestamp: NaiveDateTime,
    /// Concurrent viewer count. Always finite and ≥ 0 after normalization.
    pub viewers: f64,
}

impl Sample {
    /// Calendar date of the measurement.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

// ── DailyStat ─────────────────────────────────────────────────────────────────

/// Per-channel, per-calendar-day aggregate. Recomputed on every query.
///
/// The windowed means are `None` when no sample falls inside the window;
/// "no data" is never encoded as zero or NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStat {
    pub channel: String,
    pub date: NaiveDate,
    /// Mean viewer count over all of the day's samples.
    pub daily_mean: f64,
    /// Sum of viewer counts over all of the day's samples.
    pub daily_sum: f64,
    /// Mean over samples with hour in [11, 14), if any.
    pub midday_mean: Option<f64>,
    /// Mean over samples with hour in [19, 22), if any.
    pub evening_mean: Option<f64>,
}

// ── ChannelSummary ────────────────────────────────────────────────────────────

/// Per-channel means across days, rounded to the nearest viewer.
///
/// Rows are produced sorted descending by `daily_mean`; ties keep their
/// prior (channel-sorted) order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub channel: String,
    /// Mean of the channel's daily means.
    pub daily_mean: i64,
    /// Mean of the channel's midday means, skipping no-data days.
    /// `None` when the channel has no midday samples at all.
    pub midday_mean: Option<i64>,
    /// Mean of the channel's evening means, skipping no-data days.
    pub evening_mean: Option<i64>,
}

// ── SummaryHighlights ─────────────────────────────────────────────────────────

/// Row indices of the per-column maxima in a `ChannelSummary` table.
///
/// Display-only: the presentation layer uses this to highlight the leading
/// channel per column. The first row wins a tie.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryHighlights {
    pub daily_mean: Option<usize>,
    pub midday_mean: Option<usize>,
    pub evening_mean: Option<usize>,
}

impl SummaryHighlights {
    /// Locate the maxima of each column over `rows`.
    pub fn from_rows(rows: &[ChannelSummary]) -> Self {
        Self {
            daily_mean: max_index(rows, |r| Some(r.daily_mean)),
            midday_mean: max_index(rows, |r| r.midday_mean),
            evening_mean: max_index(rows, |r| r.evening_mean),
        }
    }
}

/// Index of the row with the largest value for one column, skipping rows
/// where the column has no data. The first row wins a tie.
fn max_index(
    rows: &[ChannelSummary],
    get: impl Fn(&ChannelSummary) -> Option<i64>,
) -> Option<usize> {
    let mut best: Option<(usize, i64)> = None;
    for (idx, row) in rows.iter().enumerate() {
        if let Some(value) = get(row) {
            if best.map_or(true, |(_, b)| value > b) {
                best = Some((idx, value));
            }
        }
    }
    best.map(|(idx, _)| idx)
}

// ── HourlyPoint ───────────────────────────────────────────────────────────────

/// One point of the comparison series: the mean viewer count for a channel
/// at an exact timestamp (duplicates at the same instant are averaged).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPoint {
    pub timestamp: NaiveDateTime,
    pub channel: String,
    pub viewers: f64,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

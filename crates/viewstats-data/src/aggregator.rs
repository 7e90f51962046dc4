//! Windowed aggregation over normalized samples.
//!
//! Runs the four query steps: date/channel filtering, per-day statistics,
//! the ranked channel summary, and the hourly comparison series. Pure and
//! infallible: an empty filter result yields three empty tables.

use std::collections::BTreeMap;
use std::ops::Range;

use chrono::{NaiveDate, NaiveDateTime, Timelike};

use viewstats_core::models::{ChannelSummary, DailyStat, HourlyPoint, Sample};
use viewstats_core::query::Query;

/// Local-hour window for the midday mean, half-open.
const MIDDAY_HOURS: Range<u32> = 11..14;

/// Local-hour window for the evening mean, half-open.
const EVENING_HOURS: Range<u32> = 19..22;

// ── AggregateReport ───────────────────────────────────────────────────────────

/// The three derived tables produced for one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateReport {
    /// Per-channel, per-day statistics, ordered by (channel, date).
    pub daily: Vec<DailyStat>,
    /// Per-channel means across days, ranked descending by daily mean.
    pub summary: Vec<ChannelSummary>,
    /// Per-(timestamp, channel) means, ordered by timestamp then channel.
    pub hourly: Vec<HourlyPoint>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Aggregate `samples` under `query` into an [`AggregateReport`].
pub fn aggregate(samples: &[Sample], query: &Query) -> AggregateReport {
    let filtered: Vec<&Sample> = samples
        .iter()
        .filter(|s| query.range.contains(s.date()) && query.channel.matches(&s.channel))
        .collect();

    let daily = daily_stats(&filtered);
    let summary = channel_summaries(&daily);
    let hourly = hourly_series(&filtered);

    AggregateReport {
        daily,
        summary,
        hourly,
    }
}

// ── Step 2: daily statistics ──────────────────────────────────────────────────

/// Running totals for one (channel, date) group.
#[derive(Debug, Default)]
struct DayAccumulator {
    sum: f64,
    count: u32,
    midday_sum: f64,
    midday_count: u32,
    evening_sum: f64,
    evening_count: u32,
}

impl DayAccumulator {
    fn add(&mut self, sample: &Sample) {
        self.sum += sample.viewers;
        self.count += 1;

        let hour = sample.timestamp.hour();
        if MIDDAY_HOURS.contains(&hour) {
            self.midday_sum += sample.viewers;
            self.midday_count += 1;
        }
        if EVENING_HOURS.contains(&hour) {
            self.evening_sum += sample.viewers;
            self.evening_count += 1;
        }
    }

    fn into_stat(self, channel: String, date: NaiveDate) -> DailyStat {
        DailyStat {
            channel,
            date,
            daily_mean: self.sum / f64::from(self.count),
            daily_sum: self.sum,
            midday_mean: mean_of(self.midday_sum, self.midday_count),
            evening_mean: mean_of(self.evening_sum, self.evening_count),
        }
    }
}

/// `None` when the window saw no samples, never zero.
fn mean_of(sum: f64, count: u32) -> Option<f64> {
    (count > 0).then(|| sum / f64::from(count))
}

fn daily_stats(filtered: &[&Sample]) -> Vec<DailyStat> {
    // BTreeMap keys give the (channel, date) output order for free.
    let mut groups: BTreeMap<(String, NaiveDate), DayAccumulator> = BTreeMap::new();

    for sample in filtered {
        groups
            .entry((sample.channel.clone(), sample.date()))
            .or_default()
            .add(sample);
    }

    groups
        .into_iter()
        .map(|((channel, date), acc)| acc.into_stat(channel, date))
        .collect()
}

// ── Step 3: channel summary ───────────────────────────────────────────────────

/// Running totals for one channel across its days.
#[derive(Debug, Default)]
struct SummaryAccumulator {
    daily_sum: f64,
    daily_count: u32,
    midday_sum: f64,
    midday_count: u32,
    evening_sum: f64,
    evening_count: u32,
}

impl SummaryAccumulator {
    fn add(&mut self, stat: &DailyStat) {
        self.daily_sum += stat.daily_mean;
        self.daily_count += 1;
        // Mean-skip-missing: a day without a windowed mean contributes
        // nothing to that column.
        if let Some(m) = stat.midday_mean {
            self.midday_sum += m;
            self.midday_count += 1;
        }
        if let Some(e) = stat.evening_mean {
            self.evening_sum += e;
            self.evening_count += 1;
        }
    }

    fn into_summary(self, channel: String) -> ChannelSummary {
        ChannelSummary {
            channel,
            daily_mean: round_to_i64(self.daily_sum / f64::from(self.daily_count)),
            midday_mean: mean_of(self.midday_sum, self.midday_count).map(round_to_i64),
            evening_mean: mean_of(self.evening_sum, self.evening_count).map(round_to_i64),
        }
    }
}

/// Round half away from zero to the nearest viewer.
fn round_to_i64(value: f64) -> i64 {
    value.round() as i64
}

fn channel_summaries(daily: &[DailyStat]) -> Vec<ChannelSummary> {
    let mut groups: BTreeMap<String, SummaryAccumulator> = BTreeMap::new();

    for stat in daily {
        groups
            .entry(stat.channel.clone())
            .or_default()
            .add(stat);
    }

    let mut rows: Vec<ChannelSummary> = groups
        .into_iter()
        .map(|(channel, acc)| acc.into_summary(channel))
        .collect();

    // Stable sort: channels tied on daily mean keep their channel-sorted
    // order from the map above.
    rows.sort_by(|a, b| b.daily_mean.cmp(&a.daily_mean));
    rows
}

// ── Step 4: hourly comparison series ──────────────────────────────────────────

fn hourly_series(filtered: &[&Sample]) -> Vec<HourlyPoint> {
    // Duplicate samples at the same (timestamp, channel) are averaged.
    let mut groups: BTreeMap<(NaiveDateTime, String), (f64, u32)> = BTreeMap::new();

    for sample in filtered {
        let entry = groups
            .entry((sample.timestamp, sample.channel.clone()))
            .or_insert((0.0, 0));
        entry.0 += sample.viewers;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|((timestamp, channel), (sum, count))| HourlyPoint {
            timestamp,
            channel,
            viewers: sum / f64::from(count),
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

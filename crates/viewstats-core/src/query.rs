use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StatsError};

// ── DateRange ─────────────────────────────────────────────────────────────────

/// An inclusive calendar-date range. Time-of-day plays no part in range
/// membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting `end < start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(StatsError::Config(format!(
                "end date {} is before start date {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// A range covering exactly one day.
    pub fn single_day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// `true` when `date` falls within the range, boundaries included.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

// ── ChannelFilter ─────────────────────────────────────────────────────────────

/// Which channels a query covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelFilter {
    /// Keep every channel.
    All,
    /// Keep only samples whose channel equals the given name.
    Only(String),
}

impl ChannelFilter {
    /// `true` when a sample with this channel name passes the filter.
    pub fn matches(&self, channel: &str) -> bool {
        match self {
            ChannelFilter::All => true,
            ChannelFilter::Only(name) => channel == name,
        }
    }
}

// ── ViewMode ──────────────────────────────────────────────────────────────────

/// How the presentation layer displays a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewMode {
    /// One channel's daily statistics.
    Single,
    /// Multiple channels side by side, including the hourly series.
    Compare,
}

impl ViewMode {
    /// Parse the CLI spelling (`"single"` / `"compare"`).
    pub fn from_cli(value: &str) -> Result<Self> {
        match value {
            "single" => Ok(ViewMode::Single),
            "compare" => Ok(ViewMode::Compare),
            other => Err(StatsError::Config(format!("unknown view mode: {}", other))),
        }
    }
}

// ── Query ─────────────────────────────────────────────────────────────────────

/// One aggregation request: a date range plus a channel filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub range: DateRange,
    pub channel: ChannelFilter,
}

impl Query {
    pub fn new(range: DateRange, channel: ChannelFilter) -> Self {
        Self { range, channel }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Plain-text rendering of the derived tables.
//!
//! This is the stand-in presentation layer: it consumes the pipeline's
//! output and produces aligned text tables. Channel names are CJK-heavy,
//! so column widths are computed from display width, not char count.

use unicode_width::UnicodeWidthStr;

use viewstats_core::formatting::{format_count, format_number, format_opt_count};
use viewstats_core::models::{ChannelSummary, DailyStat, HourlyPoint, SummaryHighlights};
use viewstats_core::query::ViewMode;
use viewstats_data::analysis::AnalysisResult;

/// Marker appended to a summary cell holding its column's maximum.
const MAX_MARKER: &str = " *";

// ── Report rendering ──────────────────────────────────────────────────────────

/// Render a complete report for one analysis run.
pub fn render_report(analysis: &AnalysisResult, view: ViewMode) -> String {
    let mut out = String::new();

    if let Some((start, end)) = analysis.date_span {
        out.push_str(&format!(
            "Data: {} channels, {} samples, {} to {}\n\n",
            analysis.channels.len(),
            analysis.metadata.samples,
            start,
            end
        ));
    } else {
        out.push_str("Data: no samples\n\n");
    }

    out.push_str("Channel ranking (mean of daily means)\n");
    out.push_str(&render_summary(&analysis.report.summary));
    out.push('\n');

    out.push_str("Daily statistics\n");
    out.push_str(&render_daily(&analysis.report.daily));

    if view == ViewMode::Compare {
        out.push('\n');
        out.push_str("Hourly comparison\n");
        out.push_str(&render_hourly(&analysis.report.hourly));
    }

    out
}

// ── Individual tables ─────────────────────────────────────────────────────────

/// Render the ranked channel summary. Column maxima are marked with `*`.
pub fn render_summary(rows: &[ChannelSummary]) -> String {
    if rows.is_empty() {
        return "(no data)\n".to_string();
    }

    let highlights = SummaryHighlights::from_rows(rows);
    let body: Vec<Vec<String>> = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            vec![
                row.channel.clone(),
                mark(format_count(row.daily_mean), highlights.daily_mean == Some(idx)),
                mark(
                    format_opt_count(row.midday_mean),
                    highlights.midday_mean == Some(idx),
                ),
                mark(
                    format_opt_count(row.evening_mean),
                    highlights.evening_mean == Some(idx),
                ),
            ]
        })
        .collect();

    let mut table = render_table(&["channel", "daily", "midday", "evening"], &body);
    table.push_str("(* = column maximum)\n");
    table
}

/// Render the per-day statistics table.
pub fn render_daily(rows: &[DailyStat]) -> String {
    if rows.is_empty() {
        return "(no data)\n".to_string();
    }

    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.channel.clone(),
                row.date.to_string(),
                format_number(row.daily_mean, 0),
                format_number(row.daily_sum, 0),
                row.midday_mean
                    .map_or_else(|| "-".to_string(), |m| format_number(m, 0)),
                row.evening_mean
                    .map_or_else(|| "-".to_string(), |m| format_number(m, 0)),
            ]
        })
        .collect();

    render_table(
        &["channel", "date", "mean", "sum", "midday", "evening"],
        &body,
    )
}

/// Render the hourly comparison series.
pub fn render_hourly(points: &[HourlyPoint]) -> String {
    if points.is_empty() {
        return "(no data)\n".to_string();
    }

    let body: Vec<Vec<String>> = points
        .iter()
        .map(|point| {
            vec![
                point.timestamp.format("%Y-%m-%d %H:%M").to_string(),
                point.channel.clone(),
                format_number(point.viewers, 0),
            ]
        })
        .collect();

    render_table(&["time", "channel", "viewers"], &body)
}

// ── Table layout ──────────────────────────────────────────────────────────────

/// Lay out a header row plus body rows as aligned columns.
///
/// The first column is left-aligned (labels), the rest right-aligned
/// (numbers). Widths are display widths so CJK cells line up.
fn render_table(headers: &[&str], body: &[Vec<String>]) -> String {
    let columns = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.width()).collect();
    for row in body {
        for (col, cell) in row.iter().enumerate().take(columns) {
            widths[col] = widths[col].max(cell.width());
        }
    }

    let mut out = String::new();
    render_row(&mut out, headers.iter().copied(), &widths);
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    out.push('\n');
    for row in body {
        render_row(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

/// Append one padded row.
fn render_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let rendered: Vec<String> = cells
        .zip(widths)
        .enumerate()
        .map(|(col, (cell, width))| {
            let padding = " ".repeat(width.saturating_sub(cell.width()));
            if col == 0 {
                format!("{}{}", cell, padding)
            } else {
                format!("{}{}", padding, cell)
            }
        })
        .collect();
    out.push_str(rendered.join("  ").trim_end());
    out.push('\n');
}

/// Append the maximum marker when `is_max` holds.
fn mark(cell: String, is_max: bool) -> String {
    if is_max {
        format!("{}{}", cell, MAX_MARKER)
    } else {
        cell
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn summary(channel: &str, daily: i64, midday: Option<i64>, evening: Option<i64>) -> ChannelSummary {
        ChannelSummary {
            channel: channel.to_string(),
            daily_mean: daily,
            midday_mean: midday,
            evening_mean: evening,
        }
    }

    #[test]
    fn test_render_summary_marks_maxima() {
        let rows = vec![
            summary("頻道A", 75, Some(100), Some(50)),
            summary("頻道B", 10, Some(200), None),
        ];
        let text = render_summary(&rows);

        assert!(text.contains("75 *"));
        assert!(text.contains("200 *"));
        assert!(text.contains("50 *"));
        assert!(text.contains("(* = column maximum)"));
    }

    #[test]
    fn test_render_summary_missing_as_dash() {
        let rows = vec![summary("頻道B", 10, None, None)];
        let text = render_summary(&rows);
        assert!(text.contains('-'));
    }

    #[test]
    fn test_render_empty_tables() {
        assert_eq!(render_summary(&[]), "(no data)\n");
        assert_eq!(render_daily(&[]), "(no data)\n");
        assert_eq!(render_hourly(&[]), "(no data)\n");
    }

    #[test]
    fn test_render_daily_row_content() {
        let rows = vec![DailyStat {
            channel: "頻道A".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            daily_mean: 1234.5,
            daily_sum: 2469.0,
            midday_mean: Some(1000.0),
            evening_mean: None,
        }];
        let text = render_daily(&rows);

        assert!(text.contains("頻道A"));
        assert!(text.contains("2024-01-01"));
        assert!(text.contains("1,235")); // mean rounded for display
        assert!(text.contains("2,469"));
    }

    #[test]
    fn test_render_hourly_formats_timestamp() {
        let points = vec![HourlyPoint {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(12, 30, 0)
                .unwrap(),
            channel: "頻道A".to_string(),
            viewers: 42.0,
        }];
        let text = render_hourly(&points);
        assert!(text.contains("2024-01-01 12:30"));
        assert!(text.contains("42"));
    }

    #[test]
    fn test_columns_align_with_cjk_labels() {
        // Both rows must produce identical column boundaries even though
        // the CJK label is wider per char.
        let rows = vec![
            summary("頻道長名稱", 100, None, None),
            summary("ab", 2000, None, None),
        ];
        let text = render_summary(&rows);
        let lines: Vec<&str> = text.lines().collect();

        // header, separator, two data rows, legend
        assert_eq!(lines.len(), 5);
        let sep_width = lines[1].width();
        assert!(lines[2].width() <= sep_width);
        assert!(lines[3].width() <= sep_width);
    }
}

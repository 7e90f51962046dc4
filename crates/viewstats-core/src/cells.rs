use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

// ── Header cleaning ───────────────────────────────────────────────────────────

/// Clean one raw header string before shape detection.
///
/// Trims surrounding whitespace, then removes embedded ideographic
/// (full-width) spaces and newline characters, the artifacts that show up
/// when sheet headers are hand-edited. All header comparisons in the
/// normalizer run on cleaned headers.
pub fn clean_header(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !matches!(c, '\u{3000}' | '\n' | '\r'))
        .collect()
}

// ── Timestamp cells ───────────────────────────────────────────────────────────

/// Parse a timestamp cell (or a wide-shape column header) into a naive
/// local datetime.
///
/// The sheet carries local wall-clock time; when an RFC 3339 offset is
/// present (exports routed through an API attach one) the offset is
/// discarded and the wall-clock time kept. Returns `None` for empty or
/// unrecognized strings; unparseable timestamps are missing data, not
/// errors.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    // Date-only cells map to midnight.
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    debug!("unparseable timestamp cell \"{}\"", s);
    None
}

// ── Viewer-count cells ────────────────────────────────────────────────────────

/// Parse a viewer-count cell into a finite, non-negative number.
///
/// Tolerates thousands separators and stray (full-width) spaces. Anything
/// that does not parse, or parses to a negative or non-finite value, is
/// missing data and returns `None`.
pub fn parse_viewers(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '\u{3000}'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let value: f64 = match cleaned.parse() {
        Ok(v) => v,
        Err(_) => {
            debug!("unparseable viewer-count cell \"{}\"", raw);
            return None;
        }
    };

    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    // ── clean_header ──────────────────────────────────────────────────────────

    #[test]
    fn test_clean_header_trims_whitespace() {
        assert_eq!(clean_header("  頻道名稱  "), "頻道名稱");
    }

    #[test]
    fn test_clean_header_strips_fullwidth_spaces() {
        assert_eq!(clean_header("頻道\u{3000}名稱"), "頻道名稱");
        assert_eq!(clean_header("\u{3000}時間\u{3000}"), "時間");
    }

    #[test]
    fn test_clean_header_strips_newlines() {
        assert_eq!(clean_header("在線\n人數"), "在線人數");
        assert_eq!(clean_header("在線\r\n人數"), "在線人數");
    }

    #[test]
    fn test_clean_header_plain_passthrough() {
        assert_eq!(clean_header("2024-01-01 10:00"), "2024-01-01 10:00");
    }

    // ── parse_timestamp ───────────────────────────────────────────────────────

    #[test]
    fn test_parse_timestamp_space_separated() {
        let dt = parse_timestamp("2024-01-01 10:00").unwrap();
        assert_eq!(dt.hour(), 10);
        assert_eq!(dt.minute(), 0);
    }

    #[test]
    fn test_parse_timestamp_with_seconds() {
        let dt = parse_timestamp("2024-01-01 10:30:45").unwrap();
        assert_eq!(dt.second(), 45);
    }

    #[test]
    fn test_parse_timestamp_t_separated() {
        assert!(parse_timestamp("2024-01-01T10:00:00").is_some());
        assert!(parse_timestamp("2024-01-01T10:00").is_some());
    }

    #[test]
    fn test_parse_timestamp_slash_dates() {
        let dt = parse_timestamp("2024/01/01 19:30").unwrap();
        assert_eq!(dt.hour(), 19);
    }

    #[test]
    fn test_parse_timestamp_rfc3339_keeps_wall_clock() {
        // The +08:00 offset is discarded; the local hour is kept.
        let dt = parse_timestamp("2024-01-01T12:00:00+08:00").unwrap();
        assert_eq!(dt.hour(), 12);
    }

    #[test]
    fn test_parse_timestamp_date_only_is_midnight() {
        let dt = parse_timestamp("2024-06-01").unwrap();
        assert_eq!(dt.hour(), 0);
        assert_eq!(dt.minute(), 0);
    }

    #[test]
    fn test_parse_timestamp_padded_input() {
        assert!(parse_timestamp("  2024-01-01 10:00  ").is_some());
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("標題").is_none());
        assert!(parse_timestamp("10:00").is_none());
    }

    // ── parse_viewers ─────────────────────────────────────────────────────────

    #[test]
    fn test_parse_viewers_integer() {
        assert_eq!(parse_viewers("1234"), Some(1234.0));
    }

    #[test]
    fn test_parse_viewers_float() {
        assert_eq!(parse_viewers("120.5"), Some(120.5));
    }

    #[test]
    fn test_parse_viewers_thousands_separators() {
        assert_eq!(parse_viewers("1,234,567"), Some(1_234_567.0));
    }

    #[test]
    fn test_parse_viewers_padded() {
        assert_eq!(parse_viewers(" 42 "), Some(42.0));
        assert_eq!(parse_viewers("\u{3000}42"), Some(42.0));
    }

    #[test]
    fn test_parse_viewers_zero_is_valid() {
        assert_eq!(parse_viewers("0"), Some(0.0));
    }

    #[test]
    fn test_parse_viewers_rejects_empty_and_garbage() {
        assert!(parse_viewers("").is_none());
        assert!(parse_viewers("   ").is_none());
        assert!(parse_viewers("N/A").is_none());
    }

    #[test]
    fn test_parse_viewers_rejects_negative() {
        assert!(parse_viewers("-5").is_none());
    }

    #[test]
    fn test_parse_viewers_rejects_non_finite() {
        assert!(parse_viewers("inf").is_none());
        assert!(parse_viewers("NaN").is_none());
    }
}

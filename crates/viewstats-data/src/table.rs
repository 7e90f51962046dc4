//! CSV decoding into [`RawTable`].
//!
//! The decoder is deliberately dumb: cell text is preserved verbatim
//! (including padding) and ragged rows are allowed. Header cleaning and
//! cell parsing belong to the normalizer.

use std::io::Read;
use std::path::Path;

use viewstats_core::error::{Result, StatsError};
use viewstats_core::models::RawTable;

/// Decode CSV text into a [`RawTable`].
///
/// The first record becomes the header row; every following record becomes
/// a data row. Empty input yields a table with no headers and no rows.
pub fn read_csv_str(text: &str) -> Result<RawTable> {
    read_csv_reader(text.as_bytes())
}

/// Decode CSV from any reader into a [`RawTable`].
pub fn read_csv_reader<R: Read>(reader: R) -> Result<RawTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut headers: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();

    for (idx, record) in csv_reader.records().enumerate() {
        let record = record?;
        let cells: Vec<String> = record.iter().map(str::to_string).collect();
        if idx == 0 {
            headers = cells;
        } else {
            rows.push(cells);
        }
    }

    Ok(RawTable::new(headers, rows))
}

/// Read and decode a CSV snapshot file.
pub fn read_csv_file(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).map_err(|source| StatsError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    read_csv_reader(std::io::BufReader::new(file))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_first_record_is_header() {
        let table = read_csv_str("連結,頻道,標題\nhttp://a,頻道A,開台\n").unwrap();
        assert_eq!(table.headers, vec!["連結", "頻道", "標題"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.cell(0, 1), Some("頻道A"));
    }

    #[test]
    fn test_cell_text_preserved_verbatim() {
        // Padding and full-width spaces must survive decoding untouched.
        let table = read_csv_str(" 時間 ,頻道\u{3000}名稱\n 2024-01-01 10:00 ,頻道A\n").unwrap();
        assert_eq!(table.headers[0], " 時間 ");
        assert_eq!(table.headers[1], "頻道\u{3000}名稱");
        assert_eq!(table.cell(0, 0), Some(" 2024-01-01 10:00 "));
    }

    #[test]
    fn test_ragged_rows_tolerated() {
        let table = read_csv_str("a,b,c\n1,2,3\n4,5\n6,7,8,9\n").unwrap();
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[1].len(), 2);
        assert_eq!(table.rows[2].len(), 4);
    }

    #[test]
    fn test_empty_input() {
        let table = read_csv_str("").unwrap();
        assert!(table.headers.is_empty());
        assert!(table.is_empty());
    }

    #[test]
    fn test_header_only_input() {
        let table = read_csv_str("連結,頻道,標題,2024-01-01 10:00\n").unwrap();
        assert_eq!(table.column_count(), 4);
        assert!(table.is_empty());
    }

    #[test]
    fn test_quoted_cells_with_commas() {
        let table = read_csv_str("a,b\n\"1,234\",x\n").unwrap();
        assert_eq!(table.cell(0, 0), Some("1,234"));
    }

    #[test]
    fn test_read_csv_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("snapshot.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "連結,頻道,標題,2024-01-01 10:00").unwrap();
        writeln!(file, "http://a,頻道A,開台,120").unwrap();

        let table = read_csv_file(&path).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.cell(0, 3), Some("120"));
    }

    #[test]
    fn test_read_csv_file_missing() {
        let err = read_csv_file(Path::new("/nonexistent/snapshot.csv")).unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }
}

//! Table sources: where raw snapshots come from.
//!
//! The core never fetches anything; a [`TableSource`] is the seam between
//! the pipeline and whatever delivers the sheet export. The shipped
//! implementation reads CSV snapshot files from disk.

use std::path::{Path, PathBuf};

use tracing::debug;
use viewstats_core::error::{Result, StatsError};
use viewstats_core::models::RawTable;
use viewstats_data::table::read_csv_file;

// ── TableSource ───────────────────────────────────────────────────────────────

/// Anything that can produce a fresh [`RawTable`] snapshot on demand.
pub trait TableSource: Send {
    /// Fetch the current snapshot.
    fn fetch(&self) -> Result<RawTable>;

    /// Human-readable description of where the data comes from.
    fn describe(&self) -> String;
}

// ── CsvFileSource ─────────────────────────────────────────────────────────────

/// Reads snapshots from a CSV file, or from the newest `.csv` file under a
/// directory when periodic exports are dropped into one.
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolve the concrete file to read for this fetch.
    fn resolve_file(&self) -> Result<PathBuf> {
        if self.path.is_dir() {
            latest_csv_in(&self.path)
        } else {
            Ok(self.path.clone())
        }
    }
}

impl TableSource for CsvFileSource {
    fn fetch(&self) -> Result<RawTable> {
        let file = self.resolve_file()?;
        debug!("fetching snapshot from {}", file.display());
        read_csv_file(&file)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Find the most recently modified `.csv` file under `dir` (recursive).
fn latest_csv_in(dir: &Path) -> Result<PathBuf> {
    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;

    for entry in walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().map(|ext| ext == "csv") != Some(true) {
            continue;
        }
        let modified = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
        let is_newer = newest
            .as_ref()
            .map_or(true, |(best, _)| modified > *best);
        if is_newer {
            newest = Some((modified, path.to_path_buf()));
        }
    }

    newest
        .map(|(_, path)| path)
        .ok_or_else(|| StatsError::NoSnapshots(dir.to_path_buf()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{}", content).unwrap();
        path
    }

    #[test]
    fn test_fetch_single_file() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "snapshot.csv",
            "連結,頻道,標題,2024-01-01 10:00\nhttp://a,頻道A,開台,100\n",
        );

        let source = CsvFileSource::new(&path);
        let table = source.fetch().unwrap();
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn test_fetch_missing_file() {
        let source = CsvFileSource::new("/nonexistent/snapshot.csv");
        assert!(source.fetch().is_err());
    }

    #[test]
    fn test_fetch_newest_in_directory() {
        let dir = TempDir::new().unwrap();
        write_csv(dir.path(), "old.csv", "a,b,c\n");
        let old = dir.path().join("old.csv");
        // Backdate the first file so modification times differ reliably.
        let past = std::time::SystemTime::now() - std::time::Duration::from_secs(3600);
        let file = std::fs::File::options().append(true).open(&old).unwrap();
        file.set_modified(past).unwrap();

        write_csv(
            dir.path(),
            "new.csv",
            "連結,頻道,標題,2024-01-01 10:00\nhttp://a,頻道A,開台,42\n",
        );

        let source = CsvFileSource::new(dir.path());
        let table = source.fetch().unwrap();
        assert_eq!(table.cell(0, 3), Some("42"));
    }

    #[test]
    fn test_directory_without_snapshots() {
        let dir = TempDir::new().unwrap();
        // A non-.csv file must not count as a snapshot.
        write_csv(dir.path(), "notes.log", "not a snapshot");

        let source = CsvFileSource::new(dir.path());
        let err = source.fetch().unwrap_err();
        assert!(matches!(err, StatsError::NoSnapshots(_)));
    }

    #[test]
    fn test_describe_reports_path() {
        let source = CsvFileSource::new("/data/snapshots");
        assert_eq!(source.describe(), "/data/snapshots");
    }
}

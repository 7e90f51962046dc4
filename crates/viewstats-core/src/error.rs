use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the viewer-statistics crates.
#[derive(Error, Debug)]
pub enum StatsError {
    /// The table's header row matches neither recognized shape.
    #[error("Unrecognized table schema: {0}")]
    Schema(String),

    /// A snapshot file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV document could not be decoded.
    #[error("Failed to decode CSV: {0}")]
    Csv(#[from] csv::Error),

    /// No CSV snapshot files were found under the given directory.
    #[error("No CSV snapshots found in {0}")]
    NoSnapshots(PathBuf),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the viewstats crates.
pub type Result<T> = std::result::Result<T, StatsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_schema() {
        let err = StatsError::Schema("channel-name column not found".to_string());
        assert_eq!(
            err.to_string(),
            "Unrecognized table schema: channel-name column not found"
        );
    }

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = StatsError::FileRead {
            path: PathBuf::from("/some/snapshot.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/some/snapshot.csv"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_no_snapshots() {
        let err = StatsError::NoSnapshots(PathBuf::from("/empty/dir"));
        assert_eq!(err.to_string(), "No CSV snapshots found in /empty/dir");
    }

    #[test]
    fn test_error_display_config() {
        let err = StatsError::Config("end date before start date".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: end date before start date"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: StatsError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_csv() {
        // Force a CSV error by reading a record with mismatched lengths from
        // a strict reader.
        let mut reader = csv::ReaderBuilder::new()
            .flexible(false)
            .from_reader("a,b\n1,2,3\n".as_bytes());
        let csv_err = reader
            .records()
            .next()
            .expect("one record attempt")
            .unwrap_err();
        let err: StatsError = csv_err.into();
        assert!(err.to_string().contains("Failed to decode CSV"));
    }
}

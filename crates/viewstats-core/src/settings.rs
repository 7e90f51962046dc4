use chrono::NaiveDate;
use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Aggregated viewer statistics for live-channel CSV snapshots
#[derive(Parser, Debug, Clone)]
#[command(
    name = "viewstats",
    about = "Aggregated viewer statistics for live-channel CSV snapshots",
    version
)]
pub struct Settings {
    /// CSV snapshot file, or a directory of snapshots (the newest is used)
    pub input: PathBuf,

    /// Restrict the report to a single channel
    #[arg(long)]
    pub channel: Option<String>,

    /// First day of the report range (defaults to the earliest sample)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Last day of the report range (defaults to the latest sample)
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// View mode
    #[arg(long, default_value = "single", value_parser = ["single", "compare"])]
    pub view: String,

    /// Keep running and re-render whenever the source refreshes
    #[arg(long)]
    pub watch: bool,

    /// Seconds between refreshes in watch mode (1-3600)
    #[arg(long, default_value = "300", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub refresh_secs: u64,

    /// Seconds a fetched table stays fresh in the cache
    #[arg(long, default_value = "300")]
    pub cache_ttl_secs: u64,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved query parameters
    #[arg(long)]
    pub clear: bool,
}

// ── SavedQuery ─────────────────────────────────────────────────────────────────

/// Last-used query parameters persisted to `~/.viewstats/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct SavedQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
}

impl SavedQuery {
    /// Return the default path to the persisted query file,
    /// `~/.viewstats/last_used.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".viewstats").join("last_used.json")
    }

    /// Load the persisted query from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write the query to an explicit path, creating parent
    /// directories if needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        // Write to a temp file then rename for atomicity.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the query file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

impl From<&Settings> for SavedQuery {
    fn from(s: &Settings) -> Self {
        SavedQuery {
            channel: s.channel.clone(),
            start_date: s.start_date,
            end_date: s.end_date,
            view: Some(s.view.clone()),
        }
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with the saved query where no explicit CLI
    /// value was provided, and persist the result for the next run.
    pub fn load_with_saved_query() -> Self {
        Self::load_with_saved_query_impl(std::env::args_os().collect(), &SavedQuery::config_path())
    }

    /// Full implementation: accepts args and an explicit config path so
    /// that tests can redirect to a temporary directory.
    pub fn load_with_saved_query_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        // Build raw ArgMatches so we can query ValueSource.
        let matches = Settings::command().get_matches_from(args.clone());

        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = SavedQuery::clear_at(config_path);
            return Self::apply_debug_flag(settings);
        }

        let saved = SavedQuery::load_from(config_path);

        // Merge saved values for fields NOT explicitly set on the command
        // line (CLI always wins).
        if !is_arg_explicitly_set(&matches, "channel") && settings.channel.is_none() {
            settings.channel = saved.channel;
        }
        if !is_arg_explicitly_set(&matches, "start_date") && settings.start_date.is_none() {
            settings.start_date = saved.start_date;
        }
        if !is_arg_explicitly_set(&matches, "end_date") && settings.end_date.is_none() {
            settings.end_date = saved.end_date;
        }
        if !is_arg_explicitly_set(&matches, "view") {
            if let Some(v) = saved.view {
                settings.view = v;
            }
        }

        settings = Self::apply_debug_flag(settings);

        // Persist current query for next run.
        let query = SavedQuery::from(&settings);
        let _ = query.save_to(config_path);

        settings
    }

    /// `--debug` overrides the log level.
    fn apply_debug_flag(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Helper: check if an arg was explicitly set on the command line ─────────────

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use tempfile::TempDir;

    fn args(list: &[&str]) -> Vec<OsString> {
        std::iter::once("viewstats")
            .chain(list.iter().copied())
            .map(OsString::from)
            .collect()
    }

    fn tmp_config_path(tmp: &TempDir) -> PathBuf {
        SavedQuery::config_path_in(tmp.path())
    }

    // ── defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_defaults() {
        let tmp = TempDir::new().unwrap();
        let settings =
            Settings::load_with_saved_query_impl(args(&["data.csv"]), &tmp_config_path(&tmp));

        assert_eq!(settings.input, PathBuf::from("data.csv"));
        assert_eq!(settings.view, "single");
        assert_eq!(settings.refresh_secs, 300);
        assert_eq!(settings.cache_ttl_secs, 300);
        assert_eq!(settings.log_level, "INFO");
        assert!(settings.channel.is_none());
        assert!(!settings.watch);
    }

    // ── saved query round-trip ────────────────────────────────────────────────

    #[test]
    fn test_saved_query_persists_and_merges() {
        let tmp = TempDir::new().unwrap();
        let path = tmp_config_path(&tmp);

        // First run sets a channel and view explicitly.
        let first = Settings::load_with_saved_query_impl(
            args(&["data.csv", "--channel", "頻道A", "--view", "compare"]),
            &path,
        );
        assert_eq!(first.channel.as_deref(), Some("頻道A"));
        assert!(path.exists(), "saved query file should be written");

        // Second run without flags inherits the saved values.
        let second = Settings::load_with_saved_query_impl(args(&["data.csv"]), &path);
        assert_eq!(second.channel.as_deref(), Some("頻道A"));
        assert_eq!(second.view, "compare");
    }

    #[test]
    fn test_cli_wins_over_saved_query() {
        let tmp = TempDir::new().unwrap();
        let path = tmp_config_path(&tmp);

        Settings::load_with_saved_query_impl(
            args(&["data.csv", "--channel", "頻道A", "--view", "compare"]),
            &path,
        );

        let next = Settings::load_with_saved_query_impl(
            args(&["data.csv", "--channel", "頻道B", "--view", "single"]),
            &path,
        );
        assert_eq!(next.channel.as_deref(), Some("頻道B"));
        assert_eq!(next.view, "single");
    }

    #[test]
    fn test_clear_removes_saved_query() {
        let tmp = TempDir::new().unwrap();
        let path = tmp_config_path(&tmp);

        Settings::load_with_saved_query_impl(args(&["data.csv", "--channel", "頻道A"]), &path);
        assert!(path.exists());

        let cleared =
            Settings::load_with_saved_query_impl(args(&["data.csv", "--clear"]), &path);
        assert!(!path.exists(), "clear must delete the saved query file");
        assert!(cleared.channel.is_none());
    }

    // ── date parsing ──────────────────────────────────────────────────────────

    #[test]
    fn test_dates_parse_from_cli() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load_with_saved_query_impl(
            args(&["data.csv", "--start-date", "2024-01-01", "--end-date", "2024-01-31"]),
            &tmp_config_path(&tmp),
        );
        assert_eq!(
            settings.start_date,
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(settings.end_date, NaiveDate::from_ymd_opt(2024, 1, 31));
    }

    // ── debug flag ────────────────────────────────────────────────────────────

    #[test]
    fn test_debug_flag_overrides_log_level() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load_with_saved_query_impl(
            args(&["data.csv", "--debug"]),
            &tmp_config_path(&tmp),
        );
        assert_eq!(settings.log_level, "DEBUG");
    }

    // ── SavedQuery file handling ──────────────────────────────────────────────

    #[test]
    fn test_load_from_missing_file_is_default() {
        let query = SavedQuery::load_from(std::path::Path::new("/nonexistent/last_used.json"));
        assert!(query.channel.is_none());
        assert!(query.view.is_none());
    }

    #[test]
    fn test_load_from_corrupt_file_is_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("last_used.json");
        std::fs::write(&path, "{not json").unwrap();
        let query = SavedQuery::load_from(&path);
        assert!(query.channel.is_none());
    }
}

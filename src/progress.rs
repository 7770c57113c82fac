// src/progress.rs

use chrono::{Local, NaiveDateTime};
use std::{
    fmt::Display,
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{error, info, warn};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only progress log: one `YYYY-MM-DD HH:MM:SS : <message>` line per event.
#[derive(Debug, Clone)]
pub struct ProgressLog {
    path: PathBuf,
}

impl ProgressLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `message` stamped with the current local time.
    pub fn record(&self, message: impl Display) -> std::io::Result<()> {
        let line = format_entry(Local::now().naive_local(), message);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }

    /// Record to the log file and echo on the console at info level.
    pub fn info(&self, message: impl Display) {
        let message = message.to_string();
        info!("{}", message);
        self.record_or_warn(&message);
    }

    /// Record to the log file and echo on the console at error level.
    pub fn error(&self, message: impl Display) {
        let message = message.to_string();
        error!("{}", message);
        self.record_or_warn(&message);
    }

    fn record_or_warn(&self, message: &str) {
        if let Err(e) = self.record(message) {
            warn!(path = %self.path.display(), error = %e, "could not append to progress log");
        }
    }
}

/// Render a single log line, trailing newline included.
pub fn format_entry(at: NaiveDateTime, message: impl Display) -> String {
    format!("{} : {}\n", at.format(TIMESTAMP_FORMAT), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_format_entry() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 1)
            .unwrap();
        assert_eq!(
            format_entry(at, "Transformation process complete."),
            "2024-03-07 09:05:01 : Transformation process complete.\n"
        );
    }

    #[test]
    fn test_record_appends_lines() {
        let tmp = tempdir().unwrap();
        let log = ProgressLog::new(tmp.path().join("code_log.txt"));

        log.record("first").unwrap();
        log.info("second");
        log.error("third");

        let contents = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with(" : first"));
        assert!(lines[1].ends_with(" : second"));
        assert!(lines[2].ends_with(" : third"));
        // "YYYY-MM-DD HH:MM:SS" prefix
        assert_eq!(&lines[0][19..22], " : ");
        assert!(NaiveDateTime::parse_from_str(&lines[0][..19], TIMESTAMP_FORMAT).is_ok());
    }

    #[test]
    fn test_unwritable_log_does_not_panic() {
        let tmp = tempdir().unwrap();
        let log = ProgressLog::new(tmp.path().join("missing").join("log.txt"));
        assert!(log.record("lost").is_err());
        log.error("still fine");
    }
}

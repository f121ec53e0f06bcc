// Download history stored as one JSON array

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::console::{paint, print_colored, Color};

pub const DEFAULT_HISTORY_FILE: &str = "download_history.json";

pub const DEFAULT_SHOW_COUNT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRecord {
    pub url: String,
    pub filename: String,
    pub format_type: String,
    /// `YYYY-MM-DD HH:MM:SS`, local time
    pub timestamp: String,
}

/// Current local time in the history timestamp format
pub fn timestamp_now() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ))
    .unwrap_or_default()
}

pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records; a missing or unreadable file counts as empty history
    pub fn load(&self) -> Vec<DownloadRecord> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    debug!(path = %self.path.display(), "history unreadable: {}", e);
                }
                return Vec::new();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            debug!(path = %self.path.display(), "history is not valid JSON: {}", e);
            Vec::new()
        })
    }

    fn save(&self, records: &[DownloadRecord]) -> io::Result<()> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        records.serialize(&mut ser).map_err(io::Error::from)?;
        fs::write(&self.path, buf)
    }

    /// Append a record stamped with the current time.
    ///
    /// A failed write prints a warning and is otherwise dropped.
    pub fn append(&self, url: &str, filename: &str, format_type: &str) -> DownloadRecord {
        let record = DownloadRecord {
            url: url.to_string(),
            filename: filename.to_string(),
            format_type: format_type.to_string(),
            timestamp: timestamp_now(),
        };

        let mut records = self.load();
        records.push(record.clone());

        if let Err(e) = self.save(&records) {
            warn!(path = %self.path.display(), "could not save download history: {}", e);
            print_colored("Warning: Could not save download history", Color::Yellow);
        }

        record
    }

    /// Up to `last_n` most recent records, oldest first
    pub fn recent(&self, last_n: usize) -> Vec<DownloadRecord> {
        let mut records = self.load();
        let skip = records.len().saturating_sub(last_n);
        records.drain(..skip);
        records
    }

    pub fn show(&self, last_n: usize) {
        let records = self.recent(last_n);
        if records.is_empty() {
            print_colored("No download history found", Color::Yellow);
            return;
        }

        println!();
        print_colored("Download History:", Color::Cyan);
        for item in &records {
            println!("{} {}", paint("URL:", Color::Green), item.url);
            println!("{} {}", paint("File:", Color::Green), item.filename);
            println!("{} {}", paint("Format:", Color::Green), item.format_type);
            println!("{} {}", paint("Date:", Color::Green), item.timestamp);
            println!("{}", "-".repeat(50));
        }
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_FILE)
    }
}

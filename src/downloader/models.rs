// Common data models for the downloader

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stand-in for any field yt-dlp did not report
pub const PLACEHOLDER: &str = "N/A";

/// Which listing a set of formats was fetched for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatContext {
    Video,
    Playlist,
}

impl FormatContext {
    pub fn from_playlist_flag(for_playlist: bool) -> Self {
        if for_playlist {
            Self::Playlist
        } else {
            Self::Video
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    Audio,
    Video,
}

impl FormatKind {
    /// Label derived from the extension string
    pub fn from_extension(ext: &str) -> Self {
        if ext.contains("audio") {
            Self::Audio
        } else {
            Self::Video
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of yt-dlp's `formats` array, as much as we care about
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFormat {
    pub format_id: Option<String>,
    pub format_note: Option<String>,
    pub height: Option<u32>,
    pub ext: Option<String>,
}

/// Subset of yt-dlp's info dict returned by `--dump-single-json`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InfoDict {
    #[serde(default)]
    pub formats: Option<Vec<RawFormat>>,
    /// Playlist entries; unavailable items come back as `null`
    #[serde(default)]
    pub entries: Option<Vec<Option<InfoDict>>>,
}

impl InfoDict {
    /// Formats of the item itself, or of the first playlist entry that has any
    pub fn into_formats(self) -> Vec<RawFormat> {
        if let Some(formats) = self.formats {
            return formats;
        }
        self.entries
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .map(InfoDict::into_formats)
            .find(|formats| !formats.is_empty())
            .unwrap_or_default()
    }
}

/// Stream format shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatDescriptor {
    pub id: String,
    pub note: String,
    /// Height in pixels, if yt-dlp knows it
    pub resolution: Option<u32>,
    pub extension: String,
    #[serde(rename = "type")]
    pub kind: FormatKind,
}

impl FormatDescriptor {
    pub fn resolution_label(&self) -> String {
        match self.resolution {
            Some(height) => height.to_string(),
            None => PLACEHOLDER.to_string(),
        }
    }
}

impl From<RawFormat> for FormatDescriptor {
    fn from(raw: RawFormat) -> Self {
        let extension = raw.ext.unwrap_or_else(|| PLACEHOLDER.to_string());
        Self {
            id: raw.format_id.unwrap_or_else(|| PLACEHOLDER.to_string()),
            note: raw.format_note.unwrap_or_default(),
            resolution: raw.height,
            kind: FormatKind::from_extension(&extension),
            extension,
        }
    }
}

/// What a finished yt-dlp run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// Files reported by yt-dlp, in the order it announced them
    pub files: Vec<String>,
}

impl DownloadOutcome {
    /// The last file announced; after merging or audio extraction this is the final output
    pub fn primary_file(&self) -> Option<&str> {
        self.files.last().map(String::as_str)
    }

    pub(crate) fn record(&mut self, file: String) {
        if !self.files.contains(&file) {
            self.files.push(file);
        }
    }
}

/// Network configuration passed through to yt-dlp
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Proxy URL (e.g., "socks5://127.0.0.1:1080")
    pub proxy: Option<String>,

    /// Timeout in seconds
    pub timeout: Option<u32>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            timeout: Some(30),
        }
    }
}

impl NetworkConfig {
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(proxy) = &self.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }

        if let Some(timeout) = self.timeout {
            args.push("--socket-timeout".to_string());
            args.push(timeout.to_string());
        }

        args
    }
}

// Error types for the yt-dlp backend

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network timeout while talking to the site
    #[error("Network timeout: {0}")]
    NetworkTimeout(String),

    /// The site blocked the request (429, bot detection, etc.)
    #[error("Blocked by YouTube: {0}")]
    BlockedByYouTube(String),

    /// yt-dlp or python not found on this system
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// URL rejected by yt-dlp
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse yt-dlp JSON output
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Local filesystem failure (download directory, pipes)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// yt-dlp exited unsuccessfully
    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl DownloadError {
    /// Raw message reported by yt-dlp (or the OS), without the variant prefix
    pub fn detail(&self) -> String {
        match self {
            Self::NetworkTimeout(msg)
            | Self::BlockedByYouTube(msg)
            | Self::ToolNotFound(msg)
            | Self::InvalidUrl(msg)
            | Self::ParseError(msg)
            | Self::ExecutionError(msg)
            | Self::Unknown(msg) => msg.clone(),
            Self::Io(err) => err.to_string(),
        }
    }
}

// Classify yt-dlp stderr text
impl From<String> for DownloadError {
    fn from(s: String) -> Self {
        let lower = s.to_lowercase();

        if lower.contains("timeout") || lower.contains("timed out") {
            return Self::NetworkTimeout(s);
        }

        if lower.contains("429")
            || lower.contains("too many requests")
            || lower.contains("confirm you're not a bot")
            || lower.contains("blocked")
        {
            return Self::BlockedByYouTube(s);
        }

        if lower.contains("command not found") || lower.contains("no such file") {
            return Self::ToolNotFound(s);
        }

        if lower.contains("invalid url")
            || lower.contains("unsupported url")
            || lower.contains("is not a valid url")
        {
            return Self::InvalidUrl(s);
        }

        if lower.contains("json") {
            return Self::ParseError(s);
        }

        Self::Unknown(s)
    }
}

impl From<&str> for DownloadError {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

// Backend trait definition

use async_trait::async_trait;

use super::errors::DownloadError;
use super::models::{DownloadOutcome, RawFormat};
use super::options::{DownloadOptions, InfoQuery};

/// Something that can run yt-dlp: the real child process, or a stub in tests
#[async_trait]
pub trait YtDlpBackend: Send + Sync {
    /// Name of the backend (for logging)
    fn name(&self) -> &'static str;

    /// Fetch available stream formats without downloading anything
    async fn fetch_formats(
        &self,
        url: &str,
        query: &InfoQuery,
    ) -> Result<Vec<RawFormat>, DownloadError>;

    /// Download `url`, invoking every hook in `options.progress_hooks` as events arrive
    async fn download(
        &self,
        url: &str,
        options: &DownloadOptions,
    ) -> Result<DownloadOutcome, DownloadError>;
}

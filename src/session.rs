// One interactive run: owns the backend, download settings and the format caches

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::downloader::formats::build_descriptors;
use crate::downloader::models::{DownloadOutcome, FormatContext, FormatDescriptor, NetworkConfig};
use crate::downloader::options::{DownloadOptions, InfoQuery};
use crate::downloader::{DownloadError, YtDlpBackend};

struct CachedFormats {
    url: String,
    formats: Vec<FormatDescriptor>,
}

pub struct Session {
    backend: Box<dyn YtDlpBackend>,
    network: NetworkConfig,
    cookiefile: Option<PathBuf>,
    format_cache: HashMap<FormatContext, CachedFormats>,
}

impl Session {
    pub fn new(backend: Box<dyn YtDlpBackend>) -> Self {
        Self {
            backend,
            network: NetworkConfig::default(),
            cookiefile: None,
            format_cache: HashMap::new(),
        }
    }

    pub fn with_network(mut self, network: NetworkConfig) -> Self {
        self.network = network;
        self
    }

    /// Cookie file passed to every request; ignored if it does not exist
    pub fn with_cookiefile(mut self, path: Option<PathBuf>) -> Self {
        self.cookiefile = path;
        self
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    fn existing_cookiefile(&self) -> Option<PathBuf> {
        self.cookiefile.clone().filter(|p| p.is_file())
    }

    /// Available formats for `url`, fetched once per context.
    ///
    /// A second call for the same context and URL returns the cached list
    /// without querying yt-dlp again.
    pub async fn list_formats(
        &mut self,
        url: &str,
        for_playlist: bool,
    ) -> Result<&[FormatDescriptor], DownloadError> {
        let context = FormatContext::from_playlist_flag(for_playlist);
        let cached = self
            .format_cache
            .get(&context)
            .map_or(false, |entry| entry.url == url);

        if !cached {
            let query = InfoQuery {
                for_playlist,
                cookiefile: self.existing_cookiefile(),
                network: self.network.clone(),
            };
            let raw = self.backend.fetch_formats(url, &query).await?;
            let formats = build_descriptors(raw);
            debug!(?context, count = formats.len(), "caching formats");
            self.format_cache.insert(
                context,
                CachedFormats {
                    url: url.to_string(),
                    formats,
                },
            );
        }

        Ok(self
            .format_cache
            .get(&context)
            .map(|entry| entry.formats.as_slice())
            .unwrap_or_default())
    }

    /// Run yt-dlp with prepared options, creating the download directory first
    pub async fn execute(
        &self,
        url: &str,
        options: DownloadOptions,
    ) -> Result<DownloadOutcome, DownloadError> {
        fs::create_dir_all(options.download_dir())?;

        let options = options
            .with_cookiefile(self.existing_cookiefile())
            .with_network(self.network.clone());

        info!(backend = self.backend.name(), %url, format = %options.format, "starting download");
        self.backend.download(url, &options).await
    }

    /// Download a single video, or its audio as MP3 when `is_audio` is set
    pub async fn download(
        &self,
        url: &str,
        format_id: &str,
        download_path: &Path,
        filename: Option<&str>,
        is_audio: bool,
    ) -> Result<DownloadOutcome, DownloadError> {
        let options = DownloadOptions::single(format_id, download_path, filename, is_audio);
        self.execute(url, options).await
    }

    /// Download every entry of a playlist into a folder named after it
    pub async fn download_playlist(
        &self,
        url: &str,
        format_id: &str,
        download_path: &Path,
        filename: Option<&str>,
    ) -> Result<DownloadOutcome, DownloadError> {
        let options = DownloadOptions::playlist(format_id, download_path, filename);
        self.execute(url, options).await
    }
}

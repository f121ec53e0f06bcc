// In-memory backend for tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::errors::DownloadError;
use super::models::{DownloadOutcome, RawFormat};
use super::options::{DownloadOptions, InfoQuery};
use super::traits::YtDlpBackend;

#[derive(Clone, Default)]
pub struct StubCalls {
    pub fetches: Arc<AtomicUsize>,
    pub downloads: Arc<AtomicUsize>,
    /// Options of every download call, in order
    pub seen: Arc<Mutex<Vec<DownloadOptions>>>,
    /// Whether the download directory existed when the backend was invoked
    pub dir_existed: Arc<Mutex<Vec<bool>>>,
}

impl StubCalls {
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

pub struct StubBackend {
    pub calls: StubCalls,
    pub formats: Vec<RawFormat>,
    /// When set, every call fails with this stderr text
    pub failure: Option<String>,
    pub produced: Vec<String>,
}

impl StubBackend {
    pub fn succeeding() -> Self {
        Self {
            calls: StubCalls::default(),
            formats: vec![
                RawFormat {
                    format_id: Some("18".into()),
                    format_note: Some("360p".into()),
                    height: Some(360),
                    ext: Some("mp4".into()),
                },
                RawFormat {
                    format_id: Some("140".into()),
                    format_note: Some("medium".into()),
                    height: None,
                    ext: Some("m4a".into()),
                },
            ],
            failure: None,
            produced: vec!["downloads/Clip.mp4".into()],
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::succeeding()
        }
    }
}

#[async_trait]
impl YtDlpBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn fetch_formats(
        &self,
        _url: &str,
        _query: &InfoQuery,
    ) -> Result<Vec<RawFormat>, DownloadError> {
        self.calls.fetches.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(msg) => Err(DownloadError::from(msg.clone())),
            None => Ok(self.formats.clone()),
        }
    }

    async fn download(
        &self,
        _url: &str,
        options: &DownloadOptions,
    ) -> Result<DownloadOutcome, DownloadError> {
        self.calls.downloads.fetch_add(1, Ordering::SeqCst);
        let existed = options.download_dir().is_dir();
        self.calls.dir_existed.lock().unwrap().push(existed);
        self.calls.seen.lock().unwrap().push(options.clone());

        match &self.failure {
            Some(msg) => Err(DownloadError::from(msg.clone())),
            None => Ok(DownloadOutcome {
                files: self.produced.clone(),
            }),
        }
    }
}

// yt-dlp child-process backend
//
// Two ways of reaching yt-dlp:
// - Native: the standalone `yt-dlp` binary
// - Python: `python3 -m yt_dlp` (override the interpreter with YTDLP_PYTHON)
//
// Auto mode prefers the binary and falls back to the Python module.

use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command as TokioCommand;
use tracing::{debug, info, trace, warn};

use super::errors::DownloadError;
use super::models::{DownloadOutcome, InfoDict, RawFormat};
use super::options::{DownloadOptions, InfoQuery};
use super::progress::{parse_output_file, parse_progress_line, ProgressEvent};
use super::tools::{find_ytdlp, get_version, python_has_module};
use super::traits::YtDlpBackend;
use super::utils::{join_pipe, run_output_with_timeout, summarize_stderr};

/// Metadata dumps of long playlists can take a while
const DEFAULT_INFO_TIMEOUT_SECS: u64 = 180;

/// How to reach yt-dlp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExtractorMode {
    /// Binary first, Python module as fallback
    #[default]
    Auto,
    /// Native `yt-dlp` binary
    Cli,
    /// Python module `yt_dlp`
    Python,
}

impl fmt::Display for ExtractorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Cli => write!(f, "cli"),
            Self::Python => write!(f, "python"),
        }
    }
}

/// Resolved command prefix for running yt-dlp
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Native { path: String },
    Python { python: String },
}

impl Invocation {
    pub fn program(&self) -> &str {
        match self {
            Self::Native { path } => path,
            Self::Python { python } => python,
        }
    }

    /// Arguments placed before yt-dlp's own options
    pub fn base_args(&self) -> Vec<String> {
        match self {
            Self::Native { .. } => Vec::new(),
            Self::Python { .. } => vec!["-m".to_string(), "yt_dlp".to_string()],
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Native { path } => format!("yt-dlp ({})", path),
            Self::Python { python } => format!("{} -m yt_dlp", python),
        }
    }

    fn native() -> Option<Self> {
        let inv = Self::Native { path: find_ytdlp()? };
        get_version(&inv).map(|_| inv)
    }

    fn python(python: &str) -> Option<Self> {
        python_has_module(python, "yt_dlp").then(|| Self::Python {
            python: python.to_string(),
        })
    }

    /// Pick an invocation for `mode`, checking that it actually runs
    pub fn resolve(mode: ExtractorMode, python: &str) -> Result<Self, DownloadError> {
        let found = match mode {
            ExtractorMode::Cli => Self::native(),
            ExtractorMode::Python => Self::python(python),
            ExtractorMode::Auto => Self::native().or_else(|| Self::python(python)),
        };

        found.ok_or_else(|| {
            DownloadError::ToolNotFound(format!(
                "no working yt-dlp for mode '{}' (install the yt-dlp binary or `pip install yt-dlp`)",
                mode
            ))
        })
    }
}

/// Backend that spawns yt-dlp for every request
pub struct ProcessBackend {
    invocation: Invocation,
    info_timeout_secs: u64,
}

impl ProcessBackend {
    pub fn new(invocation: Invocation) -> Self {
        Self {
            invocation,
            info_timeout_secs: DEFAULT_INFO_TIMEOUT_SECS,
        }
    }

    fn command_args(&self, tail: Vec<String>) -> Vec<String> {
        let mut args = self.invocation.base_args();
        args.extend(tail);
        args
    }
}

#[async_trait]
impl YtDlpBackend for ProcessBackend {
    fn name(&self) -> &'static str {
        match self.invocation {
            Invocation::Native { .. } => "cli-yt-dlp",
            Invocation::Python { .. } => "python-yt-dlp",
        }
    }

    async fn fetch_formats(
        &self,
        url: &str,
        query: &InfoQuery,
    ) -> Result<Vec<RawFormat>, DownloadError> {
        let args = self.command_args(query.to_args(url));
        debug!(
            backend = self.name(),
            "{} {}",
            self.invocation.program(),
            args.join(" ")
        );

        let output =
            run_output_with_timeout(self.invocation.program(), args, self.info_timeout_secs)
                .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(backend = self.name(), "format query failed: {}", stderr.trim());
            return Err(DownloadError::from(summarize_stderr(&stderr)));
        }

        let info: InfoDict = serde_json::from_slice(&output.stdout)
            .map_err(|e| DownloadError::ParseError(format!("Invalid JSON: {}", e)))?;

        let formats = info.into_formats();
        if formats.is_empty() {
            return Err(DownloadError::ParseError(format!(
                "No formats found for {}",
                url
            )));
        }

        debug!(backend = self.name(), count = formats.len(), "formats fetched");
        Ok(formats)
    }

    async fn download(
        &self,
        url: &str,
        options: &DownloadOptions,
    ) -> Result<DownloadOutcome, DownloadError> {
        let args = self.command_args(options.to_args(url));
        debug!(
            backend = self.name(),
            "{} {}",
            self.invocation.program(),
            args.join(" ")
        );

        let mut child = TokioCommand::new(self.invocation.program())
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                DownloadError::ToolNotFound(format!(
                    "Failed to start {}: {}",
                    self.invocation.program(),
                    e
                ))
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            DownloadError::ExecutionError("Failed to capture stdout".to_string())
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| {
            DownloadError::ExecutionError("Failed to capture stderr".to_string())
        })?;

        // Drain stderr concurrently so yt-dlp never blocks on a full pipe
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            stderr.read_to_end(&mut buf).await.map(|_| buf)
        });

        let mut outcome = DownloadOutcome::default();
        let mut reader = BufReader::new(stdout);
        let mut raw = Vec::new();
        loop {
            raw.clear();
            if reader.read_until(b'\n', &mut raw).await? == 0 {
                break;
            }
            // Titles may arrive in the console code page rather than UTF-8
            let decoded = String::from_utf8_lossy(&raw);
            let line = decoded.trim_end_matches(['\r', '\n']);

            if let Some(event) = parse_progress_line(line) {
                if let ProgressEvent::Finished { filename } = &event {
                    outcome.record(filename.clone());
                }
                for hook in &options.progress_hooks {
                    hook(&event);
                }
            } else if let Some(file) = parse_output_file(line) {
                debug!(%file, "post-processed output");
                outcome.record(file);
            } else {
                trace!("[yt-dlp] {}", line);
            }
        }

        let status = child.wait().await?;
        let stderr = join_pipe(stderr_task).await?;

        if status.success() {
            info!(backend = self.name(), %url, files = outcome.files.len(), "download finished");
            return Ok(outcome);
        }

        let stderr = String::from_utf8_lossy(&stderr);
        warn!(backend = self.name(), %url, "yt-dlp failed: {}", stderr.trim());
        Err(DownloadError::from(summarize_stderr(&stderr)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_invocation_prefix() {
        let inv = Invocation::Python {
            python: "python3".into(),
        };
        assert_eq!(inv.program(), "python3");
        assert_eq!(inv.base_args(), vec!["-m", "yt_dlp"]);
        assert_eq!(inv.label(), "python3 -m yt_dlp");
    }

    #[test]
    fn test_native_invocation_has_no_prefix() {
        let inv = Invocation::Native {
            path: "/usr/bin/yt-dlp".into(),
        };
        let backend = ProcessBackend::new(inv);
        assert_eq!(backend.name(), "cli-yt-dlp");
        assert_eq!(backend.command_args(vec!["-U".into()]), vec!["-U"]);
    }

    #[test]
    fn test_resolve_python_with_missing_interpreter() {
        let result = Invocation::resolve(ExtractorMode::Python, "ytdl-menu-no-such-python");
        assert!(matches!(result, Err(DownloadError::ToolNotFound(_))));
    }

    #[cfg(unix)]
    fn fake_ytdlp(dir: &tempfile::TempDir, body: &str) -> Invocation {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.path().join("yt-dlp");
        std::fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        Invocation::Native {
            path: path.to_string_lossy().to_string(),
        }
    }

    static HOOK_EVENTS: std::sync::Mutex<Vec<ProgressEvent>> = std::sync::Mutex::new(Vec::new());

    fn recording_hook(event: &ProgressEvent) {
        HOOK_EVENTS.lock().unwrap().push(event.clone());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_download_streams_progress_and_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("done");
        let script = format!(
            r#"printf 'Beyonc\351 - Halo\n'
printf '[ytdl-menu] downloading| 42.0%%|1.00MiB/s|00:05|clip.f137.mp4\n'
printf '[ytdl-menu] finished|100%%|NA|NA|clip.f137.mp4\n'
printf '[ytdl-menu] finished|100%%|NA|NA|clip.f140.m4a\n'
printf '[Merger] Merging formats into "clip.mp4"\n'
sleep 1
touch '{}'
exit 0
"#,
            marker.display()
        );
        let backend = ProcessBackend::new(fake_ytdlp(&dir, &script));
        let mut options = DownloadOptions::single("137+140", dir.path(), None, false);
        options.progress_hooks = vec![recording_hook];

        let outcome = backend
            .download("https://youtu.be/abc", &options)
            .await
            .unwrap();

        assert!(marker.is_file(), "yt-dlp was stopped before it exited");
        assert_eq!(
            outcome.files,
            vec!["clip.f137.mp4", "clip.f140.m4a", "clip.mp4"]
        );
        assert_eq!(outcome.primary_file(), Some("clip.mp4"));

        let events = HOOK_EVENTS.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            ProgressEvent::Downloading {
                percent: "42.0%".into(),
                speed: "1.00MiB/s".into(),
                eta: "00:05".into(),
            }
        );
        assert_eq!(
            events[2],
            ProgressEvent::Finished {
                filename: "clip.f140.m4a".into(),
            }
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_download_failure_classified_from_stderr() {
        let dir = tempfile::tempdir().unwrap();
        // Enough stderr to fill the pipe before the exit status is read
        let script = r#"i=0
while [ $i -lt 3000 ]; do
  echo "[debug] noise line $i padded so stderr outgrows the pipe buffer" >&2
  i=$((i+1))
done
printf '[ytdl-menu] downloading|10%%|NA|NA|x\n'
echo 'ERROR: [youtube] abc: HTTP Error 429: Too Many Requests' >&2
exit 1
"#;
        let backend = ProcessBackend::new(fake_ytdlp(&dir, script));
        let mut options = DownloadOptions::single("18", dir.path(), None, false);
        options.progress_hooks.clear();

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(30),
            backend.download("https://youtu.be/abc", &options),
        )
        .await
        .expect("download did not finish");

        match result {
            Err(DownloadError::BlockedByYouTube(msg)) => {
                assert!(msg.contains("429"));
                assert!(!msg.contains("noise"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_download_with_missing_binary_errors() {
        let backend = ProcessBackend::new(Invocation::Native {
            path: "ytdl-menu-definitely-missing-binary".into(),
        });
        let options = DownloadOptions::single(
            "18",
            std::path::Path::new("downloads"),
            None,
            false,
        );
        let result = backend.download("https://youtu.be/abc", &options).await;
        assert!(matches!(result, Err(DownloadError::ToolNotFound(_))));
    }
}

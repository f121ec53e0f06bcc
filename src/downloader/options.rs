// Option sets handed to yt-dlp
//
// `DownloadOptions` mirrors the option map yt-dlp consumes (outtmpl, format,
// postprocessors, progress_hooks, noplaylist, ...) and renders it into
// command-line arguments. `InfoQuery` is the metadata-only counterpart used
// for format listing.

use std::path::{Path, PathBuf};

use super::models::NetworkConfig;
use super::progress::{progress_hook, ProgressHook, PROGRESS_TEMPLATE};

/// Format selector meaning "best audio-only stream, else best overall"
pub const BEST_AUDIO: &str = "bestaudio/best";

/// Best video and audio merged, falling back to the best single file
pub const BEST_VIDEO_AUDIO: &str = "bestvideo+bestaudio/best";

pub const DEFAULT_TEMPLATE: &str = "%(title)s.%(ext)s";

pub const PLAYLIST_TEMPLATE: &str = "%(playlist)s/%(title)s.%(ext)s";

/// Post-processing step run by yt-dlp after the transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostProcessor {
    ExtractAudio { codec: String, quality: String },
}

impl PostProcessor {
    /// MP3 at 192 kbps
    pub fn mp3() -> Self {
        Self::ExtractAudio {
            codec: "mp3".to_string(),
            quality: "192".to_string(),
        }
    }

    /// yt-dlp's name for the post-processor
    pub fn key(&self) -> &'static str {
        match self {
            Self::ExtractAudio { .. } => "FFmpegExtractAudio",
        }
    }

    fn to_args(&self) -> Vec<String> {
        match self {
            Self::ExtractAudio { codec, quality } => vec![
                "--extract-audio".to_string(),
                "--audio-format".to_string(),
                codec.clone(),
                "--audio-quality".to_string(),
                format!("{}K", quality),
            ],
        }
    }
}

/// Everything yt-dlp needs to download one URL
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Directory everything is written under
    pub download_path: PathBuf,
    /// Output path template (download path joined with the filename template)
    pub outtmpl: PathBuf,
    /// Format selector
    pub format: String,
    pub postprocessors: Vec<PostProcessor>,
    pub progress_hooks: Vec<ProgressHook>,
    /// Restrict a playlist URL to the single referenced item
    pub noplaylist: bool,
    pub geo_bypass: bool,
    pub cookiefile: Option<PathBuf>,
    pub merge_output_format: Option<String>,
    pub network: NetworkConfig,
}

impl DownloadOptions {
    fn base(format: &str, download_path: &Path, template: &str) -> Self {
        Self {
            download_path: download_path.to_path_buf(),
            outtmpl: download_path.join(template),
            format: format.to_string(),
            postprocessors: Vec::new(),
            progress_hooks: vec![progress_hook],
            noplaylist: true,
            geo_bypass: true,
            cookiefile: None,
            merge_output_format: None,
            network: NetworkConfig::default(),
        }
    }

    /// Options for a single video or audio track.
    ///
    /// With `is_audio` the selector is forced to [`BEST_AUDIO`] and an MP3
    /// extraction step is attached; `format_id` is ignored in that case.
    pub fn single(
        format_id: &str,
        download_path: &Path,
        filename: Option<&str>,
        is_audio: bool,
    ) -> Self {
        let template = filename.filter(|f| !f.is_empty()).unwrap_or(DEFAULT_TEMPLATE);
        let format = if is_audio { BEST_AUDIO } else { format_id };

        let mut options = Self::base(format, download_path, template);
        if is_audio {
            options.postprocessors.push(PostProcessor::mp3());
        }
        options
    }

    /// Options for every entry of a playlist, nested under a folder named after it
    pub fn playlist(format_id: &str, download_path: &Path, filename: Option<&str>) -> Self {
        let template = filename.filter(|f| !f.is_empty()).unwrap_or(PLAYLIST_TEMPLATE);

        let mut options = Self::base(format_id, download_path, template);
        options.noplaylist = false;
        if format_id == BEST_AUDIO {
            options.postprocessors.push(PostProcessor::mp3());
        }
        options
    }

    pub fn with_cookiefile(mut self, cookiefile: Option<PathBuf>) -> Self {
        self.cookiefile = cookiefile;
        self
    }

    pub fn with_merge_output_format(mut self, container: &str) -> Self {
        self.merge_output_format = Some(container.to_string());
        self
    }

    pub fn with_network(mut self, network: NetworkConfig) -> Self {
        self.network = network;
        self
    }

    /// Short label stored in the history log
    pub fn format_label(&self) -> String {
        match self.postprocessors.first() {
            Some(PostProcessor::ExtractAudio { codec, .. }) => codec.clone(),
            None => self.format.clone(),
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_path
    }

    /// Render as yt-dlp command-line arguments, URL last
    pub fn to_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--newline".to_string(),
            "--no-colors".to_string(),
            "--progress-template".to_string(),
            PROGRESS_TEMPLATE.to_string(),
            "-f".to_string(),
            self.format.clone(),
            "-o".to_string(),
            self.outtmpl.to_string_lossy().to_string(),
        ];

        args.push(if self.noplaylist {
            "--no-playlist".to_string()
        } else {
            "--yes-playlist".to_string()
        });

        if self.geo_bypass {
            args.push("--geo-bypass".to_string());
        }

        if let Some(path) = &self.cookiefile {
            args.push("--cookies".to_string());
            args.push(path.to_string_lossy().to_string());
        }

        if let Some(container) = &self.merge_output_format {
            args.push("--merge-output-format".to_string());
            args.push(container.clone());
        }

        for pp in &self.postprocessors {
            args.extend(pp.to_args());
        }

        args.extend(self.network.to_args());
        args.push(url.to_string());
        args
    }
}

/// Metadata-only request used to list formats
#[derive(Debug, Clone, Default)]
pub struct InfoQuery {
    pub for_playlist: bool,
    pub cookiefile: Option<PathBuf>,
    pub network: NetworkConfig,
}

impl InfoQuery {
    pub fn to_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--dump-single-json".to_string(),
            "--skip-download".to_string(),
            "--no-warnings".to_string(),
            "--quiet".to_string(),
            "--geo-bypass".to_string(),
            "-f".to_string(),
            BEST_AUDIO.to_string(),
        ];

        if self.for_playlist {
            // Formats of the first entry stand in for the playlist
            args.push("--yes-playlist".to_string());
            args.push("--playlist-items".to_string());
            args.push("1".to_string());
        } else {
            args.push("--no-playlist".to_string());
        }

        if let Some(path) = &self.cookiefile {
            args.push("--cookies".to_string());
            args.push(path.to_string_lossy().to_string());
        }

        args.extend(self.network.to_args());
        args.push(url.to_string());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(args: &[String], flag: &str) -> Option<usize> {
        args.iter().position(|a| a == flag)
    }

    #[test]
    fn test_audio_overrides_format_id() {
        for format_id in ["22", "137+140", "", BEST_AUDIO] {
            let options = DownloadOptions::single(format_id, Path::new("downloads"), None, true);
            assert_eq!(options.format, BEST_AUDIO);
            assert_eq!(options.postprocessors, vec![PostProcessor::mp3()]);
            match &options.postprocessors[0] {
                PostProcessor::ExtractAudio { codec, quality } => {
                    assert_eq!(codec, "mp3");
                    assert_eq!(quality, "192");
                }
            }
            assert_eq!(options.postprocessors[0].key(), "FFmpegExtractAudio");
        }
    }

    #[test]
    fn test_video_uses_format_id_verbatim() {
        let options = DownloadOptions::single("22", Path::new("downloads"), None, false);
        assert_eq!(options.format, "22");
        assert!(options.postprocessors.is_empty());
        assert!(options.noplaylist);
        assert_eq!(options.outtmpl, Path::new("downloads").join(DEFAULT_TEMPLATE));
        assert_eq!(options.progress_hooks.len(), 1);
    }

    #[test]
    fn test_filename_override() {
        let options = DownloadOptions::single("18", Path::new("out"), Some("clip.mp4"), false);
        assert_eq!(options.outtmpl, Path::new("out").join("clip.mp4"));

        let empty = DownloadOptions::single("18", Path::new("out"), Some(""), false);
        assert_eq!(empty.outtmpl, Path::new("out").join(DEFAULT_TEMPLATE));
    }

    #[test]
    fn test_playlist_options() {
        let options = DownloadOptions::playlist("best", Path::new("downloads"), None);
        assert!(!options.noplaylist);
        assert!(options.postprocessors.is_empty());
        assert_eq!(options.outtmpl, Path::new("downloads").join(PLAYLIST_TEMPLATE));

        let audio = DownloadOptions::playlist(BEST_AUDIO, Path::new("downloads"), None);
        assert_eq!(audio.postprocessors, vec![PostProcessor::mp3()]);
    }

    #[test]
    fn test_args_rendering() {
        let options = DownloadOptions::single("x", Path::new("downloads"), None, true)
            .with_cookiefile(Some(PathBuf::from("cookies.txt")));
        let args = options.to_args("https://youtu.be/abc");

        assert_eq!(args.last().map(String::as_str), Some("https://youtu.be/abc"));
        let f = position(&args, "-f").unwrap();
        assert_eq!(args[f + 1], BEST_AUDIO);
        let q = position(&args, "--audio-quality").unwrap();
        assert_eq!(args[q + 1], "192K");
        let c = position(&args, "--cookies").unwrap();
        assert_eq!(args[c + 1], "cookies.txt");
        assert!(position(&args, "--no-playlist").is_some());
        assert!(position(&args, "--geo-bypass").is_some());
        assert_eq!(options.format_label(), "mp3");
    }

    #[test]
    fn test_merge_container() {
        let options = DownloadOptions::single(BEST_VIDEO_AUDIO, Path::new("d"), None, false)
            .with_merge_output_format("mp4");
        let args = options.to_args("u");
        let m = position(&args, "--merge-output-format").unwrap();
        assert_eq!(args[m + 1], "mp4");
        assert_eq!(options.format_label(), BEST_VIDEO_AUDIO);
    }

    #[test]
    fn test_info_query_args() {
        let query = InfoQuery {
            for_playlist: true,
            ..InfoQuery::default()
        };
        let args = query.to_args("https://youtube.com/playlist?list=PL1");
        assert!(position(&args, "--skip-download").is_some());
        assert!(position(&args, "--yes-playlist").is_some());
        assert!(position(&args, "--no-playlist").is_none());
    }
}

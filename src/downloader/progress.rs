// Progress events parsed from yt-dlp output and the console hook that renders them

use regex::Regex;
use std::io::{self, Write};

use crate::console::{paint, Color};
use crate::downloader::models::PLACEHOLDER;

/// Marker that prefixes every line printed through our progress template
pub const PROGRESS_MARKER: &str = "[ytdl-menu]";

/// Template handed to `--progress-template`; fields are separated by `|`
pub const PROGRESS_TEMPLATE: &str = "download:[ytdl-menu] %(progress.status)s|%(progress._percent_str)s|%(progress._speed_str)s|%(progress._eta_str)s|%(progress.filename)s";

const DEFAULT_PERCENT: &str = "0%";

/// Status event delivered to a progress hook during a download
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Downloading {
        percent: String,
        speed: String,
        eta: String,
    },
    Finished {
        filename: String,
    },
}

/// Callback registered in `DownloadOptions::progress_hooks`
pub type ProgressHook = fn(&ProgressEvent);

lazy_static::lazy_static! {
    static ref ALREADY_RE: Regex =
        Regex::new(r"^\[download\]\s+(.+?) has already been downloaded").unwrap();
    static ref MERGE_RE: Regex =
        Regex::new(r#"^\[Merger\]\s+Merging formats into "(.+)"$"#).unwrap();
    static ref EXTRACT_RE: Regex =
        Regex::new(r"^\[ExtractAudio\]\s+Destination:\s+(.+)$").unwrap();
}

/// yt-dlp prints `NA` for template fields it has no value for
fn field_or(value: Option<&str>, fallback: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() && v != "NA" => v.to_string(),
        _ => fallback.to_string(),
    }
}

/// Parse one stdout line into a progress event
pub fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    let line = line.trim_end_matches(['\r', '\n']);

    if let Some(rest) = line.strip_prefix(PROGRESS_MARKER) {
        let mut fields = rest.trim_start().splitn(5, '|');
        let status = fields.next()?.trim();
        let percent = fields.next();
        let speed = fields.next();
        let eta = fields.next();
        let filename = fields.next();

        return match status {
            "downloading" => Some(ProgressEvent::Downloading {
                percent: field_or(percent, DEFAULT_PERCENT),
                speed: field_or(speed, PLACEHOLDER),
                eta: field_or(eta, PLACEHOLDER),
            }),
            "finished" => Some(ProgressEvent::Finished {
                filename: field_or(filename, PLACEHOLDER),
            }),
            _ => None,
        };
    }

    ALREADY_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| ProgressEvent::Finished {
            filename: m.as_str().to_string(),
        })
}

/// Final output path announced by a post-processing step (merge or audio extraction)
pub fn parse_output_file(line: &str) -> Option<String> {
    let line = line.trim_end_matches(['\r', '\n']);
    MERGE_RE
        .captures(line)
        .or_else(|| EXTRACT_RE.captures(line))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Text of the single overwriting status line
pub fn format_downloading(percent: &str, speed: &str, eta: &str) -> String {
    format!("Downloading: {} at {} - ETA: {}", percent, speed, eta)
}

fn write_event(out: &mut impl Write, event: &ProgressEvent) -> io::Result<()> {
    match event {
        ProgressEvent::Downloading {
            percent,
            speed,
            eta,
        } => {
            let line = format_downloading(percent, speed, eta);
            write!(out, "\r{}", paint(&line, Color::Cyan))?;
            out.flush()
        }
        ProgressEvent::Finished { filename } => {
            let line = format!("Download completed: {}", filename);
            writeln!(out, "\n{}", paint(&line, Color::Green))
        }
    }
}

/// Console progress hook: overwrite one line while downloading, report each finished file
pub fn progress_hook(event: &ProgressEvent) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    // Best effort; a broken console must not abort the download
    let _ = write_event(&mut out, event);
}

// Interactive console front end
//
// Two entry points share one `Cli`: the full menu loop and the quick
// "URL, then V or A" prompt. Every download result comes back typed from the
// session and is rendered here; nothing in the loop aborts on failure.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::console::{paint, print_colored, Color};
use crate::downloader::backend::Invocation;
use crate::downloader::diagnostics::diagnose_error;
use crate::downloader::formats::{is_known_format, print_format_table};
use crate::downloader::options::{DownloadOptions, BEST_AUDIO, BEST_VIDEO_AUDIO};
use crate::downloader::tools;
use crate::downloader::{DownloadError, DownloadOutcome};
use crate::history::HistoryStore;
use crate::session::Session;

const MAX_READ_ERRORS: usize = 3;

const MENU: &[(&str, &str)] = &[
    ("1", "Download video"),
    ("2", "Download audio (MP3)"),
    ("3", "Download playlist"),
    ("4", "Update yt-dlp"),
    ("5", "Show download history"),
    ("6", "About"),
    ("7", "Exit"),
];

const BANNER: &str = r"
       __      ____
 __ __/ /_____/ / /______ _  ___ ___  __ __
/ // / __/ _  / /___/  ' \/ -_) _ \/ // /
\_, /\__/\_,_/_/   /_/_/_/\__/_//_/\_,_/
/___/
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Video,
    Audio,
    Playlist,
    Update,
    History,
    About,
    Exit,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::Video),
            "2" => Some(Self::Audio),
            "3" => Some(Self::Playlist),
            "4" => Some(Self::Update),
            "5" => Some(Self::History),
            "6" => Some(Self::About),
            "7" | "q" | "Q" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Map the playlist format prompt to a selector
pub fn playlist_selector(input: &str) -> String {
    match input.trim().to_lowercase().as_str() {
        "" | "best" => "best".to_string(),
        "a" | "audio" | "mp3" => BEST_AUDIO.to_string(),
        _ => input.trim().to_string(),
    }
}

/// Red error line shown when a download or listing fails
pub fn render_error(err: &DownloadError) -> String {
    paint(&format!("An error occurred: {}", err), Color::Red)
}

/// Yellow follow-up suggestion for a failure, if one applies
pub fn render_hint(err: &DownloadError) -> Option<String> {
    diagnose_error(&err.detail()).map(|reason| {
        let mut text = format!("{}. {}", reason.description(), reason.hint());
        if reason.cookies_might_help() {
            text.push_str(" A browser-exported cookies.txt (see --cookies) may help.");
        }
        paint(&text, Color::Yellow)
    })
}

enum Flow {
    Continue,
    Quit,
}

pub struct Cli<R> {
    session: Session,
    history: HistoryStore,
    config: AppConfig,
    invocation: Option<Invocation>,
    input: R,
}

impl<R: BufRead> Cli<R> {
    pub fn new(session: Session, config: AppConfig, input: R) -> Self {
        Self {
            session,
            history: HistoryStore::new(config.history_file.clone()),
            config,
            invocation: None,
            input,
        }
    }

    /// yt-dlp invocation used by the update and about actions
    pub fn with_invocation(mut self, invocation: Option<Invocation>) -> Self {
        self.invocation = invocation;
        self
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Read one trimmed line; `None` on end of input.
    ///
    /// An unreadable line (e.g. invalid UTF-8) is reported and asked for
    /// again, up to `MAX_READ_ERRORS` times in a row.
    fn prompt(&mut self, label: &str) -> Option<String> {
        let mut failures = 0;
        loop {
            print!("{}", paint(label, Color::Blue));
            let _ = io::stdout().flush();

            let mut line = String::new();
            match self.input.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => return Some(line.trim().to_string()),
                Err(e) => {
                    failures += 1;
                    warn!("could not read input: {}", e);
                    if failures >= MAX_READ_ERRORS {
                        print_colored("Too many unreadable lines, stopping.", Color::Red);
                        return None;
                    }
                    print_colored(&format!("Could not read input: {}", e), Color::Red);
                }
            }
        }
    }

    fn prompt_url(&mut self, label: &str) -> Option<Option<String>> {
        let url = self.prompt(label)?;
        if url.is_empty() {
            print_colored("URL cannot be empty.", Color::Red);
            return Some(None);
        }
        Some(Some(url))
    }

    fn prompt_dir(&mut self) -> Option<PathBuf> {
        let default = self.config.download_dir.clone();
        let label = format!("Enter download directory (default: {}): ", default.display());
        let dir = self.prompt(&label)?;
        Some(if dir.is_empty() {
            default
        } else {
            PathBuf::from(dir)
        })
    }

    fn prompt_filename(&mut self, label: &str) -> Option<Option<String>> {
        let name = self.prompt(label)?;
        Some((!name.is_empty()).then_some(name))
    }

    /// Print the outcome and record successful downloads in the history
    fn report(
        &self,
        url: &str,
        format_type: &str,
        fallback_name: &str,
        result: Result<DownloadOutcome, DownloadError>,
        success: &str,
        failure_prefix: Option<&str>,
    ) {
        match result {
            Ok(outcome) => {
                print_colored(success, Color::Green);
                let filename = outcome.primary_file().unwrap_or(fallback_name);
                let record = self.history.append(url, filename, format_type);
                info!(url = %record.url, file = %record.filename, "recorded download");
            }
            Err(err) => {
                match failure_prefix {
                    Some(prefix) => print_colored(&format!("{}: {}", prefix, err), Color::Red),
                    None => println!("{}", render_error(&err)),
                }
                if let Some(hint) = render_hint(&err) {
                    println!("{}", hint);
                }
            }
        }
    }

    // ---- extended menu ----

    pub async fn run_menu(&mut self) {
        print_banner();
        loop {
            print_menu();
            let Some(choice) = self.prompt("Choose an option (1-7): ") else {
                break;
            };

            let flow = match MenuChoice::parse(&choice) {
                Some(MenuChoice::Video) => self.video_action().await,
                Some(MenuChoice::Audio) => self.audio_action().await,
                Some(MenuChoice::Playlist) => self.playlist_action().await,
                Some(MenuChoice::Update) => self.update_action().await,
                Some(MenuChoice::History) => {
                    self.history.show(self.config.history_size);
                    Flow::Continue
                }
                Some(MenuChoice::About) => {
                    self.print_about();
                    Flow::Continue
                }
                Some(MenuChoice::Exit) => Flow::Quit,
                None => {
                    print_colored("Invalid choice, please enter a number from 1 to 7.", Color::Red);
                    Flow::Continue
                }
            };

            if let Flow::Quit = flow {
                break;
            }
        }
        print_colored("Goodbye!", Color::Cyan);
    }

    async fn video_action(&mut self) -> Flow {
        let Some(url) = self.prompt_url("Enter the video URL: ") else {
            return Flow::Quit;
        };
        let Some(url) = url else {
            return Flow::Continue;
        };

        let formats = match self.session.list_formats(&url, false).await {
            Ok(formats) => formats.to_vec(),
            Err(err) => {
                println!("{}", render_error(&err));
                if let Some(hint) = render_hint(&err) {
                    println!("{}", hint);
                }
                return Flow::Continue;
            }
        };
        print_format_table(&formats);

        let Some(format_id) = self.prompt("Enter the format ID (default: best): ") else {
            return Flow::Quit;
        };
        let format_id = if format_id.is_empty() {
            "best".to_string()
        } else {
            format_id
        };
        if format_id != "best" && !is_known_format(&formats, &format_id) {
            print_colored(
                &format!("Format '{}' is not in the list; passing it to yt-dlp as-is.", format_id),
                Color::Yellow,
            );
        }

        let Some(dir) = self.prompt_dir() else {
            return Flow::Quit;
        };
        let Some(filename) =
            self.prompt_filename("Enter file name (optional, leave blank to use the title): ")
        else {
            return Flow::Quit;
        };

        print_colored("Starting video download...", Color::Yellow);
        let result = self
            .session
            .download(&url, &format_id, &dir, filename.as_deref(), false)
            .await;
        let fallback = dir.join(filename.as_deref().unwrap_or("%(title)s.%(ext)s"));
        self.report(
            &url,
            &format_id,
            &fallback.to_string_lossy(),
            result,
            "Download successful!",
            None,
        );
        Flow::Continue
    }

    async fn audio_action(&mut self) -> Flow {
        let Some(url) = self.prompt_url("Enter the video URL: ") else {
            return Flow::Quit;
        };
        let Some(url) = url else {
            return Flow::Continue;
        };
        let Some(dir) = self.prompt_dir() else {
            return Flow::Quit;
        };
        let Some(filename) =
            self.prompt_filename("Enter file name (optional, leave blank to use the title): ")
        else {
            return Flow::Quit;
        };

        print_colored("Starting audio download...", Color::Yellow);
        let result = self
            .session
            .download(&url, BEST_AUDIO, &dir, filename.as_deref(), true)
            .await;
        let fallback = dir.join(filename.as_deref().unwrap_or("%(title)s.mp3"));
        self.report(
            &url,
            "mp3",
            &fallback.to_string_lossy(),
            result,
            "Download successful!",
            None,
        );
        Flow::Continue
    }

    async fn playlist_action(&mut self) -> Flow {
        let Some(url) = self.prompt_url("Enter the playlist URL: ") else {
            return Flow::Quit;
        };
        let Some(url) = url else {
            return Flow::Continue;
        };
        let Some(format) =
            self.prompt("Enter format (best / audio / a format ID, default: best): ")
        else {
            return Flow::Quit;
        };
        let format_id = playlist_selector(&format);

        let Some(dir) = self.prompt_dir() else {
            return Flow::Quit;
        };
        let Some(template) = self.prompt_filename(
            "Enter file name template (optional, default: %(playlist)s/%(title)s.%(ext)s): ",
        ) else {
            return Flow::Quit;
        };

        print_colored("Starting playlist download...", Color::Yellow);
        let result = self
            .session
            .download_playlist(&url, &format_id, &dir, template.as_deref())
            .await;
        let format_type = if format_id == BEST_AUDIO {
            "mp3"
        } else {
            format_id.as_str()
        };
        self.report(
            &url,
            format_type,
            &dir.to_string_lossy(),
            result,
            "Playlist download successful!",
            None,
        );
        Flow::Continue
    }

    async fn update_action(&mut self) -> Flow {
        let Some(invocation) = self.invocation.clone() else {
            print_colored(
                "yt-dlp was not found. Install it with `pip install yt-dlp` or from https://github.com/yt-dlp/yt-dlp",
                Color::Red,
            );
            return Flow::Continue;
        };

        print_colored("Updating yt-dlp...", Color::Yellow);
        match tools::update_ytdlp(&invocation).await {
            Ok(message) => print_colored(&message, Color::Green),
            Err(err) => print_colored(&format!("Update failed: {}", err), Color::Red),
        }
        Flow::Continue
    }

    fn print_about(&self) {
        let backend = match &self.invocation {
            Some(inv) => {
                let info = tools::get_tool_info(inv);
                format!(
                    "{} {}",
                    info.name,
                    info.version.unwrap_or_else(|| "(version unknown)".to_string())
                )
            }
            None => "not found".to_string(),
        };
        debug!(backend = self.session.backend_name(), "about panel");

        let rule = "=".repeat(60);
        print_colored(&rule, Color::Cyan);
        print_colored("About", Color::Cyan);
        print_colored(&rule, Color::Cyan);
        println!("Version: {}", env!("CARGO_PKG_VERSION"));
        println!("yt-dlp:  {}", backend);
        println!();
        println!("Downloads videos, audio (MP3) and whole playlists from YouTube.");
        println!("You can pick the exact stream format for single videos.");
        println!();
        println!("How to use:");
        println!("  1. Pick video, audio or playlist from the menu.");
        println!("  2. Paste the URL.");
        println!("  3. For videos, choose a format ID from the list that is shown.");
        println!("  4. For playlists, give a format (best, audio or an ID) without a list.");
        println!("  5. Enter a download folder and file name if you want.");
        println!();
        println!("If something goes wrong:");
        println!("  - Check your internet connection and the URL.");
        println!("  - Make sure yt-dlp and ffmpeg are installed.");
        println!("  - Make sure the format ID exists for that video.");
        println!("  - Put cookies.txt next to the program for age-restricted videos.");
        println!("  - Update yt-dlp with option 4.");
        println!(
            "History file: {}",
            self.history.path().display()
        );
        print_colored(&rule, Color::Cyan);
    }

    // ---- quick prompt ----

    pub async fn run_quick(&mut self) {
        let Some(url) = self.prompt("Enter YouTube URL: ") else {
            return;
        };
        if url.is_empty() {
            print_colored("URL cannot be empty.", Color::Red);
            return;
        }

        let Some(choice) = self.prompt("Press V To Download Video Press A For Audio \n") else {
            return;
        };
        let dir = self.config.download_dir.clone();

        if choice.to_lowercase() == "v" {
            print_colored("Starting video download with yt-dlp...", Color::Yellow);
            let options = DownloadOptions::single(BEST_VIDEO_AUDIO, &dir, None, false)
                .with_merge_output_format("mp4");
            let result = self.session.execute(&url, options).await;
            let fallback = dir.join("%(title)s.mp4");
            self.report(
                &url,
                BEST_VIDEO_AUDIO,
                &fallback.to_string_lossy(),
                result,
                "Download complete!",
                Some("Error downloading video"),
            );
        } else {
            print_colored("Starting audio download with yt-dlp...", Color::Yellow);
            let result = self.session.download(&url, BEST_AUDIO, &dir, None, true).await;
            let fallback = dir.join("%(title)s.mp3");
            self.report(
                &url,
                "mp3",
                &fallback.to_string_lossy(),
                result,
                "Audio download complete!",
                Some("Error downloading audio"),
            );
        }
    }
}

fn print_banner() {
    print_colored(BANNER, Color::Cyan);
}

fn print_menu() {
    println!();
    print_colored("Main menu:", Color::Cyan);
    for (key, label) in MENU {
        println!("  {} {}", paint(key, Color::Green), label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::options::PostProcessor;
    use crate::downloader::stub::{StubBackend, StubCalls};
    use std::io::Cursor;

    fn cli_for(
        stub: StubBackend,
        dir: &tempfile::TempDir,
        script: &str,
    ) -> (Cli<Cursor<Vec<u8>>>, StubCalls) {
        let calls = stub.calls.clone();
        let config = AppConfig {
            download_dir: dir.path().join("downloads"),
            history_file: dir.path().join("download_history.json"),
            cookie_file: dir.path().join("cookies.txt"),
            ..AppConfig::default()
        };
        let session = Session::new(Box::new(stub));
        let input = Cursor::new(script.as_bytes().to_vec());
        (Cli::new(session, config, input), calls)
    }

    #[test]
    fn test_menu_choice_parse() {
        assert_eq!(MenuChoice::parse("1"), Some(MenuChoice::Video));
        assert_eq!(MenuChoice::parse(" 3 "), Some(MenuChoice::Playlist));
        assert_eq!(MenuChoice::parse("7"), Some(MenuChoice::Exit));
        assert_eq!(MenuChoice::parse("8"), None);
        assert_eq!(MenuChoice::parse(""), None);
    }

    #[test]
    fn test_playlist_selector() {
        assert_eq!(playlist_selector(""), "best");
        assert_eq!(playlist_selector("Audio"), BEST_AUDIO);
        assert_eq!(playlist_selector("mp3"), BEST_AUDIO);
        assert_eq!(playlist_selector(" 18 "), "18");
    }

    #[test]
    fn test_render_error_contains_message() {
        let err = DownloadError::from("timeout");
        let line = render_error(&err);
        assert!(line.starts_with("\x1b[91m"));
        assert!(line.contains("An error occurred"));
        assert!(line.contains("timeout"));
        assert!(render_hint(&err).unwrap().contains("Network timeout"));
    }

    #[test]
    fn test_hint_mentions_cookies_when_they_help() {
        let blocked = DownloadError::from("ERROR: Sign in to confirm you're not a bot");
        assert!(render_hint(&blocked).unwrap().contains("cookies.txt"));

        let timeout = DownloadError::from("timeout");
        assert!(!render_hint(&timeout).unwrap().contains("cookies.txt"));
    }

    #[tokio::test]
    async fn test_unreadable_line_is_asked_again() {
        let dir = tempfile::tempdir().unwrap();
        let (mut cli, calls) = cli_for(StubBackend::succeeding(), &dir, "");
        cli.input = Cursor::new(b"\xff\xfe\n2\nhttps://youtu.be/abc\n\n\n7\n".to_vec());

        cli.run_menu().await;

        assert_eq!(calls.download_count(), 1);
        assert_eq!(cli.history().load().len(), 1);
    }

    #[tokio::test]
    async fn test_repeated_read_errors_end_the_menu() {
        let dir = tempfile::tempdir().unwrap();
        let (mut cli, calls) = cli_for(StubBackend::succeeding(), &dir, "");
        cli.input = Cursor::new(b"\xff\n\xff\n\xff\n2\nhttps://youtu.be/abc\n\n\n7\n".to_vec());

        cli.run_menu().await;

        assert_eq!(calls.download_count(), 0);
    }

    #[tokio::test]
    async fn test_audio_from_menu_records_history() {
        let dir = tempfile::tempdir().unwrap();
        let (mut cli, calls) = cli_for(
            StubBackend::succeeding(),
            &dir,
            "2\nhttps://youtu.be/abc\n\n\n5\n7\n",
        );

        cli.run_menu().await;

        assert_eq!(calls.download_count(), 1);
        assert_eq!(
            calls.seen.lock().unwrap()[0].postprocessors,
            vec![PostProcessor::mp3()]
        );
        assert!(dir.path().join("downloads").is_dir());

        let records = cli.history().load();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].url, "https://youtu.be/abc");
        assert_eq!(records[0].filename, "downloads/Clip.mp4");
        assert_eq!(records[0].format_type, "mp3");
    }

    #[tokio::test]
    async fn test_video_lists_formats_then_downloads_choice() {
        let dir = tempfile::tempdir().unwrap();
        let (mut cli, calls) = cli_for(
            StubBackend::succeeding(),
            &dir,
            "1\nhttps://youtu.be/abc\n18\n\nclip.mp4\n1\nhttps://youtu.be/abc\n140\n\n\n7\n",
        );

        cli.run_menu().await;

        assert_eq!(calls.fetch_count(), 1);
        assert_eq!(calls.download_count(), 2);
        let seen = calls.seen.lock().unwrap();
        assert_eq!(seen[0].format, "18");
        assert_eq!(seen[0].outtmpl, dir.path().join("downloads").join("clip.mp4"));
        assert_eq!(seen[1].format, "140");
        assert_eq!(cli.history().load().len(), 2);
    }

    #[tokio::test]
    async fn test_failures_return_to_menu() {
        let dir = tempfile::tempdir().unwrap();
        let (mut cli, calls) = cli_for(
            StubBackend::failing("timeout"),
            &dir,
            "1\nhttps://youtu.be/abc\n2\nhttps://youtu.be/abc\n\n\n9\n7\n",
        );

        cli.run_menu().await;

        assert_eq!(calls.fetch_count(), 1);
        assert_eq!(calls.download_count(), 1);
        assert!(cli.history().load().is_empty());
    }

    #[tokio::test]
    async fn test_menu_stops_at_end_of_input() {
        let dir = tempfile::tempdir().unwrap();
        let (mut cli, calls) = cli_for(StubBackend::succeeding(), &dir, "3\nhttps://youtube.com/playlist?list=PL1\n");

        cli.run_menu().await;

        assert_eq!(calls.download_count(), 0);
    }

    #[tokio::test]
    async fn test_playlist_audio_from_menu() {
        let dir = tempfile::tempdir().unwrap();
        let (mut cli, calls) = cli_for(
            StubBackend::succeeding(),
            &dir,
            "3\nhttps://youtube.com/playlist?list=PL1\naudio\n\n\n7\n",
        );

        cli.run_menu().await;

        assert_eq!(calls.fetch_count(), 0);
        let seen = calls.seen.lock().unwrap();
        assert_eq!(seen[0].format, BEST_AUDIO);
        assert!(!seen[0].noplaylist);
        assert_eq!(cli.history().load()[0].format_type, "mp3");
    }

    #[tokio::test]
    async fn test_quick_video_merges_to_mp4() {
        let dir = tempfile::tempdir().unwrap();
        let (mut cli, calls) = cli_for(StubBackend::succeeding(), &dir, "https://youtu.be/abc\nV\n");

        cli.run_quick().await;

        let seen = calls.seen.lock().unwrap();
        assert_eq!(seen[0].format, BEST_VIDEO_AUDIO);
        assert_eq!(seen[0].merge_output_format.as_deref(), Some("mp4"));
        assert_eq!(cli.history().load().len(), 1);
    }

    #[tokio::test]
    async fn test_quick_anything_else_is_audio() {
        let dir = tempfile::tempdir().unwrap();
        let (mut cli, calls) = cli_for(StubBackend::failing("timeout"), &dir, "https://youtu.be/abc\nx\n");

        cli.run_quick().await;

        let seen = calls.seen.lock().unwrap();
        assert_eq!(seen[0].format, BEST_AUDIO);
        assert!(cli.history().load().is_empty());
    }
}

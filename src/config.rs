// Command-line and environment configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::downloader::backend::ExtractorMode;
use crate::downloader::models::NetworkConfig;
use crate::history::{DEFAULT_HISTORY_FILE, DEFAULT_SHOW_COUNT};

pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";

pub const DEFAULT_COOKIE_FILE: &str = "cookies.txt";

#[derive(Parser, Debug, Clone)]
#[command(name = "ytdl-menu")]
#[command(version)]
#[command(about = "Download YouTube videos, audio and playlists through yt-dlp", long_about = None)]
pub struct AppConfig {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Default directory for downloads
    #[arg(long, env = "YTDL_MENU_DOWNLOAD_DIR", default_value = DEFAULT_DOWNLOAD_DIR)]
    pub download_dir: PathBuf,

    /// JSON file the download history is kept in
    #[arg(long, env = "YTDL_MENU_HISTORY_FILE", default_value = DEFAULT_HISTORY_FILE)]
    pub history_file: PathBuf,

    /// Netscape cookie file handed to yt-dlp when it exists
    #[arg(long = "cookies", env = "YTDL_MENU_COOKIES", default_value = DEFAULT_COOKIE_FILE)]
    pub cookie_file: PathBuf,

    /// How to run yt-dlp
    #[arg(long, env = "YTDL_MENU_MODE", value_enum, default_value_t = ExtractorMode::Auto)]
    pub mode: ExtractorMode,

    /// Python interpreter for the yt_dlp module
    #[arg(long, env = "YTDLP_PYTHON", default_value = "python3")]
    pub python: String,

    /// Proxy URL passed to yt-dlp (e.g. socks5://127.0.0.1:1080)
    #[arg(long, env = "YTDL_MENU_PROXY")]
    pub proxy: Option<String>,

    /// Socket timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub socket_timeout: u32,

    /// Number of entries shown by the history view
    #[arg(long, default_value_t = DEFAULT_SHOW_COUNT)]
    pub history_size: usize,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ask for a URL and V/A, then download with default settings
    Quick,
    /// Full interactive menu (default)
    Menu,
}

impl AppConfig {
    pub fn network(&self) -> NetworkConfig {
        NetworkConfig {
            proxy: self.proxy.clone(),
            timeout: Some(self.socket_timeout),
        }
    }

    /// Log filter used when RUST_LOG is not set
    pub fn default_log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "ytdl_menu=warn,ytdl_menu_lib=warn",
            1 => "ytdl_menu=info,ytdl_menu_lib=info",
            2 => "ytdl_menu=debug,ytdl_menu_lib=debug",
            _ => "ytdl_menu=trace,ytdl_menu_lib=trace",
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            command: None,
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            history_file: PathBuf::from(DEFAULT_HISTORY_FILE),
            cookie_file: PathBuf::from(DEFAULT_COOKIE_FILE),
            mode: ExtractorMode::Auto,
            python: "python3".to_string(),
            proxy: None,
            socket_timeout: 30,
            history_size: DEFAULT_SHOW_COUNT,
            verbose: 0,
        }
    }
}

pub mod cli;
pub mod config;
pub mod console;
pub mod downloader;
pub mod history;
pub mod session;

use std::io;
use tracing::{info, warn};

use cli::Cli;
use config::{AppConfig, Command};
use crate::console::{print_colored, Color};
use downloader::{Invocation, ProcessBackend};
use session::Session;

/// Resolve yt-dlp, build the session and run the chosen front end
pub async fn run(config: AppConfig) {
    let resolved = match Invocation::resolve(config.mode, &config.python) {
        Ok(invocation) => {
            info!(yt_dlp = %invocation.label(), "using yt-dlp");
            Some(invocation)
        }
        Err(e) => {
            warn!("could not locate yt-dlp: {}", e);
            print_colored(
                "Warning: yt-dlp was not found; downloads will fail until it is installed.",
                Color::Yellow,
            );
            None
        }
    };

    let backend_invocation = resolved.clone().unwrap_or(Invocation::Native {
        path: "yt-dlp".to_string(),
    });
    let session = Session::new(Box::new(ProcessBackend::new(backend_invocation)))
        .with_network(config.network())
        .with_cookiefile(Some(config.cookie_file.clone()));

    let command = config.command.clone().unwrap_or(Command::Menu);
    let stdin = io::stdin();
    let mut cli = Cli::new(session, config, stdin.lock()).with_invocation(resolved);

    match command {
        Command::Quick => cli.run_quick().await,
        Command::Menu => cli.run_menu().await,
    }
}

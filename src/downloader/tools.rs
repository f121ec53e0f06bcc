use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, info};

use super::backend::Invocation;
use super::errors::DownloadError;

#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub version: Option<String>,
}

/// Locate a native yt-dlp binary
pub fn find_ytdlp() -> Option<String> {
    let binary_name = if cfg!(target_os = "windows") {
        "yt-dlp.exe"
    } else {
        "yt-dlp"
    };

    // 1. Try common paths first
    let mut common_paths = vec![
        format!("/opt/homebrew/bin/{}", binary_name),
        format!("/usr/local/bin/{}", binary_name),
        format!("/usr/bin/{}", binary_name),
    ];
    if let Some(home) = dirs::home_dir() {
        common_paths.push(home.join(".local/bin").join(binary_name).to_string_lossy().to_string());
    }

    for path in common_paths {
        if Path::new(&path).exists() {
            return Some(path);
        }
    }

    // 2. Try PATH
    let locator = if cfg!(target_os = "windows") { "where" } else { "which" };
    if let Ok(output) = Command::new(locator).arg(binary_name).output() {
        if output.status.success() {
            let path = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("")
                .trim()
                .to_string();
            if !path.is_empty() {
                return Some(path);
            }
        }
    }

    None
}

/// Check that `python` can import `module`
pub fn python_has_module(python: &str, module: &str) -> bool {
    let code = format!("import {}", module);
    match Command::new(python)
        .args(["-c", &code])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .output()
    {
        Ok(out) => out.status.success(),
        Err(_) => false,
    }
}

/// `yt-dlp --version` through the given invocation
pub fn get_version(invocation: &Invocation) -> Option<String> {
    let mut args = invocation.base_args();
    args.push("--version".to_string());

    match Command::new(invocation.program()).args(&args).output() {
        Ok(output) if output.status.success() => {
            let out = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if out.is_empty() {
                None
            } else {
                Some(out)
            }
        }
        _ => None,
    }
}

pub fn get_tool_info(invocation: &Invocation) -> ToolInfo {
    ToolInfo {
        name: invocation.label(),
        version: get_version(invocation),
    }
}

/// Command that upgrades yt-dlp for the way it is installed
pub fn update_command(invocation: &Invocation) -> (String, Vec<String>) {
    match invocation {
        Invocation::Python { python } => (
            python.clone(),
            vec![
                "-m".to_string(),
                "pip".to_string(),
                "install".to_string(),
                "-U".to_string(),
                "yt-dlp".to_string(),
            ],
        ),
        Invocation::Native { path } if path.starts_with("/opt/homebrew") || path.contains("/Cellar/") => (
            "brew".to_string(),
            vec!["upgrade".to_string(), "yt-dlp".to_string()],
        ),
        Invocation::Native { path } => (path.clone(), vec!["-U".to_string()]),
    }
}

/// Run the upgrade with the console attached so the user sees its output
pub async fn update_ytdlp(invocation: &Invocation) -> Result<String, DownloadError> {
    let (program, args) = update_command(invocation);
    debug!(%program, args = %args.join(" "), "updating yt-dlp");

    let status = tokio::process::Command::new(&program)
        .args(&args)
        .status()
        .await
        .map_err(|e| DownloadError::ToolNotFound(format!("Failed to run {}: {}", program, e)))?;

    if status.success() {
        let version = get_version(invocation).unwrap_or_else(|| "unknown".to_string());
        info!(%version, "yt-dlp updated");
        Ok(format!("yt-dlp is up to date (version {})", version))
    } else {
        Err(DownloadError::ExecutionError(format!(
            "{} {} exited with {}",
            program,
            args.join(" "),
            status
        )))
    }
}

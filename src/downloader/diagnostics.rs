// Failure diagnostics
//
// Maps yt-dlp error text to a likely cause and a short suggestion that the
// menu prints under the error line.

/// Likely reasons a yt-dlp request failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockingReason {
    /// HTTP 403 Forbidden
    Http403Forbidden,
    /// Age-restricted content requiring login
    AgeRestricted,
    /// Geographic restriction
    GeoBlocked,
    /// Network timeout (soft IP block or bad connection)
    NetworkTimeout,
    /// HTTP 429 or similar
    RateLimited,
    /// "Sign in to confirm you're not a bot"
    BotDetection,
    PrivateVideo,
    /// Deleted, removed or otherwise gone
    VideoUnavailable,
    /// DRM / Premium / paid content
    DrmProtected,
    MembersOnly,
    /// The chosen format id does not exist for this video
    FormatUnavailable,
    /// ffmpeg missing for merging or audio extraction
    FfmpegMissing,
    Unknown,
}

impl BlockingReason {
    /// Check if cookies might help
    pub fn cookies_might_help(&self) -> bool {
        matches!(
            self,
            Self::Http403Forbidden
                | Self::AgeRestricted
                | Self::BotDetection
                | Self::PrivateVideo
                | Self::MembersOnly
        )
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Http403Forbidden => "Access denied (HTTP 403)",
            Self::AgeRestricted => "Age-restricted content",
            Self::GeoBlocked => "Geographic restriction",
            Self::NetworkTimeout => "Network timeout",
            Self::RateLimited => "Rate limited by YouTube",
            Self::BotDetection => "Bot detection triggered",
            Self::PrivateVideo => "Private video",
            Self::VideoUnavailable => "Video unavailable",
            Self::DrmProtected => "DRM-protected content",
            Self::MembersOnly => "Members-only content",
            Self::FormatUnavailable => "Requested format is not available",
            Self::FfmpegMissing => "ffmpeg not found",
            Self::Unknown => "Unknown error",
        }
    }

    /// What the user can try next
    pub fn hint(&self) -> &'static str {
        match self {
            Self::Http403Forbidden | Self::BotDetection => {
                "Export cookies from a logged-in browser to cookies.txt, or update yt-dlp (menu option 4)."
            }
            Self::AgeRestricted | Self::PrivateVideo | Self::MembersOnly => {
                "Put cookies.txt from an account that has access into the working directory."
            }
            Self::GeoBlocked => "Try a proxy or VPN in a region where the video is available.",
            Self::NetworkTimeout => "Check your internet connection and try again.",
            Self::RateLimited => "Wait a few minutes before trying again.",
            Self::VideoUnavailable => "The video was removed or made private.",
            Self::DrmProtected => "This content is DRM-protected and cannot be downloaded.",
            Self::FormatUnavailable => "Pick a format id from the list shown before the prompt.",
            Self::FfmpegMissing => "Install ffmpeg; it is needed to merge streams and convert audio.",
            Self::Unknown => "Check the URL, then try updating yt-dlp (menu option 4).",
        }
    }
}

/// Analyze error message and return the likely reason
pub fn diagnose_error(error: &str) -> Option<BlockingReason> {
    let lower = error.to_lowercase();

    if lower.contains("drm")
        || lower.contains("widevine")
        || lower.contains("requires purchase")
        || lower.contains("youtube premium")
    {
        return Some(BlockingReason::DrmProtected);
    }

    if lower.contains("members only")
        || lower.contains("members-only")
        || lower.contains("join this channel")
    {
        return Some(BlockingReason::MembersOnly);
    }

    if lower.contains("requested format is not available") {
        return Some(BlockingReason::FormatUnavailable);
    }

    if lower.contains("ffmpeg") || lower.contains("ffprobe") {
        return Some(BlockingReason::FfmpegMissing);
    }

    if lower.contains("age-restricted") || lower.contains("confirm your age") {
        return Some(BlockingReason::AgeRestricted);
    }

    if lower.contains("private video") || lower.contains("video is private") {
        return Some(BlockingReason::PrivateVideo);
    }

    if lower.contains("video unavailable")
        || lower.contains("video has been removed")
        || lower.contains("no longer available")
    {
        return Some(BlockingReason::VideoUnavailable);
    }

    if lower.contains("not available in your country") || lower.contains("geo restriction") {
        return Some(BlockingReason::GeoBlocked);
    }

    if lower.contains("429") || lower.contains("too many requests") || lower.contains("rate limit") {
        return Some(BlockingReason::RateLimited);
    }

    if lower.contains("not a bot") || lower.contains("captcha") || lower.contains("unusual traffic") {
        return Some(BlockingReason::BotDetection);
    }

    if lower.contains("403") || lower.contains("forbidden") {
        return Some(BlockingReason::Http403Forbidden);
    }

    if lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("connection refused")
        || lower.contains("network is unreachable")
    {
        return Some(BlockingReason::NetworkTimeout);
    }

    if !error.trim().is_empty() {
        return Some(BlockingReason::Unknown);
    }

    None
}

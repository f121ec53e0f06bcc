// yt-dlp integration: option building, process backend, progress and diagnostics

pub mod backend;
pub mod diagnostics;
pub mod errors;
pub mod formats;
pub mod models;
pub mod options;
pub mod progress;
pub mod tools;
pub mod traits;
pub mod utils;

#[cfg(test)]
pub mod stub;

pub use backend::{ExtractorMode, Invocation, ProcessBackend};
pub use errors::DownloadError;
pub use models::{DownloadOutcome, FormatContext, FormatDescriptor, FormatKind, NetworkConfig};
pub use options::{DownloadOptions, InfoQuery};
pub use progress::ProgressEvent;
pub use traits::YtDlpBackend;

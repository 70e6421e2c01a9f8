use crate::humanize::ByteSize;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Where the resource catalog lives
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("catalog.toml")
}

/// Bounded fetcher settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetcherConfig {
    /// Maximum number of downloads in flight at once
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Whole-request timeout; 0 disables it
    #[serde(default)]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Buffer size between the response stream and the destination file
    #[serde(default = "default_write_buffer")]
    pub write_buffer: ByteSize,
    /// Delete the destination file when its download fails
    #[serde(default)]
    pub remove_partial: bool,
}

impl FetcherConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: 0,
            user_agent: default_user_agent(),
            write_buffer: default_write_buffer(),
            remove_partial: false,
        }
    }
}

/// Host parallelism, falling back to a single worker when it cannot be queried
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    concat!("fetchkit/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_write_buffer() -> ByteSize {
    ByteSize(64 * 1024) // 64 KB
}

/// What to do when two resources in one batch target the same file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Refuse the whole batch before any download starts
    #[default]
    Reject,
    /// Let both run; the last writer wins
    Allow,
}

/// Destination settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Directory that relative catalog filenames are resolved against
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default)]
    pub duplicate_destinations: DuplicatePolicy,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            duplicate_destinations: DuplicatePolicy::default(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

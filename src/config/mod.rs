pub mod parser;

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Default size threshold in bytes (100 MiB, the usual hosting limit per file).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Default pause between batches, in seconds.
pub const DEFAULT_DELAY_SECS: u64 = 2;

/// Default commit message template; `{count}` becomes the batch length.
pub const DEFAULT_COMMIT_MESSAGE: &str = "Auto upload next {count} items";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub git: GitSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Files per commit; the prompt is skipped when set
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
    #[serde(default = "default_tracker_file")]
    pub tracker_file: String,
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
}

/// How failed git calls are treated during a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log failures and record the batch anyway
    #[default]
    Lenient,
    /// Abort before recording when commit or push fails
    Strict,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitSettings {
    #[serde(default = "default_program")]
    pub program: String,
    /// Remote to push to; plain `git push` when unset
    #[serde(default)]
    pub remote: Option<String>,
    /// Branch to push; only meaningful together with `remote`
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default = "default_push")]
    pub push: bool,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_delay_secs() -> u64 {
    DEFAULT_DELAY_SECS
}

fn default_tracker_file() -> String {
    crate::DEFAULT_TRACKER_FILE.to_string()
}

fn default_commit_message() -> String {
    DEFAULT_COMMIT_MESSAGE.to_string()
}

fn default_program() -> String {
    "git".to_string()
}

const fn default_push() -> bool {
    true
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            batch_size: None,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            delay_secs: DEFAULT_DELAY_SECS,
            tracker_file: default_tracker_file(),
            commit_message: default_commit_message(),
        }
    }
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            program: default_program(),
            remote: None,
            branch: None,
            push: true,
            failure_policy: FailurePolicy::Lenient,
        }
    }
}

impl UploadConfig {
    /// Pause inserted after every batch
    #[must_use]
    pub const fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    /// Renders the commit message for a batch of `count` files
    #[must_use]
    pub fn commit_message_for(&self, count: usize) -> String {
        self.commit_message.replace("{count}", &count.to_string())
    }
}

impl Config {
    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file does not exist or cannot be read
    /// - The file contains invalid TOML
    /// - A value fails validation
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Configuration file not found: {}", path.display());
        }

        parser::parse_config_file(path)
    }
}

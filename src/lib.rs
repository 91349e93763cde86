#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
#![allow(clippy::arithmetic_side_effects)] // Counters over file lists cannot overflow
#![allow(clippy::float_arithmetic)] // Required for ETA and throughput figures

//! # batchpush - Batched git uploads
//!
//! batchpush takes the untracked files of a git working directory and commits
//! them in fixed-size batches, pushing after every commit. Progress survives
//! restarts through a plain-text tracker file (`.upload_tracker`) that lists
//! every path already committed by the tool.
//!
//! ## Architecture
//!
//! - [`filter`]: size threshold applied to every candidate
//! - [`tracker`]: append-only ledger of committed paths
//! - [`scanner`]: untracked-file listing and candidate computation
//! - [`committer`]: stage, commit and push one batch
//! - [`upload`]: the scan/commit/record/report loop
//! - [`prompt`]: batch-size validation and the interactive prompt
//! - [`git`]: subprocess runner behind the [`git::VersionControl`] trait
//! - [`config`]: TOML configuration
//! - [`lock`]: per-directory run lock
//! - [`output`]: styled terminal output and progress rendering
//!
//! ## Example Usage
//!
//! ```no_run
//! use batchpush::UploadContext;
//! use batchpush::git::GitCli;
//! use batchpush::upload::Uploader;
//! use std::num::NonZeroUsize;
//!
//! # fn main() -> anyhow::Result<()> {
//! let ctx = UploadContext::new(".".into(), None)?;
//! let git = GitCli::new(&ctx.config.git.program, &ctx.work_dir)?;
//! let summary = Uploader::new(&ctx, &git).run(NonZeroUsize::new(25).unwrap())?;
//! println!("{} files in {} commits", summary.files, summary.batches);
//! # Ok(())
//! # }
//! ```

/// Command-line interface definitions (argument parsing structures).
pub mod cli;

/// Batch staging, commit and push.
pub mod committer;

/// Configuration parsing, validation, and management.
pub mod config;

/// File size threshold filtering.
pub mod filter;

/// Git subprocess access.
pub mod git;

/// Run locking to prevent concurrent uploads from the same directory.
pub mod lock;

/// Output formatting and progress display.
pub mod output;

/// Batch-size prompt and validation.
pub mod prompt;

/// Untracked file listing and candidate computation.
pub mod scanner;

/// Persistent ledger of committed paths.
pub mod tracker;

#[cfg(test)]
pub(crate) mod test_utils;

/// The upload loop.
pub mod upload;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Current version of the batchpush binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracker file name, relative to the working directory.
pub const DEFAULT_TRACKER_FILE: &str = ".upload_tracker";

/// Per-directory configuration file name.
pub const LOCAL_CONFIG_FILE: &str = ".batchpush.toml";

/// User configuration file path relative to the home directory.
pub const DEFAULT_CONFIG_PATH: &str = ".config/batchpush/config.toml";

/// Environment variable that points at an explicit configuration file.
pub const CONFIG_ENV: &str = "BATCHPUSH_CONFIG";

/// Central context for an upload run.
///
/// Holds the working directory and the resolved configuration. Every
/// component receives what it needs from here instead of reading globals.
#[derive(Debug, Clone)]
pub struct UploadContext {
    /// Working directory (the git checkout being uploaded).
    pub work_dir: PathBuf,

    /// Configuration file the settings came from, if any.
    pub config_path: Option<PathBuf>,

    /// Loaded configuration settings.
    pub config: config::Config,
}

impl UploadContext {
    /// Creates a context for `work_dir`, resolving the configuration file.
    ///
    /// Resolution order: `explicit_config`, `$BATCHPUSH_CONFIG`,
    /// `<work_dir>/.batchpush.toml`, `~/.config/batchpush/config.toml`.
    /// When none exists the built-in defaults are used.
    ///
    /// # Errors
    /// Returns an error if the working directory does not exist or a
    /// configuration file exists but cannot be parsed.
    pub fn new(work_dir: PathBuf, explicit_config: Option<PathBuf>) -> Result<Self> {
        let work_dir = work_dir
            .canonicalize()
            .with_context(|| format!("Working directory not found: {}", work_dir.display()))?;

        let config_path = resolve_config_path(&work_dir, explicit_config);
        let config = match &config_path {
            Some(path) => config::Config::load(path)?,
            None => config::Config::default(),
        };

        Ok(Self {
            work_dir,
            config_path,
            config,
        })
    }

    /// Creates a context with an explicit configuration value (used by tests).
    #[must_use]
    pub fn with_config(work_dir: PathBuf, config: config::Config) -> Self {
        Self {
            work_dir,
            config_path: None,
            config,
        }
    }

    /// Absolute path of the tracker file.
    #[must_use]
    pub fn tracker_path(&self) -> PathBuf {
        self.work_dir.join(&self.config.upload.tracker_file)
    }
}

/// Picks the first configuration file that applies.
fn resolve_config_path(work_dir: &Path, explicit: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path);
    }

    if let Ok(path) = std::env::var(CONFIG_ENV)
        && !path.is_empty()
    {
        return Some(PathBuf::from(path));
    }

    let local = work_dir.join(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::home_dir()
        .map(|home| home.join(DEFAULT_CONFIG_PATH))
        .filter(|path| path.is_file())
}

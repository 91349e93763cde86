//! Command-line interface definitions for batchpush.
//!
//! The CLI definition is shared between the main binary and build tools
//! (like xtask) for man page generation.
//!
//! Note: Field-level documentation is provided via clap attributes, so we
//! allow missing_docs for this module to avoid redundant documentation.

#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

use crate::config::{Config, FailurePolicy};
use clap::Parser;
use clap_complete::Shell;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Main CLI structure for batchpush.
#[derive(Parser, Debug)]
#[command(
    name = "batchpush",
    version = crate::VERSION,
    about = "Commit and push untracked files in fixed-size batches",
    long_about = "Commits the untracked files of a git working directory in batches, pushing \
                  after every commit. Progress is kept in .upload_tracker so an interrupted run \
                  resumes where it stopped. Without --batch-size the batch size is asked for \
                  interactively."
)]
pub struct Cli {
    /// Working directory to upload from
    #[arg(short = 'C', long = "dir", value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Files per commit (skips the prompt)
    #[arg(short, long, value_name = "N", value_parser = parse_batch_size_arg)]
    pub batch_size: Option<NonZeroUsize>,

    /// Skip files larger than this many bytes
    #[arg(long, value_name = "BYTES")]
    pub max_file_size: Option<u64>,

    /// Seconds to wait after each batch
    #[arg(long, value_name = "SECS")]
    pub delay: Option<u64>,

    /// Stop without recording a batch whose commit or push failed
    #[arg(long)]
    pub strict: bool,

    /// Commit only, do not push
    #[arg(long)]
    pub no_push: bool,

    /// Show the planned batches without committing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Configuration file to use
    #[arg(long, value_name = "FILE", env = "BATCHPUSH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress informational messages
    #[arg(short, long)]
    pub quiet: bool,

    /// Print a shell completion script and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

impl Cli {
    /// Applies flag values on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(size) = self.batch_size {
            config.upload.batch_size = Some(size.get());
        }
        if let Some(bytes) = self.max_file_size {
            config.upload.max_file_size = bytes;
        }
        if let Some(secs) = self.delay {
            config.upload.delay_secs = secs;
        }
        if self.strict {
            config.git.failure_policy = FailurePolicy::Strict;
        }
        if self.no_push {
            config.git.push = false;
        }
    }
}

fn parse_batch_size_arg(value: &str) -> Result<NonZeroUsize, String> {
    crate::prompt::parse_batch_size(value).map_err(|e| e.to_string())
}

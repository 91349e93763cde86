//! # Git access
//!
//! batchpush talks to git exclusively through the `git` command-line tool.
//! Four operations are needed: list untracked files, stage one path, commit,
//! and push. They sit behind the [`VersionControl`] trait so the upload loop
//! can be driven by a scripted implementation in tests.
//!
//! Every call returns a [`CallOutcome`] describing how the process exited.
//! Spawning failures (program missing, working directory gone) are the only
//! `Err` values; a non-zero exit is data the caller decides what to do with.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tracing::{debug, trace};

/// Git error categorization and handling
pub mod errors;

pub use errors::GitError;

/// Result of one git invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOutcome {
    /// Human-readable command line, e.g. `git push`
    pub command: String,
    /// Whether the process exited with status 0
    pub success: bool,
    /// Exit code, if the process was not killed by a signal
    pub code: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl CallOutcome {
    /// A successful outcome with the given stdout (used by scripted backends)
    #[must_use]
    pub fn ok(command: &str, stdout: &str) -> Self {
        Self {
            command: command.to_string(),
            success: true,
            code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    /// A failed outcome with the given stderr (used by scripted backends)
    #[must_use]
    pub fn failed(command: &str, code: i32, stderr: &str) -> Self {
        Self {
            command: command.to_string(),
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    fn from_output(command: String, output: &Output) -> Self {
        Self {
            command,
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    /// Categorized error for a failed call, `None` on success
    #[must_use]
    pub fn error(&self) -> Option<GitError> {
        if self.success {
            return None;
        }

        let mut diagnostics = self.stderr.clone();
        if !self.stdout.trim().is_empty() {
            diagnostics.push('\n');
            diagnostics.push_str(&self.stdout);
        }
        Some(GitError::from_stderr(&self.command, &diagnostics))
    }

    /// Converts a failed call into an error
    ///
    /// # Errors
    ///
    /// Returns the categorized [`GitError`] if the call did not succeed
    pub fn into_result(self) -> std::result::Result<Self, GitError> {
        match self.error() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

/// The version-control operations an upload needs
pub trait VersionControl {
    /// Lists files neither tracked nor ignored, NUL-separated
    /// (`git ls-files -z --others --exclude-standard`)
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot be invoked
    fn list_untracked(&self) -> Result<CallOutcome>;

    /// Stages a single path
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot be invoked
    fn stage(&self, path: &str) -> Result<CallOutcome>;

    /// Creates one commit from the index
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot be invoked
    fn commit(&self, message: &str) -> Result<CallOutcome>;

    /// Pushes to `remote`/`branch`, or to the upstream when both are `None`
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot be invoked
    fn push(&self, remote: Option<&str>, branch: Option<&str>) -> Result<CallOutcome>;
}

/// [`VersionControl`] backed by the git executable
#[derive(Debug, Clone)]
pub struct GitCli {
    /// Resolved path to the git executable
    program: PathBuf,
    /// Directory every command runs in
    work_dir: PathBuf,
}

impl GitCli {
    /// Resolves `program` on `PATH` and binds it to `work_dir`
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be found
    pub fn new(program: &str, work_dir: &Path) -> Result<Self> {
        let resolved = which::which(program)
            .with_context(|| format!("'{program}' not found; is git installed and on PATH?"))?;
        debug!(program = %resolved.display(), work_dir = %work_dir.display(), "Using git");

        Ok(Self {
            program: resolved,
            work_dir: work_dir.to_path_buf(),
        })
    }

    /// Runs git with `args` and captures its output
    fn run(&self, args: &[&str]) -> Result<CallOutcome> {
        let command = format!("git {}", args.first().copied().unwrap_or_default());
        trace!(?args, "Running git");

        // Paths are file names, never globs
        let output = Command::new(&self.program)
            .args(args)
            .env("GIT_LITERAL_PATHSPECS", "1")
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to run {command}"))?;

        let outcome = CallOutcome::from_output(command, &output);
        debug!(
            command = %outcome.command,
            code = ?outcome.code,
            success = outcome.success,
            "git finished"
        );
        Ok(outcome)
    }
}

impl VersionControl for GitCli {
    fn list_untracked(&self) -> Result<CallOutcome> {
        self.run(&["ls-files", "-z", "--others", "--exclude-standard"])
    }

    fn stage(&self, path: &str) -> Result<CallOutcome> {
        self.run(&["add", "--", path])
    }

    fn commit(&self, message: &str) -> Result<CallOutcome> {
        self.run(&["commit", "-m", message])
    }

    fn push(&self, remote: Option<&str>, branch: Option<&str>) -> Result<CallOutcome> {
        match (remote, branch) {
            (Some(remote), Some(branch)) => self.run(&["push", remote, branch]),
            (Some(remote), None) => self.run(&["push", remote]),
            _ => self.run(&["push"]),
        }
    }
}

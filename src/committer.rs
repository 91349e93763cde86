//! Stage, commit and push one batch.
//!
//! Staging is per path and best effort: one failing `git add` does not stop
//! the others. Exactly one commit is created per batch, followed by one push.
//! Nothing is rolled back; what to do with a failed commit or push is decided
//! by the caller according to the configured [`FailurePolicy`].
//!
//! [`FailurePolicy`]: crate::config::FailurePolicy

use crate::config::{FailurePolicy, GitSettings, UploadConfig};
use crate::git::{CallOutcome, GitError, VersionControl};
use anyhow::Result;
use tracing::{Level, debug, span, warn};

/// What happened to one batch
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Paths `git add` accepted, in batch order
    pub staged: Vec<String>,
    /// Paths `git add` rejected, with the reason
    pub stage_failures: Vec<(String, GitError)>,
    /// The commit call
    pub commit: CallOutcome,
    /// The push call; `None` when pushing is disabled, or the commit failed under the strict policy
    pub push: Option<CallOutcome>,
}

impl BatchReport {
    /// Whether the commit succeeded
    #[must_use]
    pub const fn committed(&self) -> bool {
        self.commit.success
    }

    /// Whether the push succeeded (`true` when no push was attempted by configuration)
    #[must_use]
    pub fn pushed(&self) -> bool {
        self.push.as_ref().is_none_or(|push| push.success)
    }

    /// The first commit or push failure, if any
    #[must_use]
    pub fn failure(&self) -> Option<GitError> {
        self.commit
            .error()
            .or_else(|| self.push.as_ref().and_then(CallOutcome::error))
    }
}

/// Commits batches through a [`VersionControl`] backend
pub struct BatchCommitter<'a, V: VersionControl + ?Sized> {
    /// Backend running the git commands
    vcs: &'a V,
    /// Push target and behavior
    git: &'a GitSettings,
    /// Commit message template
    upload: &'a UploadConfig,
}

impl<'a, V: VersionControl + ?Sized> BatchCommitter<'a, V> {
    /// Creates a committer
    pub const fn new(vcs: &'a V, git: &'a GitSettings, upload: &'a UploadConfig) -> Self {
        Self { vcs, git, upload }
    }

    /// Stages every path, commits once, then pushes
    ///
    /// Under the strict policy the push is skipped when the commit did not
    /// succeed. The lenient policy pushes regardless.
    ///
    /// # Errors
    ///
    /// Returns an error only if git cannot be invoked at all
    pub fn commit_batch<S: AsRef<str>>(&self, paths: &[S]) -> Result<BatchReport> {
        let span = span!(Level::DEBUG, "commit_batch", size = paths.len());
        let _guard = span.enter();

        let mut staged = Vec::with_capacity(paths.len());
        let mut stage_failures = Vec::new();

        for path in paths {
            let path = path.as_ref();
            let outcome = self.vcs.stage(path)?;
            match outcome.error() {
                None => staged.push(path.to_string()),
                Some(err) => {
                    warn!(path, error = %err.summary(), "Failed to stage file");
                    stage_failures.push((path.to_string(), err));
                }
            }
        }

        let message = self.upload.commit_message_for(paths.len());
        let commit = self.vcs.commit(&message)?;
        debug!(message = %message, success = commit.success, "Commit finished");

        let push_allowed =
            commit.success || self.git.failure_policy == FailurePolicy::Lenient;
        let push = if self.git.push && push_allowed {
            let outcome = self
                .vcs
                .push(self.git.remote.as_deref(), self.git.branch.as_deref())?;
            debug!(success = outcome.success, "Push finished");
            Some(outcome)
        } else {
            None
        };

        Ok(BatchReport {
            staged,
            stage_failures,
            commit,
            push,
        })
    }
}

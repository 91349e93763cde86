use std::fmt;

/// Categorized git failures with actionable guidance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitError {
    /// Network-related errors (DNS, connection timeout, unreachable)
    Network(String),
    /// Authentication failures (SSH keys, passwords, tokens)
    Authentication(String),
    /// Push rejected by the remote (non-fast-forward, hooks, size limits)
    Rejected(String),
    /// Commit had nothing staged
    NothingToCommit(String),
    /// Working directory is not inside a git repository
    NotARepository(String),
    /// A path given to `git add` matched nothing
    Pathspec(String),
    /// Unknown or uncategorized error
    Unknown(String),
}

impl GitError {
    /// Parse git output to categorize the error
    ///
    /// `git commit` reports "nothing to commit" on stdout, so callers pass
    /// both streams joined when they have them.
    #[must_use]
    pub fn from_stderr(command: &str, stderr: &str) -> Self {
        let lower = stderr.to_lowercase();
        let detail = extract_meaningful_message(stderr);

        if lower.contains("could not resolve host")
            || lower.contains("connection timed out")
            || lower.contains("network is unreachable")
            || lower.contains("failed to connect")
            || lower.contains("connection refused")
        {
            return Self::Network(format!("{command}: Network error - {detail}"));
        }

        if lower.contains("authentication failed")
            || lower.contains("permission denied (publickey")
            || lower.contains("could not read username")
            || lower.contains("invalid credentials")
            || lower.contains("access denied")
        {
            return Self::Authentication(format!("{command}: Authentication failed - {detail}"));
        }

        if lower.contains("not a git repository") {
            return Self::NotARepository(format!("{command}: {detail}"));
        }

        if lower.contains("nothing to commit")
            || lower.contains("nothing added to commit")
            || lower.contains("no changes added to commit")
        {
            return Self::NothingToCommit(format!("{command}: Nothing to commit - {detail}"));
        }

        if lower.contains("pathspec") && lower.contains("did not match") {
            return Self::Pathspec(format!("{command}: Path not found - {detail}"));
        }

        if lower.contains("rejected")
            || lower.contains("non-fast-forward")
            || lower.contains("failed to push some refs")
            || lower.contains("pre-receive hook declined")
        {
            return Self::Rejected(format!("{command}: Push rejected - {detail}"));
        }

        Self::Unknown(format!("{command}: {detail}"))
    }

    /// Get a user-friendly error message with actionable guidance
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(msg) => format!(
                "{msg}\n\nSuggestions:\n\
                 - Check your internet connection\n\
                 - Verify the remote URL is correct (git remote -v)\n\
                 - Run batchpush again; committed files will be skipped"
            ),
            Self::Authentication(msg) => format!(
                "{msg}\n\nSuggestions:\n\
                 - Verify your SSH key is configured (ssh-add -l)\n\
                 - For HTTPS, set up a credential helper before running batchpush"
            ),
            Self::Rejected(msg) => format!(
                "{msg}\n\nSuggestions:\n\
                 - Pull the latest changes first (git pull --rebase)\n\
                 - Check the remote's file size limits\n\
                 - Then push the pending local commits with git push"
            ),
            Self::NothingToCommit(msg) => format!(
                "{msg}\n\nSuggestions:\n\
                 - The batch files may already be committed or ignored"
            ),
            Self::NotARepository(msg) => format!(
                "{msg}\n\nSuggestions:\n\
                 - Run batchpush inside a git working directory, or pass -C <dir>"
            ),
            Self::Pathspec(msg) => format!(
                "{msg}\n\nSuggestions:\n\
                 - The file was probably removed after the scan"
            ),
            Self::Unknown(msg) => format!(
                "{msg}\n\nThis is an unexpected error. Please check the message above for details."
            ),
        }
    }

    /// Get a short description of the error type
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::Network(_) => "Network Error",
            Self::Authentication(_) => "Authentication Error",
            Self::Rejected(_) => "Push Rejected",
            Self::NothingToCommit(_) => "Nothing To Commit",
            Self::NotARepository(_) => "Not A Repository",
            Self::Pathspec(_) => "Path Not Found",
            Self::Unknown(_) => "Unknown Error",
        }
    }

    /// The one-line message without suggestions
    #[must_use]
    pub fn summary(&self) -> &str {
        match self {
            Self::Network(msg)
            | Self::Authentication(msg)
            | Self::Rejected(msg)
            | Self::NothingToCommit(msg)
            | Self::NotARepository(msg)
            | Self::Pathspec(msg)
            | Self::Unknown(msg) => msg,
        }
    }
}

impl fmt::Display for GitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for GitError {}

/// Extract the most meaningful part of the error message
fn extract_meaningful_message(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(3)
        .collect();

    if lines.is_empty() {
        return "No error details available".to_string();
    }

    lines.join(" | ")
}

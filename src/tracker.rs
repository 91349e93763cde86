//! Ledger of paths already committed by batchpush.
//!
//! The tracker file holds one path per line, in commit order. It is only
//! ever appended to, so an interrupted run loses at most the batch that was
//! in flight. Loading collapses duplicate lines into a set.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Append-only store of committed paths
#[derive(Debug, Clone)]
pub struct TrackerStore {
    /// Location of the tracker file
    path: PathBuf,
}

impl TrackerStore {
    /// Creates a store backed by `path` (the file need not exist yet)
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the tracker file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every recorded path
    ///
    /// Returns an empty set when the file does not exist. Blank lines are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read
    pub fn load(&self) -> Result<HashSet<String>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read tracker file: {}", self.path.display())
                });
            }
        };

        let tracked: HashSet<String> = content
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        debug!(entries = tracked.len(), path = %self.path.display(), "Loaded tracker");
        Ok(tracked)
    }

    /// Appends `paths` to the tracker, one per line
    ///
    /// The file is created if needed and synced before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, written or synced
    pub fn record<S: AsRef<str>>(&self, paths: &[S]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open tracker file: {}", self.path.display()))?;

        let mut writer = BufWriter::new(file);
        for path in paths {
            writeln!(writer, "{}", path.as_ref())?;
        }
        writer.flush()?;
        writer
            .get_ref()
            .sync_all()
            .with_context(|| format!("Failed to sync tracker file: {}", self.path.display()))?;

        debug!(count = paths.len(), "Recorded batch in tracker");
        Ok(())
    }
}

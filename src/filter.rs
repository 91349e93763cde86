//! Size threshold applied to upload candidates.
//!
//! A file is eligible when its size is at most the configured threshold.
//! Files that vanished between the scan and the size check are dropped
//! without complaint: the next scan will not list them either.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

/// Outcome of checking one path against the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeVerdict {
    /// At or under the threshold, with its size in bytes
    Within(u64),
    /// Over the threshold, with its size in bytes
    Oversized(u64),
    /// No longer on disk
    Missing,
    /// Present, but its metadata could not be read; left for git to judge
    Unreadable,
}

/// Candidates split by the size check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Paths that passed, in input order
    pub kept: Vec<String>,
    /// Paths over the threshold with their sizes, in input order
    pub oversized: Vec<(String, u64)>,
}

/// Inclusive byte threshold for uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeFilter {
    /// Largest accepted size in bytes
    max_bytes: u64,
}

impl SizeFilter {
    /// Creates a filter accepting files of at most `max_bytes`
    #[must_use]
    pub const fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    /// Checks a single file
    ///
    /// Symlinks are measured as links, not by their targets, since that is
    /// what git stores. A dangling link is therefore never `Missing`.
    #[must_use]
    pub fn check(&self, path: &Path) -> SizeVerdict {
        match fs::symlink_metadata(path) {
            Ok(meta) if meta.len() > self.max_bytes => SizeVerdict::Oversized(meta.len()),
            Ok(meta) => SizeVerdict::Within(meta.len()),
            Err(e) if e.kind() == ErrorKind::NotFound => SizeVerdict::Missing,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read file metadata");
                SizeVerdict::Unreadable
            }
        }
    }

    /// Splits `paths` (relative to `root`) into kept and oversized entries
    ///
    /// Missing files appear in neither list.
    #[must_use]
    pub fn partition<I, S>(&self, root: &Path, paths: I) -> FilterOutcome
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut outcome = FilterOutcome::default();

        for path in paths {
            let path = path.into();
            match self.check(&root.join(&path)) {
                SizeVerdict::Within(_) | SizeVerdict::Unreadable => outcome.kept.push(path),
                SizeVerdict::Oversized(size) => outcome.oversized.push((path, size)),
                SizeVerdict::Missing => debug!(path = %path, "Skipping vanished file"),
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_sized(dir: &Path, name: &str, len: usize) {
        fs::write(dir.join(name), vec![b'x'; len]).unwrap();
    }

    #[test]
    fn test_exact_threshold_is_included() {
        let temp = TempDir::new().unwrap();
        write_sized(temp.path(), "edge.bin", 100);

        let filter = SizeFilter::new(100);
        assert_eq!(filter.check(&temp.path().join("edge.bin")), SizeVerdict::Within(100));
    }

    #[test]
    fn test_one_byte_over_is_excluded() {
        let temp = TempDir::new().unwrap();
        write_sized(temp.path(), "big.bin", 101);

        let filter = SizeFilter::new(100);
        assert_eq!(filter.check(&temp.path().join("big.bin")), SizeVerdict::Oversized(101));
    }

    #[test]
    fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        let filter = SizeFilter::new(100);
        assert_eq!(filter.check(&temp.path().join("gone")), SizeVerdict::Missing);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_measured_as_links() {
        let temp = TempDir::new().unwrap();
        write_sized(temp.path(), "large.bin", 4096);
        std::os::unix::fs::symlink("large.bin", temp.path().join("to-large")).unwrap();
        std::os::unix::fs::symlink("does-not-exist", temp.path().join("dangling")).unwrap();

        let filter = SizeFilter::new(100);
        assert_eq!(filter.check(&temp.path().join("to-large")), SizeVerdict::Within(9));
        assert_eq!(filter.check(&temp.path().join("dangling")), SizeVerdict::Within(14));
    }

    #[test]
    fn test_partition_preserves_order_and_drops_missing() {
        let temp = TempDir::new().unwrap();
        write_sized(temp.path(), "a", 1);
        write_sized(temp.path(), "huge", 50);
        write_sized(temp.path(), "b", 10);
        fs::create_dir(temp.path().join("sub")).unwrap();
        write_sized(&temp.path().join("sub"), "c", 10);

        let filter = SizeFilter::new(10);
        let outcome = filter.partition(temp.path(), ["a", "huge", "missing", "b", "sub/c"]);

        assert_eq!(outcome.kept, vec!["a", "b", "sub/c"]);
        assert_eq!(outcome.oversized, vec![("huge".to_string(), 50)]);
    }
}

//! Untracked file discovery.
//!
//! The list comes straight from `git ls-files -z --others --exclude-standard`,
//! so `.gitignore` rules apply and names are never quoted. Candidates are recomputed from scratch on
//! every call; nothing is cached between batches.

use crate::filter::SizeFilter;
use crate::git::VersionControl;
use anyhow::Result;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Files eligible for the next batch, plus what the size check rejected
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidates {
    /// Untracked, not yet recorded, within the size threshold; scan order
    pub remaining: Vec<String>,
    /// Untracked and not yet recorded, but over the threshold
    pub oversized: Vec<(String, u64)>,
}

/// Lists untracked files through a [`VersionControl`] backend
pub struct UntrackedScanner<'a, V: VersionControl + ?Sized> {
    /// Backend used for the listing
    vcs: &'a V,
}

impl<'a, V: VersionControl + ?Sized> UntrackedScanner<'a, V> {
    /// Creates a scanner over `vcs`
    pub const fn new(vcs: &'a V) -> Self {
        Self { vcs }
    }

    /// Untracked, non-ignored paths in the order git reports them
    ///
    /// # Errors
    ///
    /// Returns an error if git cannot be run or reports a failure
    pub fn scan(&self) -> Result<Vec<String>> {
        let outcome = self.vcs.list_untracked()?.into_result()?;
        let files = parse_listing(&outcome.stdout);
        debug!(count = files.len(), "Scanned untracked files");
        Ok(files)
    }

    /// Scan minus `tracked`, split by `filter`
    ///
    /// Sizes are checked relative to `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the scan fails
    pub fn candidates<S: std::hash::BuildHasher>(
        &self,
        root: &Path,
        tracked: &HashSet<String, S>,
        filter: &SizeFilter,
    ) -> Result<Candidates> {
        let untracked = self.scan()?;
        Ok(compute_candidates(root, untracked, tracked, filter))
    }
}

/// Splits NUL-terminated `ls-files -z` output into paths
///
/// Names are taken verbatim, so quotes, tabs and spaces survive.
#[must_use]
pub fn parse_listing(stdout: &str) -> Vec<String> {
    stdout
        .split('\0')
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Removes tracked paths from `untracked`, then applies `filter`
#[must_use]
pub fn compute_candidates<S: std::hash::BuildHasher>(
    root: &Path,
    untracked: Vec<String>,
    tracked: &HashSet<String, S>,
    filter: &SizeFilter,
) -> Candidates {
    let fresh = untracked
        .into_iter()
        .filter(|path| !path.is_empty() && !tracked.contains(path));

    let outcome = filter.partition(root, fresh);
    Candidates {
        remaining: outcome.kept,
        oversized: outcome.oversized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::CallOutcome;
    use std::fs;
    use tempfile::TempDir;

    struct Listing(&'static str);

    impl VersionControl for Listing {
        fn list_untracked(&self) -> Result<CallOutcome> {
            Ok(CallOutcome::ok("git ls-files", self.0))
        }
        fn stage(&self, _path: &str) -> Result<CallOutcome> {
            unreachable!()
        }
        fn commit(&self, _message: &str) -> Result<CallOutcome> {
            unreachable!()
        }
        fn push(&self, _remote: Option<&str>, _branch: Option<&str>) -> Result<CallOutcome> {
            unreachable!()
        }
    }

    #[test]
    fn test_empty_listing_yields_no_paths() {
        assert!(parse_listing("").is_empty());
        assert!(parse_listing("\0").is_empty());
    }

    #[test]
    fn test_listing_keeps_order() {
        assert_eq!(parse_listing("b.txt\0a.txt\0dir/c.txt\0"), vec!["b.txt", "a.txt", "dir/c.txt"]);
    }

    #[test]
    fn test_listing_keeps_names_verbatim() {
        assert_eq!(
            parse_listing("say \"hi\".txt\0tab\there.txt\0 padded \0"),
            vec!["say \"hi\".txt", "tab\there.txt", " padded "]
        );
    }

    #[test]
    fn test_candidates_subtract_tracked_and_oversized() {
        let temp = TempDir::new().unwrap();
        for (name, len) in [("a", 1), ("b", 1), ("big", 64), ("c", 1)] {
            fs::write(temp.path().join(name), vec![0u8; len]).unwrap();
        }

        let vcs = Listing("a\0b\0big\0c\0ghost\0");
        let tracked: HashSet<String> = ["b".to_string()].into_iter().collect();
        let candidates = UntrackedScanner::new(&vcs)
            .candidates(temp.path(), &tracked, &SizeFilter::new(32))
            .unwrap();

        assert_eq!(candidates.remaining, vec!["a", "c"]);
        assert_eq!(candidates.oversized, vec![("big".to_string(), 64)]);
    }

    #[test]
    fn test_failed_listing_is_error() {
        struct Broken;
        impl VersionControl for Broken {
            fn list_untracked(&self) -> Result<CallOutcome> {
                Ok(CallOutcome::failed(
                    "git ls-files",
                    128,
                    "fatal: not a git repository (or any of the parent directories): .git",
                ))
            }
            fn stage(&self, _path: &str) -> Result<CallOutcome> {
                unreachable!()
            }
            fn commit(&self, _message: &str) -> Result<CallOutcome> {
                unreachable!()
            }
            fn push(&self, _remote: Option<&str>, _branch: Option<&str>) -> Result<CallOutcome> {
                unreachable!()
            }
        }

        let err = UntrackedScanner::new(&Broken).scan().unwrap_err();
        assert!(err.to_string().contains("not a git repository"));
    }
}

//! The upload loop.
//!
//! Each pass rescans the working directory, subtracts everything the tracker
//! already lists, drops oversized files, and commits the first `batch_size`
//! of what is left. The loop ends when a pass finds nothing to upload.
//! Because candidates are recomputed every pass, files added or removed
//! while a run is in progress are picked up or skipped automatically.

use crate::committer::{BatchCommitter, BatchReport};
use crate::config::FailurePolicy;
use crate::filter::SizeFilter;
use crate::git::VersionControl;
use crate::lock::{LOCK_SUFFIX, RunLock};
use crate::output::{self, ProgressSnapshot};
use crate::scanner::{Candidates, UntrackedScanner};
use crate::tracker::TrackerStore;
use crate::UploadContext;
use anyhow::{Result, anyhow};
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tracing::{Level, info, span, warn};

/// Totals for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Commits created
    pub batches: usize,
    /// Paths recorded in the tracker
    pub files: usize,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

/// Drives scan, commit, record and report until nothing is left
pub struct Uploader<'a, V: VersionControl + ?Sized> {
    /// Working directory and settings
    ctx: &'a UploadContext,
    /// Backend running the git commands
    vcs: &'a V,
}

impl<'a, V: VersionControl + ?Sized> Uploader<'a, V> {
    /// Creates an uploader for `ctx` using `vcs`
    pub const fn new(ctx: &'a UploadContext, vcs: &'a V) -> Self {
        Self { ctx, vcs }
    }

    /// Uploads every eligible file in batches of `batch_size`
    ///
    /// # Errors
    ///
    /// Returns an error if another run holds the directory lock, scanning
    /// fails, the tracker cannot be read or written, git cannot be invoked,
    /// or (under the strict policy) a commit or push fails. The failing
    /// batch is not recorded in that case.
    pub fn run(&self, batch_size: NonZeroUsize) -> Result<RunSummary> {
        let upload = &self.ctx.config.upload;
        let tracker = TrackerStore::new(self.ctx.tracker_path());
        let _lock = RunLock::acquire(&RunLock::path_for(tracker.path()))?;
        let committer = BatchCommitter::new(self.vcs, &self.ctx.config.git, upload);

        let started = Instant::now();
        // Fixed from the first pass; later passes only move `done`
        let mut first_total: Option<usize> = None;
        let mut summary = RunSummary::default();

        loop {
            let candidates = self.candidates(&tracker)?;
            report_oversized(&candidates);

            if candidates.remaining.is_empty() {
                output::success("All files have been uploaded.");
                break;
            }

            let total = *first_total.get_or_insert(candidates.remaining.len());
            let take = batch_size.get().min(candidates.remaining.len());
            let batch = &candidates.remaining[..take];

            let span = span!(Level::INFO, "batch", number = summary.batches + 1);
            let _guard = span.enter();

            output::action(
                "Uploading",
                &format!("{} files (batch {})", batch.len(), summary.batches + 1),
            );
            for path in batch {
                output::verbose(&format!("  {path}"));
            }

            let report = committer.commit_batch(batch)?;
            let recorded = self.settle(&report, batch)?;
            tracker.record(&recorded)?;

            summary.batches += 1;
            summary.files += recorded.len();
            info!(recorded = recorded.len(), total_files = summary.files, "Batch recorded");

            output::progress(&ProgressSnapshot::compute(
                summary.files,
                total,
                started.elapsed(),
            ));

            std::thread::sleep(upload.delay());
        }

        summary.elapsed = started.elapsed();
        Ok(summary)
    }

    /// Batches the next run would commit, without touching git state
    ///
    /// # Errors
    ///
    /// Returns an error if scanning fails or the tracker cannot be read
    pub fn plan(&self, batch_size: NonZeroUsize) -> Result<Vec<Vec<String>>> {
        let tracker = TrackerStore::new(self.ctx.tracker_path());
        let candidates = self.candidates(&tracker)?;
        report_oversized(&candidates);

        Ok(candidates
            .remaining
            .chunks(batch_size.get())
            .map(<[String]>::to_vec)
            .collect())
    }

    /// Fresh scan minus tracked paths and batchpush's own files
    fn candidates(&self, tracker: &TrackerStore) -> Result<Candidates> {
        let upload = &self.ctx.config.upload;
        let mut excluded = tracker.load()?;
        excluded.extend(self.own_files());

        UntrackedScanner::new(self.vcs).candidates(
            &self.ctx.work_dir,
            &excluded,
            &SizeFilter::new(upload.max_file_size),
        )
    }

    /// Tracker and lock file names as git lists them
    fn own_files(&self) -> HashSet<String> {
        let tracker = self.ctx.config.upload.tracker_file.clone();
        let lock = format!("{tracker}{LOCK_SUFFIX}");
        [tracker, lock].into_iter().collect()
    }

    /// Applies the failure policy and returns the paths to record
    fn settle(&self, report: &BatchReport, batch: &[String]) -> Result<Vec<String>> {
        for (path, err) in &report.stage_failures {
            output::warning(&format!("Could not stage {path}: {}", err.summary()));
        }

        match self.ctx.config.git.failure_policy {
            FailurePolicy::Lenient => {
                if let Some(err) = report.failure() {
                    warn!(error = %err.summary(), "Batch failure ignored under lenient policy");
                    output::warning(&format!(
                        "{}: {} (recording batch anyway; see git log / git status)",
                        err.error_type(),
                        err.summary()
                    ));
                }
                Ok(batch.to_vec())
            }
            FailurePolicy::Strict => match report.failure() {
                Some(err) => Err(anyhow!(err).context("Batch failed and was not recorded")),
                None => Ok(report.staged.clone()),
            },
        }
    }
}

/// One aggregate warning per pass listing every oversized file
fn report_oversized(candidates: &Candidates) {
    if candidates.oversized.is_empty() {
        return;
    }

    let listing = candidates
        .oversized
        .iter()
        .map(|(path, size)| format!("  {path} ({})", output::format_size(*size)))
        .collect::<Vec<_>>()
        .join("\n");
    output::warning(&format!(
        "Skipping {} file(s) over the size limit:\n{listing}",
        candidates.oversized.len()
    ));
}

//! Progress and ETA for the upload loop.
//!
//! Everything here is a pure function of (done, total, elapsed): the
//! throughput estimate is the running average over all files committed so
//! far, with no smoothing and no hidden state.

use std::fmt::Write as _;
use std::time::Duration;

/// Number of cells in the rendered bar
pub const BAR_WIDTH: usize = 30;

/// Progress figures at one point in a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    /// Files committed so far (clamped to `total`)
    pub done: usize,
    /// Files eligible when the run started
    pub total: usize,
    /// Wall-clock time since the run started
    pub elapsed: Duration,
    /// Seconds per committed file; `None` before the first file
    pub average_secs: Option<f64>,
    /// Estimated time for the remaining files; `None` before the first file
    pub remaining: Option<Duration>,
}

impl ProgressSnapshot {
    /// Computes average throughput and ETA
    ///
    /// `done` is clamped to `total` so files that appear mid-run never push
    /// the fraction past 1.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(done: usize, total: usize, elapsed: Duration) -> Self {
        let done = done.min(total);

        let average_secs = (done > 0).then(|| elapsed.as_secs_f64() / done as f64);
        let remaining = average_secs
            .map(|avg| Duration::from_secs_f64((avg * (total - done) as f64).max(0.0)));

        Self {
            done,
            total,
            elapsed,
            average_secs,
            remaining,
        }
    }

    /// Completed fraction in `0.0..=1.0` (1.0 when there is nothing to do)
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.done as f64 / self.total as f64
        }
    }

    /// Renders `[####------]` with `width` cells
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn render_bar(&self, width: usize) -> String {
        let filled = ((self.fraction() * width as f64).floor() as usize).min(width);
        format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
    }

    /// Renders the full progress line
    ///
    /// `[####------] 5/10 (50%) | avg 10.0s/file | ETA 0h 0m 50s`
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn render(&self, width: usize) -> String {
        let percent = (self.fraction() * 100.0).floor() as u32;
        let mut line = format!(
            "{} {}/{} ({percent}%)",
            self.render_bar(width),
            self.done,
            self.total
        );

        if let (Some(avg), Some(remaining)) = (self.average_secs, self.remaining) {
            let _ = write!(
                line,
                " | avg {avg:.1}s/file | ETA {}",
                format_duration(remaining)
            );
        }

        line
    }
}

/// Formats a duration as `{h}h {m}m {s}s`, dropping fractional seconds
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours}h {minutes}m {seconds}s")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_way_estimate() {
        let snapshot = ProgressSnapshot::compute(5, 10, Duration::from_secs(50));
        assert_eq!(snapshot.average_secs, Some(10.0));
        assert_eq!(snapshot.remaining, Some(Duration::from_secs(50)));
        assert_eq!(format_duration(snapshot.remaining.unwrap()), "0h 0m 50s");
    }

    #[test]
    fn test_no_estimate_before_first_file() {
        let snapshot = ProgressSnapshot::compute(0, 10, Duration::from_secs(3));
        assert_eq!(snapshot.average_secs, None);
        assert_eq!(snapshot.remaining, None);
        assert_eq!(snapshot.render(10), "[----------] 0/10 (0%)");
    }

    #[test]
    fn test_render_line() {
        let snapshot = ProgressSnapshot::compute(5, 10, Duration::from_secs(50));
        assert_eq!(
            snapshot.render(10),
            "[#####-----] 5/10 (50%) | avg 10.0s/file | ETA 0h 0m 50s"
        );
    }

    #[test]
    fn test_complete_bar() {
        let snapshot = ProgressSnapshot::compute(7, 7, Duration::from_secs(14));
        assert_eq!(snapshot.render_bar(4), "[####]");
        assert_eq!(snapshot.remaining, Some(Duration::ZERO));
    }

    #[test]
    fn test_done_is_clamped_to_total() {
        let snapshot = ProgressSnapshot::compute(12, 10, Duration::from_secs(10));
        assert_eq!(snapshot.done, 10);
        assert!((snapshot.fraction() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_total() {
        let snapshot = ProgressSnapshot::compute(0, 0, Duration::ZERO);
        assert_eq!(snapshot.render_bar(3), "[###]");
    }

    #[test]
    fn test_format_duration_components() {
        assert_eq!(format_duration(Duration::from_secs(0)), "0h 0m 0s");
        assert_eq!(format_duration(Duration::from_secs(61)), "0h 1m 1s");
        assert_eq!(format_duration(Duration::from_secs(3_725)), "1h 2m 5s");
        assert_eq!(format_duration(Duration::from_millis(59_999)), "0h 0m 59s");
        assert_eq!(format_duration(Duration::from_secs(90_000)), "25h 0m 0s");
    }
}

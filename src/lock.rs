//! Run locking to prevent two uploads from the same directory at once.
//!
//! Concurrent runs would interleave tracker appends and race on the git
//! index. A run holds an exclusive advisory lock on `<tracker>.lock` for its
//! whole duration. On drop the file is removed while still locked, and a
//! newly taken lock only counts once the path still names the locked file.

use anyhow::{Context, Result, bail};
use fs4::fs_std::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use tracing::debug;

/// Suffix appended to the tracker file name to form the lock file name
pub const LOCK_SUFFIX: &str = ".lock";

/// Holds the exclusive run lock
///
/// The lock is automatically released when this struct is dropped.
#[derive(Debug)]
pub struct RunLock {
    /// Lock file handle
    lock_file: File,
    /// Path to the lock file (for error messages and cleanup)
    lock_path: PathBuf,
}

impl RunLock {
    /// Lock file path used for a given tracker file
    #[must_use]
    pub fn path_for(tracker_path: &Path) -> PathBuf {
        let mut name = tracker_path.as_os_str().to_os_string();
        name.push(LOCK_SUFFIX);
        PathBuf::from(name)
    }

    /// Acquire the run lock at `lock_path`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create the lock file
    /// - Another run holds the lock past the timeout
    pub fn acquire(lock_path: &Path) -> Result<Self> {
        // Use shorter timeouts in test mode for faster test execution
        let lock_timeout = if cfg!(test) {
            Duration::from_millis(100)
        } else {
            Duration::from_secs(2)
        };
        let retry_interval = if cfg!(test) {
            Duration::from_millis(10)
        } else {
            Duration::from_millis(100)
        };

        let start = Instant::now();

        loop {
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(lock_path)
                .with_context(|| format!("Failed to create lock file: {}", lock_path.display()))?;

            match file.try_lock_exclusive() {
                Ok(true) if !still_linked(&file, lock_path) => {
                    // Locked a file the previous holder already unlinked
                    debug!(path = %lock_path.display(), "Lock file was replaced, retrying");
                    continue;
                }
                Ok(true) => {
                    Self::write_owner(&file);
                    debug!(path = %lock_path.display(), "Acquired run lock");
                    return Ok(Self {
                        lock_file: file,
                        lock_path: lock_path.to_path_buf(),
                    });
                }
                Ok(false) | Err(_) if start.elapsed() < lock_timeout => {
                    std::thread::sleep(retry_interval);
                }
                Ok(false) | Err(_) => {
                    bail!(
                        "Another batchpush run is already active in this directory. \
                         Wait for it to finish or remove the stale lock at: {}",
                        lock_path.display()
                    );
                }
            }
        }
    }

    /// Records pid and start time in the lock file for debugging
    fn write_owner(file: &File) {
        let _ = file.set_len(0);
        let mut writer = file;
        let _ = writeln!(
            writer,
            "pid={}\ntime={}",
            std::process::id(),
            humantime::format_rfc3339(SystemTime::now())
        );
    }

    /// Path of the held lock file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.lock_path
    }

    /// Release the lock explicitly (normally handled by Drop)
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be removed or unlocked
    pub fn release(self) -> Result<()> {
        remove_lock_file(&self.lock_path)
            .with_context(|| format!("Failed to remove lock file: {}", self.lock_path.display()))?;
        FileExt::unlock(&self.lock_file)?;
        Ok(())
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        // Unlink first so nobody can lock this inode after we let go
        if let Err(e) = remove_lock_file(&self.lock_path) {
            eprintln!(
                "Warning: Failed to remove lock file {}: {}",
                self.lock_path.display(),
                e
            );
        }

        let _ = FileExt::unlock(&self.lock_file);
    }
}

fn remove_lock_file(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Whether `path` still names the same file as the open handle
#[cfg(unix)]
fn still_linked(file: &File, path: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (file.metadata(), fs::metadata(path)) {
        (Ok(held), Ok(current)) => held.dev() == current.dev() && held.ino() == current.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn still_linked(_file: &File, path: &Path) -> bool {
    path.exists()
}

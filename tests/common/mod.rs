#![allow(dead_code)]

use anyhow::Result;
use batchpush::UploadContext;
use batchpush::config::Config;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A git working directory wired to a local bare remote
pub struct GitFixture {
    pub temp_dir: TempDir,
    pub work: PathBuf,
    pub remote: PathBuf,
}

impl GitFixture {
    /// Creates `work/` (on branch main, identity configured) and `remote.git/`
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let work = temp_dir.path().join("work");
        let remote = temp_dir.path().join("remote.git");
        fs::create_dir_all(&work)?;
        fs::create_dir_all(&remote)?;

        git(&remote, &["init", "--bare"])?;
        git(&remote, &["symbolic-ref", "HEAD", "refs/heads/main"])?;

        git(&work, &["init"])?;
        git(&work, &["symbolic-ref", "HEAD", "refs/heads/main"])?;
        git(&work, &["config", "user.name", "Test User"])?;
        git(&work, &["config", "user.email", "test@example.com"])?;
        git(&work, &["config", "commit.gpgsign", "false"])?;
        git(&work, &["config", "push.default", "current"])?;
        git(&work, &["remote", "add", "origin", remote.to_str().unwrap()])?;

        Ok(Self {
            temp_dir,
            work,
            remote,
        })
    }

    /// Writes a file of `len` bytes under the working directory
    pub fn create_file(&self, name: &str, len: usize) -> Result<PathBuf> {
        let path = self.work.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, vec![b'x'; len])?;
        Ok(path)
    }

    /// Context with no delay between batches
    pub fn context(&self) -> UploadContext {
        self.context_with(Config::default())
    }

    /// Context using `config`, with the delay forced to zero
    pub fn context_with(&self, mut config: Config) -> UploadContext {
        config.upload.delay_secs = 0;
        UploadContext::with_config(self.work.clone(), config)
    }

    pub fn tracker_content(&self) -> String {
        fs::read_to_string(self.work.join(".upload_tracker")).unwrap_or_default()
    }

    /// Commits reachable from `main` in the bare remote
    pub fn remote_commit_count(&self) -> usize {
        git_output(&self.remote, &["rev-list", "--count", "main"])
            .ok()
            .and_then(|out| out.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Commits on the local `main`
    pub fn local_commit_count(&self) -> usize {
        git_output(&self.work, &["rev-list", "--count", "main"])
            .ok()
            .and_then(|out| out.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Files in each local commit, oldest first
    pub fn commit_file_lists(&self) -> Result<Vec<Vec<String>>> {
        let revs = git_output(&self.work, &["rev-list", "--reverse", "main"])?;
        revs.lines()
            .map(|rev| {
                let files = git_output(
                    &self.work,
                    &["show", "--pretty=format:", "--name-only", rev],
                )?;
                Ok(files
                    .lines()
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect())
            })
            .collect()
    }
}

pub fn git(dir: &Path, args: &[&str]) -> Result<()> {
    let output = Command::new("git").args(args).current_dir(dir).output()?;
    if !output.status.success() {
        anyhow::bail!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(())
}

pub fn git_output(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git").args(args).current_dir(dir).output()?;
    if !output.status.success() {
        anyhow::bail!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

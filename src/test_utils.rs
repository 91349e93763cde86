//! Shared fixtures for unit tests: a scripted git backend and a temporary
//! working directory.

use crate::UploadContext;
use crate::config::Config;
use crate::git::{CallOutcome, VersionControl};
use anyhow::Result;
use std::cell::{Cell, RefCell};
use std::fs;
use tempfile::TempDir;

/// In-memory stand-in for git
///
/// Staging moves a path from the untracked list into the index; committing
/// drains the index into a recorded commit.
#[derive(Default)]
pub struct ScriptedVcs {
    untracked: RefCell<Vec<String>>,
    index: RefCell<Vec<String>>,
    commits: RefCell<Vec<(String, Vec<String>)>>,
    pushes: Cell<usize>,
    fail_push: Cell<bool>,
    rejected: RefCell<Vec<String>>,
    pending: RefCell<Vec<(usize, String)>>,
}

impl ScriptedVcs {
    pub fn listing(paths: &[&str]) -> Self {
        let vcs = Self::default();
        vcs.untracked
            .borrow_mut()
            .extend(paths.iter().map(|p| (*p).to_string()));
        vcs
    }

    pub fn fail_pushes(&self, fail: bool) {
        self.fail_push.set(fail);
    }

    pub fn reject_stage(&self, path: &str) {
        self.rejected.borrow_mut().push(path.to_string());
    }

    /// Makes `path` show up as untracked once `commits` commits exist
    pub fn add_after_commits(&self, commits: usize, path: &str) {
        self.pending.borrow_mut().push((commits, path.to_string()));
    }

    pub fn committed_batches(&self) -> Vec<Vec<String>> {
        self.commits.borrow().iter().map(|(_, files)| files.clone()).collect()
    }

    pub fn commit_messages(&self) -> Vec<String> {
        self.commits.borrow().iter().map(|(msg, _)| msg.clone()).collect()
    }

    pub fn push_count(&self) -> usize {
        self.pushes.get()
    }
}

impl VersionControl for ScriptedVcs {
    fn list_untracked(&self) -> Result<CallOutcome> {
        let done = self.commits.borrow().len();
        let mut pending = self.pending.borrow_mut();
        let mut untracked = self.untracked.borrow_mut();
        pending.retain(|(after, path)| {
            if *after <= done {
                untracked.push(path.clone());
                false
            } else {
                true
            }
        });

        let mut stdout = untracked.join("\0");
        stdout.push('\0');
        Ok(CallOutcome::ok("git ls-files", &stdout))
    }

    fn stage(&self, path: &str) -> Result<CallOutcome> {
        let mut untracked = self.untracked.borrow_mut();
        let position = untracked.iter().position(|p| p == path);
        match position {
            Some(i) if !self.rejected.borrow().iter().any(|r| r == path) => {
                let staged = untracked.remove(i);
                self.index.borrow_mut().push(staged);
                Ok(CallOutcome::ok("git add", ""))
            }
            _ => Ok(CallOutcome::failed(
                "git add",
                128,
                &format!("fatal: pathspec '{path}' did not match any files"),
            )),
        }
    }

    fn commit(&self, message: &str) -> Result<CallOutcome> {
        let files: Vec<String> = self.index.borrow_mut().drain(..).collect();
        if files.is_empty() {
            let mut outcome = CallOutcome::failed("git commit", 1, "");
            outcome.stdout = "nothing added to commit but untracked files present".to_string();
            return Ok(outcome);
        }
        self.commits.borrow_mut().push((message.to_string(), files));
        Ok(CallOutcome::ok("git commit", ""))
    }

    fn push(&self, _remote: Option<&str>, _branch: Option<&str>) -> Result<CallOutcome> {
        self.pushes.set(self.pushes.get() + 1);
        if self.fail_push.get() {
            return Ok(CallOutcome::failed(
                "git push",
                128,
                "fatal: unable to access 'https://example.invalid/': Could not resolve host: example.invalid",
            ));
        }
        Ok(CallOutcome::ok("git push", ""))
    }
}

/// Temporary working directory with a context pointing at it
pub struct Workspace {
    pub temp: TempDir,
    pub ctx: UploadContext,
}

impl Workspace {
    /// Default settings with no delay between batches
    pub fn with_files(files: &[&str]) -> Self {
        let ws = Self::with_config(Config::default());
        for file in files {
            ws.write(file, 1);
        }
        ws
    }

    /// `config` with the delay forced to zero
    pub fn with_config(mut config: Config) -> Self {
        config.upload.delay_secs = 0;
        let temp = TempDir::new().unwrap();
        let ctx = UploadContext::with_config(temp.path().to_path_buf(), config);
        Self { temp, ctx }
    }

    /// Creates `name` with `len` bytes
    pub fn write(&self, name: &str, len: usize) {
        let path = self.temp.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, vec![b'x'; len]).unwrap();
    }

    pub fn tracker_content(&self) -> String {
        fs::read_to_string(self.ctx.tracker_path()).unwrap_or_default()
    }
}

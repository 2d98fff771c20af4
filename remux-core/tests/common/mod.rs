//! Recording fakes for the lifecycle collaborators.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use remux_core::{CommandError, HookError, HookRunner, Multiplexer, Space, Vcs};

fn failed(command: &str) -> CommandError {
    CommandError::Failed {
        command: command.to_string(),
        stderr: "fatal: simulated failure".to_string(),
    }
}

/// In-memory [`Vcs`]. Worktrees are real directories with a `.git` file so
/// path-existence checks behave as they would against git.
#[derive(Default)]
pub struct FakeVcs {
    pub calls: RefCell<Vec<String>>,
    pub branches: RefCell<HashSet<String>>,
    pub worktrees: RefCell<HashSet<PathBuf>>,
    pub fail_create_branch: bool,
    pub fail_add_worktree: bool,
    pub fail_remove_worktree: bool,
    pub dirty: bool,
}

impl FakeVcs {
    pub fn with_branch(branch: &str) -> Self {
        let vcs = Self::default();
        vcs.branches.borrow_mut().insert(branch.to_string());
        vcs
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn called(&self, op: &str) -> bool {
        self.calls.borrow().iter().any(|c| c == op)
    }

    /// Mark an existing directory as a worktree without going through `add_worktree`.
    pub fn adopt(&self, path: &Path) {
        std::fs::create_dir_all(path).expect("mkdir worktree");
        std::fs::write(path.join(".git"), "gitdir: /fake\n").expect("write .git");
        self.worktrees.borrow_mut().insert(path.to_path_buf());
    }

    fn record(&self, op: &str) {
        self.calls.borrow_mut().push(op.to_string());
    }
}

impl Vcs for FakeVcs {
    fn branch_exists(&self, _repo_root: &Path, branch: &str) -> bool {
        self.record("branch_exists");
        self.branches.borrow().contains(branch)
    }

    fn create_branch(&self, _repo_root: &Path, branch: &str) -> Result<(), CommandError> {
        self.record("create_branch");
        if self.fail_create_branch {
            return Err(failed("git branch"));
        }
        self.branches.borrow_mut().insert(branch.to_string());
        Ok(())
    }

    fn delete_branch(&self, _repo_root: &Path, branch: &str) -> Result<(), CommandError> {
        self.record("delete_branch");
        self.branches.borrow_mut().remove(branch);
        Ok(())
    }

    fn add_worktree(
        &self,
        _repo_root: &Path,
        path: &Path,
        _branch: &str,
    ) -> Result<(), CommandError> {
        self.record("add_worktree");
        if self.fail_add_worktree {
            return Err(failed("git worktree add"));
        }
        self.adopt(path);
        Ok(())
    }

    fn remove_worktree(&self, path: &Path, force: bool) -> Result<(), CommandError> {
        self.record(if force { "remove_worktree --force" } else { "remove_worktree" });
        if self.fail_remove_worktree {
            return Err(failed("git worktree remove"));
        }
        std::fs::remove_dir_all(path).expect("remove worktree dir");
        self.worktrees.borrow_mut().remove(path);
        Ok(())
    }

    fn is_worktree(&self, path: &Path) -> bool {
        self.record("is_worktree");
        self.worktrees.borrow().contains(path)
    }

    fn has_uncommitted_changes(&self, _path: &Path) -> Result<bool, CommandError> {
        self.record("has_uncommitted_changes");
        Ok(self.dirty)
    }
}

/// [`HookRunner`] that records each invocation.
#[derive(Default)]
pub struct RecordingHooks {
    pub created: RefCell<Vec<Space>>,
    pub dropped: RefCell<Vec<Space>>,
    pub fail: bool,
}

impl RecordingHooks {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn invocations(&self) -> usize {
        self.created.borrow().len() + self.dropped.borrow().len()
    }

    fn outcome(&self, command: &str) -> Result<(), HookError> {
        if !self.fail {
            return Ok(());
        }
        Err(HookError::Spawn {
            command: command.to_string(),
            source: std::io::Error::other("simulated hook failure"),
        })
    }
}

impl HookRunner for RecordingHooks {
    fn run_on_create(&self, space: &Space) -> Result<(), HookError> {
        self.created.borrow_mut().push(space.clone());
        self.outcome("on_create")
    }

    fn run_on_drop(&self, space: &Space) -> Result<(), HookError> {
        self.dropped.borrow_mut().push(space.clone());
        self.outcome("on_drop")
    }
}

/// [`Multiplexer`] with a fixed set of live sessions.
#[derive(Default)]
pub struct FakeMux {
    pub live: HashSet<String>,
    pub attached: RefCell<Vec<String>>,
    pub started: RefCell<Vec<(String, PathBuf)>>,
}

impl Multiplexer for FakeMux {
    fn session_exists(&self, name: &str) -> bool {
        self.live.contains(name)
    }

    fn attach(&self, name: &str) -> Result<(), CommandError> {
        self.attached.borrow_mut().push(name.to_string());
        Ok(())
    }

    fn new_session(&self, name: &str, workdir: &Path) -> Result<(), CommandError> {
        self.started
            .borrow_mut()
            .push((name.to_string(), workdir.to_path_buf()));
        Ok(())
    }
}

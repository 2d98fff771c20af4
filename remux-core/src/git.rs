//! Version-control collaborator.
//!
//! [`Vcs`] is the contract the lifecycle manager consumes; [`GitCli`] fulfils
//! it by shelling out to `git`. Tests substitute their own implementations.

use std::path::{Path, PathBuf};

use crate::error::CommandError;
use crate::process::{run_capture, run_checked};

/// Branch and worktree operations the lifecycle depends on.
pub trait Vcs {
    fn branch_exists(&self, repo_root: &Path, branch: &str) -> bool;

    fn create_branch(&self, repo_root: &Path, branch: &str) -> Result<(), CommandError>;

    /// Best-effort; callers may ignore the result.
    fn delete_branch(&self, repo_root: &Path, branch: &str) -> Result<(), CommandError>;

    fn add_worktree(&self, repo_root: &Path, path: &Path, branch: &str)
        -> Result<(), CommandError>;

    fn remove_worktree(&self, path: &Path, force: bool) -> Result<(), CommandError>;

    /// True when `path` is the top level of a linked git worktree. The main
    /// checkout of a repository is not a space and never qualifies.
    fn is_worktree(&self, path: &Path) -> bool;

    /// True when the worktree has tracked or untracked modifications.
    fn has_uncommitted_changes(&self, path: &Path) -> Result<bool, CommandError>;
}

/// [`Vcs`] backed by the `git` binary on `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitCli;

impl Vcs for GitCli {
    fn branch_exists(&self, repo_root: &Path, branch: &str) -> bool {
        let reference = format!("refs/heads/{branch}");
        run_capture(
            "git",
            &["show-ref", "--verify", "--quiet", &reference],
            Some(repo_root),
        )
        .map(|output| output.status.success())
        .unwrap_or(false)
    }

    fn create_branch(&self, repo_root: &Path, branch: &str) -> Result<(), CommandError> {
        run_checked("git", &["branch", branch], Some(repo_root)).map(|_| ())
    }

    fn delete_branch(&self, repo_root: &Path, branch: &str) -> Result<(), CommandError> {
        run_checked("git", &["branch", "-D", branch], Some(repo_root)).map(|_| ())
    }

    fn add_worktree(
        &self,
        repo_root: &Path,
        path: &Path,
        branch: &str,
    ) -> Result<(), CommandError> {
        let path = path.to_string_lossy();
        run_checked("git", &["worktree", "add", &path, branch], Some(repo_root)).map(|_| ())
    }

    fn remove_worktree(&self, path: &Path, force: bool) -> Result<(), CommandError> {
        // Run from the main checkout so git never has to remove its own cwd.
        let runner_dir = common_root(path).unwrap_or_else(|| path.to_path_buf());
        let target = path.to_string_lossy();
        let mut args = vec!["worktree", "remove"];
        if force {
            args.push("--force");
        }
        args.push(target.as_ref());
        run_checked("git", &args, Some(&runner_dir)).map(|_| ())
    }

    fn is_worktree(&self, path: &Path) -> bool {
        if !path.join(".git").is_file() {
            return false;
        }
        let Some(toplevel) = toplevel(path) else {
            return false;
        };
        match (toplevel.canonicalize(), path.canonicalize()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    fn has_uncommitted_changes(&self, path: &Path) -> Result<bool, CommandError> {
        let output = run_checked("git", &["status", "--porcelain"], Some(path))?;
        Ok(!output.stdout.trim().is_empty())
    }
}

/// Root of the repository containing `cwd`.
///
/// Inside a linked worktree this is the main checkout, so spaces created from
/// within a space are still named after the repository.
pub fn repo_root(cwd: &Path) -> Option<PathBuf> {
    common_root(cwd).or_else(|| toplevel(cwd))
}

fn toplevel(cwd: &Path) -> Option<PathBuf> {
    let output = run_capture("git", &["rev-parse", "--show-toplevel"], Some(cwd)).ok()?;
    if !output.status.success() {
        return None;
    }
    let root = output.stdout.trim();
    if root.is_empty() {
        return None;
    }
    Some(PathBuf::from(root))
}

/// Root of the main checkout that owns the worktree at `path`.
fn common_root(path: &Path) -> Option<PathBuf> {
    let output = run_capture(
        "git",
        &["rev-parse", "--path-format=absolute", "--git-common-dir"],
        Some(path),
    )
    .ok()?;
    if !output.status.success() {
        return None;
    }
    common_root_from_git_common_dir(Path::new(output.stdout.trim()))
}

pub(crate) fn common_root_from_git_common_dir(common_dir: &Path) -> Option<PathBuf> {
    if common_dir.file_name()? != ".git" {
        return None;
    }
    common_dir.parent().map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_root_strips_dot_git() {
        assert_eq!(
            common_root_from_git_common_dir(Path::new("/r/proj/.git")),
            Some(PathBuf::from("/r/proj"))
        );
    }

    #[test]
    fn common_root_rejects_bare_dirs() {
        assert_eq!(common_root_from_git_common_dir(Path::new("/r/proj.git")), None);
    }

    #[test]
    fn plain_directory_is_not_a_worktree() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        assert!(!GitCli.is_worktree(dir.path()));
    }
}

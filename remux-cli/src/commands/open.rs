//! `remux open <name> [--dest DIR]`

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use remux_core::{git, open_space, GitCli, SessionError, SpaceName, Tmux};

use crate::config::{self, DestArgs};

/// Attach to a space's tmux session, starting one if none is running.
#[derive(Args, Debug)]
pub struct OpenArgs {
    /// Branch or space name. Inside a repository `remux open feat/login`
    /// opens `<repo>-feat-login`.
    pub name: String,

    #[command(flatten)]
    pub dest: DestArgs,
}

impl OpenArgs {
    pub fn run(self) -> Result<()> {
        let dest = self.dest.resolve()?;
        let candidates = candidates(&self.name, &config::current_dir()?);

        let mut names = candidates.iter().peekable();
        while let Some(name) = names.next() {
            match open_space(&dest, name, &GitCli, &Tmux) {
                Err(SessionError::NotFound { path }) if names.peek().is_some() => {
                    tracing::debug!("no space at {}, trying next name", path.display());
                }
                result => {
                    return result.with_context(|| format!("failed to open space '{name}'"));
                }
            }
        }
        Ok(())
    }
}

/// Names to try for `name`, most specific first.
///
/// Inside a repository the name is qualified the way `remux new` names spaces
/// (`<repo>-<branch>`, separators flattened). The bare name follows as a
/// fallback so a full space name still opens.
fn candidates(name: &str, cwd: &Path) -> Vec<String> {
    let mut names = Vec::with_capacity(2);
    if let Some(repo) = git::repo_root(cwd) {
        names.push(SpaceName::for_branch(&repo, name).to_string());
    }
    if !names.iter().any(|n| n == name) {
        names.push(name.to_string());
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;
    use tempfile::TempDir;

    fn git(dir: &Path, args: &[&str]) -> bool {
        Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// An empty repository named `proj`, or `None` without `git` on `PATH`.
    fn init_repo(parent: &TempDir) -> Option<std::path::PathBuf> {
        let repo = parent.path().join("proj");
        std::fs::create_dir_all(&repo).unwrap();
        git(&repo, &["init", "--quiet"]).then_some(repo)
    }

    #[test]
    fn outside_repo_only_the_bare_name() {
        let dir = TempDir::new().unwrap();
        assert_eq!(candidates("proj-feat", dir.path()), vec!["proj-feat"]);
    }

    #[test]
    fn nested_branch_matches_created_space_name() {
        let parent = TempDir::new().unwrap();
        let Some(repo) = init_repo(&parent) else {
            eprintln!("git not available; skipping");
            return;
        };
        let created = SpaceName::for_branch(&repo, "feat/login");
        let names = candidates("feat/login", &repo);
        assert_eq!(names[0], created.to_string());
        assert_eq!(names[0], "proj-feat-login");
    }

    #[test]
    fn repo_prefixed_branch_is_still_qualified() {
        let parent = TempDir::new().unwrap();
        let Some(repo) = init_repo(&parent) else {
            eprintln!("git not available; skipping");
            return;
        };
        assert_eq!(candidates("proj-x", &repo), vec!["proj-proj-x", "proj-x"]);
    }
}

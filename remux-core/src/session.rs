//! Terminal sessions for spaces.
//!
//! Resolves a space name to its worktree and attaches to (or creates) a tmux
//! session for it. Only reads the registry; never mutates it.

use std::path::{Path, PathBuf};

use crate::error::{CommandError, SessionError};
use crate::git::Vcs;
use crate::process::{run_capture, run_interactive};
use crate::registry;
use crate::types::SpaceName;

/// Terminal multiplexer collaborator.
pub trait Multiplexer {
    fn session_exists(&self, name: &str) -> bool;
    fn attach(&self, name: &str) -> Result<(), CommandError>;
    fn new_session(&self, name: &str, workdir: &Path) -> Result<(), CommandError>;
}

/// [`Multiplexer`] backed by the `tmux` binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tmux;

impl Multiplexer for Tmux {
    fn session_exists(&self, name: &str) -> bool {
        run_capture("tmux", &["has-session", "-t", name], None)
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn attach(&self, name: &str) -> Result<(), CommandError> {
        run_interactive("tmux", &["attach-session", "-t", name])
    }

    fn new_session(&self, name: &str, workdir: &Path) -> Result<(), CommandError> {
        let workdir = workdir.to_string_lossy();
        run_interactive("tmux", &["new-session", "-s", name, "-c", &workdir])
    }
}

/// tmux rejects `.` and `:` in session names.
pub fn sanitize_session_name(name: &str) -> String {
    name.replace(['.', ':'], "_")
}

/// Resolve `name` to a worktree path under `dest`.
///
/// A registered space resolves to its recorded path; anything else to
/// `<dest>/<name>`. Either way the path must be an existing worktree directory.
pub fn resolve_space(dest: &Path, name: &str, vcs: &dyn Vcs) -> Result<PathBuf, SessionError> {
    let registry = registry::load(dest)?;
    let path = registry
        .get(&SpaceName::from(name))
        .map(|record| record.path.clone())
        .unwrap_or_else(|| dest.join(name));

    let meta = match std::fs::metadata(&path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SessionError::NotFound { path });
        }
        Err(e) => return Err(SessionError::Io { path, source: e }),
    };
    if !meta.is_dir() {
        return Err(SessionError::NotADirectory { path });
    }
    if !vcs.is_worktree(&path) {
        return Err(SessionError::NotAWorktree { path });
    }
    Ok(path)
}

/// Attach to the session for `name`, creating it in the space if needed.
pub fn open_space(
    dest: &Path,
    name: &str,
    vcs: &dyn Vcs,
    mux: &dyn Multiplexer,
) -> Result<(), SessionError> {
    let path = resolve_space(dest, name, vcs)?;
    let session = sanitize_session_name(name);

    if mux.session_exists(&session) {
        tracing::debug!("attaching to existing session {session}");
        return mux.attach(&session).map_err(SessionError::Multiplexer);
    }
    tracing::debug!("starting session {session} in {}", path.display());
    mux.new_session(&session, &path)
        .map_err(SessionError::Multiplexer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_dots() {
        assert_eq!(sanitize_session_name("my.workspace"), "my_workspace");
    }

    #[test]
    fn sanitize_replaces_colons() {
        assert_eq!(sanitize_session_name("my:workspace"), "my_workspace");
    }

    #[test]
    fn sanitize_replaces_mixed() {
        assert_eq!(sanitize_session_name("repo.name:branch"), "repo_name_branch");
    }

    #[test]
    fn sanitize_leaves_valid_names() {
        assert_eq!(sanitize_session_name("my-workspace"), "my-workspace");
    }
}

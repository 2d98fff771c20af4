//! Create/drop state machine for spaces.
//!
//! ## `create`
//!
//! 1. Validate the branch and derive `<dest>/<repo>-<branch>`.
//! 2. Refuse if the path exists (no collaborator calls yet).
//! 3. Reuse or create the branch; record whether this call created it.
//! 4. Add the worktree. On failure delete the branch only if step 3 created it.
//! 5. Register the space and allocate a port under the registry lock.
//! 6. Run `on_create` hooks.
//!
//! Steps 5 and 6 never fail the operation: their errors come back as
//! [`Warning`]s next to the successful result.
//!
//! ## `drop`
//!
//! 1. The cwd must be a worktree, and unless forced must be clean.
//! 2. Run `on_drop` hooks, remove the worktree, unregister.
//!
//! Hook and registry failures are again returned as warnings.

use std::path::{Component, Path, PathBuf};

use crate::error::{SpaceError, Warning};
use crate::git::Vcs;
use crate::hooks::{HookRunner, Space};
use crate::registry;
use crate::types::{PortRange, SpaceName};

/// Inputs to [`Lifecycle::create`].
#[derive(Debug, Clone)]
pub struct CreateOptions {
    /// Root of the repository the space branches from.
    pub repo_root: PathBuf,
    /// Destination directory holding worktrees and the registry.
    pub dest_dir: PathBuf,
    pub branch: String,
    /// Check out an existing branch instead of failing with `BranchConflict`.
    pub reuse_existing: bool,
}

/// Inputs to [`Lifecycle::drop`].
#[derive(Debug, Clone)]
pub struct DropOptions {
    /// The worktree directory being dropped.
    pub cwd: PathBuf,
    /// Drop even with uncommitted changes.
    pub force: bool,
}

/// A space that now exists on disk.
#[derive(Debug)]
pub struct Created {
    pub name: SpaceName,
    pub path: PathBuf,
    /// `None` when registration failed (see `warnings`).
    pub port: Option<u16>,
    pub warnings: Vec<Warning>,
}

/// A space whose worktree has been removed.
#[derive(Debug)]
pub struct Dropped {
    pub name: SpaceName,
    pub path: PathBuf,
    /// Port released by the registry, if the space was registered.
    pub port: Option<u16>,
    pub warnings: Vec<Warning>,
}

/// Composes the registry with the version-control and hook collaborators.
pub struct Lifecycle<'a> {
    vcs: &'a dyn Vcs,
    hooks: &'a dyn HookRunner,
    ports: PortRange,
}

impl<'a> Lifecycle<'a> {
    pub fn new(vcs: &'a dyn Vcs, hooks: &'a dyn HookRunner) -> Self {
        Self {
            vcs,
            hooks,
            ports: PortRange::default(),
        }
    }

    pub fn with_ports(mut self, ports: PortRange) -> Self {
        self.ports = ports;
        self
    }

    /// Create a worktree for `opts.branch` and register it as a space.
    pub fn create(&self, opts: &CreateOptions) -> Result<Created, SpaceError> {
        validate_branch(&opts.branch)?;

        let name = SpaceName::for_branch(&opts.repo_root, &opts.branch);
        let path = opts.dest_dir.join(name.as_str());

        if path.exists() {
            return Err(SpaceError::AlreadyExists { path });
        }

        let created_branch = if self.vcs.branch_exists(&opts.repo_root, &opts.branch) {
            if !opts.reuse_existing {
                return Err(SpaceError::BranchConflict {
                    branch: opts.branch.clone(),
                });
            }
            tracing::debug!("reusing existing branch {}", opts.branch);
            false
        } else {
            self.vcs
                .create_branch(&opts.repo_root, &opts.branch)
                .map_err(|e| SpaceError::CreateBranch {
                    branch: opts.branch.clone(),
                    source: e,
                })?;
            tracing::debug!("created branch {}", opts.branch);
            true
        };

        if let Err(e) = self.vcs.add_worktree(&opts.repo_root, &path, &opts.branch) {
            if created_branch {
                if let Err(rollback) = self.vcs.delete_branch(&opts.repo_root, &opts.branch) {
                    tracing::warn!("failed to delete branch {}: {rollback}", opts.branch);
                } else {
                    tracing::info!("rolled back branch {}", opts.branch);
                }
            }
            return Err(SpaceError::AddWorktree { path, source: e });
        }
        tracing::info!("created worktree {}", path.display());

        let mut warnings = Vec::new();
        let port = match registry::register_space(
            &opts.dest_dir,
            name.clone(),
            path.clone(),
            opts.repo_root.clone(),
            self.ports,
        ) {
            Ok(record) => Some(record.port),
            Err(e) => {
                tracing::warn!("space {name} created but not registered: {e}");
                warnings.push(Warning::Registry(e));
                None
            }
        };

        let space = Space {
            name: name.clone(),
            path: path.clone(),
            port,
        };
        if let Err(e) = self.hooks.run_on_create(&space) {
            tracing::warn!("on_create hook failed for {name}: {e}");
            warnings.push(Warning::Hook(e));
        }

        Ok(Created {
            name,
            path,
            port,
            warnings,
        })
    }

    /// Remove the space whose worktree is `opts.cwd`.
    pub fn drop(&self, opts: &DropOptions) -> Result<Dropped, SpaceError> {
        let path = opts.cwd.clone();
        if !self.vcs.is_worktree(&path) {
            return Err(SpaceError::NotAWorktree { path });
        }

        if !opts.force {
            let dirty = self
                .vcs
                .has_uncommitted_changes(&path)
                .map_err(|e| SpaceError::Status {
                    path: path.clone(),
                    source: e,
                })?;
            if dirty {
                return Err(SpaceError::UncommittedChanges { path });
            }
        }

        let name = SpaceName::from_path(&path);
        let dest = path.parent().map(Path::to_path_buf).unwrap_or_else(|| path.clone());
        let mut warnings = Vec::new();

        let space = Space {
            name: name.clone(),
            port: registered_port(&dest, &name),
            path: path.clone(),
        };
        if let Err(e) = self.hooks.run_on_drop(&space) {
            tracing::warn!("on_drop hook failed for {name}: {e}");
            warnings.push(Warning::Hook(e));
        }

        self.vcs
            .remove_worktree(&path, opts.force)
            .map_err(|e| SpaceError::RemoveWorktree {
                path: path.clone(),
                source: e,
            })?;
        tracing::info!("removed worktree {}", path.display());

        let port = match registry::unregister_space(&dest, &name) {
            Ok(record) => record.map(|r| r.port),
            Err(e) => {
                tracing::warn!("worktree {name} removed but registry not updated: {e}");
                warnings.push(Warning::Registry(e));
                None
            }
        };

        Ok(Dropped {
            name,
            path,
            port,
            warnings,
        })
    }
}

/// Reject names that cannot form a single worktree directory under the destination.
fn validate_branch(branch: &str) -> Result<(), SpaceError> {
    let invalid = |reason| SpaceError::InvalidBranch {
        branch: branch.to_string(),
        reason,
    };
    if branch.trim().is_empty() {
        return Err(invalid("branch name is empty"));
    }
    let escapes = Path::new(branch)
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if escapes {
        return Err(invalid("branch name must not be absolute or contain `.`/`..`"));
    }
    Ok(())
}

/// Port of a registered space, read without taking the lock. Only used to
/// populate hook environment, so a stale or unreadable registry yields `None`.
fn registered_port(dest: &Path, name: &SpaceName) -> Option<u16> {
    registry::load(dest).ok()?.get(name).map(|r| r.port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_branch_accepts_plain_and_nested_names() {
        assert!(validate_branch("feat").is_ok());
        assert!(validate_branch("feat/login").is_ok());
    }

    #[test]
    fn validate_branch_rejects_empty_and_escaping_names() {
        for bad in ["", "  ", "../x", "/abs", "a/../b", "./x"] {
            let err = validate_branch(bad).unwrap_err();
            assert!(matches!(err, SpaceError::InvalidBranch { .. }), "{bad:?}: {err}");
        }
    }
}

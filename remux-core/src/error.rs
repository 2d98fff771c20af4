//! Error types for remux-core.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// All errors that can arise from registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Underlying I/O failure, with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with the file path and serde_yaml's line context.
    #[error("failed to parse registry at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The registry lock file could not be opened or locked.
    #[error("failed to lock registry at {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Every port in the candidate range is held by a record.
    #[error("no free port in range {start}-{end}")]
    PortsExhausted { start: u16, end: u16 },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RegistryError {
    RegistryError::Io {
        path: path.into(),
        source,
    }
}

/// Failure of an external command (git, tmux).
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed: {stderr}")]
    Failed { command: String, stderr: String },
}

/// Failure of a user-configured hook.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("failed to read hooks from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse hooks at {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to run hook `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("hook `{command}` exited with {status}")]
    Failed { command: String, status: ExitStatus },
}

/// Coarse classification of a [`SpaceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any side effect.
    Validation,
    /// A version-control operation failed.
    Collaborator,
    /// The space is not in a state that allows the operation.
    Precondition,
}

/// Fatal errors of the create/drop lifecycle.
#[derive(Debug, Error)]
pub enum SpaceError {
    #[error("invalid branch name {branch:?}: {reason}")]
    InvalidBranch { branch: String, reason: &'static str },

    #[error("worktree directory already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("branch {branch:?} already exists")]
    BranchConflict { branch: String },

    #[error("failed to create branch {branch:?}: {source}")]
    CreateBranch {
        branch: String,
        #[source]
        source: CommandError,
    },

    #[error("failed to create worktree at {}: {source}", path.display())]
    AddWorktree {
        path: PathBuf,
        #[source]
        source: CommandError,
    },

    #[error("failed to remove worktree at {}: {source}", path.display())]
    RemoveWorktree {
        path: PathBuf,
        #[source]
        source: CommandError,
    },

    #[error("failed to check status of {}: {source}", path.display())]
    Status {
        path: PathBuf,
        #[source]
        source: CommandError,
    },

    #[error("not a git worktree: {}", path.display())]
    NotAWorktree { path: PathBuf },

    #[error("uncommitted changes in {} (use --force to drop anyway)", path.display())]
    UncommittedChanges { path: PathBuf },
}

impl SpaceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SpaceError::InvalidBranch { .. }
            | SpaceError::AlreadyExists { .. }
            | SpaceError::BranchConflict { .. } => ErrorKind::Validation,
            SpaceError::CreateBranch { .. }
            | SpaceError::AddWorktree { .. }
            | SpaceError::RemoveWorktree { .. }
            | SpaceError::Status { .. } => ErrorKind::Collaborator,
            SpaceError::NotAWorktree { .. } | SpaceError::UncommittedChanges { .. } => {
                ErrorKind::Precondition
            }
        }
    }
}

/// A secondary failure that did not abort the enclosing operation.
#[derive(Debug, Error)]
pub enum Warning {
    #[error("registry not updated: {0}")]
    Registry(#[source] RegistryError),

    #[error("hook failed: {0}")]
    Hook(#[source] HookError),
}

/// Errors resolving or opening a space session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("space does not exist: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("space path is not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    #[error("not a git worktree: {}", path.display())]
    NotAWorktree { path: PathBuf },

    #[error("failed to access space at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("terminal session error: {0}")]
    Multiplexer(#[source] CommandError),
}

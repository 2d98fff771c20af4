//! remux core library: space registry, lifecycle, and collaborators.
//!
//! - [`types`]: space records, the registry document, port ranges
//! - [`error`]: error enums and the non-fatal [`Warning`] channel
//! - [`registry`]: locked load / save / register / unregister
//! - [`git`]: the [`Vcs`] collaborator and its `git` implementation
//! - [`hooks`]: `.remux.yaml` hooks and the [`HookRunner`] collaborator
//! - [`lifecycle`]: create / drop with rollback
//! - [`session`]: tmux sessions for spaces

pub mod error;
pub mod git;
pub mod hooks;
pub mod lifecycle;
mod process;
pub mod registry;
pub mod session;
pub mod types;

pub use error::{
    CommandError, ErrorKind, HookError, RegistryError, SessionError, SpaceError, Warning,
};
pub use git::{GitCli, Vcs};
pub use hooks::{HookConfig, HookRunner, ShellHooks, Space};
pub use lifecycle::{CreateOptions, Created, DropOptions, Dropped, Lifecycle};
pub use session::{open_space, resolve_space, sanitize_session_name, Multiplexer, Tmux};
pub use types::{PortRange, Registry, SpaceName, SpaceRecord};

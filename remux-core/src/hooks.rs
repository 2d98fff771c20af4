//! Per-space lifecycle hooks.
//!
//! A space may carry a `.remux.yaml` at its root:
//!
//! ```yaml
//! on_create:
//!   - npm install
//! on_drop:
//!   - docker compose down
//! ```
//!
//! Commands run sequentially through `sh -c` inside the space directory with
//! `REMUX_SPACE_NAME`, `REMUX_SPACE_PATH` and (when known) `REMUX_PORT` set.
//! The first failing command stops the sequence.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::error::HookError;
use crate::types::SpaceName;

pub const HOOKS_FILE: &str = ".remux.yaml";

/// An on-disk space directory, registered or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Space {
    pub name: SpaceName,
    pub path: PathBuf,
    pub port: Option<u16>,
}

impl Space {
    pub fn new(path: impl Into<PathBuf>, port: Option<u16>) -> Self {
        let path = path.into();
        Self {
            name: SpaceName::from_path(&path),
            path,
            port,
        }
    }

    pub fn hooks_path(&self) -> PathBuf {
        self.path.join(HOOKS_FILE)
    }
}

/// Commands declared in `.remux.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookConfig {
    #[serde(default)]
    pub on_create: Vec<String>,
    #[serde(default)]
    pub on_drop: Vec<String>,
}

impl HookConfig {
    /// Load the hooks for `space`. A missing file means no hooks.
    pub fn load(space: &Space) -> Result<Self, HookError> {
        let path = space.hooks_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| HookError::Read {
            path: path.clone(),
            source: e,
        })?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents).map_err(|e| HookError::Config { path, source: e })
    }
}

/// Hook collaborator consumed by the lifecycle manager.
pub trait HookRunner {
    fn run_on_create(&self, space: &Space) -> Result<(), HookError>;
    fn run_on_drop(&self, space: &Space) -> Result<(), HookError>;
}

/// Runs `.remux.yaml` hooks through the system shell.
#[derive(Debug, Clone)]
pub struct ShellHooks {
    shell: PathBuf,
}

impl Default for ShellHooks {
    fn default() -> Self {
        Self {
            shell: PathBuf::from("sh"),
        }
    }
}

impl ShellHooks {
    fn run_all(&self, space: &Space, commands: &[String]) -> Result<(), HookError> {
        for command in commands {
            tracing::info!("hook [{}]: {command}", space.name);
            run_hook(&self.shell, space, command)?;
        }
        Ok(())
    }
}

impl HookRunner for ShellHooks {
    fn run_on_create(&self, space: &Space) -> Result<(), HookError> {
        let config = HookConfig::load(space)?;
        self.run_all(space, &config.on_create)
    }

    fn run_on_drop(&self, space: &Space) -> Result<(), HookError> {
        let config = HookConfig::load(space)?;
        self.run_all(space, &config.on_drop)
    }
}

fn run_hook(shell: &Path, space: &Space, command: &str) -> Result<(), HookError> {
    let mut cmd = Command::new(shell);
    cmd.arg("-c")
        .arg(command)
        .current_dir(&space.path)
        .env("REMUX_SPACE_NAME", space.name.as_str())
        .env("REMUX_SPACE_PATH", &space.path)
        .stdin(Stdio::null());
    match space.port {
        Some(port) => {
            cmd.env("REMUX_PORT", port.to_string());
        }
        None => {
            cmd.env_remove("REMUX_PORT");
        }
    }

    let status = cmd.status().map_err(|e| HookError::Spawn {
        command: command.to_string(),
        source: e,
    })?;
    if !status.success() {
        return Err(HookError::Failed {
            command: command.to_string(),
            status,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn space_in(dir: &TempDir, port: Option<u16>) -> Space {
        Space::new(dir.path(), port)
    }

    #[test]
    fn missing_file_means_no_hooks() {
        let dir = TempDir::new().expect("tempdir");
        let config = HookConfig::load(&space_in(&dir, None)).expect("load");
        assert_eq!(config, HookConfig::default());
    }

    #[test]
    fn partial_file_defaults_other_list() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join(HOOKS_FILE), "on_drop:\n  - echo bye\n").unwrap();
        let config = HookConfig::load(&space_in(&dir, None)).expect("load");
        assert!(config.on_create.is_empty());
        assert_eq!(config.on_drop, vec!["echo bye".to_string()]);
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join(HOOKS_FILE), "on_create: {unclosed").unwrap();
        let err = HookConfig::load(&space_in(&dir, None)).unwrap_err();
        assert!(matches!(err, HookError::Config { .. }), "got: {err}");
    }

    #[cfg(unix)]
    #[test]
    fn create_hook_runs_in_space_with_env() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(
            dir.path().join(HOOKS_FILE),
            "on_create:\n  - echo \"$REMUX_SPACE_NAME:$REMUX_PORT\" > hook.out\n",
        )
        .unwrap();
        let space = space_in(&dir, Some(9001));
        ShellHooks::default().run_on_create(&space).expect("hook");

        let out = std::fs::read_to_string(dir.path().join("hook.out")).unwrap();
        assert_eq!(out.trim(), format!("{}:9001", space.name));
    }

    #[cfg(unix)]
    #[test]
    fn failing_command_stops_sequence() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(
            dir.path().join(HOOKS_FILE),
            "on_drop:\n  - exit 3\n  - touch never\n",
        )
        .unwrap();
        let err = ShellHooks::default()
            .run_on_drop(&space_in(&dir, None))
            .unwrap_err();
        assert!(matches!(err, HookError::Failed { .. }), "got: {err}");
        assert!(!dir.path().join("never").exists());
    }
}

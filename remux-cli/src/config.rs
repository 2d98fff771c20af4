//! Destination directory and port range resolution.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use remux_core::{registry, PortRange};

pub const PORT_START_ENV: &str = "REMUX_PORT_START";
pub const PORT_END_ENV: &str = "REMUX_PORT_END";

/// `--dest` shared by every command that touches a destination directory.
#[derive(Args, Debug, Clone)]
pub struct DestArgs {
    /// Worktree directory (default: ~/at).
    #[arg(long, short = 'd', env = "REMUX_DEST", value_name = "DIR")]
    pub dest: Option<PathBuf>,
}

impl DestArgs {
    /// The destination as an absolute path.
    pub fn resolve(&self) -> Result<PathBuf> {
        let dest = match &self.dest {
            Some(dest) => dest.clone(),
            None => registry::default_dest().context("could not determine home directory")?,
        };
        let dest = absolute(&dest)?;
        tracing::debug!("destination {}", dest.display());
        Ok(dest)
    }
}

pub fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().context("failed to get current directory")
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(current_dir()?.join(path))
}

/// Port range from `REMUX_PORT_START` / `REMUX_PORT_END`, defaulting to 9000-9999.
pub fn port_range() -> Result<PortRange> {
    let start = read_port(PORT_START_ENV)?.unwrap_or(PortRange::DEFAULT_START);
    let end = read_port(PORT_END_ENV)?.unwrap_or(PortRange::DEFAULT_END);
    if start > end {
        bail!("{PORT_START_ENV} ({start}) must not exceed {PORT_END_ENV} ({end})");
    }
    let range = PortRange::new(start, end);
    tracing::debug!("port range {range}");
    Ok(range)
}

fn read_port(var: &str) -> Result<Option<u16>> {
    match std::env::var(var) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{var} must be a port number, got '{raw}'")),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("failed to read {var}")),
    }
}

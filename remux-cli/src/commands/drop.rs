//! `remux drop [--force]`

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use remux_core::{DropOptions, GitCli, Lifecycle, ShellHooks};

use super::print_warnings;
use crate::config;

/// Remove the space the current directory is in.
#[derive(Args, Debug)]
pub struct DropArgs {
    /// Drop even if the worktree has uncommitted changes.
    #[arg(long, short = 'f')]
    pub force: bool,
}

impl DropArgs {
    pub fn run(self) -> Result<()> {
        let cwd = config::current_dir()?;

        let vcs = GitCli;
        let hooks = ShellHooks::default();
        let dropped = Lifecycle::new(&vcs, &hooks)
            .drop(&DropOptions {
                cwd: cwd.clone(),
                force: self.force,
            })
            .with_context(|| format!("failed to drop {}", cwd.display()))?;

        println!("✓ Removed space '{}'", dropped.name.as_str().green());
        if let Some(port) = dropped.port {
            println!("  Released port {port}");
        }
        print_warnings(&dropped.warnings);
        Ok(())
    }
}

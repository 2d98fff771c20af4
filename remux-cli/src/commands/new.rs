//! `remux new <branch> [--dest DIR] [--reuse]`

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use remux_core::{git, CreateOptions, GitCli, Lifecycle, ShellHooks};

use super::print_warnings;
use crate::config::{self, DestArgs};

/// Create a worktree for a branch, reserve a port and run `on_create` hooks.
#[derive(Args, Debug)]
pub struct NewArgs {
    /// Branch to check out. Created from HEAD unless `--reuse` is given and it exists.
    pub branch: String,

    #[command(flatten)]
    pub dest: DestArgs,

    /// Check out the branch if it already exists instead of failing.
    #[arg(long)]
    pub reuse: bool,
}

impl NewArgs {
    pub fn run(self) -> Result<()> {
        let cwd = config::current_dir()?;
        let repo_root = git::repo_root(&cwd).context("not inside a git repository")?;
        let dest_dir = self.dest.resolve()?;
        std::fs::create_dir_all(&dest_dir)
            .with_context(|| format!("cannot create {}", dest_dir.display()))?;

        let vcs = GitCli;
        let hooks = ShellHooks::default();
        let lifecycle = Lifecycle::new(&vcs, &hooks).with_ports(config::port_range()?);

        let created = lifecycle
            .create(&CreateOptions {
                repo_root,
                dest_dir,
                branch: self.branch.clone(),
                reuse_existing: self.reuse,
            })
            .with_context(|| format!("failed to create space for '{}'", self.branch))?;

        println!("✓ Created space '{}'", created.name.as_str().green());
        println!("  Path: {}", created.path.display());
        match created.port {
            Some(port) => println!("  Port: {port}"),
            None => println!("  Port: {}", "unassigned".yellow()),
        }
        print_warnings(&created.warnings);
        Ok(())
    }
}

//! `remux list [--dest DIR] [--json]`

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use remux_core::{registry, SpaceRecord};

use crate::config::DestArgs;

/// List the spaces registered under a destination directory.
#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub dest: DestArgs,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl ListArgs {
    pub fn run(self) -> Result<()> {
        let dest = self.dest.resolve()?;
        let registry = registry::load(&dest)
            .with_context(|| format!("failed to load registry under {}", dest.display()))?;
        let records: Vec<&SpaceRecord> = registry.iter().collect();

        if self.json {
            print_json(&records)?;
            return Ok(());
        }
        if records.is_empty() {
            println!("No spaces under {}", dest.display());
            return Ok(());
        }
        print_table(&records);
        Ok(())
    }
}

#[derive(Serialize)]
struct SpaceJson<'a> {
    name: &'a str,
    path: String,
    port: u16,
    repo_root: String,
    created_at: DateTime<Utc>,
    exists: bool,
}

fn print_json(records: &[&SpaceRecord]) -> Result<()> {
    let rows: Vec<SpaceJson<'_>> = records
        .iter()
        .map(|r| SpaceJson {
            name: r.name.as_str(),
            path: r.path.display().to_string(),
            port: r.port,
            repo_root: r.repo_root.display().to_string(),
            created_at: r.created_at,
            exists: r.path.is_dir(),
        })
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&rows).context("failed to serialize spaces")?
    );
    Ok(())
}

#[derive(Tabled)]
struct SpaceTableRow {
    #[tabled(rename = "space")]
    name: String,
    #[tabled(rename = "port")]
    port: u16,
    #[tabled(rename = "path")]
    path: String,
    #[tabled(rename = "created")]
    created: String,
}

fn print_table(records: &[&SpaceRecord]) {
    let rows: Vec<SpaceTableRow> = records
        .iter()
        .map(|r| SpaceTableRow {
            name: if r.path.is_dir() {
                r.name.to_string()
            } else {
                format!("{} {}", r.name, "(missing)".red())
            },
            port: r.port,
            path: r.path.display().to_string(),
            created: r.created_at.format("%Y-%m-%d %H:%M").to_string(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

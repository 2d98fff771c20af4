//! Captured-output helpers for the external commands remux drives.

use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use crate::error::CommandError;

pub(crate) struct CmdOutput {
    pub(crate) status: ExitStatus,
    pub(crate) stdout: String,
    pub(crate) stderr: String,
}

/// Run `program args…` (optionally in `cwd`) and capture its output.
///
/// Only spawn failures are errors here; callers inspect `status`.
pub(crate) fn run_capture(
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
) -> Result<CmdOutput, CommandError> {
    let mut command = Command::new(program);
    command.args(args).stdin(Stdio::null());
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }
    tracing::debug!("running {}", render_command(program, args));
    let output = command.output().map_err(|e| CommandError::Spawn {
        program: program.to_string(),
        source: e,
    })?;

    Ok(CmdOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Like [`run_capture`], but a non-zero exit is a [`CommandError::Failed`].
pub(crate) fn run_checked(
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
) -> Result<CmdOutput, CommandError> {
    let output = run_capture(program, args, cwd)?;
    if !output.status.success() {
        return Err(CommandError::Failed {
            command: render_command(program, args),
            stderr: best_error_line(&output.stderr),
        });
    }
    Ok(output)
}

/// Run a command attached to the current terminal.
pub(crate) fn run_interactive(program: &str, args: &[&str]) -> Result<(), CommandError> {
    tracing::debug!("running {} (interactive)", render_command(program, args));
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| CommandError::Spawn {
            program: program.to_string(),
            source: e,
        })?;
    if !status.success() {
        return Err(CommandError::Failed {
            command: render_command(program, args),
            stderr: format!("exited with {status}"),
        });
    }
    Ok(())
}

pub(crate) fn render_command(program: &str, args: &[&str]) -> String {
    let mut rendered = program.to_string();
    for arg in args {
        rendered.push(' ');
        rendered.push_str(arg);
    }
    rendered
}

/// Pick the most useful line of a command's stderr: the first `error:`/`fatal:`
/// line if any, else the last non-empty line.
pub(crate) fn best_error_line(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if let Some(line) = lines.iter().find(|line| {
        let lower = line.to_ascii_lowercase();
        lower.starts_with("error:") || lower.starts_with("fatal:")
    }) {
        return (*line).to_string();
    }

    lines
        .last()
        .map(|line| (*line).to_string())
        .unwrap_or_else(|| "unknown error".to_string())
}

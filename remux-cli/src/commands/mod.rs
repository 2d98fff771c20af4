pub mod drop;
pub mod list;
pub mod new;
pub mod open;

use colored::Colorize;

use remux_core::Warning;

/// Non-fatal problems are reported after the outcome line, never as errors.
pub(crate) fn print_warnings(warnings: &[Warning]) {
    for warning in warnings {
        eprintln!("{} {warning}", "warning:".yellow().bold());
    }
}

//! Terminal output helpers.
//!
//! Data goes to stdout as JSON so it can be piped; everything meant for a
//! human (progress, results, hints) goes to stderr.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

pub fn progress(msg: &str) {
    eprintln!("{}", msg.dimmed());
}

pub fn success(msg: &str) {
    eprintln!("{} {}", "✓".green(), msg);
}

pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

/// A follow-up the user can take, such as logging in again.
pub fn hint(msg: &str) {
    eprintln!("  {} {}", "→".yellow(), msg);
}

/// `label: value` on stderr.
pub fn field(label: &str, value: impl std::fmt::Display) {
    eprintln!("{:>10} {}", format!("{}:", label).dimmed(), value);
}

/// One JSON document per line on stdout.
pub fn json_line<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

pub fn json_pretty<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

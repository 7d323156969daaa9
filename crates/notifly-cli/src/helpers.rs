//! Shared CLI helpers — path expansion, `--var` parsing, outcome printing.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use colored::Colorize;
use serde_json::Value;

use notifly_core::template::TemplateData;
use notifly_core::types::SendResult;

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Parse `key=value` pairs into template data.
///
/// Values that parse as JSON (numbers, booleans, arrays, objects) keep their
/// type, so `items=["a","b"]` works with `{{#each items}}`. Anything else is
/// a plain string.
pub fn parse_vars(pairs: &[String]) -> Result<TemplateData> {
    let mut data = TemplateData::new();
    for pair in pairs {
        let Some((key, raw)) = pair.split_once('=') else {
            bail!("invalid --var '{}': expected key=value", pair);
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("invalid --var '{}': empty key", pair);
        }
        let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        data.insert(key.to_string(), value);
    }
    Ok(data)
}

/// Print a send outcome. Returns `true` on success.
pub fn print_outcome(channel: &str, result: &SendResult) -> bool {
    match result {
        Ok(sent) => {
            println!("{} {} sent", "✓".green(), channel);
            if let Some(loc) = &sent.location {
                println!("  {:<10} {}", "channel:".bold(), loc.channel);
                println!("  {:<10} {}", "ts:".bold(), loc.ts);
                if let Some(thread) = &loc.thread_ts {
                    println!("  {:<10} {}", "thread:".bold(), thread);
                }
                println!("  {:<10} {}", "link:".bold(), loc.permalink.cyan());
            }
            true
        }
        Err(e) => {
            eprintln!("{} {} failed: {}", "✗".red(), channel, e.message().red());
            false
        }
    }
}

pub fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

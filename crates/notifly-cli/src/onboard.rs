//! `notifly init` — write a default config file.
//!
//! The file starts from defaults plus any `NOTIFLY_*` env overrides, so
//! credentials exported in the shell land in the config.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use notifly_core::config::{get_config_path, load_defaults, save_config};

/// Run the init command.
pub fn run(path: Option<&Path>, force: bool) -> Result<()> {
    println!();
    println!("{}", "🔔 Notifly Setup".cyan().bold());
    println!();

    let config_path = path.map(Path::to_path_buf).unwrap_or_else(get_config_path);

    if config_path.exists() && !force {
        println!(
            "  {} config already exists at {} (use --force to overwrite)",
            "✓".green(),
            config_path.display()
        );
        println!();
        return Ok(());
    }

    let config = load_defaults();
    save_config(&config, Some(&config_path))
        .with_context(|| format!("failed to write {}", config_path.display()))?;

    println!("  {} created config at {}", "✓".green(), config_path.display());
    println!();
    println!(
        "{}",
        "  Next: set slack.webhookUrl or slack.botToken, and mailTransport settings.".green()
    );
    println!();

    Ok(())
}

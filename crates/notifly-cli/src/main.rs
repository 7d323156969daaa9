//! Notifly CLI — entry point.
//!
//! # Commands
//!
//! - `notifly mail --to ADDR --subject S --body B` — send an email
//! - `notifly slack send|dm|reply …` — post to Slack
//! - `notifly status` — show configuration and credential status
//! - `notifly init` — write a default config file
//!
//! A send whose result is a failure exits with status 1.

mod helpers;
mod onboard;
mod send_cmd;
mod status;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use notifly_core::config::load_config;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// 🔔 Notifly — send email and Slack notifications from the shell
#[derive(Parser)]
#[command(name = "notifly", version, about, long_about = None)]
struct Cli {
    /// Config file (default: ~/.notifly/config.json)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, default_value_t = false)]
    logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send an email
    Mail(send_cmd::MailArgs),

    /// Send a Slack message
    Slack {
        #[command(subcommand)]
        action: send_cmd::SlackCommands,
    },

    /// Show configuration and credential status
    Status,

    /// Write a default config file
    Init {
        /// Overwrite an existing config
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.logs);

    let config_path: Option<PathBuf> = cli.config.as_deref().map(helpers::expand_tilde);

    match cli.command {
        Commands::Mail(args) => {
            let config = load_config(config_path.as_deref());
            let result = send_cmd::run_mail(&config, args).await?;
            Ok(helpers::exit_code(helpers::print_outcome("mail", &result)))
        }
        Commands::Slack { action } => {
            let config = load_config(config_path.as_deref());
            let result = send_cmd::run_slack(&config, action).await?;
            Ok(helpers::exit_code(helpers::print_outcome("slack", &result)))
        }
        Commands::Status => {
            status::run(config_path.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Init { force } => {
            onboard::run(config_path.as_deref(), force)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("notifly=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_mail_with_vars() {
        let cli = Cli::try_parse_from([
            "notifly", "mail", "--to", "a@x.io", "--subject", "Hi {{name}}", "--body", "b",
            "--var", "name=Ada", "--html",
        ])
        .unwrap();
        match cli.command {
            Commands::Mail(args) => {
                assert_eq!(args.to, "a@x.io");
                assert_eq!(args.var, vec!["name=Ada".to_string()]);
                assert!(args.html);
                assert!(!args.no_prefix);
            }
            _ => panic!("expected mail command"),
        }
    }

    #[test]
    fn parses_mail_plain_and_rejects_both_formats() {
        let cli = Cli::try_parse_from([
            "notifly", "mail", "--to", "a@x.io", "--subject", "s", "--body", "b", "--plain",
        ])
        .unwrap();
        match cli.command {
            Commands::Mail(args) => assert!(args.plain && !args.html),
            _ => panic!("expected mail command"),
        }

        assert!(Cli::try_parse_from([
            "notifly", "mail", "--to", "a@x.io", "--subject", "s", "--body", "b", "--plain",
            "--html",
        ])
        .is_err());
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["notifly", "status", "--logs", "-c", "/tmp/n.json"]).unwrap();
        assert!(cli.logs);
        assert_eq!(cli.config.as_deref(), Some("/tmp/n.json"));
    }

    #[test]
    fn parses_slack_reply() {
        let cli = Cli::try_parse_from([
            "notifly", "slack", "reply", "--channel", "C1", "--ts", "1.2", "--message", "ack",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Slack {
                action: send_cmd::SlackCommands::Reply { .. }
            }
        ));
    }
}

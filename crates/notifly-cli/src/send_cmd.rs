//! `notifly mail` and `notifly slack …` — one send per invocation.
//!
//! Both commands render their text through the template engine when at
//! least one `--var` is given, so `{{name}}`, `{{#if}}` and `{{#each}}` work
//! from the shell.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tracing::debug;

use notifly_channels::email::{EmailTemplate, MailOptions, Mailer};
use notifly_channels::slack::{SlackNotifier, SlackOptions};
use notifly_channels::transport::{create_transport, Attachment, Recipients};
use notifly_core::config::Config;
use notifly_core::template::{render, TemplateData};
use notifly_core::types::SendResult;

use crate::helpers::{expand_tilde, parse_vars};

// ─────────────────────────────────────────────
// Mail
// ─────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct MailArgs {
    /// Recipient(s), comma-separated
    #[arg(long)]
    pub to: String,

    /// Subject line (template)
    #[arg(short, long)]
    pub subject: String,

    /// Message body (template)
    #[arg(short, long)]
    pub body: String,

    /// Send the body as HTML
    #[arg(long, default_value_t = false, conflicts_with = "plain")]
    pub html: bool,

    /// Send the body as plain text, even if the config defaults to HTML
    #[arg(long, default_value_t = false)]
    pub plain: bool,

    /// Don't prepend the configured subject prefix
    #[arg(long, default_value_t = false)]
    pub no_prefix: bool,

    /// Sender display name (overrides config)
    #[arg(long)]
    pub sender: Option<String>,

    /// File to attach (repeatable)
    #[arg(long)]
    pub attach: Vec<String>,

    /// Template variable `key=value` (repeatable)
    #[arg(long)]
    pub var: Vec<String>,
}

/// Send one email using the configured transport.
pub async fn run_mail(config: &Config, args: MailArgs) -> Result<SendResult> {
    let transport = create_transport(&config.mail_transport)?;
    debug!(transport = transport.display_name(), "mail transport ready");
    let mailer = Mailer::new(config.mail.clone(), transport);

    let mut attachments = Vec::with_capacity(args.attach.len());
    for path in &args.attach {
        let path = expand_tilde(path);
        let attachment = Attachment::from_path(&path)
            .await
            .with_context(|| format!("failed to read attachment {}", path.display()))?;
        attachments.push(attachment);
    }

    let options = MailOptions {
        sender: args.sender,
        html: html_override(args.html, args.plain),
        attachments,
        no_prefix: args.no_prefix,
    };
    let to = Recipients::parse(&args.to);

    let data = parse_vars(&args.var)?;
    let result = if data.is_empty() {
        mailer.send(to, &args.subject, &args.body, &options).await
    } else {
        EmailTemplate::new(args.subject, args.body)
            .send(&mailer, to, &data, &options)
            .await
    };

    Ok(result)
}

// ─────────────────────────────────────────────
// Slack
// ─────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum SlackCommands {
    /// Post to a channel or user (`#ops`, `ops`, `@alice`)
    Send {
        /// Target; empty uses the configured default channel
        #[arg(short, long, default_value = "")]
        target: String,

        /// Message text (template)
        #[arg(short, long)]
        message: String,

        /// Display name (overrides config)
        #[arg(long)]
        username: Option<String>,

        /// Emoji icon, e.g. `:rocket:` (overrides config)
        #[arg(long)]
        icon: Option<String>,

        /// Suppress link previews
        #[arg(long, default_value_t = false)]
        no_unfurl: bool,

        /// Post into this thread
        #[arg(long)]
        thread_ts: Option<String>,

        /// Template variable `key=value` (repeatable)
        #[arg(long)]
        var: Vec<String>,
    },

    /// Send a direct message to a user
    Dm {
        /// User name or ID; `@` is added if missing
        #[arg(short, long)]
        user: String,

        /// Message text (template)
        #[arg(short, long)]
        message: String,

        /// Template variable `key=value` (repeatable)
        #[arg(long)]
        var: Vec<String>,
    },

    /// Reply in a message thread (needs a bot token)
    Reply {
        /// Channel ID, e.g. `C0123`
        #[arg(long)]
        channel: String,

        /// Timestamp of the parent message
        #[arg(long)]
        ts: String,

        /// Message text (template)
        #[arg(short, long)]
        message: String,

        /// Template variable `key=value` (repeatable)
        #[arg(long)]
        var: Vec<String>,
    },
}

/// Run one Slack command.
pub async fn run_slack(config: &Config, action: SlackCommands) -> Result<SendResult> {
    let notifier = SlackNotifier::new(config.slack.clone());

    let result = match action {
        SlackCommands::Send {
            target,
            message,
            username,
            icon,
            no_unfurl,
            thread_ts,
            var,
        } => {
            let options = SlackOptions {
                username,
                icon_emoji: icon,
                unfurl_links: no_unfurl.then_some(false),
                thread_ts,
                ..Default::default()
            };
            let text = expand_text(&message, &parse_vars(&var)?);
            notifier.send(&target, &text, &options).await
        }
        SlackCommands::Dm { user, message, var } => {
            let text = expand_text(&message, &parse_vars(&var)?);
            notifier
                .send_direct_message(&user, &text, &SlackOptions::default())
                .await
        }
        SlackCommands::Reply {
            channel,
            ts,
            message,
            var,
        } => {
            let text = expand_text(&message, &parse_vars(&var)?);
            notifier
                .reply_to_message(&channel, &ts, &text, &SlackOptions::default())
                .await
        }
    };

    Ok(result)
}

/// `--html` / `--plain` as an override; neither means "use the config".
fn html_override(html: bool, plain: bool) -> Option<bool> {
    if html {
        Some(true)
    } else if plain {
        Some(false)
    } else {
        None
    }
}

/// Render `text` only when variables were given; otherwise send it verbatim.
fn expand_text(text: &str, data: &TemplateData) -> String {
    if data.is_empty() {
        text.to_string()
    } else {
        render(text, data)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

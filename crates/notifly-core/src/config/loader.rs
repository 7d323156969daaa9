//! Config loader — reads `~/.notifly/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.notifly/config.json`
//! 3. Environment variables `NOTIFLY_<SECTION>__<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::{Config, MailTransportKind};

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    load_config_from_path(&config_path)
}

/// Defaults with env overrides applied; what a missing config file yields.
pub fn load_defaults() -> Config {
    apply_env_overrides(Config::default())
}

/// Load config from a specific file path.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return load_defaults();
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let config: Config = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `NOTIFLY_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `NOTIFLY_MAIL__SENDER_NAME`, `__SUBJECT_PREFIX`, `__HTML`, `__DEBUG`
/// - `NOTIFLY_SLACK__BOT_TOKEN`, `__WEBHOOK_URL`, `__DEFAULT_CHANNEL`, `__USERNAME`,
///   `__ICON_EMOJI`, `__DEBUG`, `__API_BASE`, `__PERMALINK_BASE`
/// - `NOTIFLY_MAIL_TRANSPORT__KIND` (`http` | `smtp`), `__FROM_ADDRESS`, `__API_URL`,
///   `__API_KEY`, `__SMTP_HOST`, `__SMTP_PORT`, `__SMTP_USERNAME`, `__SMTP_PASSWORD`,
///   `__SMTP_USE_TLS`, `__SMTP_USE_SSL`
///
/// Flags accept `true` or `1`; anything else is `false`.
fn apply_env_overrides(mut config: Config) -> Config {
    // Mail
    if let Ok(val) = std::env::var("NOTIFLY_MAIL__SENDER_NAME") {
        config.mail.sender_name = val;
    }
    if let Ok(val) = std::env::var("NOTIFLY_MAIL__SUBJECT_PREFIX") {
        config.mail.subject_prefix = val;
    }
    if let Ok(val) = std::env::var("NOTIFLY_MAIL__HTML") {
        config.mail.html = parse_flag(&val);
    }
    if let Ok(val) = std::env::var("NOTIFLY_MAIL__DEBUG") {
        config.mail.debug = parse_flag(&val);
    }

    // Slack
    if let Ok(val) = std::env::var("NOTIFLY_SLACK__BOT_TOKEN") {
        config.slack.bot_token = val;
    }
    if let Ok(val) = std::env::var("NOTIFLY_SLACK__WEBHOOK_URL") {
        config.slack.webhook_url = val;
    }
    if let Ok(val) = std::env::var("NOTIFLY_SLACK__DEFAULT_CHANNEL") {
        config.slack.default_channel = val;
    }
    if let Ok(val) = std::env::var("NOTIFLY_SLACK__USERNAME") {
        config.slack.username = val;
    }
    if let Ok(val) = std::env::var("NOTIFLY_SLACK__ICON_EMOJI") {
        config.slack.icon_emoji = val;
    }
    if let Ok(val) = std::env::var("NOTIFLY_SLACK__DEBUG") {
        config.slack.debug = parse_flag(&val);
    }
    if let Ok(val) = std::env::var("NOTIFLY_SLACK__API_BASE") {
        config.slack.api_base = val;
    }
    if let Ok(val) = std::env::var("NOTIFLY_SLACK__PERMALINK_BASE") {
        config.slack.permalink_base = val;
    }

    // Mail transport
    let transport = &mut config.mail_transport;
    if let Ok(val) = std::env::var("NOTIFLY_MAIL_TRANSPORT__KIND") {
        match val.to_lowercase().as_str() {
            "http" => transport.kind = MailTransportKind::Http,
            "smtp" => transport.kind = MailTransportKind::Smtp,
            other => warn!(kind = %other, "ignoring unknown mail transport kind"),
        }
    }
    if let Ok(val) = std::env::var("NOTIFLY_MAIL_TRANSPORT__FROM_ADDRESS") {
        transport.from_address = val;
    }
    if let Ok(val) = std::env::var("NOTIFLY_MAIL_TRANSPORT__API_URL") {
        transport.api_url = val;
    }
    if let Ok(val) = std::env::var("NOTIFLY_MAIL_TRANSPORT__API_KEY") {
        transport.api_key = val;
    }
    if let Ok(val) = std::env::var("NOTIFLY_MAIL_TRANSPORT__SMTP_HOST") {
        transport.smtp_host = val;
    }
    if let Ok(val) = std::env::var("NOTIFLY_MAIL_TRANSPORT__SMTP_PORT") {
        if let Ok(p) = val.parse::<u16>() {
            transport.smtp_port = p;
        }
    }
    if let Ok(val) = std::env::var("NOTIFLY_MAIL_TRANSPORT__SMTP_USERNAME") {
        transport.smtp_username = val;
    }
    if let Ok(val) = std::env::var("NOTIFLY_MAIL_TRANSPORT__SMTP_PASSWORD") {
        transport.smtp_password = val;
    }
    if let Ok(val) = std::env::var("NOTIFLY_MAIL_TRANSPORT__SMTP_USE_TLS") {
        transport.smtp_use_tls = parse_flag(&val);
    }
    if let Ok(val) = std::env::var("NOTIFLY_MAIL_TRANSPORT__SMTP_USE_SSL") {
        transport.smtp_use_ssl = parse_flag(&val);
    }

    config
}

fn parse_flag(val: &str) -> bool {
    val == "true" || val == "1"
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

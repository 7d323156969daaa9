//! Configuration schema — one section per channel plus the mail transport.
//!
//! Hierarchy: `Config` → `MailConfig`, `SlackConfig`, `MailTransportConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.
//!
//! Each channel section has a matching `*Update` struct whose fields are all
//! optional. Merging an update only touches the fields it carries, so the
//! last write wins per field.

use serde::{Deserialize, Serialize};
use tracing::warn;

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.notifly/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub mail: MailConfig,
    pub slack: SlackConfig,
    pub mail_transport: MailTransportConfig,
}

// ─────────────────────────────────────────────
// Mail
// ─────────────────────────────────────────────

/// Mail dispatcher defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MailConfig {
    /// Display name used as the sender when a send doesn't override it.
    pub sender_name: String,
    /// Prepended to every subject unless a send asks for no prefix.
    pub subject_prefix: String,
    /// Send bodies as HTML by default.
    pub html: bool,
    /// Log every outcome at `info` instead of `debug`.
    pub debug: bool,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            sender_name: "Notifly".to_string(),
            subject_prefix: String::new(),
            html: false,
            debug: false,
        }
    }
}

/// Partial update for [`MailConfig`]. `None` leaves a field unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MailConfigUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
}

impl MailConfig {
    /// Merge the fields present in `update` into this config.
    pub fn merge(&mut self, update: MailConfigUpdate) {
        if let Some(v) = update.sender_name {
            self.sender_name = v;
        }
        if let Some(v) = update.subject_prefix {
            self.subject_prefix = v;
        }
        if let Some(v) = update.html {
            self.html = v;
        }
        if let Some(v) = update.debug {
            self.debug = v;
        }
    }
}

// ─────────────────────────────────────────────
// Slack
// ─────────────────────────────────────────────

/// Slack dispatcher settings.
///
/// Either credential is enough to send: a webhook URL (fire-and-forget) or a
/// bot token (Web API, returns message identifiers). Empty strings mean unset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SlackConfig {
    /// Bot token (`xoxb-...`).
    pub bot_token: String,
    /// Incoming webhook URL. Takes precedence over the token when both are set.
    pub webhook_url: String,
    /// Target used when a send gives an empty one.
    pub default_channel: String,
    /// Display name attached to every message.
    pub username: String,
    /// Emoji icon attached to every message (e.g. `:bell:`).
    pub icon_emoji: String,
    /// Log every outcome at `info` instead of `debug`.
    pub debug: bool,
    /// Web API base URL.
    pub api_base: String,
    /// Base URL that permalinks are built from.
    pub permalink_base: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            webhook_url: String::new(),
            default_channel: "#general".to_string(),
            username: "Notifly".to_string(),
            icon_emoji: ":bell:".to_string(),
            debug: false,
            api_base: "https://slack.com/api".to_string(),
            permalink_base: "https://slack.com".to_string(),
        }
    }
}

impl SlackConfig {
    /// Whether at least one credential (token or webhook URL) is set.
    pub fn is_configured(&self) -> bool {
        !self.bot_token.is_empty() || !self.webhook_url.is_empty()
    }

    /// Merge the fields present in `update` into this config.
    ///
    /// Logs a warning (but still applies the update) when the result has
    /// neither a token nor a webhook URL.
    pub fn merge(&mut self, update: SlackConfigUpdate) {
        if let Some(v) = update.bot_token {
            self.bot_token = v;
        }
        if let Some(v) = update.webhook_url {
            self.webhook_url = v;
        }
        if let Some(v) = update.default_channel {
            self.default_channel = v;
        }
        if let Some(v) = update.username {
            self.username = v;
        }
        if let Some(v) = update.icon_emoji {
            self.icon_emoji = v;
        }
        if let Some(v) = update.debug {
            self.debug = v;
        }
        if let Some(v) = update.api_base {
            self.api_base = v;
        }
        if let Some(v) = update.permalink_base {
            self.permalink_base = v;
        }

        if !self.is_configured() {
            warn!("slack config has neither botToken nor webhookUrl; sends will fail");
        }
    }
}

/// Partial update for [`SlackConfig`]. `None` leaves a field unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SlackConfigUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_emoji: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permalink_base: Option<String>,
}

// ─────────────────────────────────────────────
// Mail transport
// ─────────────────────────────────────────────

/// Which mail transport the CLI builds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailTransportKind {
    /// Hosted mail API over HTTPS.
    #[default]
    Http,
    /// SMTP relay (requires the `smtp` feature).
    Smtp,
}

/// Settings for whichever mail transport is in use.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MailTransportConfig {
    pub kind: MailTransportKind,
    /// Sender address; the display name comes from `MailConfig`.
    pub from_address: String,

    // ── Hosted API ──
    /// Endpoint that accepts a JSON email document.
    pub api_url: String,
    /// Bearer key for the hosted API.
    pub api_key: String,

    // ── SMTP ──
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    /// Use STARTTLS (default true).
    pub smtp_use_tls: bool,
    /// Use implicit TLS/SMTPS (default false, for port 465).
    pub smtp_use_ssl: bool,
}

impl Default for MailTransportConfig {
    fn default() -> Self {
        Self {
            kind: MailTransportKind::Http,
            from_address: String::new(),
            api_url: "https://api.resend.com/emails".to_string(),
            api_key: String::new(),
            smtp_host: String::new(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            smtp_use_tls: true,
            smtp_use_ssl: false,
        }
    }
}

impl MailTransportConfig {
    /// Whether the selected transport has what it needs to send.
    pub fn is_configured(&self) -> bool {
        if self.from_address.is_empty() {
            return false;
        }
        match self.kind {
            MailTransportKind::Http => !self.api_url.is_empty() && !self.api_key.is_empty(),
            MailTransportKind::Smtp => !self.smtp_host.is_empty(),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slack_defaults() {
        let cfg = SlackConfig::default();
        assert_eq!(cfg.default_channel, "#general");
        assert_eq!(cfg.api_base, "https://slack.com/api");
        assert!(!cfg.is_configured());
    }

    #[test]
    fn test_slack_configured_by_token_or_webhook() {
        let mut cfg = SlackConfig::default();
        cfg.bot_token = "xoxb-1".into();
        assert!(cfg.is_configured());

        let mut cfg = SlackConfig::default();
        cfg.webhook_url = "https://hooks.example/T".into();
        assert!(cfg.is_configured());
    }

    #[test]
    fn test_slack_merge_only_touches_given_fields() {
        let mut cfg = SlackConfig::default();
        cfg.merge(SlackConfigUpdate {
            bot_token: Some("xoxb-1".into()),
            ..Default::default()
        });
        cfg.merge(SlackConfigUpdate {
            username: Some("Alerts".into()),
            ..Default::default()
        });

        assert_eq!(cfg.bot_token, "xoxb-1");
        assert_eq!(cfg.username, "Alerts");
        assert_eq!(cfg.icon_emoji, ":bell:");
    }

    #[test]
    fn test_slack_merge_can_clear_credential() {
        let mut cfg = SlackConfig::default();
        cfg.bot_token = "xoxb-1".into();
        cfg.merge(SlackConfigUpdate {
            bot_token: Some(String::new()),
            ..Default::default()
        });
        assert!(!cfg.is_configured());
    }

    #[test]
    fn test_mail_merge_last_write_wins() {
        let mut cfg = MailConfig::default();
        cfg.merge(MailConfigUpdate {
            subject_prefix: Some("[ops] ".into()),
            html: Some(true),
            ..Default::default()
        });
        cfg.merge(MailConfigUpdate {
            subject_prefix: Some("[prod] ".into()),
            ..Default::default()
        });

        assert_eq!(cfg.subject_prefix, "[prod] ");
        assert!(cfg.html);
        assert_eq!(cfg.sender_name, "Notifly");
    }

    #[test]
    fn test_update_deserializes_from_partial_json() {
        let update: SlackConfigUpdate =
            serde_json::from_str(r#"{"webhookUrl": "https://hooks.example/T"}"#).unwrap();
        assert_eq!(update.webhook_url.as_deref(), Some("https://hooks.example/T"));
        assert!(update.bot_token.is_none());
    }

    #[test]
    fn test_transport_kind_lowercase() {
        let cfg: MailTransportConfig = serde_json::from_str(r#"{"kind": "smtp"}"#).unwrap();
        assert_eq!(cfg.kind, MailTransportKind::Smtp);
        assert_eq!(cfg.smtp_port, 587);
    }

    #[test]
    fn test_transport_is_configured() {
        let mut cfg = MailTransportConfig::default();
        assert!(!cfg.is_configured());

        cfg.from_address = "bot@example.com".into();
        cfg.api_key = "re_123".into();
        assert!(cfg.is_configured());

        cfg.kind = MailTransportKind::Smtp;
        assert!(!cfg.is_configured());
        cfg.smtp_host = "smtp.example.com".into();
        assert!(cfg.is_configured());
    }
}

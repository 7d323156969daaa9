//! Slack dispatcher — incoming webhook or bearer-token Web API.
//!
//! Delivery is picked per call from the config: a webhook URL wins over a bot
//! token. Webhook posts are fire-and-forget; Web API posts return the
//! channel ID and timestamp, from which a permalink is built.
//!
//! Every operation returns a [`SendResult`]; HTTP and parse failures are
//! folded into [`SendError`] values, never propagated.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use notifly_core::config::{SlackConfig, SlackConfigUpdate};
use notifly_core::template::{Template, TemplateData};
use notifly_core::types::{MessageLocation, SendError, SendResult, Sent};

/// Message used when the Web API answers `ok: false` without an `error`.
const UNKNOWN_ERROR: &str = "Unknown error";

// ─────────────────────────────────────────────
// Options & payload
// ─────────────────────────────────────────────

/// Per-send overrides. `None` means "use the config" or "omit".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SlackOptions {
    /// Display name. Default: `SlackConfig::username`.
    pub username: Option<String>,
    /// Emoji icon. Default: `SlackConfig::icon_emoji`.
    pub icon_emoji: Option<String>,
    /// Legacy attachments, passed through untouched.
    pub attachments: Option<Vec<Value>>,
    /// Block Kit blocks, passed through untouched.
    pub blocks: Option<Vec<Value>>,
    /// `Some(false)` suppresses link previews.
    pub unfurl_links: Option<bool>,
    /// Post into this thread.
    pub thread_ts: Option<String>,
}

/// JSON body shared by webhook and Web API posts.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MessagePayload {
    pub channel: String,
    pub text: String,
    pub username: String,
    pub icon_emoji: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unfurl_links: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
}

/// Response of `chat.postMessage`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PostMessageResponse {
    ok: bool,
    channel: Option<String>,
    ts: Option<String>,
    thread_ts: Option<String>,
    error: Option<String>,
    message: Option<PostedMessage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PostedMessage {
    thread_ts: Option<String>,
}

// ─────────────────────────────────────────────
// Delivery selection
// ─────────────────────────────────────────────

/// How a message leaves the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery<'a> {
    /// POST to an incoming webhook URL.
    Webhook { url: &'a str },
    /// POST to `chat.postMessage` with a bearer token.
    Api { token: &'a str },
}

/// Pick the delivery for `config`: webhook first, then token, else `None`.
pub fn select_delivery(config: &SlackConfig) -> Option<Delivery<'_>> {
    if !config.webhook_url.is_empty() {
        Some(Delivery::Webhook {
            url: &config.webhook_url,
        })
    } else if !config.bot_token.is_empty() {
        Some(Delivery::Api {
            token: &config.bot_token,
        })
    } else {
        None
    }
}

/// Normalize a send target.
///
/// `@user` is kept as-is; anything else gets a leading `#` if missing. An
/// empty target falls back to `default_channel`, normalized the same way.
/// Returns `None` when both are empty.
pub fn normalize_target(target: &str, default_channel: &str) -> Option<String> {
    let target = if target.is_empty() {
        default_channel
    } else {
        target
    };

    if target.is_empty() {
        None
    } else if target.starts_with('@') || target.starts_with('#') {
        Some(target.to_string())
    } else {
        Some(format!("#{}", target))
    }
}

/// `<base>/archives/<channel>/p<ts without '.'>`
pub fn build_permalink(base: &str, channel: &str, ts: &str) -> String {
    format!(
        "{}/archives/{}/p{}",
        base.trim_end_matches('/'),
        channel,
        ts.replace('.', "")
    )
}

// ─────────────────────────────────────────────
// SlackNotifier
// ─────────────────────────────────────────────

/// Sends Slack messages using its own [`SlackConfig`].
///
/// Safe to share across tasks behind an `Arc`; updating the config needs
/// `&mut self`, so shared mutation is up to the caller.
#[derive(Debug, Clone)]
pub struct SlackNotifier {
    config: SlackConfig,
    http: reqwest::Client,
}

impl SlackNotifier {
    pub fn new(config: SlackConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Build with a caller-supplied HTTP client.
    pub fn with_client(config: SlackConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    /// A copy of the current configuration.
    pub fn config(&self) -> SlackConfig {
        self.config.clone()
    }

    /// Merge a partial update into the configuration.
    pub fn update_config(&mut self, update: SlackConfigUpdate) {
        self.config.merge(update);
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Build the JSON payload for `message` to an already-normalized `channel`.
    pub fn build_payload(&self, channel: &str, message: &str, options: &SlackOptions) -> MessagePayload {
        MessagePayload {
            channel: channel.to_string(),
            text: message.to_string(),
            username: options
                .username
                .clone()
                .unwrap_or_else(|| self.config.username.clone()),
            icon_emoji: options
                .icon_emoji
                .clone()
                .unwrap_or_else(|| self.config.icon_emoji.clone()),
            unfurl_links: options.unfurl_links,
            attachments: options.attachments.clone(),
            blocks: options.blocks.clone(),
            thread_ts: options.thread_ts.clone(),
        }
    }

    /// Send `message` to `target` (`#channel`, `channel`, or `@user`).
    pub async fn send(&self, target: &str, message: &str, options: &SlackOptions) -> SendResult {
        let Some(delivery) = select_delivery(&self.config) else {
            let result = Err(SendError::NotConfigured(
                "Slack is not configured: set botToken or webhookUrl".to_string(),
            ));
            self.log_outcome("send", target, &result);
            return result;
        };

        let Some(channel) = normalize_target(target, &self.config.default_channel) else {
            let result = Err(SendError::NotConfigured(
                "no target given and no default channel configured".to_string(),
            ));
            self.log_outcome("send", target, &result);
            return result;
        };
        let payload = self.build_payload(&channel, message, options);

        let result = match delivery {
            Delivery::Webhook { url } => self.post_webhook(url, &payload).await,
            Delivery::Api { token } => self.post_api(token, &payload).await,
        };

        self.log_outcome("send", &channel, &result);
        result
    }

    /// Send a direct message; `@` is prepended to `user` if absent.
    pub async fn send_direct_message(
        &self,
        user: &str,
        message: &str,
        options: &SlackOptions,
    ) -> SendResult {
        let target = if user.starts_with('@') {
            user.to_string()
        } else {
            format!("@{}", user)
        };
        self.send(&target, message, options).await
    }

    /// Reply in the thread of message `ts` in `channel_id`.
    ///
    /// Needs a bot token: webhooks cannot address threads by ID, so a
    /// webhook-only config fails without any network call. `channel_id` is
    /// sent as given.
    pub async fn reply_to_message(
        &self,
        channel_id: &str,
        ts: &str,
        message: &str,
        options: &SlackOptions,
    ) -> SendResult {
        if self.config.bot_token.is_empty() {
            let result = Err(SendError::NotConfigured(
                "Slack bot token is required to reply to a message".to_string(),
            ));
            self.log_outcome("reply", channel_id, &result);
            return result;
        }

        let mut payload = self.build_payload(channel_id, message, options);
        payload.thread_ts = Some(ts.to_string());

        let result = self.post_api(&self.config.bot_token, &payload).await;
        self.log_outcome("reply", channel_id, &result);
        result
    }

    /// Render `template` against `data` and send it to `target`.
    pub async fn send_templated_message(
        &self,
        target: &str,
        template: &Template,
        data: &TemplateData,
        options: &SlackOptions,
    ) -> SendResult {
        let message = template.render(data);
        self.send(target, &message, options).await
    }

    // ─────────────────────────────────────────
    // HTTP
    // ─────────────────────────────────────────

    async fn post_webhook(&self, url: &str, payload: &MessagePayload) -> SendResult {
        let resp = self
            .http
            .post(url)
            .json(payload)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SendError::Transport(e.to_string()))?;

        debug!(status = %resp.status(), "webhook accepted message");
        Ok(Sent::unlocated())
    }

    async fn post_api(&self, token: &str, payload: &MessagePayload) -> SendResult {
        let resp = self
            .http
            .post(format!(
                "{}/chat.postMessage",
                self.config.api_base.trim_end_matches('/')
            ))
            .bearer_auth(token)
            .json(payload)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SendError::Transport(e.to_string()))?;

        let body: PostMessageResponse = resp
            .json()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;

        if !body.ok {
            return Err(SendError::Rejected(
                body.error.unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
            ));
        }

        let thread_ts = body
            .thread_ts
            .or_else(|| body.message.and_then(|m| m.thread_ts));

        match (body.channel, body.ts) {
            (Some(channel), Some(ts)) => {
                let permalink = build_permalink(&self.config.permalink_base, &channel, &ts);
                Ok(Sent::at(MessageLocation {
                    channel,
                    ts,
                    thread_ts,
                    permalink,
                }))
            }
            _ => Ok(Sent::unlocated()),
        }
    }

    fn log_outcome(&self, op: &str, target: &str, result: &SendResult) {
        match result {
            Ok(sent) => {
                let permalink = sent
                    .location
                    .as_ref()
                    .map(|l| l.permalink.as_str())
                    .unwrap_or("");
                if self.config.debug {
                    info!(op, to = target, permalink, "slack message sent");
                } else {
                    debug!(op, to = target, permalink, "slack message sent");
                }
            }
            Err(e) => warn!(op, to = target, error = %e, "slack send failed"),
        }
    }
}

// ─────────────────────────────────────────────
// Templates
// ─────────────────────────────────────────────

/// A message template bound to a notifier at send time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlackTemplate {
    template: Template,
}

impl SlackTemplate {
    pub fn new(template: impl Into<Template>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn render(&self, data: &TemplateData) -> String {
        self.template.render(data)
    }

    /// Render and send through `notifier`.
    pub async fn send(
        &self,
        notifier: &SlackNotifier,
        target: &str,
        data: &TemplateData,
        options: &SlackOptions,
    ) -> SendResult {
        notifier
            .send_templated_message(target, &self.template, data, options)
            .await
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

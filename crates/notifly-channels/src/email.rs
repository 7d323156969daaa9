//! Email dispatcher — resolves defaults and overrides, then hands off to a
//! [`MailTransport`].
//!
//! Resolution rules for each send:
//! - sender name: `options.sender`, else `config.sender_name`
//! - HTML flag: `options.html`, else `config.html`
//! - subject: `config.subject_prefix + subject`, unless `options.no_prefix`
//!
//! A transport error becomes `SendError::Transport`. Success carries no
//! message location.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use notifly_core::config::{MailConfig, MailConfigUpdate};
use notifly_core::template::{Template, TemplateData};
use notifly_core::types::{SendError, SendResult, Sent};

use crate::transport::{Attachment, MailTransport, OutgoingMail, Recipients};

// ─────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────

/// Per-send overrides. Every field defaults to "use the config".
#[derive(Clone, Debug, Default)]
pub struct MailOptions {
    /// Sender display name. Default: `MailConfig::sender_name`.
    pub sender: Option<String>,
    /// Send as HTML. Default: `MailConfig::html`.
    pub html: Option<bool>,
    /// Files to attach. Default: none.
    pub attachments: Vec<Attachment>,
    /// Skip `MailConfig::subject_prefix`. Default: false.
    pub no_prefix: bool,
}

// ─────────────────────────────────────────────
// Mailer
// ─────────────────────────────────────────────

/// Sends email using its own [`MailConfig`] and a shared transport.
pub struct Mailer {
    config: MailConfig,
    transport: Arc<dyn MailTransport>,
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailer")
            .field("config", &self.config)
            .field("transport", &self.transport.display_name())
            .finish()
    }
}

impl Mailer {
    pub fn new(config: MailConfig, transport: Arc<dyn MailTransport>) -> Self {
        Self { config, transport }
    }

    /// A copy of the current configuration.
    pub fn config(&self) -> MailConfig {
        self.config.clone()
    }

    /// Merge a partial update into the configuration.
    pub fn update_config(&mut self, update: MailConfigUpdate) {
        self.config.merge(update);
    }

    /// Resolve config defaults and per-send overrides into a finished mail.
    pub fn compose(
        &self,
        to: impl Into<Recipients>,
        subject: &str,
        body: &str,
        options: &MailOptions,
    ) -> OutgoingMail {
        let subject = if options.no_prefix {
            subject.to_string()
        } else {
            format!("{}{}", self.config.subject_prefix, subject)
        };

        OutgoingMail {
            to: to.into(),
            subject,
            body: body.to_string(),
            html: options.html.unwrap_or(self.config.html),
            sender_name: options
                .sender
                .clone()
                .unwrap_or_else(|| self.config.sender_name.clone()),
            attachments: options.attachments.clone(),
        }
    }

    /// Send one email.
    pub async fn send(
        &self,
        to: impl Into<Recipients>,
        subject: &str,
        body: &str,
        options: &MailOptions,
    ) -> SendResult {
        let mail = self.compose(to, subject, body, options);

        let result = match self.transport.deliver(&mail).await {
            Ok(()) => Ok(Sent::unlocated()),
            Err(e) => Err(SendError::Transport(e.to_string())),
        };

        self.log_outcome(&mail, &result);
        result
    }

    /// Render `template` against `data` and send the result as the body.
    pub async fn send_templated(
        &self,
        to: impl Into<Recipients>,
        subject: &str,
        template: &Template,
        data: &TemplateData,
        options: &MailOptions,
    ) -> SendResult {
        let body = template.render(data);
        self.send(to, subject, &body, options).await
    }

    fn log_outcome(&self, mail: &OutgoingMail, result: &SendResult) {
        match result {
            Ok(_) if self.config.debug => info!(
                transport = self.transport.display_name(),
                to = %mail.to,
                subject = %mail.subject,
                html = mail.html,
                "email sent"
            ),
            Ok(_) => debug!(to = %mail.to, subject = %mail.subject, "email sent"),
            Err(e) => warn!(
                transport = self.transport.display_name(),
                to = %mail.to,
                error = %e,
                "email send failed"
            ),
        }
    }
}

// ─────────────────────────────────────────────
// Email templates
// ─────────────────────────────────────────────

/// A subject + body pair rendered together on every send.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailTemplate {
    subject: Template,
    body: Template,
}

impl EmailTemplate {
    pub fn new(subject: impl Into<Template>, body: impl Into<Template>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Render subject and body against `data`.
    pub fn render(&self, data: &TemplateData) -> (String, String) {
        (self.subject.render(data), self.body.render(data))
    }

    /// Render and send through `mailer`.
    pub async fn send(
        &self,
        mailer: &Mailer,
        to: impl Into<Recipients>,
        data: &TemplateData,
        options: &MailOptions,
    ) -> SendResult {
        let (subject, body) = self.render(data);
        mailer.send(to, &subject, &body, options).await
    }
}

/// Build template data from a JSON value; non-objects yield an empty map.
pub fn template_data(value: Value) -> TemplateData {
    match value {
        Value::Object(map) => map,
        _ => TemplateData::new(),
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::Mutex;

    /// Records every delivered mail; optionally fails.
    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<OutgoingMail>>,
        fail_with: Option<String>,
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn deliver(&self, mail: &OutgoingMail) -> anyhow::Result<()> {
            if let Some(msg) = &self.fail_with {
                anyhow::bail!("{}", msg);
            }
            self.sent.lock().await.push(mail.clone());
            Ok(())
        }

        fn display_name(&self) -> &str {
            "recording"
        }
    }

    fn make_config() -> MailConfig {
        MailConfig {
            sender_name: "Monitor".into(),
            subject_prefix: "[alert] ".into(),
            html: false,
            debug: false,
        }
    }

    fn make_mailer() -> (Mailer, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::default());
        (Mailer::new(make_config(), transport.clone()), transport)
    }

    #[test]
    fn test_compose_uses_defaults() {
        let (mailer, _) = make_mailer();
        let mail = mailer.compose("ops@example.com", "Disk full", "body", &MailOptions::default());
        assert_eq!(mail.subject, "[alert] Disk full");
        assert_eq!(mail.sender_name, "Monitor");
        assert!(!mail.html);
        assert_eq!(mail.to.as_slice(), &["ops@example.com".to_string()]);
    }

    #[test]
    fn test_compose_applies_overrides() {
        let (mailer, _) = make_mailer();
        let options = MailOptions {
            sender: Some("Pager".into()),
            html: Some(true),
            no_prefix: true,
            ..Default::default()
        };
        let mail = mailer.compose("ops@example.com", "Disk full", "body", &options);
        assert_eq!(mail.subject, "Disk full");
        assert_eq!(mail.sender_name, "Pager");
        assert!(mail.html);
    }

    #[test]
    fn test_compose_html_override_false_beats_config_true() {
        let (mut mailer, _) = make_mailer();
        mailer.update_config(MailConfigUpdate {
            html: Some(true),
            ..Default::default()
        });
        let options = MailOptions {
            html: Some(false),
            ..Default::default()
        };
        assert!(!mailer.compose("a@b.c", "s", "b", &options).html);
        assert!(mailer.compose("a@b.c", "s", "b", &MailOptions::default()).html);
    }

    #[tokio::test]
    async fn test_send_success_has_no_location() {
        let (mailer, transport) = make_mailer();
        let result = mailer
            .send("a@x.io, b@x.io", "Hello", "World", &MailOptions::default())
            .await;

        assert_eq!(result, Ok(Sent::unlocated()));
        let sent = transport.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to.as_slice().len(), 2);
        assert_eq!(sent[0].body, "World");
    }

    #[tokio::test]
    async fn test_send_transport_error_becomes_failure() {
        let transport = Arc::new(RecordingTransport {
            fail_with: Some("quota exceeded".into()),
            ..Default::default()
        });
        let mailer = Mailer::new(make_config(), transport);

        let result = mailer.send("a@x.io", "Hi", "Body", &MailOptions::default()).await;
        assert_eq!(result, Err(SendError::Transport("quota exceeded".into())));
    }

    #[tokio::test]
    async fn test_send_templated_renders_body() {
        let (mailer, transport) = make_mailer();
        let template = Template::new("Build {{id}}{{#if failed}} FAILED{{/if}}");
        let data = template_data(json!({"id": 42, "failed": true}));

        mailer
            .send_templated("a@x.io", "CI", &template, &data, &MailOptions::default())
            .await
            .unwrap();

        let sent = transport.sent.lock().await;
        assert_eq!(sent[0].body, "Build 42 FAILED");
        assert_eq!(sent[0].subject, "[alert] CI");
    }

    #[tokio::test]
    async fn test_email_template_renders_subject_and_body() {
        let (mailer, transport) = make_mailer();
        let template = EmailTemplate::new(
            "Order {{order}} shipped",
            "Items:\n{{#each items}}- {{this}}\n{{/each}}",
        );
        let data = template_data(json!({"order": "A-1", "items": ["pen", "ink"]}));

        template
            .send(&mailer, "c@x.io", &data, &MailOptions::default())
            .await
            .unwrap();

        let sent = transport.sent.lock().await;
        assert_eq!(sent[0].subject, "[alert] Order A-1 shipped");
        assert_eq!(sent[0].body, "Items:\n- pen\n- ink\n");
    }

    #[test]
    fn test_config_returns_independent_copy() {
        let (mailer, _) = make_mailer();
        let mut copy = mailer.config();
        copy.subject_prefix = "changed".into();
        assert_eq!(mailer.config().subject_prefix, "[alert] ");
    }

    #[test]
    fn test_template_data_non_object() {
        assert!(template_data(json!([1, 2])).is_empty());
    }
}

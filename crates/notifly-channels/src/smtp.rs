//! SMTP mail transport via lettre.
//!
//! Supports implicit TLS (port 465), STARTTLS (port 587) and plain
//! connections, picked from `MailTransportConfig`.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment as MimeAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

use notifly_core::config::MailTransportConfig;

use crate::transport::{MailTransport, OutgoingMail};

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Sends mail through an SMTP relay.
pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: Address,
}

impl SmtpMailTransport {
    pub fn new(config: &MailTransportConfig) -> anyhow::Result<Self> {
        if config.smtp_host.is_empty() {
            anyhow::bail!("SMTP host not configured");
        }

        let from_address: Address = config
            .from_address
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid from address '{}': {}", config.from_address, e))?;

        let port = if config.smtp_port > 0 {
            config.smtp_port
        } else {
            DEFAULT_SMTP_PORT
        };

        let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

        let transport = if config.smtp_use_ssl {
            // Implicit TLS (SMTPS, port 465)
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
                .map_err(|e| anyhow::anyhow!("SMTP relay error: {}", e))?
                .port(port)
                .credentials(creds)
                .build()
        } else if config.smtp_use_tls {
            // STARTTLS (port 587)
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                .map_err(|e| anyhow::anyhow!("SMTP STARTTLS error: {}", e))?
                .port(port)
                .credentials(creds)
                .build()
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
                .port(port)
                .credentials(creds)
                .build()
        };

        debug!(host = %config.smtp_host, port, "SMTP transport ready");

        Ok(Self {
            transport,
            from_address,
        })
    }

    /// Build the MIME message for `mail`.
    fn build_message(&self, mail: &OutgoingMail) -> anyhow::Result<Message> {
        let sender_name = (!mail.sender_name.is_empty()).then(|| mail.sender_name.clone());
        let mut builder = Message::builder()
            .from(Mailbox::new(sender_name, self.from_address.clone()))
            .subject(&mail.subject);

        if mail.to.is_empty() {
            anyhow::bail!("no recipients");
        }
        for to in mail.to.as_slice() {
            let mailbox: Mailbox = to
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid to address '{}': {}", to, e))?;
            builder = builder.to(mailbox);
        }

        let body = if mail.html {
            SinglePart::html(mail.body.clone())
        } else {
            SinglePart::plain(mail.body.clone())
        };

        let message = if mail.attachments.is_empty() {
            builder.singlepart(body)
        } else {
            let mut parts = MultiPart::mixed().singlepart(body);
            for att in &mail.attachments {
                let content_type = ContentType::parse(&att.content_type)
                    .or_else(|_| ContentType::parse("application/octet-stream"))
                    .map_err(|e| anyhow::anyhow!("invalid content type: {}", e))?;
                parts = parts.singlepart(
                    MimeAttachment::new(att.filename.clone()).body(att.data.clone(), content_type),
                );
            }
            builder.multipart(parts)
        };

        message.map_err(|e| anyhow::anyhow!("failed to build email: {}", e))
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn deliver(&self, mail: &OutgoingMail) -> anyhow::Result<()> {
        let message = self.build_message(mail)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| anyhow::anyhow!("SMTP send error: {}", e))?;

        info!(to = %mail.to, subject = %mail.subject, "email sent via SMTP");
        Ok(())
    }

    fn display_name(&self) -> &str {
        "SMTP"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Attachment, Recipients};

    fn make_config() -> MailTransportConfig {
        MailTransportConfig {
            kind: notifly_core::config::MailTransportKind::Smtp,
            from_address: "bot@example.com".into(),
            smtp_host: "smtp.example.com".into(),
            smtp_username: "bot@example.com".into(),
            smtp_password: "secret".into(),
            ..Default::default()
        }
    }

    fn make_mail() -> OutgoingMail {
        OutgoingMail {
            to: Recipients::parse("ops@example.com, dev@example.com"),
            subject: "Nightly build".into(),
            body: "All green".into(),
            html: false,
            sender_name: "CI".into(),
            attachments: Vec::new(),
        }
    }

    #[test]
    fn test_new_requires_host() {
        let mut cfg = make_config();
        cfg.smtp_host = String::new();
        assert!(SmtpMailTransport::new(&cfg).is_err());
    }

    #[test]
    fn test_new_rejects_bad_from() {
        let mut cfg = make_config();
        cfg.from_address = "not an address".into();
        assert!(SmtpMailTransport::new(&cfg).is_err());
    }

    #[tokio::test]
    async fn test_build_message_headers() {
        let t = SmtpMailTransport::new(&make_config()).unwrap();
        let msg = t.build_message(&make_mail()).unwrap();
        let raw = String::from_utf8(msg.formatted()).unwrap();
        assert!(raw.contains("Subject: Nightly build"));
        assert!(raw.contains("ops@example.com"));
        assert!(raw.contains("dev@example.com"));
        assert!(raw.contains("CI"));
    }

    #[tokio::test]
    async fn test_build_message_with_attachment_is_multipart() {
        let t = SmtpMailTransport::new(&make_config()).unwrap();
        let mut mail = make_mail();
        mail.attachments.push(Attachment::new("log.txt", "text/plain", b"boom".to_vec()));
        let msg = t.build_message(&mail).unwrap();
        let raw = String::from_utf8(msg.formatted()).unwrap();
        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("log.txt"));
    }

    #[tokio::test]
    async fn test_build_message_rejects_bad_recipient() {
        let t = SmtpMailTransport::new(&make_config()).unwrap();
        let mut mail = make_mail();
        mail.to = Recipients::parse("nope");
        assert!(t.build_message(&mail).is_err());
    }
}

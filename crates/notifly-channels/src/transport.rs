//! Mail transports — the outbound leg the `Mailer` hands finished mail to.
//!
//! - [`MailTransport`] — trait every transport implements
//! - [`HttpMailTransport`] — hosted mail API (JSON over HTTPS, bearer key)
//! - `SmtpMailTransport` — SMTP relay via lettre (`smtp` feature)
//!
//! Transports report failure through `anyhow::Result`; the `Mailer` turns
//! that into a `SendError` so nothing escapes to the caller.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;
use tracing::{debug, error};

use notifly_core::config::{MailTransportConfig, MailTransportKind};

// ─────────────────────────────────────────────
// Mail types
// ─────────────────────────────────────────────

/// One or more recipient addresses.
///
/// Built from a single address, a comma-separated list, or a vector.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Recipients(Vec<String>);

impl Recipients {
    /// Split a comma-separated list, trimming blanks.
    pub fn parse(list: &str) -> Self {
        Self(
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        )
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Recipients {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

impl From<&str> for Recipients {
    fn from(list: &str) -> Self {
        Recipients::parse(list)
    }
}

impl From<String> for Recipients {
    fn from(list: String) -> Self {
        Recipients::parse(&list)
    }
}

impl From<Vec<String>> for Recipients {
    fn from(addresses: Vec<String>) -> Self {
        Recipients::parse(&addresses.join(","))
    }
}

impl From<&[&str]> for Recipients {
    fn from(addresses: &[&str]) -> Self {
        Recipients::parse(&addresses.join(","))
    }
}

/// A file attached to an outgoing email.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Read an attachment from disk. Content type is guessed from the extension.
    pub async fn from_path(path: &Path) -> anyhow::Result<Self> {
        let data = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let content_type = guess_content_type(&filename).to_string();
        Ok(Self {
            filename,
            content_type,
            data,
        })
    }
}

/// Best-effort MIME type from a file name.
fn guess_content_type(filename: &str) -> &'static str {
    let lower = filename.to_lowercase();
    let ext = lower.rsplit('.').next().unwrap_or("");
    match ext {
        "txt" | "log" => "text/plain",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

/// A fully resolved email, ready for a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: Recipients,
    pub subject: String,
    pub body: String,
    /// Send `body` as HTML (a plain-text copy goes along with it).
    pub html: bool,
    /// Sender display name.
    pub sender_name: String,
    pub attachments: Vec<Attachment>,
}

// ─────────────────────────────────────────────
// Trait
// ─────────────────────────────────────────────

/// Delivers a finished email.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Hand `mail` to the underlying service.
    async fn deliver(&self, mail: &OutgoingMail) -> anyhow::Result<()>;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}

/// Build the transport selected by `config.kind`.
pub fn create_transport(config: &MailTransportConfig) -> anyhow::Result<Arc<dyn MailTransport>> {
    match config.kind {
        MailTransportKind::Http => Ok(Arc::new(HttpMailTransport::new(config))),
        #[cfg(feature = "smtp")]
        MailTransportKind::Smtp => Ok(Arc::new(crate::smtp::SmtpMailTransport::new(config)?)),
        #[cfg(not(feature = "smtp"))]
        MailTransportKind::Smtp => {
            anyhow::bail!("SMTP transport requires building with the `smtp` feature")
        }
    }
}

// ─────────────────────────────────────────────
// Hosted mail API
// ─────────────────────────────────────────────

/// Request body accepted by the hosted mail API.
#[derive(Debug, Serialize)]
struct ApiEmail<'a> {
    from: String,
    to: &'a [String],
    subject: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<ApiAttachment<'a>>,
}

#[derive(Debug, Serialize)]
struct ApiAttachment<'a> {
    filename: &'a str,
    content_type: &'a str,
    /// Base64-encoded file contents.
    content: String,
}

/// Sends mail by POSTing a JSON document to a hosted mail API.
pub struct HttpMailTransport {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from_address: String,
}

impl std::fmt::Debug for HttpMailTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpMailTransport")
            .field("api_url", &self.api_url)
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl HttpMailTransport {
    pub fn new(config: &MailTransportConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            from_address: config.from_address.clone(),
        }
    }

    /// `"Name <address>"`, or the bare address when the name is empty.
    fn from_header(&self, sender_name: &str) -> String {
        if sender_name.is_empty() {
            self.from_address.clone()
        } else {
            format!("{} <{}>", sender_name, self.from_address)
        }
    }
}

#[async_trait]
impl MailTransport for HttpMailTransport {
    async fn deliver(&self, mail: &OutgoingMail) -> anyhow::Result<()> {
        if mail.to.is_empty() {
            anyhow::bail!("no recipients");
        }
        if self.from_address.is_empty() {
            anyhow::bail!("no from_address configured");
        }

        let body = ApiEmail {
            from: self.from_header(&mail.sender_name),
            to: mail.to.as_slice(),
            subject: &mail.subject,
            text: &mail.body,
            html: mail.html.then_some(mail.body.as_str()),
            attachments: mail
                .attachments
                .iter()
                .map(|a| ApiAttachment {
                    filename: &a.filename,
                    content_type: &a.content_type,
                    content: BASE64.encode(&a.data),
                })
                .collect(),
        };

        debug!(
            url = %self.api_url,
            to = %mail.to,
            attachments = mail.attachments.len(),
            "posting email to mail API"
        );

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(status = %status, body = %text, "mail API error");
            anyhow::bail!("mail API returned {}: {}", status, text);
        }

        Ok(())
    }

    fn display_name(&self) -> &str {
        "mail API"
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_config(api_url: &str) -> MailTransportConfig {
        MailTransportConfig {
            api_url: api_url.to_string(),
            api_key: "re_test".into(),
            from_address: "alerts@example.com".into(),
            ..Default::default()
        }
    }

    fn make_mail() -> OutgoingMail {
        OutgoingMail {
            to: Recipients::parse("ops@example.com"),
            subject: "Disk full".into(),
            body: "<b>/var</b> is at 99%".into(),
            html: true,
            sender_name: "Monitor".into(),
            attachments: Vec::new(),
        }
    }

    #[test]
    fn test_recipients_parse_list() {
        let r = Recipients::parse(" a@x.io, b@y.io ,, ");
        assert_eq!(r.as_slice(), &["a@x.io".to_string(), "b@y.io".to_string()]);
        assert_eq!(r.to_string(), "a@x.io, b@y.io");
    }

    #[test]
    fn test_recipients_from_vec() {
        let r: Recipients = vec!["a@x.io".to_string(), " ".to_string()].into();
        assert_eq!(r.as_slice().len(), 1);
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type("report.PDF"), "application/pdf");
        assert_eq!(guess_content_type("data.csv"), "text/csv");
        assert_eq!(guess_content_type("blob"), "application/octet-stream");
    }

    #[test]
    fn test_from_header() {
        let t = HttpMailTransport::new(&make_config("http://unused"));
        assert_eq!(t.from_header("Monitor"), "Monitor <alerts@example.com>");
        assert_eq!(t.from_header(""), "alerts@example.com");
    }

    #[test]
    fn test_create_transport_http() {
        let t = create_transport(&make_config("http://unused")).unwrap();
        assert_eq!(t.display_name(), "mail API");
    }

    #[cfg(not(feature = "smtp"))]
    #[test]
    fn test_create_transport_smtp_without_feature() {
        let mut cfg = make_config("http://unused");
        cfg.kind = MailTransportKind::Smtp;
        assert!(create_transport(&cfg).is_err());
    }

    #[tokio::test]
    async fn test_attachment_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("report.csv");
        tokio::fs::write(&file, b"a,b\n1,2\n").await.unwrap();

        let att = Attachment::from_path(&file).await.unwrap();
        assert_eq!(att.filename, "report.csv");
        assert_eq!(att.content_type, "text/csv");
        assert_eq!(att.data, b"a,b\n1,2\n");
    }

    #[tokio::test]
    async fn test_deliver_posts_json() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(header("Authorization", "Bearer re_test"))
            .and(body_partial_json(serde_json::json!({
                "from": "Monitor <alerts@example.com>",
                "to": ["ops@example.com"],
                "subject": "Disk full",
                "text": "<b>/var</b> is at 99%",
                "html": "<b>/var</b> is at 99%"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "1"})))
            .expect(1)
            .mount(&server)
            .await;

        let t = HttpMailTransport::new(&make_config(&format!("{}/emails", server.uri())));
        t.deliver(&make_mail()).await.unwrap();
    }

    #[tokio::test]
    async fn test_deliver_encodes_attachments() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(body_partial_json(serde_json::json!({
                "attachments": [{
                    "filename": "hi.txt",
                    "content_type": "text/plain",
                    "content": "aGk="
                }]
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut mail = make_mail();
        mail.html = false;
        mail.attachments.push(Attachment::new("hi.txt", "text/plain", b"hi".to_vec()));

        let t = HttpMailTransport::new(&make_config(&format!("{}/emails", server.uri())));
        t.deliver(&mail).await.unwrap();
    }

    #[tokio::test]
    async fn test_deliver_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("invalid from"))
            .mount(&server)
            .await;

        let t = HttpMailTransport::new(&make_config(&format!("{}/emails", server.uri())));
        let err = t.deliver(&make_mail()).await.unwrap_err();
        assert!(err.to_string().contains("422"));
        assert!(err.to_string().contains("invalid from"));
    }

    #[tokio::test]
    async fn test_deliver_without_recipients() {
        let t = HttpMailTransport::new(&make_config("http://127.0.0.1:1/emails"));
        let mut mail = make_mail();
        mail.to = Recipients::default();
        let err = t.deliver(&mail).await.unwrap_err();
        assert!(err.to_string().contains("no recipients"));
    }
}

//! Notifly channels — email and Slack dispatchers.
//!
//! - [`email::Mailer`] resolves mail defaults and hands off to a [`transport::MailTransport`]
//! - [`slack::SlackNotifier`] posts through an incoming webhook or the Web API

pub mod email;
pub mod slack;
#[cfg(feature = "smtp")]
pub mod smtp;
pub mod transport;

pub use email::{EmailTemplate, MailOptions, Mailer};
pub use slack::{SlackNotifier, SlackOptions, SlackTemplate};
pub use transport::{create_transport, Attachment, MailTransport, OutgoingMail, Recipients};

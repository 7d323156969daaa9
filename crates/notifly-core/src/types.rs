//! Send outcomes shared by the email and Slack dispatchers.
//!
//! Every send returns a [`SendResult`]. Dispatchers never panic or bubble up
//! transport errors; a failure always arrives as a [`SendError`] value.

use serde::Serialize;
use thiserror::Error;

/// Where a Slack message landed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageLocation {
    /// Channel ID returned by the Web API (e.g. `C0123`).
    pub channel: String,
    /// Message timestamp, Slack's message ID (e.g. `1610000000.000100`).
    pub ts: String,
    /// Parent timestamp when the message was posted in a thread.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    /// Deep link to the message.
    pub permalink: String,
}

/// A successful send.
///
/// Email and webhook deliveries have no addressable location; Web API posts do.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Sent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<MessageLocation>,
}

impl Sent {
    /// A success with nothing to point at.
    pub fn unlocated() -> Self {
        Self { location: None }
    }

    /// A success at a known message location.
    pub fn at(location: MessageLocation) -> Self {
        Self {
            location: Some(location),
        }
    }
}

/// Why a send failed.
///
/// `Display` renders the bare message, so callers can show it as-is.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SendError {
    /// A required credential is missing. No network call was made.
    #[error("{0}")]
    NotConfigured(String),
    /// The HTTP or mail call failed, or its response could not be read.
    #[error("{0}")]
    Transport(String),
    /// The remote service answered but reported failure.
    #[error("{0}")]
    Rejected(String),
}

impl SendError {
    /// The human-readable message carried by this error.
    pub fn message(&self) -> &str {
        match self {
            SendError::NotConfigured(m) | SendError::Transport(m) | SendError::Rejected(m) => m,
        }
    }
}

/// Outcome of a single send.
pub type SendResult = Result<Sent, SendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_is_bare_message() {
        let err = SendError::Rejected("channel_not_found".into());
        assert_eq!(err.to_string(), "channel_not_found");
        assert_eq!(err.message(), "channel_not_found");
    }

    #[test]
    fn test_sent_serializes_without_empty_location() {
        let json = serde_json::to_value(Sent::unlocated()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn test_location_skips_missing_thread() {
        let sent = Sent::at(MessageLocation {
            channel: "C1".into(),
            ts: "1.2".into(),
            thread_ts: None,
            permalink: "https://slack.com/archives/C1/p12".into(),
        });
        let json = serde_json::to_value(&sent).unwrap();
        assert!(json["location"].get("thread_ts").is_none());
        assert_eq!(json["location"]["channel"], "C1");
    }
}

//! Outgoing mail types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A file attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A message ready for a mail transport.
///
/// The sender is a property of the transport, not of the message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
    pub attachments: Vec<Attachment>,
}

/// A "start a discussion" request submitted from the web client.
///
/// Name and email are optional on the wire; the authenticated account fills
/// them in when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionRequest {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid recipient address: '{0}'")]
    InvalidAddress(String),

    #[error("mail transport not configured: {0}")]
    NotConfigured(String),

    #[error("authentication with mail provider failed: {0}")]
    Auth(String),

    #[error("mail transport error: {0}")]
    Transport(String),
}

/// Loose `local@domain.tld` check; the transport does the real validation.
pub fn is_plausible_address(address: &str) -> bool {
    let address = address.trim();
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !address.chars().any(|c| c.is_whitespace() || c == '<' || c == '>')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plausible_addresses() {
        assert!(is_plausible_address("ada@example.com"));
        assert!(is_plausible_address("  grace.hopper@navy.mil "));
        assert!(!is_plausible_address("no-at-sign"));
        assert!(!is_plausible_address("@example.com"));
        assert!(!is_plausible_address("ada@localhost"));
        assert!(!is_plausible_address("ada@.com"));
        assert!(!is_plausible_address("a b@example.com"));
        assert!(!is_plausible_address("ada@example.com>\r\nBcc: x@y.z"));
    }

    #[test]
    fn test_discussion_request_camel_case() {
        let json = r#"{"subject":"Graphs","message":"Dijkstra?","userName":"Ada","userEmail":"ada@example.com"}"#;
        let req: DiscussionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.user_name.as_deref(), Some("Ada"));
        assert_eq!(req.user_email.as_deref(), Some("ada@example.com"));
    }

    #[test]
    fn test_discussion_request_missing_fields_default() {
        let req: DiscussionRequest = serde_json::from_str("{}").unwrap();
        assert!(req.subject.is_empty());
        assert!(req.user_name.is_none());
    }
}

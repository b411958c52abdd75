//! MIME message rendering on top of `mail-builder`.
//!
//! Addresses are checked and header text is flattened to one line here;
//! encoding, boundaries and folding are left to the builder.

use mail_builder::MessageBuilder;
use mail_builder::headers::address::Address;
use mail_builder::headers::content_type::ContentType;

use ragchat_types::mail::{EmailMessage, MailError, is_plausible_address};

/// The mailbox messages are sent from.
#[derive(Debug, Clone)]
pub struct Sender {
    pub name: String,
    pub address: String,
}

impl Sender {
    pub fn new(name: &str, address: &str) -> Self {
        Self {
            name: sanitize(name),
            address: address.trim().to_string(),
        }
    }

    fn mailbox(&self) -> Address<'_> {
        if self.name.is_empty() {
            Address::from(self.address.as_str())
        } else {
            Address::from((self.name.as_str(), self.address.as_str()))
        }
    }
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.address)
        } else {
            write!(f, "{} <{}>", self.name, self.address)
        }
    }
}

/// Render `message` as a complete RFC 5322 document sent from `from`.
pub fn render(from: &Sender, message: &EmailMessage) -> Result<String, MailError> {
    let to = message.to.trim();
    if !is_plausible_address(to) {
        return Err(MailError::InvalidAddress(to.to_string()));
    }
    let reply_to = message.reply_to.as_deref().map(str::trim);
    if let Some(reply_to) = reply_to {
        if !is_plausible_address(reply_to) {
            return Err(MailError::InvalidAddress(reply_to.to_string()));
        }
    }

    let mut builder = MessageBuilder::new()
        .from(from.mailbox())
        .to(to)
        .subject(sanitize(&message.subject))
        .text_body(message.text.as_str());
    if let Some(reply_to) = reply_to {
        builder = builder.reply_to(reply_to);
    }
    if let Some(html) = message.html.as_deref() {
        builder = builder.html_body(html);
    }
    for attachment in &message.attachments {
        builder = builder.attachment(
            content_type(&attachment.content_type),
            sanitize(&attachment.filename).replace('"', ""),
            attachment.data.as_slice(),
        );
    }

    builder
        .write_to_string()
        .map_err(|e| MailError::Transport(format!("failed to render message: {e}")))
}

/// Parse `type/subtype; key=value` into a builder content type.
fn content_type(raw: &str) -> ContentType<'static> {
    let raw = sanitize(raw);
    let mut parts = raw.split(';').map(str::trim);
    let kind = parts
        .next()
        .filter(|k| k.contains('/'))
        .unwrap_or("application/octet-stream")
        .to_string();
    parts
        .filter_map(|p| p.split_once('='))
        .fold(ContentType::new(kind), |ct, (key, value)| {
            ct.attribute(key.trim().to_string(), value.trim_matches('"').to_string())
        })
}

/// Header values never carry line breaks.
fn sanitize(value: &str) -> String {
    value.replace(['\r', '\n'], " ").trim().to_string()
}

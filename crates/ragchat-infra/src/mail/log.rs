//! Logging mail transport for local development.

use tracing::info;

use ragchat_core::mail::mailer::Mailer;
use ragchat_types::mail::{EmailMessage, MailError};

use super::mime::{self, Sender};

/// Renders each message exactly as Gmail would receive it, then logs a
/// summary instead of sending. Rendering still rejects bad addresses.
pub struct LogMailer {
    from: Sender,
}

impl LogMailer {
    pub fn new(from: Sender) -> Self {
        Self { from }
    }
}

impl Mailer for LogMailer {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let rendered = mime::render(&self.from, message)?;
        info!(
            from = %self.from,
            to = %message.to,
            reply_to = ?message.reply_to,
            subject = %message.subject,
            attachments = message.attachments.len(),
            bytes = rendered.len(),
            "Mail not sent (log transport)"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_mailer_accepts_valid_message() {
        let mailer = LogMailer::new(Sender::new("DSA", "dsa@example.com"));
        let message = EmailMessage {
            to: "ada@example.com".to_string(),
            subject: "Hi".to_string(),
            text: "Body".to_string(),
            ..Default::default()
        };
        mailer.send(&message).await.unwrap();
    }

    #[tokio::test]
    async fn test_log_mailer_still_validates() {
        let mailer = LogMailer::new(Sender::new("DSA", "dsa@example.com"));
        let message = EmailMessage {
            to: "bogus".to_string(),
            ..Default::default()
        };
        assert!(mailer.send(&message).await.is_err());
    }
}

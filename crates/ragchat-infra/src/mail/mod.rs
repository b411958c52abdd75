//! Mail transports.
//!
//! - `gmail`: Gmail API `messages.send` with an OAuth2 refresh token
//! - `log`: writes messages to the log instead of sending them
//! - `mime`: RFC 5322 / MIME rendering shared by the transports (`mail-builder`)

pub mod gmail;
pub mod log;
pub mod mime;

use ragchat_core::mail::mailer::BoxMailer;
use ragchat_types::config::{MailConfig, MailTransport};
use ragchat_types::mail::MailError;

use self::gmail::{GmailCredentials, GmailMailer};
use self::log::LogMailer;
use self::mime::Sender;

/// Create the configured transport. Gmail needs credentials and a sender address.
pub fn create_mailer(
    config: &MailConfig,
    credentials: Option<GmailCredentials>,
) -> Result<BoxMailer, MailError> {
    match config.transport {
        MailTransport::Log => Ok(BoxMailer::new(LogMailer::new(sender(config)))),
        MailTransport::Gmail => {
            let credentials = credentials.ok_or_else(|| {
                MailError::NotConfigured(
                    "GMAIL_CLIENT_ID, GMAIL_CLIENT_SECRET and GMAIL_REFRESH_TOKEN are required"
                        .into(),
                )
            })?;
            if config.sender_address.is_none() {
                return Err(MailError::NotConfigured("mail.sender_address is not set".into()));
            }
            Ok(BoxMailer::new(GmailMailer::new(sender(config), credentials)?))
        }
    }
}

/// The configured sender, with a placeholder address when none is set.
fn sender(config: &MailConfig) -> Sender {
    let address = config
        .sender_address
        .as_deref()
        .unwrap_or("noreply@localhost.localdomain");
    Sender::new(&config.sender_name, address)
}

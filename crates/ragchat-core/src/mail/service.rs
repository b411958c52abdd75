//! Mail service: chat exports and discussion requests.

use ragchat_types::mail::{
    Attachment, DiscussionRequest, EmailMessage, MailError, is_plausible_address,
};
use ragchat_types::user::PublicUser;
use tracing::info;

use crate::mail::mailer::Mailer;
use crate::mail::templates;

/// Errors raised before anything is handed to the transport, plus transport errors.
#[derive(Debug, thiserror::Error)]
pub enum MailServiceError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Mail(#[from] MailError),
}

/// Composes and sends the application's emails through a `Mailer`.
pub struct MailService<M: Mailer> {
    mailer: M,
    team_address: Option<String>,
}

impl<M: Mailer> MailService<M> {
    /// `team_address` receives discussion requests; without one they are rejected.
    pub fn new(mailer: M, team_address: Option<String>) -> Self {
        Self {
            mailer,
            team_address,
        }
    }

    pub fn mailer(&self) -> &M {
        &self.mailer
    }

    /// Email a rendered transcript to `to` as a `chat.txt` attachment.
    pub async fn send_transcript(
        &self,
        to: &str,
        session_id: &str,
        transcript_text: String,
    ) -> Result<(), MailServiceError> {
        let to = to.trim();
        if !is_plausible_address(to) {
            return Err(MailServiceError::Validation(format!(
                "invalid email address: '{to}'"
            )));
        }

        let message = EmailMessage {
            to: to.to_string(),
            reply_to: None,
            subject: templates::TRANSCRIPT_SUBJECT.to_string(),
            text: templates::TRANSCRIPT_TEXT.to_string(),
            html: None,
            attachments: vec![Attachment {
                filename: templates::TRANSCRIPT_FILENAME.to_string(),
                content_type: "text/plain; charset=utf-8".to_string(),
                data: transcript_text.into_bytes(),
            }],
        };
        self.mailer.send(&message).await?;
        info!(session_id = %session_id, transport = self.mailer.name(), "Transcript emailed");
        Ok(())
    }

    /// Forward a discussion request to the team, then confirm to the requester.
    ///
    /// Name and email missing from the request are taken from `account`.
    pub async fn send_discussion(
        &self,
        request: &DiscussionRequest,
        account: &PublicUser,
    ) -> Result<(), MailServiceError> {
        let subject = request.subject.trim();
        let body = request.message.trim();
        if subject.is_empty() || body.is_empty() {
            return Err(MailServiceError::Validation(
                "Subject and message are required".to_string(),
            ));
        }

        let user_name = non_blank(request.user_name.as_deref()).unwrap_or(&account.name);
        let user_email = non_blank(request.user_email.as_deref()).unwrap_or(&account.email);
        if !is_plausible_address(user_email) {
            return Err(MailServiceError::Validation(format!(
                "invalid email address: '{user_email}'"
            )));
        }

        let team = self
            .team_address
            .as_deref()
            .ok_or_else(|| MailError::NotConfigured("no team address configured".to_string()))?;

        let to_team = EmailMessage {
            to: team.to_string(),
            reply_to: Some(user_email.to_string()),
            subject: templates::discussion_subject(subject),
            text: templates::discussion_text(user_name, user_email, subject, body),
            html: Some(templates::discussion_html(user_name, user_email, subject, body)),
            attachments: vec![],
        };
        self.mailer.send(&to_team).await?;

        let confirmation = EmailMessage {
            to: user_email.to_string(),
            reply_to: None,
            subject: templates::CONFIRMATION_SUBJECT.to_string(),
            text: templates::confirmation_text(user_name, subject),
            html: Some(templates::confirmation_html(user_name, subject)),
            attachments: vec![],
        };
        self.mailer.send(&confirmation).await?;

        info!(user_id = %account.id, transport = self.mailer.name(), "Discussion request sent");
        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

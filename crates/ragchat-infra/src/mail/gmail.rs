//! Gmail API transport.
//!
//! Sends through `users.messages.send` using an OAuth2 refresh token issued
//! for the sending account. Access tokens are refreshed on demand and cached
//! until shortly before they expire.

use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use ragchat_core::mail::mailer::Mailer;
use ragchat_types::mail::{EmailMessage, MailError};

use super::mime::{self, Sender};

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

/// Refresh this long before the provider-reported expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// OAuth2 client credentials plus a long-lived refresh token.
pub struct GmailCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
    pub refresh_token: SecretString,
}

struct CachedToken {
    access_token: SecretString,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

/// Mail transport backed by the Gmail REST API.
///
/// Does NOT derive Debug: it holds OAuth secrets.
pub struct GmailMailer {
    client: reqwest::Client,
    from: Sender,
    credentials: GmailCredentials,
    token_url: String,
    api_base: String,
    token: Mutex<Option<CachedToken>>,
}

impl GmailMailer {
    pub fn new(from: Sender, credentials: GmailCredentials) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MailError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            from,
            credentials,
            token_url: TOKEN_URL.to_string(),
            api_base: API_BASE.to_string(),
            token: Mutex::new(None),
        })
    }

    /// Point at different OAuth and API hosts.
    pub fn with_endpoints(mut self, token_url: String, api_base: String) -> Self {
        self.token_url = token_url;
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    async fn access_token(&self) -> Result<SecretString, MailError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + EXPIRY_MARGIN {
                return Ok(SecretString::from(token.access_token.expose_secret().to_string()));
            }
        }

        debug!("Refreshing Gmail access token");
        let form = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.expose_secret()),
            ("refresh_token", self.credentials.refresh_token.expose_secret()),
            ("grant_type", "refresh_token"),
        ];
        let response = self
            .client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| MailError::Transport(format!("token refresh request failed: {e}")))?;

        if !response.status().is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(MailError::Auth(format!("token refresh failed: {body}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| MailError::Auth(format!("token refresh parse failed: {e}")))?;

        let expires_at = Instant::now() + Duration::from_secs(token.expires_in.unwrap_or(3600));
        *cached = Some(CachedToken {
            access_token: SecretString::from(token.access_token.clone()),
            expires_at,
        });
        Ok(SecretString::from(token.access_token))
    }
}

impl Mailer for GmailMailer {
    fn name(&self) -> &str {
        "gmail"
    }

    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let raw = mime::render(&self.from, message)?;
        let access_token = self.access_token().await?;

        let response = self
            .client
            .post(format!("{}/users/me/messages/send", self.api_base))
            .bearer_auth(access_token.expose_secret())
            .json(&serde_json::json!({ "raw": URL_SAFE_NO_PAD.encode(raw.as_bytes()) }))
            .send()
            .await
            .map_err(|e| MailError::Transport(format!("send request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            debug!(to = %message.to, "Gmail accepted message");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if status.as_u16() == 401 {
            // Revoked or expired early; force a refresh next time.
            *self.token.lock().await = None;
            warn!("Gmail rejected access token");
            return Err(MailError::Auth(format!("HTTP {status}: {body}")));
        }
        Err(MailError::Transport(format!("HTTP {status}: {body}")))
    }
}

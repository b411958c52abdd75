//! Secrets from the environment.
//!
//! API keys and OAuth credentials never live in `ragchat.toml`; they are
//! read from environment variables (optionally seeded from `.env`) and held
//! as [`SecretString`] so they stay out of logs and debug output.

use secrecy::SecretString;
use tracing::{info, warn};

use ragchat_types::config::LlmProviderKind;

use crate::mail::gmail::GmailCredentials;

pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const PINECONE_API_KEY: &str = "PINECONE_API_KEY";
pub const GMAIL_CLIENT_ID: &str = "GMAIL_CLIENT_ID";
pub const GMAIL_CLIENT_SECRET: &str = "GMAIL_CLIENT_SECRET";
pub const GMAIL_REFRESH_TOKEN: &str = "GMAIL_REFRESH_TOKEN";

/// Resolved secrets. Missing values are `None`; callers decide whether
/// that is fatal for the feature they are wiring.
pub struct Secrets {
    /// Gemini key, used for both generation and embeddings.
    pub google_api_key: Option<SecretString>,
    pub openai_api_key: Option<SecretString>,
    pub pinecone_api_key: Option<SecretString>,
    gmail_client_id: Option<String>,
    gmail_client_secret: Option<SecretString>,
    gmail_refresh_token: Option<SecretString>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let secret = |key: &str| get(key).map(SecretString::from);

        Self {
            google_api_key: secret(GOOGLE_API_KEY).or_else(|| secret(GEMINI_API_KEY)),
            openai_api_key: secret(OPENAI_API_KEY),
            pinecone_api_key: secret(PINECONE_API_KEY),
            gmail_client_id: get(GMAIL_CLIENT_ID),
            gmail_client_secret: secret(GMAIL_CLIENT_SECRET),
            gmail_refresh_token: secret(GMAIL_REFRESH_TOKEN),
        }
    }

    /// The key for the configured generation backend.
    pub fn llm_api_key(&self, provider: LlmProviderKind) -> Option<&SecretString> {
        match provider {
            LlmProviderKind::Gemini => self.google_api_key.as_ref(),
            LlmProviderKind::OpenAi | LlmProviderKind::OpenAiCompatible => {
                self.openai_api_key.as_ref()
            }
        }
    }

    /// Gmail credentials when all three parts are present.
    pub fn gmail_credentials(&self) -> Option<GmailCredentials> {
        use secrecy::ExposeSecret;
        Some(GmailCredentials {
            client_id: self.gmail_client_id.clone()?,
            client_secret: SecretString::from(
                self.gmail_client_secret.as_ref()?.expose_secret().to_string(),
            ),
            refresh_token: SecretString::from(
                self.gmail_refresh_token.as_ref()?.expose_secret().to_string(),
            ),
        })
    }

    /// Which secrets are set, by variable name. Never includes values.
    pub fn report(&self) -> Vec<(&'static str, bool)> {
        vec![
            (GOOGLE_API_KEY, self.google_api_key.is_some()),
            (OPENAI_API_KEY, self.openai_api_key.is_some()),
            (PINECONE_API_KEY, self.pinecone_api_key.is_some()),
            (GMAIL_CLIENT_ID, self.gmail_client_id.is_some()),
            (GMAIL_CLIENT_SECRET, self.gmail_client_secret.is_some()),
            (GMAIL_REFRESH_TOKEN, self.gmail_refresh_token.is_some()),
        ]
    }

    pub fn log_report(&self) {
        for (name, present) in self.report() {
            if present {
                info!(secret = name, "Secret configured");
            } else {
                warn!(secret = name, "Secret not set");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn secrets(pairs: &[(&str, &str)]) -> Secrets {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Secrets::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn test_gemini_key_is_fallback_for_google_key() {
        let s = secrets(&[(GEMINI_API_KEY, "gem")]);
        assert_eq!(s.google_api_key.unwrap().expose_secret(), "gem");

        let s = secrets(&[(GOOGLE_API_KEY, "goog"), (GEMINI_API_KEY, "gem")]);
        assert_eq!(s.google_api_key.unwrap().expose_secret(), "goog");
    }

    #[test]
    fn test_llm_key_follows_provider() {
        let s = secrets(&[(GOOGLE_API_KEY, "goog"), (OPENAI_API_KEY, "sk-test")]);
        let gemini = s.llm_api_key(LlmProviderKind::Gemini).unwrap();
        assert_eq!(gemini.expose_secret(), "goog");
        let openai = s.llm_api_key(LlmProviderKind::OpenAi).unwrap();
        assert_eq!(openai.expose_secret(), "sk-test");
    }

    #[test]
    fn test_blank_values_are_unset() {
        let s = secrets(&[(PINECONE_API_KEY, "   ")]);
        assert!(s.pinecone_api_key.is_none());
    }

    #[test]
    fn test_gmail_credentials_need_all_parts() {
        let partial = secrets(&[(GMAIL_CLIENT_ID, "id"), (GMAIL_CLIENT_SECRET, "secret")]);
        assert!(partial.gmail_credentials().is_none());

        let full = secrets(&[
            (GMAIL_CLIENT_ID, "id"),
            (GMAIL_CLIENT_SECRET, "secret"),
            (GMAIL_REFRESH_TOKEN, "refresh"),
        ]);
        let creds = full.gmail_credentials().unwrap();
        assert_eq!(creds.client_id, "id");
        assert_eq!(creds.refresh_token.expose_secret(), "refresh");
    }

    #[test]
    fn test_report_has_no_values() {
        let s = secrets(&[(PINECONE_API_KEY, "pc-very-secret")]);
        let report = format!("{:?}", s.report());
        assert!(!report.contains("pc-very-secret"));
        assert!(report.contains("(\"PINECONE_API_KEY\", true)"));
    }
}

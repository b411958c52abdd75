//! LLM provider implementations.
//!
//! Every supported backend speaks the OpenAI chat completions protocol, so
//! one [`OpenAiCompatibleProvider`] covers them all. [`create_provider`]
//! builds it from the `[llm]` config section.

pub mod openai_compat;

use ragchat_core::llm::box_provider::BoxLlmProvider;
use ragchat_types::config::{LlmConfig, LlmProviderKind};
use ragchat_types::llm::LlmError;

use self::openai_compat::OpenAiCompatibleProvider;

/// Create a [`BoxLlmProvider`] from the `[llm]` config section.
///
/// `api_key` is the resolved secret value. Gemini and OpenAI require one;
/// a self-hosted compatible server may run without auth.
pub fn create_provider(config: &LlmConfig, api_key: Option<&str>) -> Result<BoxLlmProvider, LlmError> {
    let provider = match config.provider {
        LlmProviderKind::Gemini => {
            let key = api_key.ok_or(LlmError::AuthenticationFailed)?;
            match config.base_url.as_deref() {
                Some(base_url) => {
                    let mut cfg = openai_compat::config::gemini_defaults(key, &config.model);
                    cfg.base_url = base_url.trim_end_matches('/').to_string();
                    OpenAiCompatibleProvider::new(cfg)
                }
                None => OpenAiCompatibleProvider::gemini(key, &config.model),
            }
        }
        LlmProviderKind::OpenAi => {
            let key = api_key.ok_or(LlmError::AuthenticationFailed)?;
            OpenAiCompatibleProvider::openai(key, &config.model)
        }
        LlmProviderKind::OpenAiCompatible => {
            let base_url = config.base_url.as_deref().ok_or_else(|| {
                LlmError::InvalidRequest("llm.base_url is required for openai_compatible".into())
            })?;
            OpenAiCompatibleProvider::compatible(base_url, api_key.unwrap_or("none"), &config.model)
        }
    };
    Ok(BoxLlmProvider::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragchat_core::llm::provider::LlmProvider;

    #[test]
    fn test_create_provider_gemini() {
        let provider = create_provider(&LlmConfig::default(), Some("gemini-key")).unwrap();
        assert_eq!(provider.name(), "gemini");
    }

    #[test]
    fn test_create_provider_gemini_missing_key() {
        match create_provider(&LlmConfig::default(), None) {
            Err(LlmError::AuthenticationFailed) => {}
            Err(other) => panic!("Expected AuthenticationFailed, got: {other}"),
            Ok(_) => panic!("Expected error but got Ok"),
        }
    }

    #[test]
    fn test_create_provider_openai() {
        let config = LlmConfig {
            provider: LlmProviderKind::OpenAi,
            model: "gpt-4o-mini".to_string(),
            ..Default::default()
        };
        let provider = create_provider(&config, Some("sk-test")).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_create_provider_compatible_needs_base_url() {
        let config = LlmConfig {
            provider: LlmProviderKind::OpenAiCompatible,
            model: "llama3".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            create_provider(&config, None),
            Err(LlmError::InvalidRequest(_))
        ));

        let config = LlmConfig {
            base_url: Some("http://localhost:11434/v1".to_string()),
            ..config
        };
        let provider = create_provider(&config, None).unwrap();
        assert_eq!(provider.name(), "openai_compatible");
    }
}

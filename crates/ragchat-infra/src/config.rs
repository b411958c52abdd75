//! Configuration loader for ragchat.
//!
//! Reads `ragchat.toml` and deserializes it into [`AppConfig`]. Falls back to
//! defaults when the file is missing or malformed, then applies the handful
//! of environment overrides deployments rely on.

use std::path::{Path, PathBuf};

use ragchat_types::config::AppConfig;

/// Environment variable naming the config file when `--config` is not given.
pub const CONFIG_ENV: &str = "RAGCHAT_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "ragchat.toml";

/// `--config` if given, else `$RAGCHAT_CONFIG`, else `./ragchat.toml`.
pub fn resolve_config_path(cli: Option<&Path>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    std::env::var_os(CONFIG_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Load configuration from `path`.
///
/// - If the file does not exist, returns [`AppConfig::default()`].
/// - If the file exists but fails to read or parse, logs a warning and returns the default.
pub async fn load_config(path: &Path) -> AppConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            AppConfig::default()
        }
    }
}

/// Apply `PORT`, `FRONTEND_URL`, `DATABASE_URL` and `PINECONE_INDEX_HOST`.
///
/// `lookup` is `std::env::var` in production. Empty values are ignored and
/// an unparsable `PORT` is logged and ignored.
pub fn apply_env_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(port) = get("PORT") {
        match port.trim().parse::<u16>() {
            Ok(port) => config.server.port = port,
            Err(_) => tracing::warn!("Ignoring invalid PORT value '{port}'"),
        }
    }
    if let Some(url) = get("FRONTEND_URL") {
        config.server.frontend_url = url;
    }
    if let Some(url) = get("DATABASE_URL") {
        config.database.url = url;
    }
    if let Some(host) = get("PINECONE_INDEX_HOST") {
        config.vector.index_host = Some(host);
    }
}

/// Resolve the path, load the file, and apply process environment overrides.
pub async fn load_effective_config(cli_path: Option<&Path>) -> (PathBuf, AppConfig) {
    let path = resolve_config_path(cli_path);
    let mut config = load_config(&path).await;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    (path, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    use ragchat_types::config::{LlmProviderKind, MailTransport};

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("ragchat.toml")).await;
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.retrieval.top_k, 10);
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ragchat.toml");
        tokio::fs::write(
            &path,
            r#"
[server]
port = 8080

[llm]
provider = "openai"
model = "gpt-4o-mini"

[retrieval]
top_k = 5
min_score = 0.25

[mail]
transport = "gmail"
sender_address = "dsa@example.com"
"#,
        )
        .await
        .unwrap();

        let config = load_config(&path).await;
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.llm.provider, LlmProviderKind::OpenAi);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.max_output_tokens, 2048);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.min_score, Some(0.25));
        assert_eq!(config.mail.transport, MailTransport::Gmail);
    }

    #[tokio::test]
    async fn load_config_compatible_provider_keeps_file_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ragchat.toml");
        tokio::fs::write(
            &path,
            r#"
[server]
port = 6100

[llm]
provider = "openai_compatible"
base_url = "http://localhost:11434/v1"
"#,
        )
        .await
        .unwrap();

        let config = load_config(&path).await;
        assert_eq!(config.server.port, 6100);
        assert_eq!(config.llm.provider, LlmProviderKind::OpenAiCompatible);
        assert_eq!(config.llm.base_url.as_deref(), Some("http://localhost:11434/v1"));
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ragchat.toml");
        tokio::fs::write(&path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(&path).await;
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn env_overrides_apply_and_ignore_garbage() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PORT", "not-a-port"),
            ("FRONTEND_URL", "https://dsa.example.com"),
            ("DATABASE_URL", "sqlite:///var/lib/ragchat/db.sqlite?mode=rwc"),
            ("PINECONE_INDEX_HOST", "  "),
        ]);
        let mut config = AppConfig::default();
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.frontend_url, "https://dsa.example.com");
        assert!(config.database.url.starts_with("sqlite:///var/lib"));
        assert!(config.vector.index_host.is_none());

        apply_env_overrides(&mut config, |k| (k == "PORT").then(|| "7000".to_string()));
        assert_eq!(config.server.port, 7000);
    }

    #[test]
    fn explicit_config_path_wins() {
        let path = resolve_config_path(Some(Path::new("/etc/ragchat.toml")));
        assert_eq!(path, PathBuf::from("/etc/ragchat.toml"));
    }
}

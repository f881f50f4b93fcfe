use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::http_client::HttpClient;
use super::{AnthropicProvider, OpenAiProvider};
use crate::domain::{DomainError, LlmProvider};

/// Wire protocol spoken by a provider endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderKind {
    /// OpenAI chat-completions, or any endpoint compatible with it
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "anthropic")]
    Anthropic,
}

/// How to reach one named provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl ProviderSettings {
    pub fn new(kind: ProviderKind, model: impl Into<String>, api_key_env: impl Into<String>) -> Self {
        Self {
            kind,
            model: model.into(),
            base_url: None,
            api_key_env: api_key_env.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// A provider ready for use, together with the registry name and model
/// it was selected under
#[derive(Debug, Clone)]
pub struct ResolvedProvider {
    pub name: String,
    pub model: String,
    pub provider: Arc<dyn LlmProvider>,
}

/// Named provider settings; one is selected per run at configuration time
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, ProviderSettings>,
    request_timeout: Option<Duration>,
}

impl ProviderRegistry {
    pub fn empty() -> Self {
        Self {
            providers: BTreeMap::new(),
            request_timeout: None,
        }
    }

    /// Registry with the built-in providers
    pub fn builtin() -> Self {
        Self::empty()
            .register(
                "openai",
                ProviderSettings::new(ProviderKind::OpenAi, "gpt-4o-mini", "OPENAI_API_KEY"),
            )
            .register(
                "groq",
                ProviderSettings::new(ProviderKind::OpenAi, "llama-3.3-70b-versatile", "GROQ_API_KEY")
                    .with_base_url("https://api.groq.com/openai/v1"),
            )
            .register(
                "grok",
                ProviderSettings::new(ProviderKind::OpenAi, "grok-beta", "XAI_API_KEY")
                    .with_base_url("https://api.x.ai/v1"),
            )
            .register(
                "gemini",
                ProviderSettings::new(ProviderKind::OpenAi, "gemini-1.5-flash", "GOOGLE_API_KEY")
                    .with_base_url("https://generativelanguage.googleapis.com/v1beta/openai"),
            )
            .register(
                "anthropic",
                ProviderSettings::new(
                    ProviderKind::Anthropic,
                    "claude-3-5-haiku-latest",
                    "ANTHROPIC_API_KEY",
                ),
            )
    }

    pub fn register(mut self, name: impl Into<String>, settings: ProviderSettings) -> Self {
        self.providers.insert(name.into(), settings);
        self
    }

    /// Add or replace providers from configuration
    pub fn with_overrides(mut self, overrides: &HashMap<String, ProviderSettings>) -> Self {
        for (name, settings) in overrides {
            self.providers.insert(name.clone(), settings.clone());
        }
        self
    }

    /// HTTP timeout applied to every created provider
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    pub fn settings(&self, name: &str) -> Result<&ProviderSettings, DomainError> {
        self.providers.get(name).ok_or_else(|| {
            DomainError::configuration(format!(
                "Unknown provider '{}' (known: {})",
                name,
                self.names().join(", ")
            ))
        })
    }

    /// Create the named provider, reading its API key from the environment
    pub fn create(&self, name: &str) -> Result<ResolvedProvider, DomainError> {
        let settings = self.settings(name)?;

        let api_key = std::env::var(&settings.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                DomainError::configuration(format!(
                    "{} not set; required by provider '{}'",
                    settings.api_key_env, name
                ))
            })?;

        self.create_with_key(name, api_key)
    }

    /// Create the named provider with an explicit API key
    pub fn create_with_key(
        &self,
        name: &str,
        api_key: impl Into<String>,
    ) -> Result<ResolvedProvider, DomainError> {
        let settings = self.settings(name)?;
        let client = match self.request_timeout {
            Some(timeout) => HttpClient::with_timeout(timeout)?,
            None => HttpClient::new(),
        };

        let provider: Arc<dyn LlmProvider> = match settings.kind {
            ProviderKind::OpenAi => {
                let provider = match &settings.base_url {
                    Some(base_url) => OpenAiProvider::with_base_url(client, api_key, base_url),
                    None => OpenAiProvider::new(client, api_key),
                };
                Arc::new(provider.with_name(compatible_name(name)))
            }
            ProviderKind::Anthropic => {
                let provider = match &settings.base_url {
                    Some(base_url) => AnthropicProvider::with_base_url(client, api_key, base_url),
                    None => AnthropicProvider::new(client, api_key),
                };
                Arc::new(provider)
            }
        };

        debug!(provider = name, model = %settings.model, "Created LLM provider");

        Ok(ResolvedProvider {
            name: name.to_string(),
            model: settings.model.clone(),
            provider,
        })
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn compatible_name(name: &str) -> &'static str {
    match name {
        "openai" => "openai",
        "groq" => "groq",
        "grok" => "grok",
        "gemini" => "gemini",
        _ => "openai_compatible",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_providers() {
        let registry = ProviderRegistry::builtin();
        assert_eq!(
            registry.names(),
            vec!["anthropic", "gemini", "grok", "groq", "openai"]
        );
        assert_eq!(
            registry.settings("grok").unwrap().base_url.as_deref(),
            Some("https://api.x.ai/v1")
        );
    }

    #[test]
    fn test_create_openai_compatible_provider() {
        let resolved = ProviderRegistry::builtin()
            .create_with_key("groq", "test-key")
            .unwrap();

        assert_eq!(resolved.name, "groq");
        assert_eq!(resolved.model, "llama-3.3-70b-versatile");
        assert_eq!(resolved.provider.provider_name(), "groq");
    }

    #[test]
    fn test_create_anthropic_provider() {
        let resolved = ProviderRegistry::builtin()
            .create_with_key("anthropic", "test-key")
            .unwrap();
        assert_eq!(resolved.provider.provider_name(), "anthropic");
    }

    #[test]
    fn test_unknown_provider_lists_known_names() {
        let err = ProviderRegistry::builtin()
            .create_with_key("vertex", "k")
            .unwrap_err();

        assert!(matches!(err, DomainError::Configuration { .. }));
        assert!(err.to_string().contains("openai"));
    }

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let registry = ProviderRegistry::empty().register(
            "local",
            ProviderSettings::new(ProviderKind::OpenAi, "m", "RQI_TEST_KEY_THAT_IS_NEVER_SET")
                .with_base_url("http://localhost:11434/v1"),
        );

        let err = registry.create("local").unwrap_err();
        assert!(err.to_string().contains("RQI_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_overrides_replace_builtin_settings() {
        let mut overrides = HashMap::new();
        overrides.insert(
            "openai".to_string(),
            ProviderSettings::new(ProviderKind::OpenAi, "gpt-4o", "OPENAI_API_KEY"),
        );

        let registry = ProviderRegistry::builtin().with_overrides(&overrides);
        let resolved = registry.create_with_key("openai", "k").unwrap();

        assert_eq!(resolved.model, "gpt-4o");
    }

    #[test]
    fn test_provider_kind_names() {
        let settings: ProviderSettings = serde_json::from_value(serde_json::json!({
            "kind": "openai",
            "model": "m",
            "api_key_env": "K"
        }))
        .unwrap();
        assert_eq!(settings.kind, ProviderKind::OpenAi);
    }
}

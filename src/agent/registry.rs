//! Provider registry — the agent factory.
//!
//! Maps provider keys to agent constructors, so a new backend is added by
//! registering it rather than by editing a dispatch table.
//!
//! # Example
//!
//! ```ignore
//! let registry = ProviderRegistry::with_defaults(&config.providers);
//! let agent = registry.create("openai:gpt-4o-mini", Toolbox::new())?;
//! let response = agent.prompt("Hello", None).await?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::llm::{deepseek, gemini, ollama, openai};
use super::llm::{DeepSeekAgent, GeminiAgent, OllamaAgent, OpenAiAgent, ProviderAgent};
use super::model_id::ModelId;
use crate::config::ProviderSettings;
use crate::error::Error;
use crate::tools::Toolbox;
use crate::Result;

/// Builds an agent for `(model name, tools)`. Must not perform network I/O.
pub type AgentConstructor =
    Arc<dyn Fn(&str, Toolbox) -> Result<Box<dyn ProviderAgent>> + Send + Sync>;

/// Provider registry — creates provider agents from model identifiers.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    constructors: BTreeMap<String, AgentConstructor>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in backends bound to the given settings.
    ///
    /// Supported providers:
    /// - `"openai"`: OpenAI chat completions
    /// - `"gemini"`: Google Generative Language API
    /// - `"ollama"`: Ollama chat API
    /// - `"deepseek"`: placeholder, no remote calls
    pub fn with_defaults(settings: &ProviderSettings) -> Self {
        let mut registry = Self::new();

        let s = settings.clone();
        registry.register(openai::PROVIDER, move |model, tools| {
            Ok(Box::new(OpenAiAgent::new(
                &s.openai_api_key,
                &s.openai_base_url,
                model,
                tools,
            )))
        });

        let s = settings.clone();
        registry.register(gemini::PROVIDER, move |model, tools| {
            Ok(Box::new(GeminiAgent::new(
                &s.google_api_key,
                &s.gemini_base_url,
                model,
                tools,
            )))
        });

        let s = settings.clone();
        registry.register(ollama::PROVIDER, move |model, tools| {
            Ok(Box::new(OllamaAgent::new(&s.ollama_base_url, model, tools)))
        });

        registry.register(deepseek::PROVIDER, |model, tools| {
            Ok(Box::new(DeepSeekAgent::new(model, tools)))
        });

        registry
    }

    /// Register (or replace) the constructor for a provider key.
    pub fn register<F>(&mut self, provider: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&str, Toolbox) -> Result<Box<dyn ProviderAgent>> + Send + Sync + 'static,
    {
        self.constructors
            .insert(provider.into(), Arc::new(constructor));
        self
    }

    /// Check if a provider key is registered.
    pub fn contains(&self, provider: &str) -> bool {
        self.constructors.contains_key(provider)
    }

    /// List registered provider keys, sorted.
    pub fn available(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Parse `provider:model-name` and construct the matching agent.
    pub fn create(&self, identifier: &str, tools: Toolbox) -> Result<Box<dyn ProviderAgent>> {
        let id = ModelId::parse(identifier)?;

        let constructor = self
            .constructors
            .get(id.provider())
            .ok_or_else(|| Error::UnsupportedProvider(id.provider().to_string()))?;

        debug!(provider = id.provider(), model = id.model(), tools = tools.len(), "Creating agent");
        constructor(id.model(), tools)
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.available())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::llm::FakeAgent;

    fn registry() -> ProviderRegistry {
        ProviderRegistry::with_defaults(&ProviderSettings::default())
    }

    #[test]
    fn test_default_providers() {
        assert_eq!(registry().available(), vec!["deepseek", "gemini", "ollama", "openai"]);
    }

    #[test]
    fn test_model_name_passes_through() {
        let registry = registry();
        for (identifier, provider, model) in [
            ("openai:gpt-4o-mini", "openai", "gpt-4o-mini"),
            ("gemini:Gemini-2.0-Flash ", "gemini", "Gemini-2.0-Flash "),
            ("ollama:llama3:8b", "ollama", "llama3:8b"),
            ("deepseek:", "deepseek", ""),
        ] {
            let agent = registry.create(identifier, Toolbox::new()).unwrap();
            assert_eq!(agent.provider(), provider);
            assert_eq!(agent.model(), model);
        }
    }

    #[test]
    fn test_malformed_identifier() {
        let err = registry().create("gpt-4o", Toolbox::new()).err().unwrap();
        assert!(matches!(err, Error::MalformedIdentifier(s) if s == "gpt-4o"));
    }

    #[test]
    fn test_unsupported_provider_names_token() {
        for identifier in ["mistral:large", "OpenAI:gpt-4o", ":model"] {
            let err = registry().create(identifier, Toolbox::new()).err().unwrap();
            let provider = identifier.split(':').next().unwrap();
            assert!(matches!(err, Error::UnsupportedProvider(ref p) if p == provider));
            assert!(err.to_string().contains(&format!("\"{provider}\"")));
        }
    }

    #[tokio::test]
    async fn test_register_custom_provider() {
        let mut registry = registry();
        registry.register("fake", |model, _tools| {
            Ok(Box::new(FakeAgent::new(model, vec!["pong"])))
        });

        assert!(registry.contains("fake"));
        let agent = registry.create("fake:echo-1", Toolbox::new()).unwrap();
        assert_eq!(agent.model(), "echo-1");

        let response = agent.prompt("ping", None).await.unwrap();
        assert_eq!(response.as_text(), Some("pong"));
    }
}

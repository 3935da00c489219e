//! DeepSeek agent — not wired to the remote API yet.
//!
//! Returns a marked placeholder so the registry and gateway contract holds.

use async_trait::async_trait;
use tracing::warn;

use super::{drive, ProviderAgent, StreamEvent};
use crate::agent::callbacks::{streaming, StreamCallbacks};
use crate::agent::response::Response;
use crate::tools::Toolbox;
use crate::Result;

pub const PROVIDER: &str = "deepseek";

/// Placeholder DeepSeek agent. Tools are accepted and ignored.
#[derive(Clone)]
pub struct DeepSeekAgent {
    model: String,
    tools: Toolbox,
}

impl DeepSeekAgent {
    pub fn new(model: &str, tools: Toolbox) -> Self {
        Self {
            model: model.to_string(),
            tools,
        }
    }

    pub fn placeholder(prompt: &str) -> String {
        format!("DeepSeek response for: {prompt}")
    }
}

#[async_trait]
impl ProviderAgent for DeepSeekAgent {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn prompt(&self, prompt: &str, callbacks: Option<StreamCallbacks>) -> Result<Response> {
        warn!(
            provider = PROVIDER,
            model = self.model.as_str(),
            tools = self.tools.len(),
            "DeepSeek integration is not implemented, returning a placeholder"
        );

        let text = Self::placeholder(prompt);
        let Some(callbacks) = streaming(callbacks) else {
            return Ok(Response::Text(text));
        };

        // Single chunk, then end of stream with no payload.
        let events = futures_util::stream::iter([Ok(StreamEvent::Text(text))]);
        Ok(Response::Stream(drive(PROVIDER, events, callbacks)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_placeholder_text() {
        let agent = DeepSeekAgent::new("deepseek-chat", Toolbox::new());
        let response = agent.prompt("hello", None).await.unwrap();
        assert_eq!(response.as_text(), Some("DeepSeek response for: hello"));
    }

    #[tokio::test]
    async fn test_tools_are_ignored() {
        let mut tools = Toolbox::new();
        tools.add(crate::tools::FnTool::new("swap", "Swap tokens", |_| async {
            Ok(serde_json::Value::Null)
        }));

        let agent = DeepSeekAgent::new("deepseek-chat", tools);
        let response = agent.prompt("swap", None).await.unwrap();
        assert_eq!(response.as_text(), Some("DeepSeek response for: swap"));
    }

    #[tokio::test]
    async fn test_synthesized_stream() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (a, b, c) = (log.clone(), log.clone(), log.clone());
        let callbacks = StreamCallbacks::new()
            .on_chunk(move |t| a.lock().unwrap().push(format!("chunk:{t}")))
            .on_final(move |p| b.lock().unwrap().push(format!("final:{}", p.is_none())))
            .on_completion(move |t| c.lock().unwrap().push(format!("completion:{t}")));

        let agent = DeepSeekAgent::new("deepseek-chat", Toolbox::new());
        let response = agent.prompt("hi", Some(callbacks)).await.unwrap();
        assert!(response.is_stream());
        assert_eq!(response.into_text().await.unwrap(), "DeepSeek response for: hi");

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "chunk:DeepSeek response for: hi",
                "final:true",
                "completion:DeepSeek response for: hi"
            ]
        );
    }
}

//! Provider agents — one flat implementation per backend.
//!
//! This module provides:
//! - [`ProviderAgent`] trait, the uniform `prompt` contract
//! - a shared streaming driver that fires [`StreamCallbacks`]
//! - concrete backends: OpenAI, Gemini, Ollama and a DeepSeek stub
//!
//! # Adding a New Provider
//!
//! 1. Create a new file (e.g., `mistral.rs`)
//! 2. Implement `ProviderAgent`, streaming through [`drive`]
//! 3. Register a constructor with [`super::ProviderRegistry::register`]

pub(crate) mod http;

pub mod deepseek;
pub mod gemini;
pub mod ollama;
pub mod openai;

pub use deepseek::DeepSeekAgent;
pub use gemini::GeminiAgent;
pub use ollama::OllamaAgent;
pub use openai::OpenAiAgent;

use async_stream::try_stream;
use async_trait::async_trait;
use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;
use serde_json::{json, Value};
use tracing::debug;

use super::callbacks::StreamCallbacks;
use super::response::{Response, TextStream};
use crate::tools::Toolbox;
use crate::Result;

/// Provider agent trait — one backend, one model, one request.
///
/// Agents are created fresh for every prompt call and must not perform
/// network I/O before [`ProviderAgent::prompt`].
#[async_trait]
pub trait ProviderAgent: Send + Sync {
    /// Registered provider key (e.g. `"openai"`).
    fn provider(&self) -> &str;

    /// Model name exactly as given in the identifier.
    fn model(&self) -> &str;

    /// Send the prompt.
    ///
    /// Without callbacks (or with an empty set) the complete text is
    /// returned. With callbacks a [`TextStream`] is returned as soon as the
    /// backend starts streaming. The callbacks fire only while that stream
    /// is read; a handle dropped unread fires none of them.
    async fn prompt(&self, prompt: &str, callbacks: Option<StreamCallbacks>) -> Result<Response>;
}

/// One decoded backend event.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Incremental text; empty text is not a chunk.
    Text(String),
    /// End-of-stream payload. The last one seen goes to `on_final`.
    Final(Value),
}

/// Turn backend events into a text stream that fires the callbacks.
///
/// `on_chunk` runs before each chunk is yielded. `on_final` and
/// `on_completion` run once the event stream ends without error.
pub fn drive<S>(provider: &'static str, events: S, mut callbacks: StreamCallbacks) -> TextStream
where
    S: Stream<Item = Result<StreamEvent>> + Send + 'static,
{
    TextStream::new(try_stream! {
        let mut events = Box::pin(events);
        let mut full_text = String::new();
        let mut final_payload = None;
        let mut chunks = 0usize;

        while let Some(event) = events.next().await {
            match event? {
                StreamEvent::Text(text) if text.is_empty() => {}
                StreamEvent::Text(text) => {
                    chunks += 1;
                    callbacks.chunk(&text);
                    full_text.push_str(&text);
                    yield Bytes::from(text);
                }
                StreamEvent::Final(payload) => final_payload = Some(payload),
            }
        }

        debug!(provider, chunks, chars = full_text.len(), "Stream finished");
        callbacks.finish(final_payload, full_text);
    })
}

/// Tools in the OpenAI function-calling shape (also accepted by Ollama).
pub(crate) fn openai_tools(tools: &Toolbox) -> Option<Value> {
    if tools.is_empty() {
        return None;
    }

    let functions: Vec<Value> = tools
        .definitions()
        .into_iter()
        .map(|t| {
            json!({
                "type": "function",
                "function": {
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.parameters
                }
            })
        })
        .collect();

    Some(Value::Array(functions))
}

/// Scripted agent for tests.
#[cfg(test)]
pub struct FakeAgent {
    pub model: String,
    pub chunks: Vec<&'static str>,
    pub error: Option<&'static str>,
}

#[cfg(test)]
impl FakeAgent {
    pub fn new(model: &str, chunks: Vec<&'static str>) -> Self {
        Self {
            model: model.to_string(),
            chunks,
            error: None,
        }
    }

    pub fn failing(model: &str, error: &'static str) -> Self {
        Self {
            model: model.to_string(),
            chunks: vec![],
            error: Some(error),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl ProviderAgent for FakeAgent {
    fn provider(&self) -> &str {
        "fake"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn prompt(&self, _prompt: &str, callbacks: Option<StreamCallbacks>) -> Result<Response> {
        if let Some(error) = self.error {
            return Err(crate::error::Error::backend("fake", None, error));
        }

        match super::callbacks::streaming(callbacks) {
            None => Ok(Response::Text(self.chunks.concat())),
            Some(callbacks) => {
                let mut events: Vec<Result<StreamEvent>> = self
                    .chunks
                    .iter()
                    .map(|c| Ok(StreamEvent::Text(c.to_string())))
                    .collect();
                events.push(Ok(StreamEvent::Final(json!({"done": true}))));
                let events = futures_util::stream::iter(events);
                Ok(Response::Stream(drive("fake", events, callbacks)))
            }
        }
    }
}

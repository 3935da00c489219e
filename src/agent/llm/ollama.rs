//! Ollama agent for a local or self-hosted server.

use async_stream::try_stream;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::http::{ensure_no_error, lines, read_json, send};
use super::{drive, openai_tools, ProviderAgent, StreamEvent};
use crate::agent::callbacks::{streaming, StreamCallbacks};
use crate::agent::response::Response;
use crate::tools::Toolbox;
use crate::Result;

pub const PROVIDER: &str = "ollama";

/// Ollama agent. The native chat API needs no credentials.
#[derive(Clone)]
pub struct OllamaAgent {
    base_url: String,
    model: String,
    tools: Toolbox,
    client: Client,
}

impl OllamaAgent {
    pub fn new(base_url: &str, model: &str, tools: Toolbox) -> Self {
        Self {
            base_url: base_url.to_string(),
            model: model.to_string(),
            tools,
            client: Client::new(),
        }
    }

    fn build_url(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }

    fn build_request(&self, prompt: &str, stream: bool) -> Value {
        let mut request = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "stream": stream
        });

        if let Some(tools) = openai_tools(&self.tools) {
            request["tools"] = tools;
        }

        request
    }

    /// `message.content`, or the OpenAI-shaped `choices[0].message.content`
    /// some compatible proxies return. Empty when neither is present.
    pub(crate) fn parse_text(body: &Value) -> String {
        body.pointer("/message/content")
            .or_else(|| body.pointer("/choices/0/message/content"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }
}

#[async_trait]
impl ProviderAgent for OllamaAgent {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn prompt(&self, prompt: &str, callbacks: Option<StreamCallbacks>) -> Result<Response> {
        let callbacks = streaming(callbacks);
        let request = self.build_request(prompt, callbacks.is_some());

        info!(
            provider = PROVIDER,
            model = self.model.as_str(),
            stream = callbacks.is_some(),
            tools = self.tools.len(),
            "Sending prompt to Ollama"
        );

        let response = send(PROVIDER, self.client.post(self.build_url()).json(&request)).await?;

        let Some(callbacks) = callbacks else {
            let body = ensure_no_error(PROVIDER, read_json(PROVIDER, response).await?)?;
            let text = Self::parse_text(&body);
            debug!(chars = text.len(), "Received response from Ollama");
            return Ok(Response::Text(text));
        };

        // One JSON object per line; the last one has `done: true`.
        let events = try_stream! {
            let mut lines = Box::pin(lines(PROVIDER, response));
            while let Some(line) = lines.next().await {
                let line = line?;
                let event: Value = match serde_json::from_str(&line) {
                    Ok(event) => event,
                    Err(e) => {
                        warn!("failed to parse Ollama chunk: {e}, data: {line}");
                        continue;
                    }
                };
                let event = ensure_no_error(PROVIDER, event)?;

                yield StreamEvent::Text(Self::parse_text(&event));
                if event.get("done").and_then(Value::as_bool).unwrap_or(false) {
                    yield StreamEvent::Final(event);
                    break;
                }
            }
        };

        Ok(Response::Stream(drive(PROVIDER, events, callbacks)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::{Arc, Mutex};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn agent(server: &MockServer) -> OllamaAgent {
        OllamaAgent::new(&server.uri(), "llama3:8b", Toolbox::new())
    }

    #[tokio::test]
    async fn test_buffered_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({"model": "llama3:8b", "stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "llama3:8b",
                "message": {"role": "assistant", "content": "ok"},
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = agent(&server).prompt("ping", None).await.unwrap();
        assert_eq!(response.as_text(), Some("ok"));
    }

    #[tokio::test]
    async fn test_buffered_openai_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "ok"}}]
            })))
            .mount(&server)
            .await;

        let response = agent(&server).prompt("ping", None).await.unwrap();
        assert_eq!(response.as_text(), Some("ok"));
    }

    #[tokio::test]
    async fn test_unknown_model_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(404).set_body_string(r#"{"error":"model \"llama3:8b\" not found"}"#),
            )
            .mount(&server)
            .await;

        let err = agent(&server).prompt("ping", None).await.unwrap_err();
        assert!(matches!(err, Error::Backend { status: Some(404), .. }));
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_streaming_ndjson() {
        let body = concat!(
            "{\"message\":{\"role\":\"assistant\",\"content\":\"He\"},\"done\":false}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"llo\"},\"done\":false}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"\"},\"done\":true,\"eval_count\":2}\n",
        );
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"stream": true})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
            .expect(1)
            .mount(&server)
            .await;

        let chunks = Arc::new(Mutex::new(Vec::new()));
        let finals = Arc::new(Mutex::new(Vec::new()));
        let completion = Arc::new(Mutex::new(None));
        let (a, b, c) = (chunks.clone(), finals.clone(), completion.clone());
        let callbacks = StreamCallbacks::new()
            .on_chunk(move |t| a.lock().unwrap().push(t.to_string()))
            .on_final(move |p| b.lock().unwrap().push(p))
            .on_completion(move |t| *c.lock().unwrap() = Some(t));

        let response = agent(&server).prompt("hi", Some(callbacks)).await.unwrap();
        let text = response.into_text().await.unwrap();

        assert_eq!(text, "Hello");
        assert_eq!(*chunks.lock().unwrap(), vec!["He", "llo"]);
        let finals = finals.lock().unwrap();
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].as_ref().unwrap()["eval_count"], 2);
        assert_eq!(completion.lock().unwrap().as_deref(), Some("Hello"));
    }
}

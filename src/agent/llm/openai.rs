//! OpenAI chat completions agent.

use async_stream::try_stream;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::http::{ensure_no_error, lines, read_json, send, sse_data};
use super::{drive, openai_tools, ProviderAgent, StreamEvent};
use crate::agent::callbacks::{streaming, StreamCallbacks};
use crate::agent::response::Response;
use crate::tools::Toolbox;
use crate::Result;

pub const PROVIDER: &str = "openai";

/// OpenAI API agent using bearer-token authentication.
#[derive(Clone)]
pub struct OpenAiAgent {
    api_key: String,
    base_url: String,
    model: String,
    tools: Toolbox,
    client: Client,
}

impl OpenAiAgent {
    pub fn new(api_key: &str, base_url: &str, model: &str, tools: Toolbox) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
            model: model.to_string(),
            tools,
            client: Client::new(),
        }
    }

    fn build_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
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

    /// Text of the first choice, empty when the payload lacks it.
    pub(crate) fn parse_text(body: &Value) -> String {
        body.pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// Events carried by one SSE `data:` payload.
    fn parse_event(event: Value) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        if let Some(text) = event
            .pointer("/choices/0/delta/content")
            .and_then(Value::as_str)
        {
            events.push(StreamEvent::Text(text.to_string()));
        }

        let finished = event
            .pointer("/choices/0/finish_reason")
            .is_some_and(|reason| !reason.is_null());
        if finished {
            events.push(StreamEvent::Final(event));
        }

        events
    }
}

#[async_trait]
impl ProviderAgent for OpenAiAgent {
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
            "Sending prompt to OpenAI"
        );

        let response = send(
            PROVIDER,
            self.client
                .post(self.build_url())
                .bearer_auth(&self.api_key)
                .json(&request),
        )
        .await?;

        let Some(callbacks) = callbacks else {
            let body = ensure_no_error(PROVIDER, read_json(PROVIDER, response).await?)?;
            let text = Self::parse_text(&body);
            debug!(chars = text.len(), "Received response from OpenAI");
            return Ok(Response::Text(text));
        };

        let events = try_stream! {
            let mut lines = Box::pin(lines(PROVIDER, response));
            while let Some(line) = lines.next().await {
                let line = line?;
                let Some(data) = sse_data(&line) else { continue };
                if data == "[DONE]" {
                    break;
                }

                let event: Value = match serde_json::from_str(data) {
                    Ok(event) => event,
                    Err(e) => {
                        warn!("failed to parse OpenAI chunk: {e}, data: {data}");
                        continue;
                    }
                };
                for event in Self::parse_event(ensure_no_error(PROVIDER, event)?) {
                    yield event;
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
    use crate::tools::FnTool;
    use std::sync::{Arc, Mutex};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn agent(server: &MockServer, tools: Toolbox) -> OpenAiAgent {
        OpenAiAgent::new("sk-test", &format!("{}/v1", server.uri()), "gpt-4o-mini", tools)
    }

    #[tokio::test]
    async fn test_buffered_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "stream": false,
                "messages": [{"role": "user", "content": "ping"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "ok"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = agent(&server, Toolbox::new()).prompt("ping", None).await.unwrap();
        assert_eq!(response.as_text(), Some("ok"));
    }

    #[tokio::test]
    async fn test_missing_choices_is_empty_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "cmpl-1"})))
            .mount(&server)
            .await;

        let response = agent(&server, Toolbox::new()).prompt("ping", None).await.unwrap();
        assert_eq!(response.as_text(), Some(""));
    }

    #[tokio::test]
    async fn test_error_status_is_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let err = agent(&server, Toolbox::new()).prompt("ping", None).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Backend { status: Some(401), ref message, .. } if message == "invalid api key"
        ));
    }

    #[tokio::test]
    async fn test_tools_are_forwarded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "tools": [{"type": "function", "function": {"name": "get_balance"}}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": null}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut tools = Toolbox::new();
        tools.add(FnTool::new("get_balance", "SOL balance", |_| async { Ok(Value::Null) }));

        let response = agent(&server, tools).prompt("balance?", None).await.unwrap();
        assert_eq!(response.as_text(), Some(""));
    }

    #[tokio::test]
    async fn test_streaming_prompt() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"He\"}}]}\n\n",
            ": keep-alive\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"llo\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
            "data: [DONE]\n\n",
        );
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"stream": true})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .expect(1)
            .mount(&server)
            .await;

        let log = Arc::new(Mutex::new(Vec::new()));
        let (a, b, c) = (log.clone(), log.clone(), log.clone());
        let callbacks = StreamCallbacks::new()
            .on_chunk(move |t| a.lock().unwrap().push(format!("chunk:{t}")))
            .on_final(move |p| {
                let reason = p.and_then(|p| p["choices"][0]["finish_reason"].as_str().map(String::from));
                b.lock().unwrap().push(format!("final:{}", reason.unwrap_or_default()));
            })
            .on_completion(move |t| c.lock().unwrap().push(format!("completion:{t}")));

        let response = agent(&server, Toolbox::new())
            .prompt("hi", Some(callbacks))
            .await
            .unwrap();
        let Response::Stream(stream) = response else {
            panic!("expected a stream");
        };

        assert_eq!(stream.collect_text().await.unwrap(), "Hello");
        assert_eq!(
            *log.lock().unwrap(),
            vec!["chunk:He", "chunk:llo", "final:stop", "completion:Hello"]
        );
    }

    #[tokio::test]
    async fn test_stream_error_event() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"He\"}}]}\n\n",
            "data: {\"error\":{\"message\":\"server overloaded\"}}\n\n",
        );
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let completed = Arc::new(Mutex::new(false));
        let flag = completed.clone();
        let callbacks = StreamCallbacks::new().on_completion(move |_| *flag.lock().unwrap() = true);

        let response = agent(&server, Toolbox::new())
            .prompt("hi", Some(callbacks))
            .await
            .unwrap();
        let Response::Stream(stream) = response else {
            panic!("expected a stream");
        };

        let err = stream.drain().await.unwrap_err();
        assert!(err.to_string().contains("server overloaded"));
        assert!(!*completed.lock().unwrap());
    }
}

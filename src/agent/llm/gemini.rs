//! Gemini agent (Generative Language API, API key authentication).

use async_stream::try_stream;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;

use super::http::{ensure_no_error, lines, read_json, send, sse_data};
use super::{drive, ProviderAgent, StreamEvent};
use crate::agent::callbacks::{streaming, StreamCallbacks};
use crate::agent::response::Response;
use crate::error::Error;
use crate::tools::Toolbox;
use crate::Result;

pub const PROVIDER: &str = "gemini";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini API agent using API key authentication.
#[derive(Clone)]
pub struct GeminiAgent {
    api_key: String,
    base_url: String,
    model: String,
    tools: Toolbox,
    client: Client,
}

impl GeminiAgent {
    pub fn new(api_key: &str, base_url: &str, model: &str, tools: Toolbox) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
            model: model.to_string(),
            tools,
            client: Client::new(),
        }
    }

    /// `{base}/models/{model}:{method}`, with the model name kept as a
    /// single encoded path segment.
    fn build_url(&self, method: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("invalid Gemini base URL {:?}: {e}", self.base_url)))?;

        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Gemini base URL {:?} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .push("models")
            .push(&format!("{}:{}", self.model, method));

        Ok(url)
    }

    fn convert_tools(&self) -> Option<Value> {
        if self.tools.is_empty() {
            return None;
        }

        let function_declarations: Vec<Value> = self
            .tools
            .definitions()
            .into_iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.parameters
                })
            })
            .collect();

        Some(json!([{
            "functionDeclarations": function_declarations
        }]))
    }

    fn build_request(&self, prompt: &str) -> Value {
        let mut request = json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}]
        });

        if let Some(tool_config) = self.convert_tools() {
            request["tools"] = tool_config;
        }

        request
    }

    /// Concatenated text parts of the first candidate, empty when absent.
    pub(crate) fn parse_text(body: &Value) -> String {
        body.pointer("/candidates/0/content/parts")
            .and_then(Value::as_array)
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl ProviderAgent for GeminiAgent {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn prompt(&self, prompt: &str, callbacks: Option<StreamCallbacks>) -> Result<Response> {
        let callbacks = streaming(callbacks);
        let request = self.build_request(prompt);

        info!(
            provider = PROVIDER,
            model = self.model.as_str(),
            stream = callbacks.is_some(),
            tools = self.tools.len(),
            "Sending prompt to Gemini"
        );

        let Some(callbacks) = callbacks else {
            let response = send(
                PROVIDER,
                self.client
                    .post(self.build_url("generateContent")?)
                    .header(API_KEY_HEADER, self.api_key.as_str())
                    .json(&request),
            )
            .await?;

            let body = ensure_no_error(PROVIDER, read_json(PROVIDER, response).await?)?;
            let text = Self::parse_text(&body);
            debug!(chars = text.len(), "Received response from Gemini");
            return Ok(Response::Text(text));
        };

        let response = send(
            PROVIDER,
            self.client
                .post(self.build_url("streamGenerateContent")?)
                .header(API_KEY_HEADER, self.api_key.as_str())
                .query(&[("alt", "sse")])
                .json(&request),
        )
        .await?;

        let events = try_stream! {
            let mut lines = Box::pin(lines(PROVIDER, response));
            while let Some(line) = lines.next().await {
                let line = line?;
                let Some(data) = sse_data(&line) else { continue };

                let event: Value = match serde_json::from_str(data) {
                    Ok(event) => event,
                    Err(e) => {
                        warn!("failed to parse Gemini chunk: {e}, data: {data}");
                        continue;
                    }
                };
                let event = ensure_no_error(PROVIDER, event)?;

                yield StreamEvent::Text(Self::parse_text(&event));
                if let Some(usage) = event.get("usageMetadata") {
                    yield StreamEvent::Final(usage.clone());
                }
            }
        };

        Ok(Response::Stream(drive(PROVIDER, events, callbacks)))
    }
}

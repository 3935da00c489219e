//! Shared HTTP plumbing for the backends.
//!
//! Sending with error normalization, JSON payload decoding and the line
//! splitting used by both SSE (`data: ...`) and NDJSON bodies.

use async_stream::try_stream;
use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::{RequestBuilder, Response};
use serde_json::Value;

use crate::error::Error;
use crate::Result;

/// Send a request, turning transport failures and non-2xx statuses into
/// [`Error::Backend`].
pub(crate) async fn send(provider: &str, request: RequestBuilder) -> Result<Response> {
    let response = request
        .send()
        .await
        .map_err(|e| Error::transport(provider, e))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(Error::backend(provider, Some(status.as_u16()), error_text));
    }

    Ok(response)
}

/// Decode a buffered response body as JSON.
///
/// Only a body that is not JSON at all is an error; field lookups on the
/// result are the caller's business.
pub(crate) async fn read_json(provider: &str, response: Response) -> Result<Value> {
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| Error::transport(provider, e))?;

    serde_json::from_str(&text).map_err(|e| {
        Error::backend(provider, Some(status), format!("invalid JSON payload: {e}"))
    })
}

/// Error object embedded in a payload, as several backends report failures
/// inside a 200 response or mid-stream.
pub(crate) fn embedded_error(provider: &str, payload: &Value) -> Option<Error> {
    let error = payload.get("error")?;
    if error.is_null() {
        return None;
    }

    let message = error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string());
    let status = error
        .get("code")
        .and_then(Value::as_u64)
        .and_then(|c| u16::try_from(c).ok());

    Some(Error::backend(provider, status, message))
}

/// Pass a payload through unless it carries an embedded error object.
pub(crate) fn ensure_no_error(provider: &str, payload: Value) -> Result<Value> {
    match embedded_error(provider, &payload) {
        Some(err) => Err(err),
        None => Ok(payload),
    }
}

/// Split a streaming body into complete lines.
pub(crate) fn lines(provider: &'static str, response: Response) -> impl Stream<Item = Result<String>> + Send {
    try_stream! {
        let mut body = response.bytes_stream();
        let mut decoder = LineDecoder::default();

        while let Some(next) = body.next().await {
            let bytes = next.map_err(|e| Error::transport(provider, e))?;
            tracing::trace!(provider, bytes = bytes.len(), "chunk received");
            for line in decoder.push(&bytes) {
                yield line;
            }
        }

        if let Some(line) = decoder.finish() {
            yield line;
        }
    }
}

/// Payload of an SSE `data:` line. Other SSE fields and comments yield `None`.
pub(crate) fn sse_data(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim)
}

/// Buffers bytes until a full line is available.
///
/// Network reads can end in the middle of a line, or of a UTF-8 sequence.
#[derive(Debug, Default)]
pub(crate) struct LineDecoder {
    buf: Vec<u8>,
}

impl LineDecoder {
    /// Feed bytes and take every line completed by them (without line endings).
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);
            if !line.is_empty() {
                lines.push(line.to_string());
            }
        }
        lines
    }

    /// Take whatever is left once the body has ended.
    pub(crate) fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buf);
        let rest = String::from_utf8_lossy(&rest);
        let rest = rest.trim();
        (!rest.is_empty()).then(|| rest.to_string())
    }
}

//! Prompt results: complete text or a live stream handle.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;

use crate::error::Error;
use crate::Result;

/// Result of a prompt call.
///
/// `Text` for buffered calls, `Stream` when streaming callbacks were supplied.
#[derive(Debug)]
pub enum Response {
    Text(String),
    Stream(TextStream),
}

impl Response {
    pub fn is_stream(&self) -> bool {
        matches!(self, Response::Stream(_))
    }

    /// Buffered text, if this is a buffered response.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Response::Text(text) => Some(text),
            Response::Stream(_) => None,
        }
    }

    /// Resolve to text, reading a stream to the end if needed.
    pub async fn into_text(self) -> Result<String> {
        match self {
            Response::Text(text) => Ok(text),
            Response::Stream(stream) => stream.collect_text().await,
        }
    }
}

/// Readable stream of UTF-8 text chunks.
///
/// Lazy: the backend body is read, and progress callbacks fire, as the
/// handle is polled. Dropping it closes the underlying connection.
pub struct TextStream {
    inner: Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>,
}

impl TextStream {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }

    /// Stream that yields one chunk and ends.
    pub fn once(text: impl Into<String>) -> Self {
        let bytes = Bytes::from(text.into());
        Self::new(futures_util::stream::once(async move { Ok(bytes) }))
    }

    /// Map every error this stream yields.
    pub fn map_err<F>(self, mut f: F) -> Self
    where
        F: FnMut(Error) -> Error + Send + 'static,
    {
        Self::new(self.inner.map(move |item| item.map_err(&mut f)))
    }

    /// Read to the end, discarding the bytes. Useful when only callbacks matter.
    pub async fn drain(mut self) -> Result<()> {
        while let Some(item) = self.inner.next().await {
            item?;
        }
        Ok(())
    }

    /// Read to the end and decode the text.
    pub async fn collect_text(mut self) -> Result<String> {
        let mut buf = Vec::new();
        while let Some(item) = self.inner.next().await {
            buf.extend_from_slice(&item?);
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl Stream for TextStream {
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for TextStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TextStream")
    }
}

//! Progress callbacks for streaming prompts.

use serde_json::Value;

type ChunkFn = Box<dyn FnMut(&str) + Send>;
type FinalFn = Box<dyn FnOnce(Option<Value>) + Send>;
type CompletionFn = Box<dyn FnOnce(String) + Send>;

/// Callbacks that switch a prompt into streaming mode.
///
/// - `on_chunk` fires once per text chunk, in arrival order.
/// - `on_final` fires once at end of stream with a backend-specific payload.
/// - `on_completion` fires once after `on_final` with the full text.
///
/// Neither end-of-stream callback fires if the stream fails or is dropped early.
#[derive(Default)]
pub struct StreamCallbacks {
    on_chunk: Option<ChunkFn>,
    on_final: Option<FinalFn>,
    on_completion: Option<CompletionFn>,
}

impl StreamCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_chunk(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_chunk = Some(Box::new(f));
        self
    }

    pub fn on_final(mut self, f: impl FnOnce(Option<Value>) + Send + 'static) -> Self {
        self.on_final = Some(Box::new(f));
        self
    }

    pub fn on_completion(mut self, f: impl FnOnce(String) + Send + 'static) -> Self {
        self.on_completion = Some(Box::new(f));
        self
    }

    /// True when no callback is set; such a set does not request streaming.
    pub fn is_empty(&self) -> bool {
        self.on_chunk.is_none() && self.on_final.is_none() && self.on_completion.is_none()
    }

    pub(crate) fn chunk(&mut self, text: &str) {
        if let Some(f) = self.on_chunk.as_mut() {
            f(text);
        }
    }

    /// Fire the end-of-stream callbacks. Consumes them, so they run at most once.
    pub(crate) fn finish(&mut self, payload: Option<Value>, full_text: String) {
        if let Some(f) = self.on_final.take() {
            f(payload);
        }
        if let Some(f) = self.on_completion.take() {
            f(full_text);
        }
    }
}

impl std::fmt::Debug for StreamCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamCallbacks")
            .field("on_chunk", &self.on_chunk.is_some())
            .field("on_final", &self.on_final.is_some())
            .field("on_completion", &self.on_completion.is_some())
            .finish()
    }
}

/// Keep only callback sets that actually request streaming.
pub(crate) fn streaming(callbacks: Option<StreamCallbacks>) -> Option<StreamCallbacks> {
    callbacks.filter(|c| !c.is_empty())
}

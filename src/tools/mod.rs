//! Tools module - capabilities handed to backends
//!
//! A tool is an opaque capability (kind, description, async function) that
//! the caller passes along with a prompt. Backends with native function
//! calling receive its definition; the gateway never invokes or validates it.

mod toolbox;

pub use toolbox::{ToolDefinition, Toolbox};

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use serde_json::{json, Value};

use crate::Result;

/// Tool trait - interface for every tool descriptor
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool kind, used as the function name by backends
    fn kind(&self) -> &str;

    /// Description of what the tool does
    fn description(&self) -> &str;

    /// JSON Schema for the arguments
    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    /// Run the tool with the given arguments
    async fn invoke(&self, args: Value) -> Result<Value>;

    /// Convert to a backend-facing definition
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.kind().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

type ToolFn = dyn Fn(Value) -> BoxFuture<'static, Result<Value>> + Send + Sync;

/// Tool built from an async closure.
///
/// ```ignore
/// let echo = FnTool::new("echo", "Return the arguments", |args| async move { Ok(args) });
/// ```
pub struct FnTool {
    kind: String,
    description: String,
    parameters: Value,
    function: Box<ToolFn>,
}

impl FnTool {
    pub fn new<F, Fut>(kind: impl Into<String>, description: impl Into<String>, function: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Value>> + Send + 'static,
    {
        Self {
            kind: kind.into(),
            description: description.into(),
            parameters: json!({"type": "object", "properties": {}}),
            function: Box::new(move |args| Box::pin(function(args))),
        }
    }

    /// Attach a JSON Schema for the arguments.
    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }
}

impl std::fmt::Debug for FnTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTool")
            .field("kind", &self.kind)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Tool for FnTool {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Value {
        self.parameters.clone()
    }

    async fn invoke(&self, args: Value) -> Result<Value> {
        (self.function)(args).await
    }
}

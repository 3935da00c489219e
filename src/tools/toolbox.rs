//! Toolbox - the ordered tool list attached to one prompt call

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::Tool;
use crate::error::Error;
use crate::Result;

/// Tool definition as sent to a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Ordered collection of tools.
///
/// Cloning is cheap; tools are shared, never mutated.
#[derive(Clone, Default)]
pub struct Toolbox {
    tools: Vec<Arc<dyn Tool>>,
}

impl Toolbox {
    /// Create an empty toolbox
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool
    pub fn add<T: Tool + 'static>(&mut self, tool: T) -> &mut Self {
        self.tools.push(Arc::new(tool));
        self
    }

    /// Add an already shared tool
    pub fn add_shared(&mut self, tool: Arc<dyn Tool>) -> &mut Self {
        self.tools.push(tool);
        self
    }

    /// Get the first tool of the given kind
    pub fn get(&self, kind: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.kind() == kind)
    }

    /// Invoke a tool by kind
    pub async fn invoke(&self, kind: &str, args: Value) -> Result<Value> {
        let tool = self
            .get(kind)
            .ok_or_else(|| Error::Tool(format!("Unknown tool: {kind}")))?;

        tool.invoke(args).await
    }

    /// Definitions in insertion order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// List tool kinds in insertion order
    pub fn kinds(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.kind()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for Toolbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.kinds()).finish()
    }
}

impl FromIterator<Arc<dyn Tool>> for Toolbox {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Tool>>>(iter: I) -> Self {
        Self {
            tools: iter.into_iter().collect(),
        }
    }
}

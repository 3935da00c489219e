//! Agent module — dispatch and streaming core.
//!
//! This module contains:
//! - Model identifier parsing (`provider:model-name`)
//! - Provider agent trait and backend implementations
//! - Provider registry (the agent factory)
//! - Response types and streaming callbacks
//!
//! # Adding a New Provider
//!
//! See [`llm`] and [`ProviderRegistry::register`].

mod callbacks;
mod model_id;
mod registry;
mod response;

// Provider backends in submodule
pub mod llm;

// Re-exports for convenience
pub use callbacks::StreamCallbacks;
pub use llm::{
    drive, DeepSeekAgent, GeminiAgent, OllamaAgent, OpenAiAgent, ProviderAgent, StreamEvent,
};
pub use model_id::ModelId;
pub use registry::{AgentConstructor, ProviderRegistry};
pub use response::{Response, TextStream};

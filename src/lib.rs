//! SolAgent - provider-agnostic text-generation gateway
//!
//! This library dispatches a prompt to the backend named by a
//! `provider:model-name` identifier and returns either the complete text or
//! a live stream with progress callbacks.

pub mod agent;
pub mod config;
pub mod connection;
pub mod error;
pub mod gateway;
pub mod tools;
pub mod ui;
pub mod wallet;

pub use agent::{ModelId, ProviderAgent, ProviderRegistry, Response, StreamCallbacks, TextStream};
pub use config::{Config, ProviderSettings};
pub use error::{Error, Result};
pub use gateway::SolAgent;
pub use tools::{FnTool, Tool, Toolbox};
pub use wallet::Wallet;

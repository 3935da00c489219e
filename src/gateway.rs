//! Gateway — the single `prompt` entry point.
//!
//! Owns the wallet reference, the RPC connection and the configuration.
//! Holds no per-call state, so concurrent prompts are independent.

use tracing::{debug, error, info_span, Instrument};
use uuid::Uuid;

use crate::agent::{ProviderRegistry, Response, StreamCallbacks};
use crate::config::Config;
use crate::connection::RpcConnection;
use crate::error::Error;
use crate::tools::Toolbox;
use crate::wallet::Wallet;
use crate::Result;

/// Provider-agnostic text-generation gateway.
#[derive(Debug, Clone)]
pub struct SolAgent {
    wallet: Wallet,
    connection: RpcConnection,
    config: Config,
    registry: ProviderRegistry,
}

impl SolAgent {
    /// Create a gateway with the built-in backends, using the credentials in
    /// `config.providers`.
    pub fn create(wallet: Wallet, config: Config) -> Self {
        let registry = ProviderRegistry::with_defaults(&config.providers);
        Self::with_registry(wallet, config, registry)
    }

    /// Create a gateway around a custom registry.
    pub fn with_registry(wallet: Wallet, config: Config, registry: ProviderRegistry) -> Self {
        let connection = RpcConnection::new(wallet.rpc_url());
        Self {
            wallet,
            connection,
            config,
            registry,
        }
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn connection(&self) -> &RpcConnection {
        &self.connection
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Prompt `model` (`provider:model-name`) with the given tools.
    ///
    /// Returns [`Response::Text`] without callbacks and [`Response::Stream`]
    /// with them. Every failure, including errors read from a returned
    /// stream, is logged and surfaced as [`Error::Gateway`].
    pub async fn prompt(
        &self,
        model: &str,
        tools: &Toolbox,
        prompt: &str,
        callbacks: Option<StreamCallbacks>,
    ) -> Result<Response> {
        let request_id = Uuid::new_v4();
        let span = info_span!("prompt", %request_id, model);

        async move {
            match self.dispatch(model, tools, prompt, callbacks).await {
                Ok(Response::Stream(stream)) => {
                    let stream = stream.map_err(move |e| {
                        error!(%request_id, error = %e, "Error while streaming response");
                        Error::gateway(e)
                    });
                    Ok(Response::Stream(stream))
                }
                Ok(response) => Ok(response),
                Err(e) => {
                    error!(error = %e, "Error during prompt execution");
                    Err(Error::gateway(e))
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn dispatch(
        &self,
        model: &str,
        tools: &Toolbox,
        prompt: &str,
        callbacks: Option<StreamCallbacks>,
    ) -> Result<Response> {
        let agent = self.registry.create(model, tools.clone())?;
        debug!(provider = agent.provider(), chars = prompt.len(), "Dispatching prompt");
        agent.prompt(prompt, callbacks).await
    }
}

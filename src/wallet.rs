//! Wallet collaborator
//!
//! The gateway only needs the RPC endpoint a wallet points at. Key material,
//! signing and keypair files are handled elsewhere.

use url::Url;

use crate::error::Error;
use crate::Result;

/// A wallet reference as seen by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wallet {
    rpc_url: Url,
}

impl Wallet {
    /// Create a wallet reference for the given RPC endpoint.
    pub fn new(rpc_url: &str) -> Result<Self> {
        let rpc_url = Url::parse(rpc_url)
            .map_err(|e| Error::Wallet(format!("Invalid RPC URL '{rpc_url}': {e}")))?;

        match rpc_url.scheme() {
            "http" | "https" => Ok(Self { rpc_url }),
            other => Err(Error::Wallet(format!(
                "Unsupported RPC URL scheme '{other}', expected http or https"
            ))),
        }
    }

    /// Read the RPC endpoint from an environment variable.
    pub fn from_env(variable: &str) -> Result<Self> {
        let value = std::env::var(variable)
            .map_err(|_| Error::Wallet(format!("Environment variable '{variable}' not found")))?;
        Self::new(value.trim())
    }

    /// RPC endpoint of the cluster this wallet talks to.
    pub fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }
}

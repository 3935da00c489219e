//! Network connection handle for the wallet's RPC endpoint.

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::error::Error;
use crate::Result;

/// JSON-RPC connection to a Solana cluster.
///
/// Construction performs no network I/O.
#[derive(Debug, Clone)]
pub struct RpcConnection {
    endpoint: Url,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl RpcConnection {
    pub fn new(endpoint: &Url) -> Self {
        Self {
            endpoint: endpoint.clone(),
            client: Client::new(),
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Issue a single JSON-RPC call and return its `result`.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::transport("rpc", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::backend("rpc", Some(status.as_u16()), error_text));
        }

        let rpc: RpcResponse = response.json().await.map_err(|e| Error::transport("rpc", e))?;
        if let Some(err) = rpc.error {
            return Err(Error::backend(
                "rpc",
                None,
                format!("{method} failed ({}): {}", err.code, err.message),
            ));
        }

        Ok(rpc.result.unwrap_or(Value::Null))
    }

    /// Node health as reported by `getHealth` (`"ok"` when healthy).
    pub async fn get_health(&self) -> Result<String> {
        let result = self.call("getHealth", json!([])).await?;
        Ok(result.as_str().unwrap_or_default().to_string())
    }
}

//! Error types for SolAgent

use thiserror::Error;

/// Result type alias for SolAgent operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in SolAgent
#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed model identifier \"{0}\": expected \"provider:model-name\"")]
    MalformedIdentifier(String),

    #[error("Model provider \"{0}\" is not supported")]
    UnsupportedProvider(String),

    #[error("{provider} API error{}: {message}", status_suffix(.status))]
    Backend {
        provider: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Failed to get response: {0}")]
    Gateway(#[source] Box<Error>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

impl Error {
    /// Build a backend error from a non-success HTTP status and body.
    pub fn backend(provider: &str, status: Option<u16>, message: impl Into<String>) -> Self {
        Error::Backend {
            provider: provider.to_string(),
            status,
            message: message.into(),
        }
    }

    /// Convert a transport failure into a backend error, keeping its status if any.
    ///
    /// The request URL is left out of the message since it may carry credentials.
    pub fn transport(provider: &str, err: reqwest::Error) -> Self {
        Error::Backend {
            provider: provider.to_string(),
            status: err.status().map(|s| s.as_u16()),
            message: err.without_url().to_string(),
        }
    }

    /// Wrap an error for the gateway boundary. Already-wrapped errors are kept as is.
    pub fn gateway(err: Error) -> Self {
        match err {
            Error::Gateway(_) => err,
            other => Error::Gateway(Box::new(other)),
        }
    }

    /// The error underneath a gateway wrapper.
    pub fn root(&self) -> &Error {
        match self {
            Error::Gateway(inner) => inner.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_display_includes_status() {
        let err = Error::backend("openai", Some(401), "invalid api key");
        assert_eq!(err.to_string(), "openai API error (401): invalid api key");

        let err = Error::backend("ollama", None, "connection refused");
        assert_eq!(err.to_string(), "ollama API error: connection refused");
    }

    #[tokio::test]
    async fn test_transport_error_omits_url() {
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:1/rpc?token=hunter2")
            .send()
            .await
            .unwrap_err();

        let err = Error::transport("rpc", err);
        assert!(matches!(err, Error::Backend { ref provider, status: None, .. } if provider == "rpc"));
        assert!(!err.to_string().contains("hunter2"));
    }

    #[test]
    fn test_gateway_wraps_once() {
        let err = Error::gateway(Error::UnsupportedProvider("mistral".into()));
        let err = Error::gateway(err);

        assert_eq!(
            err.to_string(),
            "Failed to get response: Model provider \"mistral\" is not supported"
        );
        assert!(matches!(err.root(), Error::UnsupportedProvider(p) if p == "mistral"));
    }
}

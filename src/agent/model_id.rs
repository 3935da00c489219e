//! Model identifiers of the form `provider:model-name`.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Separator between provider key and model name
pub const SEPARATOR: char = ':';

/// A parsed `provider:model-name` identifier.
///
/// Only the first separator splits; the model name is kept verbatim, so
/// `ollama:llama3:8b` selects model `llama3:8b`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelId {
    provider: String,
    model: String,
}

impl ModelId {
    pub fn parse(identifier: &str) -> Result<Self, Error> {
        let (provider, model) = identifier
            .split_once(SEPARATOR)
            .ok_or_else(|| Error::MalformedIdentifier(identifier.to_string()))?;

        Ok(Self {
            provider: provider.to_string(),
            model: model.to_string(),
        })
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl FromStr for ModelId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.provider, self.model)
    }
}

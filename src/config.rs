//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::Result;

/// Highest accepted Jupiter platform fee, in basis points.
pub const MAX_FEE_BPS: u16 = 10_000;

/// Main configuration structure
///
/// Everything except [`ProviderSettings`] is carried through untouched for
/// integrations that live outside the gateway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub jupiter_referral_account: Option<String>,

    /// Platform fee in basis points (0-10000)
    #[serde(default)]
    pub jupiter_fee_bps: Option<u16>,

    #[serde(default)]
    pub flash_privilege: Option<String>,

    #[serde(default)]
    pub flexlend_api_key: Option<String>,

    #[serde(default)]
    pub helius_api_key: Option<String>,

    #[serde(default)]
    pub cookie_api_key: Option<String>,

    #[serde(default)]
    pub birdeye_api_key: Option<String>,

    /// Credentials and endpoints for the text-generation backends
    #[serde(default)]
    pub providers: ProviderSettings,
}

impl Config {
    /// Start a builder with every option unset.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Backend credentials and endpoints.
///
/// Missing keys stay empty; the backend rejects the first call instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default)]
    pub openai_api_key: String,

    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    #[serde(default)]
    pub google_api_key: String,

    #[serde(default = "default_gemini_base_url")]
    pub gemini_base_url: String,

    #[serde(default)]
    pub deepseek_api_key: String,

    #[serde(default = "default_ollama_base_url")]
    pub ollama_base_url: String,
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            openai_base_url: default_openai_base_url(),
            google_api_key: String::new(),
            gemini_base_url: default_gemini_base_url(),
            deepseek_api_key: String::new(),
            ollama_base_url: default_ollama_base_url(),
        }
    }
}

impl ProviderSettings {
    /// Read every backend setting from the process environment.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        settings.fill_from_env();
        settings
    }

    /// Fill credentials that are still empty from the process environment.
    ///
    /// Endpoints are only replaced when the corresponding variable is set.
    pub fn fill_from_env(&mut self) {
        self.fill_with(|key| std::env::var(key).ok());
    }

    fn fill_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        for (field, key) in [
            (&mut self.openai_api_key, "OPENAI_API_KEY"),
            (&mut self.google_api_key, "GOOGLE_API_KEY"),
            (&mut self.deepseek_api_key, "DEEPSEEK_API_KEY"),
        ] {
            if field.is_empty() {
                if let Some(value) = lookup(key) {
                    *field = value;
                }
            }
        }

        for (field, key) in [
            (&mut self.openai_base_url, "OPENAI_BASE_URL"),
            (&mut self.gemini_base_url, "GEMINI_BASE_URL"),
            (&mut self.ollama_base_url, "OLLAMA_BASE_URL"),
        ] {
            if let Some(value) = lookup(key) {
                *field = value;
            }
        }
    }

    /// Names of the backends whose credential is present.
    pub fn configured(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if !self.openai_api_key.is_empty() {
            names.push("openai");
        }
        if !self.google_api_key.is_empty() {
            names.push("gemini");
        }
        if !self.deepseek_api_key.is_empty() {
            names.push("deepseek");
        }
        // Ollama runs locally without a key
        names.push("ollama");
        names
    }
}

/// Fluent builder for [`Config`].
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn jupiter_referral_account(mut self, account: impl Into<String>) -> Self {
        self.config.jupiter_referral_account = Some(account.into());
        self
    }

    pub fn jupiter_fee_bps(mut self, fee: u16) -> Self {
        self.config.jupiter_fee_bps = Some(fee);
        self
    }

    pub fn flash_privilege(mut self, privilege: impl Into<String>) -> Self {
        self.config.flash_privilege = Some(privilege.into());
        self
    }

    pub fn flexlend_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.flexlend_api_key = Some(key.into());
        self
    }

    pub fn helius_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.helius_api_key = Some(key.into());
        self
    }

    pub fn cookie_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.cookie_api_key = Some(key.into());
        self
    }

    pub fn birdeye_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.birdeye_api_key = Some(key.into());
        self
    }

    pub fn providers(mut self, providers: ProviderSettings) -> Self {
        self.config.providers = providers;
        self
    }

    /// Finish the configuration, rejecting out-of-range fees.
    pub fn build(self) -> Result<Config> {
        if let Some(fee) = self.config.jupiter_fee_bps {
            if fee > MAX_FEE_BPS {
                return Err(Error::Config(format!(
                    "jupiter_fee_bps must be at most {MAX_FEE_BPS}, got {fee}"
                )));
            }
        }
        Ok(self.config)
    }
}

/// Get the config directory path
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".solagent")
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Load configuration from the default location.
///
/// A missing file yields the default configuration.
pub fn load() -> Result<Config> {
    let path = config_path();
    if !path.exists() {
        return Ok(Config::default());
    }
    load_from(&path)
}

/// Load configuration from a specific file
pub fn load_from(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    if let Some(fee) = config.jupiter_fee_bps {
        if fee > MAX_FEE_BPS {
            return Err(Error::Config(format!(
                "jupiter_fee_bps in {path:?} must be at most {MAX_FEE_BPS}"
            )));
        }
    }
    Ok(config)
}

/// Save configuration to the default location
pub fn save(config: &Config) -> Result<PathBuf> {
    let path = config_path();
    save_to(config, &path)?;
    Ok(path)
}

/// Save configuration to a specific file
pub fn save_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.jupiter_fee_bps, None);
        assert_eq!(config.providers.ollama_base_url, "http://localhost:11434");
        assert!(config.providers.openai_api_key.is_empty());
    }

    #[test]
    fn test_builder_rejects_large_fee() {
        let err = Config::builder().jupiter_fee_bps(10_001).build().unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let config = Config::builder()
            .jupiter_fee_bps(50)
            .helius_api_key("helius")
            .build()
            .unwrap();
        assert_eq!(config.jupiter_fee_bps, Some(50));
        assert_eq!(config.helius_api_key.as_deref(), Some("helius"));
    }

    #[test]
    fn test_fill_keeps_existing_credentials() {
        let env: HashMap<&str, &str> = [
            ("OPENAI_API_KEY", "from-env"),
            ("GOOGLE_API_KEY", "google-env"),
            ("OLLAMA_BASE_URL", "http://gpu-box:11434"),
            ("DEEPSEEK_API_KEY", "  "),
        ]
        .into_iter()
        .collect();

        let mut settings = ProviderSettings {
            openai_api_key: "from-file".to_string(),
            ..ProviderSettings::default()
        };
        settings.fill_with(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.openai_api_key, "from-file");
        assert_eq!(settings.google_api_key, "google-env");
        assert_eq!(settings.ollama_base_url, "http://gpu-box:11434");
        assert!(settings.deepseek_api_key.is_empty());
        assert_eq!(settings.openai_base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"providers": {"openai_api_key": "sk-test"}}"#).unwrap();
        assert_eq!(config.providers.openai_api_key, "sk-test");
        assert_eq!(
            config.providers.gemini_base_url,
            "https://generativelanguage.googleapis.com/v1beta"
        );
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config::builder()
            .jupiter_referral_account("referral")
            .birdeye_api_key("birdeye")
            .build()
            .unwrap();
        save_to(&config, &path).unwrap();

        assert_eq!(load_from(&path).unwrap(), config);
    }
}

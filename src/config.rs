//! Configuration management for modelarena.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::profile::{ProfileCatalog, ProviderProfile, WireFamily};
use crate::types::RunConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub keys: KeysConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    /// Defaults applied to every selected model unless overridden on the
    /// command line.
    #[serde(default)]
    pub defaults: RunConfig,
    /// Extra model profiles, added on top of the built-in catalog.
    #[serde(default)]
    pub profiles: Vec<ProviderProfile>,
}

/// API keys per wire family. Any of these may instead come from the
/// matching environment variable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeysConfig {
    #[serde(default)]
    pub responses: Option<String>,
    #[serde(default)]
    pub messages: Option<String>,
    #[serde(default)]
    pub chat_completions: Option<String>,
}

/// Base URLs per wire family. Deployments usually point these at an
/// authenticating proxy rather than the providers directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_responses_base")]
    pub responses: String,
    #[serde(default = "default_messages_base")]
    pub messages: String,
    #[serde(default = "default_chat_base")]
    pub chat_completions: String,
}

fn default_responses_base() -> String {
    "https://api.openai.com".to_string()
}

fn default_messages_base() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_chat_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta/openai".to_string()
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            responses: default_responses_base(),
            messages: default_messages_base(),
            chat_completions: default_chat_base(),
        }
    }
}

impl EndpointsConfig {
    pub fn base(&self, family: WireFamily) -> &str {
        match family {
            WireFamily::Responses => &self.responses,
            WireFamily::Messages => &self.messages,
            WireFamily::ChatCompletions => &self.chat_completions,
        }
    }
}

impl AppConfig {
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".modelarena").join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path).with_context(|| {
                format!("Failed to read config file: {}", config_path.display())
            })?;
            toml::from_str(&content).with_context(|| {
                format!("Failed to parse config file: {}", config_path.display())
            })?
        } else {
            Self::default()
        };

        if let Ok(base) = std::env::var("MODELARENA_RESPONSES_BASE") {
            config.endpoints.responses = base;
        }
        if let Ok(base) = std::env::var("MODELARENA_MESSAGES_BASE") {
            config.endpoints.messages = base;
        }
        if let Ok(base) = std::env::var("MODELARENA_CHAT_BASE") {
            config.endpoints.chat_completions = base;
        }

        Ok(config)
    }

    /// The built-in catalog extended with any profiles from the config
    /// file (config entries replace built-ins with the same id).
    pub fn catalog(&self) -> ProfileCatalog {
        let mut catalog = ProfileCatalog::builtin();
        for profile in &self.profiles {
            catalog.insert(profile.clone());
        }
        catalog
    }

    pub fn save_default() -> Result<PathBuf> {
        let config_path = Self::config_path()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let default = Self::default();
        let content = toml::to_string_pretty(&default).context("Failed to serialize config")?;
        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;
        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_gets_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.endpoints.responses, "https://api.openai.com");
        assert!(config.keys.responses.is_none());
        assert_eq!(config.defaults.output_token_budget, 8192);
    }

    #[test]
    fn test_config_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = AppConfig::default();
        config.keys.messages = Some("sk-ant".to_string());
        config.endpoints.chat_completions = "http://localhost:8080".to_string();
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();
        let loaded: AppConfig =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.keys.messages.as_deref(), Some("sk-ant"));
        assert_eq!(
            loaded.endpoints.base(WireFamily::ChatCompletions),
            "http://localhost:8080"
        );
    }

    #[test]
    fn test_extra_profiles_extend_the_catalog() {
        let config: AppConfig = toml::from_str(
            r#"
            [[profiles]]
            id = "local-llama"
            wire_family = "chat_completions"
            output_token_limit = 4096
            "#,
        )
        .unwrap();
        let catalog = config.catalog();
        assert!(catalog.get("local-llama").is_some());
        assert!(catalog.get("gpt-5").is_some());
    }
}

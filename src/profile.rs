//! Provider profiles: static descriptions of the models the playground
//! can talk to.
//!
//! A profile records which wire family a model speaks, its pricing, its
//! output limit and its capability flags. Profiles are loaded once at
//! startup and never mutated; identity is the model id.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The shape and event vocabulary of one provider's streaming protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFamily {
    /// OpenAI Responses API events (`response.output_text.delta`, ...).
    Responses,
    /// Anthropic Messages API events (`message_start`, `content_block_delta`, ...).
    Messages,
    /// OpenAI-compatible chat completions chunks (`choices[].delta`).
    ChatCompletions,
}

impl fmt::Display for WireFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WireFamily::Responses => "responses",
            WireFamily::Messages => "messages",
            WireFamily::ChatCompletions => "chat_completions",
        };
        write!(f, "{}", name)
    }
}

/// Dollars per million tokens, split by direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

/// Immutable description of one model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub id: String,
    pub wire_family: WireFamily,
    /// Absent pricing means cost cannot be estimated for this model; the
    /// UI renders it as unknown, never as $0.
    #[serde(default)]
    pub pricing: Option<Pricing>,
    pub output_token_limit: u32,
    #[serde(default)]
    pub supports_thinking: bool,
    #[serde(default)]
    pub supports_reasoning_effort: bool,
    #[serde(default)]
    pub supports_verbosity: bool,
}

/// The set of known profiles, keyed by model id.
#[derive(Debug, Clone)]
pub struct ProfileCatalog {
    profiles: HashMap<String, ProviderProfile>,
}

impl ProfileCatalog {
    /// The models the playground ships with.
    pub fn builtin() -> Self {
        let profiles = vec![
            ProviderProfile {
                id: "gpt-5".to_string(),
                wire_family: WireFamily::Responses,
                pricing: Some(Pricing {
                    input_per_million: 1.25,
                    output_per_million: 10.0,
                }),
                output_token_limit: 128_000,
                supports_thinking: false,
                supports_reasoning_effort: true,
                supports_verbosity: true,
            },
            ProviderProfile {
                id: "gpt-5-mini".to_string(),
                wire_family: WireFamily::Responses,
                pricing: Some(Pricing {
                    input_per_million: 0.25,
                    output_per_million: 2.0,
                }),
                output_token_limit: 128_000,
                supports_thinking: false,
                supports_reasoning_effort: true,
                supports_verbosity: true,
            },
            ProviderProfile {
                id: "claude-sonnet-4-5".to_string(),
                wire_family: WireFamily::Messages,
                pricing: Some(Pricing {
                    input_per_million: 3.0,
                    output_per_million: 15.0,
                }),
                output_token_limit: 64_000,
                supports_thinking: true,
                supports_reasoning_effort: false,
                supports_verbosity: false,
            },
            ProviderProfile {
                id: "claude-haiku-4-5".to_string(),
                wire_family: WireFamily::Messages,
                pricing: Some(Pricing {
                    input_per_million: 1.0,
                    output_per_million: 5.0,
                }),
                output_token_limit: 64_000,
                supports_thinking: true,
                supports_reasoning_effort: false,
                supports_verbosity: false,
            },
            ProviderProfile {
                id: "gemini-2.5-pro".to_string(),
                wire_family: WireFamily::ChatCompletions,
                pricing: Some(Pricing {
                    input_per_million: 1.25,
                    output_per_million: 10.0,
                }),
                output_token_limit: 65_536,
                supports_thinking: true,
                supports_reasoning_effort: false,
                supports_verbosity: false,
            },
            ProviderProfile {
                id: "gemini-2.5-flash".to_string(),
                wire_family: WireFamily::ChatCompletions,
                pricing: Some(Pricing {
                    input_per_million: 0.30,
                    output_per_million: 2.50,
                }),
                output_token_limit: 65_536,
                supports_thinking: true,
                supports_reasoning_effort: false,
                supports_verbosity: false,
            },
        ];

        let profiles = profiles
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        Self { profiles }
    }

    pub fn get(&self, id: &str) -> Option<&ProviderProfile> {
        self.profiles.get(id)
    }

    /// Add or replace a profile (used for entries declared in the config
    /// file).
    pub fn insert(&mut self, profile: ProviderProfile) {
        self.profiles.insert(profile.id.clone(), profile);
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(|k| k.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_covers_all_families() {
        let catalog = ProfileCatalog::builtin();
        let families: std::collections::HashSet<WireFamily> = catalog
            .ids()
            .map(|id| catalog.get(id).unwrap().wire_family)
            .collect();
        assert!(families.contains(&WireFamily::Responses));
        assert!(families.contains(&WireFamily::Messages));
        assert!(families.contains(&WireFamily::ChatCompletions));
    }

    #[test]
    fn test_insert_replaces_by_id() {
        let mut catalog = ProfileCatalog::builtin();
        let mut custom = catalog.get("gpt-5").unwrap().clone();
        custom.pricing = None;
        catalog.insert(custom);
        assert!(catalog.get("gpt-5").unwrap().pricing.is_none());
    }

    #[test]
    fn test_profile_deserializes_with_flag_defaults() {
        let profile: ProviderProfile = toml::from_str(
            r#"
            id = "local-llama"
            wire_family = "chat_completions"
            output_token_limit = 4096
            "#,
        )
        .unwrap();
        assert_eq!(profile.wire_family, WireFamily::ChatCompletions);
        assert!(profile.pricing.is_none());
        assert!(!profile.supports_thinking);
    }
}

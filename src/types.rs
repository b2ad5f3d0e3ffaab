//! Core data types shared by the streaming engine.
//!
//! This module defines the per-model run configuration, the normalized
//! `Delta` that every wire family's interpreter produces, and the usage
//! accounting types that feed the cost model.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::profile::ProviderProfile;
use crate::run::RunError;

// --- Run configuration ---

/// Reasoning effort level for models that expose it instead of temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Minimal,
    Low,
    Medium,
    High,
}

impl ReasoningEffort {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasoningEffort::Minimal => "minimal",
            ReasoningEffort::Low => "low",
            ReasoningEffort::Medium => "medium",
            ReasoningEffort::High => "high",
        }
    }
}

impl FromStr for ReasoningEffort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minimal" => Ok(ReasoningEffort::Minimal),
            "low" => Ok(ReasoningEffort::Low),
            "medium" => Ok(ReasoningEffort::Medium),
            "high" => Ok(ReasoningEffort::High),
            other => Err(format!(
                "unknown reasoning effort '{}' (expected minimal, low, medium or high)",
                other
            )),
        }
    }
}

/// Output verbosity hint, only honored by models that support it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Low,
    Medium,
    High,
}

impl Verbosity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Low => "low",
            Verbosity::Medium => "medium",
            Verbosity::High => "high",
        }
    }
}

/// Requested shape of the model's final answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Text,
    Json,
}

/// Per-model, user-editable settings for one run.
///
/// Temperature and reasoning effort are mutually exclusive: a model takes
/// one or the other depending on its wire family and capabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub reasoning_effort: Option<ReasoningEffort>,
    #[serde(default)]
    pub verbosity: Option<Verbosity>,
    #[serde(default = "default_output_token_budget")]
    pub output_token_budget: u32,
    /// Extended-reasoning budget. When set, the output token budget must
    /// leave room above it for the visible answer.
    #[serde(default)]
    pub thinking_budget: Option<u32>,
    #[serde(default)]
    pub response_format: ResponseFormat,
    #[serde(default)]
    pub web_search: bool,
    #[serde(default)]
    pub code_execution: bool,
    #[serde(default)]
    pub url_context: bool,
}

fn default_output_token_budget() -> u32 {
    8192
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            temperature: None,
            reasoning_effort: None,
            verbosity: None,
            output_token_budget: default_output_token_budget(),
            thinking_budget: None,
            response_format: ResponseFormat::Text,
            web_search: false,
            code_execution: false,
            url_context: false,
        }
    }
}

impl RunConfig {
    /// Check this configuration against a model's capabilities.
    ///
    /// Called before any network activity; a failure here short-circuits
    /// the run straight to `Errored` without issuing a request.
    pub fn validate(&self, profile: &ProviderProfile) -> Result<(), RunError> {
        if self.output_token_budget == 0 {
            return Err(RunError::Validation(
                "output token budget must be greater than zero".to_string(),
            ));
        }
        if self.output_token_budget > profile.output_token_limit {
            return Err(RunError::Validation(format!(
                "output token budget {} exceeds the model limit of {}",
                self.output_token_budget, profile.output_token_limit
            )));
        }
        if self.temperature.is_some() && self.reasoning_effort.is_some() {
            return Err(RunError::Validation(
                "temperature and reasoning effort are mutually exclusive".to_string(),
            ));
        }
        if self.reasoning_effort.is_some() && !profile.supports_reasoning_effort {
            return Err(RunError::Validation(format!(
                "model '{}' does not accept a reasoning effort",
                profile.id
            )));
        }
        if self.verbosity.is_some() && !profile.supports_verbosity {
            return Err(RunError::Validation(format!(
                "model '{}' does not accept a verbosity setting",
                profile.id
            )));
        }
        if let Some(thinking) = self.thinking_budget {
            if !profile.supports_thinking {
                return Err(RunError::Validation(format!(
                    "model '{}' does not support extended thinking",
                    profile.id
                )));
            }
            if self.output_token_budget <= thinking {
                return Err(RunError::Validation(format!(
                    "output token budget ({}) must exceed the thinking budget ({})",
                    self.output_token_budget, thinking
                )));
            }
        }
        Ok(())
    }
}

// --- Normalized stream deltas ---

/// One usage observation extracted from a single frame.
///
/// Fields are optional because different families report usage
/// piecemeal: a missing field means "no new information", never zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageSnapshot {
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    /// Hidden reasoning tokens, reported separately where the upstream
    /// exposes them. Already included in `output_tokens`.
    pub reasoning_tokens: Option<u64>,
    /// True when this snapshot is the authoritative final accounting.
    pub is_final: bool,
}

/// The normalized unit produced by an interpreter for one frame.
///
/// Exactly one variant per frame. Unrecognized or malformed frames
/// become `Ignorable`; they must never fail a run.
#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    /// A fragment of visible answer text, appended in arrival order.
    Text(String),
    /// A usage observation; triggers a cost recomputation.
    Usage(UsageSnapshot),
    /// The stream's end-of-output marker.
    Terminal,
    /// A frame with nothing to surface (thinking traces, pings, decode
    /// failures).
    Ignorable,
}

// --- Accumulated usage ---

/// Token counts accumulated over one run.
///
/// Values are monotonically non-decreasing once set: snapshots replace
/// the stored counts but can never lower them, which also retains the
/// last known-good value when a later usage object is malformed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub reasoning_tokens: Option<u64>,
}

impl Usage {
    /// Fold one snapshot into the accumulated counts.
    pub fn apply(&mut self, snapshot: &UsageSnapshot) {
        if let Some(input) = snapshot.input_tokens {
            self.input_tokens = self.input_tokens.max(input);
        }
        if let Some(output) = snapshot.output_tokens {
            self.output_tokens = self.output_tokens.max(output);
        }
        if let Some(reasoning) = snapshot.reasoning_tokens {
            let prior = self.reasoning_tokens.unwrap_or(0);
            self.reasoning_tokens = Some(prior.max(reasoning));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileCatalog;

    fn profile(id: &str) -> ProviderProfile {
        ProfileCatalog::builtin().get(id).unwrap().clone()
    }

    #[test]
    fn test_thinking_budget_must_fit_under_output_budget() {
        let config = RunConfig {
            thinking_budget: Some(4096),
            output_token_budget: 2048,
            ..RunConfig::default()
        };
        let err = config.validate(&profile("claude-sonnet-4-5")).unwrap_err();
        assert!(matches!(err, RunError::Validation(_)));
    }

    #[test]
    fn test_thinking_budget_accepted_when_smaller() {
        let config = RunConfig {
            thinking_budget: Some(1024),
            output_token_budget: 4096,
            ..RunConfig::default()
        };
        assert!(config.validate(&profile("claude-sonnet-4-5")).is_ok());
    }

    #[test]
    fn test_temperature_and_effort_are_exclusive() {
        let config = RunConfig {
            temperature: Some(0.7),
            reasoning_effort: Some(ReasoningEffort::Low),
            ..RunConfig::default()
        };
        assert!(config.validate(&profile("gpt-5")).is_err());
    }

    #[test]
    fn test_effort_rejected_without_capability() {
        let config = RunConfig {
            reasoning_effort: Some(ReasoningEffort::High),
            ..RunConfig::default()
        };
        assert!(config.validate(&profile("claude-sonnet-4-5")).is_err());
        assert!(config.validate(&profile("gpt-5")).is_ok());
    }

    #[test]
    fn test_usage_replaces_but_never_decreases() {
        let mut usage = Usage::default();
        usage.apply(&UsageSnapshot {
            input_tokens: Some(12),
            output_tokens: Some(40),
            ..UsageSnapshot::default()
        });
        // Cumulative update replaces the output count.
        usage.apply(&UsageSnapshot {
            output_tokens: Some(90),
            ..UsageSnapshot::default()
        });
        assert_eq!(usage.input_tokens, 12);
        assert_eq!(usage.output_tokens, 90);
        // A lower (stale or garbled) value is retained at the known good.
        usage.apply(&UsageSnapshot {
            output_tokens: Some(10),
            ..UsageSnapshot::default()
        });
        assert_eq!(usage.output_tokens, 90);
    }

    #[test]
    fn test_usage_missing_fields_keep_prior_values() {
        let mut usage = Usage {
            input_tokens: 100,
            output_tokens: 50,
            reasoning_tokens: None,
        };
        usage.apply(&UsageSnapshot::default());
        assert_eq!(usage.input_tokens, 100);
        assert_eq!(usage.output_tokens, 50);
    }

    #[test]
    fn test_reasoning_effort_from_str() {
        assert_eq!(
            "medium".parse::<ReasoningEffort>().unwrap(),
            ReasoningEffort::Medium
        );
        assert!("extreme".parse::<ReasoningEffort>().is_err());
    }
}

//! Command-line interface definitions.

use anyhow::Result;
use clap::Parser;

use crate::types::{ReasoningEffort, ResponseFormat, RunConfig, Verbosity};

/// Send one prompt to several models and watch them stream side by side.
#[derive(Debug, Parser)]
#[command(name = "modelarena", version, about)]
pub struct Cli {
    /// The prompt to send to every selected model.
    pub prompt: String,

    /// Model to include in the comparison (repeatable).
    #[arg(short, long = "model", required = true)]
    pub models: Vec<String>,

    /// Sampling temperature (mutually exclusive with --reasoning-effort).
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Reasoning effort: minimal, low, medium or high.
    #[arg(long)]
    pub reasoning_effort: Option<String>,

    /// Output verbosity: low, medium or high.
    #[arg(long)]
    pub verbosity: Option<String>,

    /// Maximum output tokens per model.
    #[arg(long)]
    pub max_output_tokens: Option<u32>,

    /// Extended-thinking token budget (must be below the output budget).
    #[arg(long)]
    pub thinking_budget: Option<u32>,

    /// Ask for a JSON-formatted answer.
    #[arg(long)]
    pub json: bool,

    /// Enable the provider's web search tool.
    #[arg(long)]
    pub web_search: bool,

    /// Enable the provider's code execution tool.
    #[arg(long)]
    pub code_execution: bool,

    /// Enable the provider's URL context tool.
    #[arg(long)]
    pub url_context: bool,
}

impl Cli {
    /// Overlay the command-line flags on top of the configured defaults.
    pub fn run_config(&self, defaults: &RunConfig) -> Result<RunConfig> {
        let mut config = defaults.clone();
        if self.temperature.is_some() {
            config.temperature = self.temperature;
            config.reasoning_effort = None;
        }
        if let Some(effort) = &self.reasoning_effort {
            config.reasoning_effort =
                Some(effort.parse::<ReasoningEffort>().map_err(anyhow::Error::msg)?);
            config.temperature = None;
        }
        if let Some(verbosity) = &self.verbosity {
            config.verbosity = Some(match verbosity.as_str() {
                "low" => Verbosity::Low,
                "medium" => Verbosity::Medium,
                "high" => Verbosity::High,
                other => anyhow::bail!("unknown verbosity '{}'", other),
            });
        }
        if let Some(budget) = self.max_output_tokens {
            config.output_token_budget = budget;
        }
        if self.thinking_budget.is_some() {
            config.thinking_budget = self.thinking_budget;
        }
        if self.json {
            config.response_format = ResponseFormat::Json;
        }
        config.web_search |= self.web_search;
        config.code_execution |= self.code_execution;
        config.url_context |= self.url_context;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "modelarena",
            "hello",
            "-m",
            "gpt-5",
            "--reasoning-effort",
            "high",
            "--max-output-tokens",
            "1000",
        ]);
        let config = cli.run_config(&RunConfig::default()).unwrap();
        assert_eq!(config.reasoning_effort, Some(ReasoningEffort::High));
        assert_eq!(config.output_token_budget, 1000);
        assert!(config.temperature.is_none());
    }

    #[test]
    fn test_temperature_clears_a_default_effort() {
        let cli = Cli::parse_from(["modelarena", "hello", "-m", "gpt-5", "--temperature", "0.2"]);
        let defaults = RunConfig {
            reasoning_effort: Some(ReasoningEffort::Medium),
            ..RunConfig::default()
        };
        let config = cli.run_config(&defaults).unwrap();
        assert_eq!(config.temperature, Some(0.2));
        assert!(config.reasoning_effort.is_none());
    }

    #[test]
    fn test_bad_effort_is_an_error() {
        let cli = Cli::parse_from([
            "modelarena",
            "hello",
            "-m",
            "gpt-5",
            "--reasoning-effort",
            "maximum",
        ]);
        assert!(cli.run_config(&RunConfig::default()).is_err());
    }
}

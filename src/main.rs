mod cli;
mod config;
mod controller;
mod cost;
mod credentials;
mod frames;
mod interpret;
mod profile;
mod request;
mod run;
mod transport;
mod types;

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::AppConfig;
use controller::AggregationController;
use credentials::ConfigCredentials;
use run::{ModelRunState, RunStatus};
use transport::HttpTransport;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();

    // Auto-generate config file on first run
    let config_path = AppConfig::config_path()?;
    if !config_path.exists() {
        let path = AppConfig::save_default()?;
        eprintln!("[Config] Created default config: {}", path.display());
        eprintln!("[Config] Edit it to set your API keys and endpoints.");
    }
    let config = AppConfig::load()?;

    let run_config = args.run_config(&config.defaults)?;
    let selections: Vec<(String, types::RunConfig)> = args
        .models
        .iter()
        .map(|id| (id.clone(), run_config.clone()))
        .collect();

    let (controller, mut updates) = AggregationController::new(
        config.catalog(),
        config.endpoints.clone(),
        Arc::new(ConfigCredentials::new(config.keys.clone())),
        Arc::new(HttpTransport::new()),
    );

    for model_id in &args.models {
        controller.select(model_id);
    }
    controller.submit(&args.prompt, &selections)?;

    // With one model, stream its text live; with several, report status
    // transitions and print the full answers at the end.
    let live = args.models.len() == 1;
    let mut printed_len: HashMap<String, usize> = HashMap::new();
    let mut last_status: HashMap<String, RunStatus> = HashMap::new();

    while !controller.all_terminal() {
        let Some(update) = updates.recv().await else {
            break;
        };
        let Some(state) = controller.state(&update.model_id) else {
            continue;
        };

        if live {
            let already = printed_len.entry(update.model_id.clone()).or_insert(0);
            if state.accumulated_text.len() > *already {
                print!("{}", &state.accumulated_text[*already..]);
                std::io::stdout().flush()?;
                *already = state.accumulated_text.len();
            }
        }
        let previous = last_status.insert(update.model_id.clone(), state.status);
        if !live && previous != Some(state.status) {
            eprintln!("[{}] {}", update.model_id, describe(&state));
        }
    }

    if live {
        println!();
    } else {
        for (model_id, state) in controller.snapshot_all() {
            println!("===== {} =====", model_id);
            if let Some(error) = &state.error {
                println!("(error: {})", error);
            }
            println!("{}", state.accumulated_text);
        }
    }

    println!();
    println!("{:<24} {:>9} {:>8} {:>8} {:>10} {:>8}", "model", "status", "in", "out", "cost", "time");
    for (model_id, state) in controller.snapshot_all() {
        let (input, output) = state
            .usage
            .map(|u| (u.input_tokens.to_string(), u.output_tokens.to_string()))
            .unwrap_or_else(|| ("-".to_string(), "-".to_string()));
        let cost = state
            .cost
            .map(|c| format!("${:.4}", c))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<24} {:>9} {:>8} {:>8} {:>10} {:>7.1}s",
            model_id,
            status_label(state.status),
            input,
            output,
            cost,
            state.elapsed_seconds,
        );
    }

    Ok(())
}

fn describe(state: &ModelRunState) -> String {
    match state.status {
        RunStatus::Idle => "idle".to_string(),
        RunStatus::Running => "streaming...".to_string(),
        RunStatus::Complete => format!("complete in {:.1}s", state.elapsed_seconds),
        RunStatus::Errored => format!(
            "error: {}",
            state.error.as_deref().unwrap_or("unknown failure")
        ),
    }
}

fn status_label(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Idle => "idle",
        RunStatus::Running => "running",
        RunStatus::Complete => "complete",
        RunStatus::Errored => "errored",
    }
}

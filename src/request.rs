//! Request construction, one body shape per wire family.

use serde_json::{json, Value};

use crate::profile::{ProviderProfile, WireFamily};
use crate::types::{ResponseFormat, RunConfig};

/// A transport-ready upstream request.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Value,
}

/// Build the streaming request for one model.
///
/// The credential goes into the family's auth header and is never held
/// anywhere else; the base URL comes from configuration so deployments
/// can point each family at an authenticating proxy.
pub fn build(
    profile: &ProviderProfile,
    config: &RunConfig,
    prompt: &str,
    base_url: &str,
    api_key: &str,
) -> ProviderRequest {
    let base = base_url.trim_end_matches('/');
    match profile.wire_family {
        WireFamily::Responses => build_responses(profile, config, prompt, base, api_key),
        WireFamily::Messages => build_messages(profile, config, prompt, base, api_key),
        WireFamily::ChatCompletions => build_chat(profile, config, prompt, base, api_key),
    }
}

fn build_responses(
    profile: &ProviderProfile,
    config: &RunConfig,
    prompt: &str,
    base: &str,
    api_key: &str,
) -> ProviderRequest {
    let mut body = json!({
        "model": profile.id,
        "input": prompt,
        "stream": true,
        "max_output_tokens": config.output_token_budget,
    });
    if let Some(temperature) = config.temperature {
        body["temperature"] = json!(temperature);
    }
    if let Some(effort) = config.reasoning_effort {
        body["reasoning"] = json!({ "effort": effort.as_str() });
    }
    let mut text = serde_json::Map::new();
    if let Some(verbosity) = config.verbosity {
        text.insert("verbosity".to_string(), json!(verbosity.as_str()));
    }
    if config.response_format == ResponseFormat::Json {
        text.insert("format".to_string(), json!({ "type": "json_object" }));
    }
    if !text.is_empty() {
        body["text"] = Value::Object(text);
    }
    let mut tools = Vec::new();
    if config.web_search {
        tools.push(json!({ "type": "web_search" }));
    }
    if config.code_execution {
        tools.push(json!({ "type": "code_interpreter", "container": { "type": "auto" } }));
    }
    if !tools.is_empty() {
        body["tools"] = json!(tools);
    }

    ProviderRequest {
        url: format!("{}/v1/responses", base),
        headers: vec![
            ("authorization", format!("Bearer {}", api_key)),
            ("content-type", "application/json".to_string()),
        ],
        body,
    }
}

fn build_messages(
    profile: &ProviderProfile,
    config: &RunConfig,
    prompt: &str,
    base: &str,
    api_key: &str,
) -> ProviderRequest {
    let mut body = json!({
        "model": profile.id,
        "max_tokens": config.output_token_budget,
        "stream": true,
        "messages": [{ "role": "user", "content": prompt }],
    });
    if let Some(temperature) = config.temperature {
        body["temperature"] = json!(temperature);
    }
    if let Some(budget) = config.thinking_budget {
        body["thinking"] = json!({ "type": "enabled", "budget_tokens": budget });
    }
    let mut tools = Vec::new();
    if config.web_search {
        tools.push(json!({ "type": "web_search_20250305", "name": "web_search" }));
    }
    if config.code_execution {
        tools.push(json!({ "type": "code_execution_20250522", "name": "code_execution" }));
    }
    if !tools.is_empty() {
        body["tools"] = json!(tools);
    }

    ProviderRequest {
        url: format!("{}/v1/messages", base),
        headers: vec![
            ("x-api-key", api_key.to_string()),
            ("anthropic-version", "2023-06-01".to_string()),
            ("content-type", "application/json".to_string()),
        ],
        body,
    }
}

fn build_chat(
    profile: &ProviderProfile,
    config: &RunConfig,
    prompt: &str,
    base: &str,
    api_key: &str,
) -> ProviderRequest {
    let mut body = json!({
        "model": profile.id,
        "messages": [{ "role": "user", "content": prompt }],
        "max_tokens": config.output_token_budget,
        "stream": true,
        "stream_options": { "include_usage": true },
    });
    if let Some(temperature) = config.temperature {
        body["temperature"] = json!(temperature);
    }
    if config.response_format == ResponseFormat::Json {
        body["response_format"] = json!({ "type": "json_object" });
    }
    let mut tools = Vec::new();
    if config.web_search {
        tools.push(json!({ "type": "google_search" }));
    }
    if config.code_execution {
        tools.push(json!({ "type": "code_execution" }));
    }
    if config.url_context {
        tools.push(json!({ "type": "url_context" }));
    }
    if !tools.is_empty() {
        body["tools"] = json!(tools);
    }

    ProviderRequest {
        url: format!("{}/chat/completions", base),
        headers: vec![
            ("authorization", format!("Bearer {}", api_key)),
            ("content-type", "application/json".to_string()),
        ],
        body,
    }
}

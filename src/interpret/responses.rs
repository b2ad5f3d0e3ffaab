//! Interpreter for the responses-style wire family.
//!
//! Events carry a `type` discriminator. Visible text arrives as
//! `response.output_text.delta`; the terminal `response.completed`
//! event nests the authoritative usage object. For reasoning-capable
//! models that final output count already includes hidden reasoning
//! tokens, which the upstream also breaks out separately.

use serde::Deserialize;
use serde_json::Value;

use super::{render_structured_part, EventInterpreter};
use crate::types::{Delta, UsageSnapshot};

pub struct ResponsesInterpreter;

#[derive(Deserialize)]
struct ResponsesEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    delta: Option<Value>,
    #[serde(default)]
    response: Option<ResponseObject>,
}

#[derive(Deserialize)]
struct ResponseObject {
    #[serde(default)]
    usage: Option<ResponsesUsage>,
}

#[derive(Deserialize)]
struct ResponsesUsage {
    input_tokens: Option<u64>,
    output_tokens: Option<u64>,
    #[serde(default)]
    output_tokens_details: Option<OutputTokensDetails>,
}

#[derive(Deserialize)]
struct OutputTokensDetails {
    reasoning_tokens: Option<u64>,
}

impl EventInterpreter for ResponsesInterpreter {
    fn interpret(&self, payload: &str) -> Result<Delta, serde_json::Error> {
        let event: ResponsesEvent = serde_json::from_str(payload)?;

        match event.kind.as_str() {
            "response.output_text.delta" => Ok(text_delta(event.delta)),
            "response.completed" => {
                let usage = event.response.and_then(|r| r.usage);
                match usage {
                    Some(usage) => Ok(Delta::Usage(UsageSnapshot {
                        input_tokens: usage.input_tokens,
                        output_tokens: usage.output_tokens,
                        reasoning_tokens: usage
                            .output_tokens_details
                            .and_then(|d| d.reasoning_tokens),
                        is_final: true,
                    })),
                    // Completed without usage still carries no text; the
                    // stream close will finish the run.
                    None => Ok(Delta::Ignorable),
                }
            }
            _ => Ok(Delta::Ignorable),
        }
    }
}

/// The delta of an output-text event is normally a plain string, but
/// rich parts appear here for models that emit structured output.
fn text_delta(delta: Option<Value>) -> Delta {
    match delta {
        Some(Value::String(text)) => Delta::Text(text),
        Some(other) => match render_structured_part(&other) {
            Some(text) => Delta::Text(text),
            None => Delta::Ignorable,
        },
        None => Delta::Ignorable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interpret(payload: &str) -> Delta {
        ResponsesInterpreter.interpret(payload).unwrap()
    }

    #[test]
    fn test_output_text_delta_yields_text() {
        let delta = interpret(r#"{"type":"response.output_text.delta","delta":"Hello"}"#);
        assert_eq!(delta, Delta::Text("Hello".to_string()));
    }

    #[test]
    fn test_completed_carries_final_usage() {
        let delta = interpret(
            r#"{"type":"response.completed","response":{"usage":{
                "input_tokens":120,"output_tokens":512,
                "output_tokens_details":{"reasoning_tokens":384}}}}"#,
        );
        assert_eq!(
            delta,
            Delta::Usage(UsageSnapshot {
                input_tokens: Some(120),
                output_tokens: Some(512),
                reasoning_tokens: Some(384),
                is_final: true,
            })
        );
    }

    #[test]
    fn test_lifecycle_events_are_ignorable() {
        assert_eq!(
            interpret(r#"{"type":"response.created","response":{}}"#),
            Delta::Ignorable
        );
        assert_eq!(
            interpret(r#"{"type":"response.output_item.added","item":{}}"#),
            Delta::Ignorable
        );
    }

    #[test]
    fn test_structured_delta_renders_as_text() {
        let delta = interpret(
            r#"{"type":"response.output_text.delta",
                "delta":{"executable_code":{"language":"PYTHON","code":"x = 1"}}}"#,
        );
        assert_eq!(delta, Delta::Text("\n```python\nx = 1\n```\n".to_string()));
    }

    #[test]
    fn test_missing_usage_on_completed_is_ignorable() {
        assert_eq!(
            interpret(r#"{"type":"response.completed","response":{}}"#),
            Delta::Ignorable
        );
    }
}

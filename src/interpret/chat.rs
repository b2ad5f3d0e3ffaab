//! Interpreter for the chat-completions wire family.
//!
//! Chunks carry text under `choices[0].delta.content`. Usage appears
//! only on the chunk(s) where the upstream honors the include-usage
//! option, as one verbatim, non-cumulative object. Providers behind
//! OpenAI-compatible gateways may put an array of rich parts where the
//! content string normally goes; those render as text substitutions.

use serde::Deserialize;
use serde_json::Value;

use super::{render_structured_parts, EventInterpreter};
use crate::types::{Delta, UsageSnapshot};

pub struct ChatCompletionsInterpreter;

#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    #[serde(default)]
    delta: Option<ChatDelta>,
}

#[derive(Deserialize)]
struct ChatDelta {
    #[serde(default)]
    content: Option<Value>,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
}

impl EventInterpreter for ChatCompletionsInterpreter {
    fn interpret(&self, payload: &str) -> Result<Delta, serde_json::Error> {
        let chunk: ChatChunk = serde_json::from_str(payload)?;

        if let Some(text) = chunk
            .choices
            .first()
            .and_then(|c| c.delta.as_ref())
            .and_then(|d| d.content.as_ref())
            .and_then(content_text)
        {
            if !text.is_empty() {
                return Ok(Delta::Text(text));
            }
        }

        // The usage chunk arrives with an empty choices list; take its
        // counts verbatim.
        if let Some(usage) = chunk.usage {
            return Ok(Delta::Usage(UsageSnapshot {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
                reasoning_tokens: None,
                is_final: true,
            }));
        }

        Ok(Delta::Ignorable)
    }
}

fn content_text(content: &Value) -> Option<String> {
    match content {
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => Some(render_structured_parts(parts)),
        _ => None,
    }
}

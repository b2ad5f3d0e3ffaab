//! Frame interpreters, one per wire family.
//!
//! Each provider speaks its own incremental event vocabulary. An
//! `EventInterpreter` turns one frame payload into the normalized
//! `Delta` the rest of the engine understands. Interpreters are a
//! closed set selected by `WireFamily`, never by string comparison at
//! the call sites.

pub mod chat;
pub mod messages;
pub mod responses;

use crate::profile::WireFamily;
use crate::types::Delta;

/// The literal sentinel some upstreams send instead of closing cleanly.
const DONE_SENTINEL: &str = "[DONE]";

/// Parses a single frame payload into a normalized delta.
///
/// The payload has already been separated from its `data:` envelope.
/// Implementations return a decode error for anything they cannot parse;
/// `decode_frame` converts that into `Ignorable` so one bad frame can
/// never fail a run. That recovery lives in exactly one place by design.
pub trait EventInterpreter: Send + Sync {
    fn interpret(&self, payload: &str) -> Result<Delta, serde_json::Error>;
}

/// Select the interpreter for a wire family.
pub fn interpreter_for(family: WireFamily) -> &'static dyn EventInterpreter {
    match family {
        WireFamily::Responses => &responses::ResponsesInterpreter,
        WireFamily::Messages => &messages::MessagesInterpreter,
        WireFamily::ChatCompletions => &chat::ChatCompletionsInterpreter,
    }
}

/// Decode one complete frame into a delta.
///
/// Strips the `data:` envelope, recognizes the end-of-stream sentinel
/// without parsing it, and swallows payload decode failures. Frames
/// without a `data:` envelope (SSE `event:` lines, comments) carry no
/// payload of their own and are ignorable.
pub fn decode_frame(interpreter: &dyn EventInterpreter, frame: &str) -> Delta {
    let payload = match frame.strip_prefix("data:") {
        Some(payload) => payload.trim(),
        None => return Delta::Ignorable,
    };
    if payload == DONE_SENTINEL {
        return Delta::Terminal;
    }
    match interpreter.interpret(payload) {
        Ok(delta) => delta,
        Err(e) => {
            tracing::debug!(error = %e, "discarding undecodable frame");
            Delta::Ignorable
        }
    }
}

// --- Structured content parts ---

/// Render one rich structured part as deterministic text.
///
/// Some models interleave non-text parts in their output: executable
/// code, the result of running it, or inline image bytes. Each becomes
/// a stable textual substitution so the accumulated answer stays a
/// plain string. Returns `None` for parts with nothing to show.
pub(crate) fn render_structured_part(part: &serde_json::Value) -> Option<String> {
    if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
        return Some(text.to_string());
    }

    if let Some(code) = field(part, "executable_code", "executableCode") {
        let language = code
            .get("language")
            .and_then(|l| l.as_str())
            .unwrap_or("")
            .to_lowercase();
        let source = code.get("code").and_then(|c| c.as_str()).unwrap_or("");
        return Some(format!("\n```{}\n{}\n```\n", language, source.trim_end()));
    }

    if let Some(result) = field(part, "code_execution_result", "codeExecutionResult") {
        let output = result.get("output").and_then(|o| o.as_str()).unwrap_or("");
        return Some(format!("\n[execution result]\n```\n{}\n```\n", output.trim_end()));
    }

    if let Some(blob) = field(part, "inline_data", "inlineData") {
        let mime = field_str(blob, "mime_type", "mimeType").unwrap_or("application/octet-stream");
        let data = blob.get("data").and_then(|d| d.as_str()).unwrap_or("");
        return Some(format!("\n![generated image](data:{};base64,{})\n", mime, data));
    }

    None
}

/// Render a sequence of parts, concatenated in order.
pub(crate) fn render_structured_parts(parts: &[serde_json::Value]) -> String {
    parts
        .iter()
        .filter_map(render_structured_part)
        .collect::<Vec<_>>()
        .concat()
}

// Providers are inconsistent about snake_case vs camelCase part keys.
fn field<'a>(
    value: &'a serde_json::Value,
    snake: &str,
    camel: &str,
) -> Option<&'a serde_json::Value> {
    value.get(snake).or_else(|| value.get(camel))
}

fn field_str<'a>(value: &'a serde_json::Value, snake: &str, camel: &str) -> Option<&'a str> {
    field(value, snake, camel).and_then(|v| v.as_str())
}

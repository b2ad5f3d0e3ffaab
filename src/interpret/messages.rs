//! Interpreter for the messages-style wire family.
//!
//! Usage arrives split across the stream: `message_start` reports the
//! input-token count, and each `message_delta` reports the cumulative
//! output-token count, which replaces the prior value rather than
//! adding to it. Text arrives only as the `text_delta` kind of
//! `content_block_delta`; thinking deltas are deliberately never
//! surfaced as text.

use serde::Deserialize;
use serde_json::Value;

use super::{render_structured_part, EventInterpreter};
use crate::types::{Delta, UsageSnapshot};

pub struct MessagesInterpreter;

#[derive(Deserialize)]
#[serde(tag = "type")]
enum MessagesEvent {
    #[serde(rename = "message_start")]
    MessageStart { message: MessageStart },
    #[serde(rename = "message_delta")]
    MessageDelta {
        #[serde(default)]
        usage: Option<DeltaUsage>,
    },
    #[serde(rename = "content_block_start")]
    ContentBlockStart { content_block: Value },
    #[serde(rename = "content_block_delta")]
    ContentBlockDelta { delta: ContentDelta },
    #[serde(rename = "content_block_stop")]
    ContentBlockStop {},
    #[serde(rename = "message_stop")]
    MessageStop {},
    #[serde(rename = "ping")]
    Ping {},
}

#[derive(Deserialize)]
struct MessageStart {
    #[serde(default)]
    usage: Option<StartUsage>,
}

#[derive(Deserialize)]
struct StartUsage {
    input_tokens: Option<u64>,
}

#[derive(Deserialize)]
struct DeltaUsage {
    output_tokens: Option<u64>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ContentDelta {
    #[serde(rename = "text_delta")]
    Text { text: String },
    #[serde(rename = "thinking_delta")]
    Thinking {},
    #[serde(rename = "signature_delta")]
    Signature {},
    #[serde(rename = "input_json_delta")]
    InputJson {},
    #[serde(rename = "citations_delta")]
    Citations {},
}

impl EventInterpreter for MessagesInterpreter {
    fn interpret(&self, payload: &str) -> Result<Delta, serde_json::Error> {
        let event: MessagesEvent = serde_json::from_str(payload)?;

        let delta = match event {
            MessagesEvent::MessageStart { message } => {
                let input_tokens = message.usage.and_then(|u| u.input_tokens);
                Delta::Usage(UsageSnapshot {
                    input_tokens,
                    ..UsageSnapshot::default()
                })
            }
            MessagesEvent::MessageDelta { usage } => Delta::Usage(UsageSnapshot {
                output_tokens: usage.and_then(|u| u.output_tokens),
                ..UsageSnapshot::default()
            }),
            MessagesEvent::ContentBlockDelta { delta } => match delta {
                ContentDelta::Text { text } => Delta::Text(text),
                // Thinking traces and tool-input fragments never reach
                // the visible answer.
                _ => Delta::Ignorable,
            },
            MessagesEvent::ContentBlockStart { content_block } => {
                // Blocks opening with renderable rich content (server
                // tool results, inline images) become text; ordinary
                // empty text/thinking block openers do not.
                match render_structured_part(&content_block) {
                    Some(text) if !text.is_empty() => Delta::Text(text),
                    _ => Delta::Ignorable,
                }
            }
            MessagesEvent::MessageStop {} => Delta::Terminal,
            MessagesEvent::ContentBlockStop {} | MessagesEvent::Ping {} => Delta::Ignorable,
        };
        Ok(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interpret(payload: &str) -> Delta {
        MessagesInterpreter.interpret(payload).unwrap()
    }

    #[test]
    fn test_message_start_carries_input_usage_only() {
        let delta = interpret(
            r#"{"type":"message_start","message":{"usage":{"input_tokens":42,"output_tokens":1}}}"#,
        );
        assert_eq!(
            delta,
            Delta::Usage(UsageSnapshot {
                input_tokens: Some(42),
                ..UsageSnapshot::default()
            })
        );
    }

    #[test]
    fn test_message_delta_reports_cumulative_output() {
        let delta = interpret(r#"{"type":"message_delta","usage":{"output_tokens":250}}"#);
        assert_eq!(
            delta,
            Delta::Usage(UsageSnapshot {
                output_tokens: Some(250),
                ..UsageSnapshot::default()
            })
        );
    }

    #[test]
    fn test_text_delta_yields_text() {
        let delta = interpret(
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hi"}}"#,
        );
        assert_eq!(delta, Delta::Text("Hi".to_string()));
    }

    #[test]
    fn test_thinking_delta_is_never_surfaced() {
        let delta = interpret(
            r#"{"type":"content_block_delta","index":0,
                "delta":{"type":"thinking_delta","thinking":"secret chain"}}"#,
        );
        assert_eq!(delta, Delta::Ignorable);
    }

    #[test]
    fn test_message_stop_is_terminal() {
        assert_eq!(interpret(r#"{"type":"message_stop"}"#), Delta::Terminal);
    }

    #[test]
    fn test_ping_and_block_stop_are_ignorable() {
        assert_eq!(interpret(r#"{"type":"ping"}"#), Delta::Ignorable);
        assert_eq!(
            interpret(r#"{"type":"content_block_stop","index":0}"#),
            Delta::Ignorable
        );
    }

    #[test]
    fn test_plain_text_block_start_is_not_duplicated() {
        let delta = interpret(
            r#"{"type":"content_block_start","index":0,
                "content_block":{"type":"text","text":""}}"#,
        );
        assert_eq!(delta, Delta::Ignorable);
    }

    #[test]
    fn test_malformed_usage_fails_decode_instead_of_crashing() {
        // A usage object of the wrong shape is a per-frame decode error;
        // decode_frame turns it into Ignorable and the run keeps its last
        // known-good counts.
        let result =
            MessagesInterpreter.interpret(r#"{"type":"message_delta","usage":{"output_tokens":"many"}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_message_delta_without_usage_reports_nothing_new() {
        assert_eq!(
            interpret(r#"{"type":"message_delta","delta":{"stop_reason":"end_turn"}}"#),
            Delta::Usage(UsageSnapshot::default())
        );
    }
}

//! Credential lookup for the three wire families.
//!
//! The engine never persists keys; it asks an injected store at submit
//! time and short-circuits a run when the answer is absent. The store
//! is a constructor dependency of the controller, never ambient state.

use crate::config::KeysConfig;
use crate::profile::WireFamily;

/// Supplies the API key for a wire family, if one is configured.
pub trait CredentialStore: Send + Sync {
    fn get(&self, family: WireFamily) -> Option<String>;
}

/// Keys from the config file, with a per-family environment fallback.
pub struct ConfigCredentials {
    keys: KeysConfig,
}

impl ConfigCredentials {
    pub fn new(keys: KeysConfig) -> Self {
        Self { keys }
    }

    fn env_fallback(family: WireFamily) -> Option<String> {
        let var = match family {
            WireFamily::Responses => "OPENAI_API_KEY",
            WireFamily::Messages => "ANTHROPIC_API_KEY",
            WireFamily::ChatCompletions => "GEMINI_API_KEY",
        };
        std::env::var(var).ok().filter(|v| !v.is_empty())
    }
}

impl CredentialStore for ConfigCredentials {
    fn get(&self, family: WireFamily) -> Option<String> {
        let configured = match family {
            WireFamily::Responses => self.keys.responses.clone(),
            WireFamily::Messages => self.keys.messages.clone(),
            WireFamily::ChatCompletions => self.keys.chat_completions.clone(),
        };
        configured
            .filter(|k| !k.is_empty())
            .or_else(|| Self::env_fallback(family))
    }
}

use std::env;

use log::warn;

pub const API_KEY_VAR: &str = "LOVABLE_API_KEY";
pub const DEFAULT_GATEWAY_URL: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";

/// Runtime settings, read once at startup and handed to whoever needs them.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_host: String,
    pub bind_port: u16,
    pub gateway_url: String,
    pub model: String,
    /// Bearer secret for the gateway. `None` when unset or empty.
    pub api_key: Option<String>,
    /// Reject unknown actions instead of answering them as chat.
    pub strict_actions: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_host: "127.0.0.1".to_string(),
            bind_port: 8080,
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            strict_actions: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, falling back to defaults
    /// for anything missing or unparseable.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_port = match lookup("BIND_PORT") {
            Some(raw) => raw.trim().parse::<u16>().unwrap_or_else(|_| {
                warn!("Ignoring invalid BIND_PORT {:?}, using {}", raw, defaults.bind_port);
                defaults.bind_port
            }),
            None => defaults.bind_port,
        };

        let strict_actions = lookup("ANALYZER_STRICT_ACTIONS")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(defaults.strict_actions);

        Self {
            bind_host: non_empty(lookup("BIND_HOST")).unwrap_or(defaults.bind_host),
            bind_port,
            gateway_url: non_empty(lookup("AI_GATEWAY_URL")).unwrap_or(defaults.gateway_url),
            model: non_empty(lookup("AI_GATEWAY_MODEL")).unwrap_or(defaults.model),
            api_key: non_empty(lookup(API_KEY_VAR)),
            strict_actions,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

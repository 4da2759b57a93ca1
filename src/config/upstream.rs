use serde::{Deserialize, Serialize};
use url::Url;

/// Model API (OpenAI-compatible chat completions) settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// API base URL; `chat/completions` is resolved against it.
    /// TOML: `upstream.base_url`. Default: `https://api.openai.com/v1/`.
    #[serde(default = "default_base_url")]
    pub base_url: Url,

    /// Bearer token sent to the model API.
    /// TOML: `upstream.api_key`. Env: `PROMPTDESK_UPSTREAM__API_KEY`.
    #[serde(default)]
    pub api_key: String,

    /// Model name.
    /// TOML: `upstream.model`. Default: `gpt-4o-mini`.
    #[serde(default = "default_model")]
    pub model: String,

    /// TOML: `upstream.temperature`. Default: unset (provider default).
    #[serde(default)]
    pub temperature: Option<f32>,

    /// TOML: `upstream.max_tokens`. Default: unset (provider default).
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Optional outbound HTTP proxy.
    /// TOML: `upstream.proxy`. Example: `http://127.0.0.1:1080`.
    #[serde(default)]
    pub proxy: Option<Url>,

    /// Allow HTTP/2 multiplexing; disabled forces HTTP/1.
    /// TOML: `upstream.enable_multiplexing`. Default: `false`.
    #[serde(default)]
    pub enable_multiplexing: bool,

    /// Abort a stream after this many seconds without an upstream event.
    /// TOML: `upstream.idle_timeout_secs`. Default: `60`.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            model: default_model(),
            temperature: None,
            max_tokens: None,
            proxy: None,
            enable_multiplexing: false,
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

impl UpstreamConfig {
    pub fn chat_completions_url(&self) -> Result<Url, url::ParseError> {
        let mut base = self.base_url.clone();
        // `Url::join` drops the last path segment unless it ends with '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join("chat/completions")
    }
}

fn default_base_url() -> Url {
    Url::parse("https://api.openai.com/v1/").expect("static default base url")
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_idle_timeout_secs() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_completions_url_tolerates_missing_trailing_slash() {
        let mut cfg = UpstreamConfig::default();
        assert_eq!(
            cfg.chat_completions_url().unwrap().as_str(),
            "https://api.openai.com/v1/chat/completions"
        );

        cfg.base_url = Url::parse("http://localhost:11434/v1").unwrap();
        assert_eq!(
            cfg.chat_completions_url().unwrap().as_str(),
            "http://localhost:11434/v1/chat/completions"
        );
    }
}

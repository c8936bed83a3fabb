//! Configuration for rivulet
//!
//! Loaded from a TOML file with `{{ env.VAR }}` placeholder expansion, so
//! API keys can live in the environment rather than on disk.

mod env;
mod loader;

use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Top-level configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Upstream chat provider
    pub provider: ProviderConfig,
    /// Default sampling parameters
    #[serde(default)]
    pub chat: ChatConfig,
    /// Stream pacing and timeout tuning
    #[serde(default)]
    pub stream: StreamConfig,
}

/// Upstream provider endpoint and credentials
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Base URL of the OpenAI-compatible API (e.g. `https://api.siliconflow.cn/v1`)
    pub base_url: Url,
    /// Alternate base URL used for search-capable models
    #[serde(default)]
    pub search_base_url: Option<Url>,
    /// Bearer token for authentication
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Default model identifier
    pub model: String,
}

/// Default sampling parameters sent with every request
///
/// `max_tokens` is intentionally absent; the provider behaves better when it
/// picks its own limit.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// Sampling temperature
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Nucleus sampling threshold
    #[serde(default)]
    pub top_p: Option<f64>,
    /// Presence penalty
    #[serde(default)]
    pub presence_penalty: Option<f64>,
    /// Frequency penalty
    #[serde(default)]
    pub frequency_penalty: Option<f64>,
}

/// Pacing and timeout tuning for the stream session
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct StreamConfig {
    /// Milliseconds to wait for the provider to acknowledge the connection
    pub connect_timeout_ms: u64,
    /// Milliseconds of event silence before the stream is aborted
    pub idle_timeout_ms: u64,
    /// Delay before re-issuing a request after a tool batch, in milliseconds
    pub restart_delay_ms: u64,
    /// Interval between display-pacing ticks, in milliseconds
    pub tick_interval_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            // Thinking models can sit silent for minutes before the first token
            connect_timeout_ms: 120_000,
            idle_timeout_ms: 600_000,
            restart_delay_ms: 60,
            tick_interval_ms: 16,
        }
    }
}

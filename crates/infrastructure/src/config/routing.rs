//! Provider routing and retrieval configuration.

use std::{collections::HashMap, time::Duration};

use application::{RetryPolicy, RouterConfig, RoutingTable};
use domain::{AsrProvider, Language, TtsProvider};
use serde::{Deserialize, Serialize};

/// Provider call bounds and per-language overrides
///
/// ```toml
/// [routing]
/// call_timeout_ms = 20000
///
/// [routing.asr]
/// hi = "whisper"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// ASR overrides on top of the default table
    #[serde(default)]
    pub asr: HashMap<Language, AsrProvider>,

    /// TTS overrides on top of the default table
    #[serde(default)]
    pub tts: HashMap<Language, TtsProvider>,
}

const fn default_call_timeout_ms() -> u64 {
    30000
}

const fn default_retry_backoff_ms() -> u64 {
    200
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: default_call_timeout_ms(),
            retry_backoff_ms: default_retry_backoff_ms(),
            asr: HashMap::new(),
            tts: HashMap::new(),
        }
    }
}

impl RoutingConfig {
    /// Default table with the configured overrides applied
    #[must_use]
    pub fn table(&self) -> RoutingTable {
        let table = self
            .asr
            .iter()
            .fold(RoutingTable::default(), |t, (&lang, &p)| t.with_asr_route(lang, p));
        self.tts
            .iter()
            .fold(table, |t, (&lang, &p)| t.with_tts_route(lang, p))
    }

    #[must_use]
    pub const fn router_config(&self) -> RouterConfig {
        RouterConfig {
            call_timeout: Duration::from_millis(self.call_timeout_ms),
            retry: RetryPolicy::once(Duration::from_millis(self.retry_backoff_ms)),
        }
    }

    pub(super) fn validate(&self, errors: &mut Vec<String>) {
        if self.call_timeout_ms == 0 {
            errors.push("routing.call_timeout_ms must be greater than 0".to_string());
        }
    }
}

/// Retrieval-and-generation backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    #[serde(default = "default_rag_url")]
    pub url: String,

    #[serde(default = "default_rag_timeout")]
    pub timeout_secs: u64,
}

fn default_rag_url() -> String {
    "http://localhost:8000/query".to_string()
}

const fn default_rag_timeout() -> u64 {
    30
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            url: default_rag_url(),
            timeout_secs: default_rag_timeout(),
        }
    }
}

impl RagConfig {
    pub(super) fn validate(&self, errors: &mut Vec<String>) {
        if reqwest::Url::parse(&self.url).is_err() {
            errors.push(format!("rag.url is not a valid URL: {}", self.url));
        }
        if self.timeout_secs == 0 {
            errors.push("rag.timeout_secs must be greater than 0".to_string());
        }
    }
}

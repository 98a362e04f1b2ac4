//! Application configuration
//!
//! Split into focused sub-modules by concern:
//! - `server`: HTTP server settings and log format
//! - `rate_limit`: per-session quotas and the counter store backend
//! - `storage`: object store backend and presigned URL expiries
//! - `routing`: provider call bounds, language overrides, retrieval backend
//!
//! Speech provider settings live in [`ai_speech::SpeechConfig`].

mod rate_limit;
mod routing;
mod server;
mod storage;

use ai_speech::SpeechConfig;
use serde::{Deserialize, Serialize};

pub use rate_limit::{CounterBackend, RateLimitConfig};
pub use routing::{RagConfig, RoutingConfig};
pub use server::{LogFormat, ServerConfig};
pub use storage::{StorageBackend, StorageConfig};

/// Environment variable prefix, e.g. `VOICE_GATEWAY__SERVER__PORT=8080`
pub const ENV_PREFIX: &str = "VOICE_GATEWAY";

/// Shared default for boolean `true` fields across config structs
pub(crate) const fn default_true() -> bool {
    true
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Per-session quotas
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Object storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Speech providers
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Provider routing
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Retrieval-and-generation backend
    #[serde(default)]
    pub rag: RagConfig,
}

impl AppConfig {
    /// Load configuration from `config.toml` and the environment
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or the result is invalid.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables (e.g., VOICE_GATEWAY__SERVER__PORT)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be parsed or the result is invalid.
    pub fn from_toml(toml: &str) -> Result<Self, config::ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section, reporting all problems at once
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` listing each invalid setting.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        let mut errors = Vec::new();

        self.server.validate(&mut errors);
        self.rate_limit.validate(&mut errors);
        self.storage.validate(&mut errors);
        self.routing.validate(&mut errors);
        self.rag.validate(&mut errors);

        if let Err(e) = self.speech.aws.validate() {
            errors.push(format!("speech.aws: {e}"));
        }
        if self.speech.openai.timeout_ms == 0 {
            errors.push("speech.openai.timeout_ms must be greater than 0".to_string());
        }
        // A Transcribe job outliving the router timeout would never be deleted
        if self.speech.aws.transcribe_job_timeout_secs.saturating_mul(1000)
            >= self.routing.call_timeout_ms
        {
            errors.push(
                "speech.aws.transcribe_job_timeout_secs must be below routing.call_timeout_ms"
                    .to_string(),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(config::ConfigError::Message(errors.join("; ")))
        }
    }
}

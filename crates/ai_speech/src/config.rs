//! Configuration for speech processing

use serde::{Deserialize, Serialize};

/// Configuration for all speech providers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// OpenAI Whisper and TTS
    #[serde(default)]
    pub openai: OpenAiSpeechConfig,

    /// Amazon Transcribe and Polly
    #[serde(default)]
    pub aws: AwsSpeechConfig,
}

/// OpenAI speech API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiSpeechConfig {
    /// API key; providers are not registered without one
    #[serde(default)]
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Speech-to-text model
    #[serde(default = "default_stt_model")]
    pub stt_model: String,

    /// Text-to-speech model
    #[serde(default = "default_tts_model")]
    pub tts_model: String,

    /// TTS voice
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Longest text sent in one TTS request
    #[serde(default = "default_max_tts_chunk_chars")]
    pub max_tts_chunk_chars: usize,
}

/// Amazon speech service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsSpeechConfig {
    #[serde(default = "default_aws_region")]
    pub region: String,

    /// Polly voice used for every supported locale
    #[serde(default = "default_polly_voice")]
    pub polly_voice: String,

    /// Polly engine (`standard` or `neural`)
    #[serde(default = "default_polly_engine")]
    pub polly_engine: String,

    /// Delay between Transcribe job status polls
    #[serde(default = "default_poll_interval_ms")]
    pub transcribe_poll_interval_ms: u64,

    /// Upper bound on waiting for a Transcribe job
    #[serde(default = "default_job_timeout_secs")]
    pub transcribe_job_timeout_secs: u64,
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_stt_model() -> String {
    "whisper-1".to_string()
}

fn default_tts_model() -> String {
    "tts-1".to_string()
}

fn default_voice() -> String {
    "alloy".to_string()
}

const fn default_timeout_ms() -> u64 {
    30000 // 30 seconds
}

const fn default_max_tts_chunk_chars() -> usize {
    4000
}

fn default_aws_region() -> String {
    "ap-south-1".to_string()
}

fn default_polly_voice() -> String {
    "Aditi".to_string()
}

fn default_polly_engine() -> String {
    "standard".to_string()
}

const fn default_poll_interval_ms() -> u64 {
    1000
}

const fn default_job_timeout_secs() -> u64 {
    25
}

impl Default for OpenAiSpeechConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
            stt_model: default_stt_model(),
            tts_model: default_tts_model(),
            voice: default_voice(),
            timeout_ms: default_timeout_ms(),
            max_tts_chunk_chars: default_max_tts_chunk_chars(),
        }
    }
}

impl Default for AwsSpeechConfig {
    fn default() -> Self {
        Self {
            region: default_aws_region(),
            polly_voice: default_polly_voice(),
            polly_engine: default_polly_engine(),
            transcribe_poll_interval_ms: default_poll_interval_ms(),
            transcribe_job_timeout_secs: default_job_timeout_secs(),
        }
    }
}

impl OpenAiSpeechConfig {
    /// Create a minimal config for testing
    #[cfg(test)]
    pub fn test() -> Self {
        Self {
            api_key: Some("test-key".to_string()),
            ..Default::default()
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.as_deref().is_none_or(str::is_empty) {
            return Err("OpenAI API key is required".to_string());
        }

        if self.timeout_ms == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        if self.max_tts_chunk_chars == 0 {
            return Err("TTS chunk size must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl AwsSpeechConfig {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.region.trim().is_empty() {
            return Err("AWS region must not be empty".to_string());
        }

        if self.transcribe_poll_interval_ms == 0 {
            return Err("Transcribe poll interval must be greater than 0".to_string());
        }

        if self.transcribe_job_timeout_secs == 0 {
            return Err("Transcribe job timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = SpeechConfig::default();

        assert!(config.openai.api_key.is_none());
        assert_eq!(config.openai.base_url, "https://api.openai.com/v1");
        assert_eq!(config.openai.stt_model, "whisper-1");
        assert_eq!(config.openai.tts_model, "tts-1");
        assert_eq!(config.openai.voice, "alloy");
        assert_eq!(config.openai.max_tts_chunk_chars, 4000);
        assert_eq!(config.aws.region, "ap-south-1");
        assert_eq!(config.aws.polly_voice, "Aditi");
        assert_eq!(config.aws.polly_engine, "standard");
        assert_eq!(config.aws.transcribe_job_timeout_secs, 25);
    }

    #[test]
    fn validate_fails_without_api_key() {
        assert!(OpenAiSpeechConfig::default().validate().is_err());

        let blank = OpenAiSpeechConfig {
            api_key: Some(String::new()),
            ..Default::default()
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn validate_succeeds_with_api_key() {
        assert!(OpenAiSpeechConfig::test().validate().is_ok());
    }

    #[test]
    fn validate_fails_with_zero_timeout() {
        let mut config = OpenAiSpeechConfig::test();
        config.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn aws_validate_rejects_zero_poll_interval() {
        let mut config = AwsSpeechConfig::default();
        assert!(config.validate().is_ok());
        config.transcribe_poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_deserializes_from_toml() {
        let toml = r#"
            [openai]
            api_key = "sk-test"
            tts_model = "tts-1-hd"
            voice = "nova"

            [aws]
            region = "us-east-1"
            polly_engine = "neural"
        "#;

        let config: SpeechConfig = toml::from_str(toml).unwrap();

        assert_eq!(config.openai.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.openai.tts_model, "tts-1-hd");
        assert_eq!(config.openai.voice, "nova");
        assert_eq!(config.openai.stt_model, "whisper-1");
        assert_eq!(config.aws.region, "us-east-1");
        assert_eq!(config.aws.polly_engine, "neural");
        assert_eq!(config.aws.polly_voice, "Aditi");
    }
}

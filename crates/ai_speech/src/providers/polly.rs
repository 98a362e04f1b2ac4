//! Amazon Polly text-to-speech
//!
//! Synthesizes mp3 for the Indian English and Hindi locales. Text past
//! Polly's per-request limit is synthesized in sentence-aligned chunks.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_polly::{
    Client,
    types::{Engine, LanguageCode, OutputFormat, VoiceId},
};
use domain::{AudioFormat, Language};
use tracing::{debug, instrument};

use super::aws::classify_sdk_error;
use crate::chunking::split_for_tts;
use crate::config::AwsSpeechConfig;
use crate::error::SpeechError;
use crate::ports::TextToSpeech;
use crate::types::AudioData;

/// Characters Polly accepts in one plain-text request
const POLLY_MAX_CHARS: usize = 3000;

/// Polly-backed TTS
#[derive(Debug, Clone)]
pub struct PollySpeechProvider {
    client: Client,
    voice: String,
    engine: String,
}

impl PollySpeechProvider {
    pub fn new(sdk_config: &SdkConfig, config: &AwsSpeechConfig) -> Self {
        Self::from_client(Client::new(sdk_config), config)
    }

    pub fn from_client(client: Client, config: &AwsSpeechConfig) -> Self {
        Self {
            client,
            voice: config.polly_voice.clone(),
            engine: config.polly_engine.clone(),
        }
    }

    /// Polly locale for `language`
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::UnsupportedLanguage` for languages Polly has no
    /// voice for.
    pub fn locale_for(language: Language) -> Result<&'static str, SpeechError> {
        match language {
            Language::English | Language::Hindi => Ok(language.locale()),
            Language::Odia => Err(SpeechError::UnsupportedLanguage(
                language.locale().to_string(),
            )),
        }
    }

    async fn synthesize_chunk(&self, text: &str, locale: &str) -> Result<Vec<u8>, SpeechError> {
        let output = self
            .client
            .synthesize_speech()
            .text(text)
            .voice_id(VoiceId::from(self.voice.as_str()))
            .language_code(LanguageCode::from(locale))
            .output_format(OutputFormat::Mp3)
            .engine(Engine::from(self.engine.as_str()))
            .send()
            .await
            .map_err(|e| classify_sdk_error("polly", &e))?;

        let bytes = output
            .audio_stream
            .collect()
            .await
            .map_err(|e| SpeechError::InvalidResponse(format!("Failed to read Polly audio: {e}")))?
            .into_bytes();
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl TextToSpeech for PollySpeechProvider {
    #[instrument(skip_all, fields(text_len = text.chars().count(), language = %language))]
    async fn synthesize(&self, text: &str, language: Language) -> Result<AudioData, SpeechError> {
        let locale = Self::locale_for(language)?;
        if text.trim().is_empty() {
            return Err(SpeechError::SynthesisFailed(
                "Text cannot be empty".to_string(),
            ));
        }

        let mut audio = Vec::new();
        for chunk in split_for_tts(text, POLLY_MAX_CHARS) {
            audio.extend(self.synthesize_chunk(&chunk, locale).await?);
        }

        debug!(audio_size = audio.len(), voice = %self.voice, "Polly synthesis complete");
        Ok(AudioData::new(audio, AudioFormat::Mp3))
    }

    fn model_name(&self) -> &str {
        &self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locales_for_supported_languages() {
        assert_eq!(
            PollySpeechProvider::locale_for(Language::English).unwrap(),
            "en-IN"
        );
        assert_eq!(
            PollySpeechProvider::locale_for(Language::Hindi).unwrap(),
            "hi-IN"
        );
    }

    #[test]
    fn odia_is_unsupported_and_permanent() {
        let err = PollySpeechProvider::locale_for(Language::Odia).unwrap_err();
        assert!(matches!(err, SpeechError::UnsupportedLanguage(ref l) if l == "or-IN"));
        assert!(!err.is_transient());
    }
}

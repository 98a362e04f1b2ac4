//! Speech adapters - Implement the ASR/TTS backend ports using ai_speech
//!
//! Every `SpeechError` becomes a `ProviderError` tagged with the provider
//! name, transient or permanent according to `SpeechError::is_transient`.

use std::sync::Arc;

use ai_speech::{AudioData, SpeechError, SpeechToText, StoredAudioTranscriber, TextToSpeech};
use application::{
    error::ProviderError,
    ports::{AsrBackend, AsrOutput, ObjectStorePort, TtsBackend, TtsOutput},
};
use async_trait::async_trait;
use domain::{AsrProvider, Language, ObjectKey, TtsProvider};
use tracing::{debug, instrument};

fn map_error(provider: &'static str, err: SpeechError) -> ProviderError {
    if err.is_transient() {
        ProviderError::transient(provider, err.to_string())
    } else {
        ProviderError::permanent(provider, err.to_string())
    }
}

/// ASR backend that downloads the audio and posts the bytes (Whisper)
pub struct UploadingAsrBackend {
    provider: AsrProvider,
    stt: Arc<dyn SpeechToText>,
    objects: Arc<dyn ObjectStorePort>,
}

impl std::fmt::Debug for UploadingAsrBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadingAsrBackend")
            .field("provider", &self.provider)
            .field("model", &self.stt.model_name())
            .finish_non_exhaustive()
    }
}

impl UploadingAsrBackend {
    pub fn new(
        provider: AsrProvider,
        stt: Arc<dyn SpeechToText>,
        objects: Arc<dyn ObjectStorePort>,
    ) -> Self {
        Self {
            provider,
            stt,
            objects,
        }
    }
}

#[async_trait]
impl AsrBackend for UploadingAsrBackend {
    fn provider(&self) -> AsrProvider {
        self.provider
    }

    #[instrument(skip_all, fields(provider = self.provider.name(), key = %audio))]
    async fn transcribe(
        &self,
        audio: &ObjectKey,
        language: Language,
    ) -> Result<AsrOutput, ProviderError> {
        let name = self.provider.name();
        let bytes = self
            .objects
            .get(audio)
            .await
            .map_err(|e| ProviderError::transient(name, e.to_string()))?;

        debug!(size = bytes.len(), "Fetched source audio");
        let transcription = self
            .stt
            .transcribe(AudioData::new(bytes, audio.audio_format()), language)
            .await
            .map_err(|e| map_error(name, e))?;

        Ok(AsrOutput {
            text: transcription.text,
            confidence: transcription.confidence,
            provider: self.provider,
        })
    }
}

/// ASR backend that hands the provider a store URI (Amazon Transcribe)
pub struct StoredAsrBackend {
    provider: AsrProvider,
    transcriber: Arc<dyn StoredAudioTranscriber>,
    objects: Arc<dyn ObjectStorePort>,
}

impl std::fmt::Debug for StoredAsrBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredAsrBackend")
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

impl StoredAsrBackend {
    pub fn new(
        provider: AsrProvider,
        transcriber: Arc<dyn StoredAudioTranscriber>,
        objects: Arc<dyn ObjectStorePort>,
    ) -> Self {
        Self {
            provider,
            transcriber,
            objects,
        }
    }
}

#[async_trait]
impl AsrBackend for StoredAsrBackend {
    fn provider(&self) -> AsrProvider {
        self.provider
    }

    #[instrument(skip_all, fields(provider = self.provider.name(), key = %audio))]
    async fn transcribe(
        &self,
        audio: &ObjectKey,
        language: Language,
    ) -> Result<AsrOutput, ProviderError> {
        let uri = self.objects.object_uri(audio);
        let transcription = self
            .transcriber
            .transcribe_stored(&uri, audio.audio_format(), language)
            .await
            .map_err(|e| map_error(self.provider.name(), e))?;

        Ok(AsrOutput {
            text: transcription.text,
            confidence: transcription.confidence,
            provider: self.provider,
        })
    }
}

/// TTS backend over any `TextToSpeech` engine (Polly, OpenAI)
pub struct SynthesisBackend {
    provider: TtsProvider,
    tts: Arc<dyn TextToSpeech>,
}

impl std::fmt::Debug for SynthesisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthesisBackend")
            .field("provider", &self.provider)
            .field("model", &self.tts.model_name())
            .finish()
    }
}

impl SynthesisBackend {
    pub fn new(provider: TtsProvider, tts: Arc<dyn TextToSpeech>) -> Self {
        Self { provider, tts }
    }
}

#[async_trait]
impl TtsBackend for SynthesisBackend {
    fn provider(&self) -> TtsProvider {
        self.provider
    }

    #[instrument(skip_all, fields(provider = self.provider.name(), text_len = text.len()))]
    async fn synthesize(&self, text: &str, language: Language) -> Result<TtsOutput, ProviderError> {
        let audio = self
            .tts
            .synthesize(text, language)
            .await
            .map_err(|e| map_error(self.provider.name(), e))?;

        let format = audio.format();
        Ok(TtsOutput {
            audio: audio.into_data(),
            format,
            provider: self.provider,
        })
    }
}

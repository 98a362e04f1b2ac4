//! Language-to-backend dispatch for speech-to-text and text-to-speech
//!
//! Routing is a lookup in a static table followed by a registry lookup of
//! the backend serving that provider. Every call is bounded by a timeout and
//! retried once on transient failure. The router knows nothing about quotas
//! or storage.

use std::{collections::HashMap, fmt, sync::Arc, time::Duration};

use domain::{AsrProvider, Language, ObjectKey, TtsProvider};
use tracing::{info, instrument};

use crate::{
    error::ProviderError,
    ports::{AsrBackend, AsrOutput, TtsBackend, TtsOutput},
    retry::{RetryPolicy, with_retry},
};

/// Language → provider table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTable {
    asr: HashMap<Language, AsrProvider>,
    tts: HashMap<Language, TtsProvider>,
}

impl Default for RoutingTable {
    /// English and Hindi go to AWS, everything else to OpenAI
    fn default() -> Self {
        let mut asr = HashMap::new();
        let mut tts = HashMap::new();
        for language in Language::ALL {
            let (a, t) = match language {
                Language::English | Language::Hindi => {
                    (AsrProvider::Transcribe, TtsProvider::Polly)
                },
                Language::Odia => (AsrProvider::Whisper, TtsProvider::OpenAi),
            };
            asr.insert(language, a);
            tts.insert(language, t);
        }
        Self { asr, tts }
    }
}

impl RoutingTable {
    #[must_use]
    pub fn with_asr_route(mut self, language: Language, provider: AsrProvider) -> Self {
        self.asr.insert(language, provider);
        self
    }

    #[must_use]
    pub fn with_tts_route(mut self, language: Language, provider: TtsProvider) -> Self {
        self.tts.insert(language, provider);
        self
    }

    #[must_use]
    pub fn asr_provider(&self, language: Language) -> Option<AsrProvider> {
        self.asr.get(&language).copied()
    }

    #[must_use]
    pub fn tts_provider(&self, language: Language) -> Option<TtsProvider> {
        self.tts.get(&language).copied()
    }
}

/// Per-call bounds
#[derive(Debug, Clone, PartialEq)]
pub struct RouterConfig {
    pub call_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(30),
            retry: RetryPolicy::once(Duration::from_millis(200)),
        }
    }
}

/// Dispatches speech calls to the backend registered for each language
pub struct ProviderRouter {
    table: RoutingTable,
    asr_backends: HashMap<AsrProvider, Arc<dyn AsrBackend>>,
    tts_backends: HashMap<TtsProvider, Arc<dyn TtsBackend>>,
    config: RouterConfig,
}

impl fmt::Debug for ProviderRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRouter")
            .field("table", &self.table)
            .field("asr_backends", &self.asr_backends.keys().collect::<Vec<_>>())
            .field("tts_backends", &self.tts_backends.keys().collect::<Vec<_>>())
            .field("config", &self.config)
            .finish()
    }
}

impl ProviderRouter {
    pub fn new(table: RoutingTable, config: RouterConfig) -> Self {
        Self {
            table,
            asr_backends: HashMap::new(),
            tts_backends: HashMap::new(),
            config,
        }
    }

    /// Register a speech-to-text backend under its provider variant
    #[must_use]
    pub fn with_asr_backend(mut self, backend: Arc<dyn AsrBackend>) -> Self {
        self.asr_backends.insert(backend.provider(), backend);
        self
    }

    /// Register a text-to-speech backend under its provider variant
    #[must_use]
    pub fn with_tts_backend(mut self, backend: Arc<dyn TtsBackend>) -> Self {
        self.tts_backends.insert(backend.provider(), backend);
        self
    }

    #[must_use]
    pub const fn table(&self) -> &RoutingTable {
        &self.table
    }

    /// Backend that transcribes `language`
    pub fn select_asr(&self, language: Language) -> Result<Arc<dyn AsrBackend>, ProviderError> {
        let provider = self.table.asr_provider(language).ok_or_else(|| {
            ProviderError::permanent("router", format!("no ASR route for {language}"))
        })?;
        self.asr_backends.get(&provider).cloned().ok_or_else(|| {
            ProviderError::permanent(provider.name(), "provider not configured")
        })
    }

    /// Backend that synthesizes `language`
    pub fn select_tts(&self, language: Language) -> Result<Arc<dyn TtsBackend>, ProviderError> {
        let provider = self.table.tts_provider(language).ok_or_else(|| {
            ProviderError::permanent("router", format!("no TTS route for {language}"))
        })?;
        self.tts_backends.get(&provider).cloned().ok_or_else(|| {
            ProviderError::permanent(provider.name(), "provider not configured")
        })
    }

    /// Transcribe through the routed backend
    #[instrument(skip_all, fields(audio = %audio, language = %language))]
    pub async fn transcribe(
        &self,
        audio: &ObjectKey,
        language: Language,
    ) -> Result<AsrOutput, ProviderError> {
        let backend = self.select_asr(language)?;
        let name = backend.provider().name();
        let timeout = self.config.call_timeout;

        let outcome = with_retry(&self.config.retry, || {
            let backend = Arc::clone(&backend);
            async move {
                tokio::time::timeout(timeout, backend.transcribe(audio, language))
                    .await
                    .unwrap_or_else(|_| Err(timed_out(name, timeout)))
            }
        })
        .await;

        let attempts = outcome.attempts;
        let output = outcome.into_result()?;
        if output.text.trim().is_empty() {
            return Err(ProviderError::permanent(name, "empty transcript"));
        }

        info!(provider = name, attempts, chars = output.text.len(), "Transcription complete");
        Ok(output)
    }

    /// Synthesize through the routed backend
    #[instrument(skip_all, fields(chars = text.len(), language = %language))]
    pub async fn synthesize(
        &self,
        text: &str,
        language: Language,
    ) -> Result<TtsOutput, ProviderError> {
        let backend = self.select_tts(language)?;
        let name = backend.provider().name();
        let timeout = self.config.call_timeout;

        let outcome = with_retry(&self.config.retry, || {
            let backend = Arc::clone(&backend);
            async move {
                tokio::time::timeout(timeout, backend.synthesize(text, language))
                    .await
                    .unwrap_or_else(|_| Err(timed_out(name, timeout)))
            }
        })
        .await;

        let attempts = outcome.attempts;
        let output = outcome.into_result()?;
        if output.audio.is_empty() {
            return Err(ProviderError::permanent(name, "empty audio"));
        }

        info!(provider = name, attempts, bytes = output.audio.len(), "Synthesis complete");
        Ok(output)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn timed_out(provider: &str, after: Duration) -> ProviderError {
    ProviderError::transient(
        provider,
        format!("timed out after {}ms", after.as_millis() as u64),
    )
}

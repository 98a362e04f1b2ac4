//! Construction of the adapters selected by configuration

use std::{sync::Arc, time::Duration};

use ai_speech::{OpenAISpeechProvider, PollySpeechProvider, TranscribeSpeechProvider};
use application::{
    ObjectLifecycleManager, PipelineConfig, ProviderRouter, RateLimiter, RetryPolicy,
    VoicePipelineService,
    error::ApplicationError,
    ports::{Clock, CounterStorePort, ObjectStorePort, RetrievalPort, SystemClock},
};
use domain::{AsrProvider, Language, TtsProvider};
use tracing::{info, warn};

use crate::{
    adapters::{
        HttpRetrievalAdapter, MemoryObjectStore, MokaCounterStore, S3ObjectStore,
        SqliteCounterStore, StoredAsrBackend, SynthesisBackend, UploadingAsrBackend,
    },
    config::{AppConfig, CounterBackend, RateLimitConfig, StorageBackend, StorageConfig},
};

/// Counter store for the configured backend
///
/// The SQLite backend purges lapsed records once while opening.
pub async fn build_counter_store(
    config: &RateLimitConfig,
    clock: &dyn Clock,
) -> Result<Arc<dyn CounterStorePort>, ApplicationError> {
    match config.backend {
        CounterBackend::Memory => Ok(Arc::new(MokaCounterStore::new(config.max_tracked_keys))),
        CounterBackend::Sqlite => {
            let store = SqliteCounterStore::connect(&config.sqlite_path).await?;
            let purged = store.purge_expired(clock.now()).await?;
            info!(purged, path = %config.sqlite_path, "Rate windows loaded");
            Ok(Arc::new(store))
        },
    }
}

/// Object store for the configured backend
pub fn build_object_store(
    config: &StorageConfig,
) -> Result<Arc<dyn ObjectStorePort>, ApplicationError> {
    match config.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory object store; presigned handles are not reachable");
            Ok(Arc::new(MemoryObjectStore::new(config.bucket.clone())))
        },
        StorageBackend::S3 => Ok(Arc::new(S3ObjectStore::new(config)?)),
    }
}

/// Router with a backend for every provider the routing table uses
///
/// OpenAI backends are registered only when an API key is configured;
/// languages routed to them fail as unroutable otherwise.
pub async fn build_router(
    config: &AppConfig,
    objects: Arc<dyn ObjectStorePort>,
) -> Result<ProviderRouter, ApplicationError> {
    let table = config.routing.table();
    let mut router = ProviderRouter::new(table.clone(), config.routing.router_config());

    let uses_asr =
        |p: AsrProvider| Language::ALL.iter().any(|&l| table.asr_provider(l) == Some(p));
    let uses_tts =
        |p: TtsProvider| Language::ALL.iter().any(|&l| table.tts_provider(l) == Some(p));

    if uses_asr(AsrProvider::Transcribe) || uses_tts(TtsProvider::Polly) {
        let sdk = ai_speech::load_sdk_config(&config.speech.aws.region).await;
        if uses_asr(AsrProvider::Transcribe) {
            router = router.with_asr_backend(Arc::new(StoredAsrBackend::new(
                AsrProvider::Transcribe,
                Arc::new(TranscribeSpeechProvider::new(&sdk, &config.speech.aws)),
                Arc::clone(&objects),
            )));
        }
        if uses_tts(TtsProvider::Polly) {
            router = router.with_tts_backend(Arc::new(SynthesisBackend::new(
                TtsProvider::Polly,
                Arc::new(PollySpeechProvider::new(&sdk, &config.speech.aws)),
            )));
        }
    }

    if uses_asr(AsrProvider::Whisper) || uses_tts(TtsProvider::OpenAi) {
        if config.speech.openai.api_key.is_some() {
            let openai = Arc::new(
                OpenAISpeechProvider::new(config.speech.openai.clone())
                    .map_err(|e| ApplicationError::Configuration(e.to_string()))?,
            );
            if uses_asr(AsrProvider::Whisper) {
                router = router.with_asr_backend(Arc::new(UploadingAsrBackend::new(
                    AsrProvider::Whisper,
                    openai.clone(),
                    Arc::clone(&objects),
                )));
            }
            if uses_tts(TtsProvider::OpenAi) {
                let backend = SynthesisBackend::new(TtsProvider::OpenAi, openai);
                router = router.with_tts_backend(Arc::new(backend));
            }
        } else {
            warn!("speech.openai.api_key is not set; OpenAI-routed languages are unavailable");
        }
    }

    Ok(router)
}

/// Assemble the pipeline service from configuration
pub async fn build_pipeline(config: &AppConfig) -> Result<VoicePipelineService, ApplicationError> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let counters = build_counter_store(&config.rate_limit, clock.as_ref()).await?;
    let objects = build_object_store(&config.storage)?;
    let router = build_router(config, Arc::clone(&objects)).await?;
    let retrieval: Arc<dyn RetrievalPort> = Arc::new(
        HttpRetrievalAdapter::new(&config.rag)
            .map_err(|e| ApplicationError::Configuration(e.to_string()))?,
    );

    Ok(VoicePipelineService::with_config(
        Arc::new(RateLimiter::new(counters, clock, config.rate_limit.policy())),
        Arc::new(router),
        retrieval,
        Arc::new(ObjectLifecycleManager::new(objects, config.storage.lifecycle())),
        pipeline_config(config),
    ))
}

/// Retrieval bounds: the RAG timeout plus the router's single retry
#[must_use]
pub fn pipeline_config(config: &AppConfig) -> PipelineConfig {
    PipelineConfig {
        retrieval_timeout: Duration::from_secs(config.rag.timeout_secs),
        retrieval_retry: RetryPolicy::once(Duration::from_millis(config.routing.retry_backoff_ms)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backends_by_default() {
        let config = AppConfig::default();
        let counters = build_counter_store(&config.rate_limit, &SystemClock)
            .await
            .unwrap();
        assert!(counters.read("s1#asr").await.unwrap().is_none());

        let objects = build_object_store(&config.storage).unwrap();
        let key = domain::ObjectKey::new("uploads/s1/a.wav").unwrap();
        assert!(objects.object_uri(&key).starts_with("memory://farmer-voice-audio/"));
    }

    #[tokio::test]
    async fn sqlite_backend_opens_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = RateLimitConfig {
            backend: CounterBackend::Sqlite,
            sqlite_path: dir.path().join("limits.db").display().to_string(),
            ..RateLimitConfig::default()
        };
        let counters = build_counter_store(&config, &SystemClock).await.unwrap();
        assert!(counters.read("s1#tts").await.unwrap().is_none());
    }

    #[test]
    fn retrieval_uses_rag_timeout() {
        let mut config = AppConfig::default();
        config.rag.timeout_secs = 12;
        assert_eq!(pipeline_config(&config).retrieval_timeout, Duration::from_secs(12));
    }

    #[tokio::test]
    async fn openai_routes_need_a_key() {
        let mut config = AppConfig::default();
        config.routing.asr.clear();
        config.routing.tts.clear();
        let objects = build_object_store(&config.storage).unwrap();

        let router = build_router(&config, objects).await.unwrap();
        assert!(router.select_asr(Language::Odia).is_err());
        assert!(router.select_tts(Language::Odia).is_err());
    }
}

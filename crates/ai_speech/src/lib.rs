//! AI Speech - Speech-to-Text and Text-to-Speech clients
//!
//! Provides traits and implementations for speech processing:
//! - `SpeechToText` - Transcribe audio bytes to text (OpenAI Whisper)
//! - `StoredAudioTranscriber` - Transcribe audio held in S3 (Amazon Transcribe)
//! - `TextToSpeech` - Synthesize speech from text (OpenAI TTS, Amazon Polly)
//!
//! # Architecture
//!
//! This crate follows the ports & adapters pattern:
//! - `ports` module defines the traits (ports)
//! - `providers` module contains concrete implementations (adapters)
//!
//! Every provider failure is a [`SpeechError`] that knows whether it is
//! transient.
//!
//! # Example
//!
//! ```ignore
//! use ai_speech::{OpenAISpeechProvider, SpeechToText, TextToSpeech, AudioData};
//! use domain::{AudioFormat, Language};
//!
//! let provider = OpenAISpeechProvider::new(config.openai)?;
//!
//! let audio = AudioData::new(bytes, AudioFormat::Wav);
//! let transcription = provider.transcribe(audio, Language::Odia).await?;
//!
//! let speech = provider.synthesize("ନମସ୍କାର", Language::Odia).await?;
//! ```

pub mod chunking;
pub mod config;
pub mod error;
pub mod ports;
pub mod providers;
pub mod types;

pub use chunking::split_for_tts;
pub use config::{AwsSpeechConfig, OpenAiSpeechConfig, SpeechConfig};
pub use error::SpeechError;
pub use ports::{SpeechToText, StoredAudioTranscriber, TextToSpeech};
pub use providers::aws::load_sdk_config;
pub use providers::openai::OpenAISpeechProvider;
pub use providers::polly::PollySpeechProvider;
pub use providers::transcribe::TranscribeSpeechProvider;
pub use types::{AudioData, Transcription};

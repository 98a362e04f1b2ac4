//! Domain entities - Objects with identity and lifecycle

mod pipeline;
mod provider;
mod rate_window;

pub use pipeline::{
    AudioDelivery, PipelineInput, PipelineKind, PipelineRequest, PipelineResult, PipelineStage,
    ProvidersUsed,
};
pub use provider::{AsrProvider, Provider, ProviderFamily, TtsProvider};
pub use rate_window::{RateDecision, RateWindow};

//! Application services - Use case implementations

mod object_lifecycle;
mod provider_router;
mod rate_limiter;
mod voice_pipeline;

pub use object_lifecycle::{DownloadHandle, LifecycleConfig, ObjectLifecycleManager, UploadHandle};
pub use provider_router::{ProviderRouter, RouterConfig, RoutingTable};
pub use rate_limiter::{QuotaStatus, RateLimitPolicy, RateLimiter, counter_key};
pub use voice_pipeline::{PipelineConfig, PipelineOutcome, VoicePipelineService};

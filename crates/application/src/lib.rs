//! Application layer - Use cases and orchestration
//!
//! Contains the rate limiter, the provider router, the object lifecycle
//! manager and the voice pipeline orchestrator, together with the ports that
//! infrastructure adapters implement.

pub mod error;
pub mod pipeline_context;
pub mod ports;
pub mod retry;
pub mod services;

pub use error::{ApplicationError, ErrorKind, PipelineFailure, ProviderError, ProviderErrorKind};
pub use pipeline_context::PipelineContext;
pub use retry::{RetryOutcome, RetryPolicy, Retryable, with_retry};
pub use ports::*;
pub use services::*;

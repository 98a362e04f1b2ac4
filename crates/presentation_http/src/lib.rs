//! Voice gateway HTTP presentation layer
//!
//! Exposes the voice pipeline over axum: ASR, TTS and ask routes, quota
//! introspection, upload handles and health probes.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, ErrorResponse};
pub use middleware::{RequestId, RequestIdLayer, ValidatedJson, VoiceHeaders};
pub use routes::create_router;
pub use state::AppState;

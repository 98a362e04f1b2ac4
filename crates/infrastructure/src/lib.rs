//! Infrastructure layer - Adapters for external systems
//!
//! Implements ports defined in the application layer: counter stores
//! (moka, SQLite), object stores (S3, in-memory), the retrieval HTTP client
//! and the speech backends. Also owns configuration loading and logging setup.

pub mod adapters;
pub mod config;
pub mod logging;
pub mod wiring;

pub use adapters::*;
pub use config::{
    AppConfig, CounterBackend, LogFormat, RagConfig, RateLimitConfig, RoutingConfig,
    ServerConfig, StorageBackend, StorageConfig,
};
pub use logging::{LoggingError, init_logging};
pub use wiring::{
    build_counter_store, build_object_store, build_pipeline, build_router, pipeline_config,
};

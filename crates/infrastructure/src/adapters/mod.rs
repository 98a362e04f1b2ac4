//! Infrastructure adapters
//!
//! Adapters connect application ports to concrete implementations.

mod http_retrieval_adapter;
mod memory_object_store;
mod moka_counter_store;
mod s3_object_store;
mod speech_adapter;
mod sqlite_counter_store;

pub use http_retrieval_adapter::HttpRetrievalAdapter;
pub use memory_object_store::MemoryObjectStore;
pub use moka_counter_store::MokaCounterStore;
pub use s3_object_store::S3ObjectStore;
pub use speech_adapter::{StoredAsrBackend, SynthesisBackend, UploadingAsrBackend};
pub use sqlite_counter_store::SqliteCounterStore;

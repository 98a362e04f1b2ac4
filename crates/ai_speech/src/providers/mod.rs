//! Speech provider implementations

pub mod aws;
pub mod openai;
pub mod polly;
pub mod transcribe;

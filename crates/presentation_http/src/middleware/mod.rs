//! HTTP middleware components
//!
//! Request correlation plus the extractors that validate headers and bodies.

pub mod request_id;
pub mod validation;

pub use request_id::{REQUEST_ID_HEADER, RequestId, RequestIdLayer};
pub use validation::{LANGUAGE_HEADER, SESSION_HEADER, ValidatedJson, VoiceHeaders};

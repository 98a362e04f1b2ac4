//! Value Objects - Immutable, identity-less domain primitives

mod audio_format;
mod language;
mod object_key;
mod request_type;
mod session_id;

pub use audio_format::AudioFormat;
pub use language::Language;
pub use object_key::{LifecycleClass, ObjectKey};
pub use request_type::RequestType;
pub use session_id::SessionId;

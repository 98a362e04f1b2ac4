//! Domain layer for the voice gateway
//!
//! Contains the value objects, entities and errors that describe sessions,
//! rate windows, speech providers and the voice pipeline. This layer performs
//! no I/O and defines the ubiquitous language.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;

//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod clock;
mod counter_store;
mod object_store;
mod retrieval_port;
mod speech_backend;

pub use clock::{Clock, ManualClock, SystemClock};
#[cfg(test)]
pub use counter_store::MockCounterStorePort;
pub use counter_store::{CounterStorePort, IncrementOutcome, IncrementRequest};
#[cfg(test)]
pub use object_store::MockObjectStorePort;
pub use object_store::ObjectStorePort;
#[cfg(test)]
pub use retrieval_port::MockRetrievalPort;
pub use retrieval_port::{Answer, RetrievalPort};
#[cfg(test)]
pub use speech_backend::{MockAsrBackend, MockTtsBackend};
pub use speech_backend::{AsrBackend, AsrOutput, TtsBackend, TtsOutput};

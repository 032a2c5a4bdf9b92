//! Domain types and models

pub mod envelope;
pub mod outcome;
pub mod request;

pub use envelope::Envelope;
pub use outcome::RunOutcome;
pub use request::{RequestDescriptor, TransportMethod};

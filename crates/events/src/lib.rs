//! Domain events and the envelopes that journal them.

pub mod envelope;
pub mod event;

pub use envelope::EventEnvelope;
pub use event::Event;

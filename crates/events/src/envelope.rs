use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Event;

/// Envelope for an event, containing stream metadata.
///
/// This is the unit appended to an aggregate's journal.
///
/// `sequence_number` is monotonically increasing per stream, starting at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    aggregate_type: String,

    /// Monotonically increasing position in the aggregate stream.
    sequence_number: u64,

    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: Uuid,
        aggregate_type: impl Into<String>,
        sequence_number: u64,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            aggregate_type: aggregate_type.into(),
            sequence_number,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

impl<E: Event> EventEnvelope<E> {
    /// Wrap `payload` with a fresh time-ordered event id (UUIDv7).
    pub fn seal(aggregate_type: impl Into<String>, sequence_number: u64, payload: E) -> Self {
        Self::new(Uuid::now_v7(), aggregate_type, sequence_number, payload)
    }

    /// Stable type name of the wrapped event.
    pub fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }
}

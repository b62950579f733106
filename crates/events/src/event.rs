use chrono::{DateTime, Utc};

/// A domain fact produced by an aggregate.
///
/// Events are immutable, versioned and only ever appended.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable name, e.g. "library.loan.issued".
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// Business time of the fact.
    fn occurred_at(&self) -> DateTime<Utc>;

    /// `<event_type>/v<version>`, the key consumers match on.
    fn schema_key(&self) -> String {
        format!("{}/v{}", self.event_type(), self.version())
    }
}

//! Intent abstractions.

use uuid::Uuid;

/// An intent a caller issues against a room.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Stable name of the intent, e.g. `room.enter`, used in log fields.
    fn command_type(&self) -> &'static str;

    /// Correlation ID carried through every log line the intent produces.
    fn correlation_id(&self) -> Uuid;

    /// The room this intent targets.
    fn room_id(&self) -> &str;
}

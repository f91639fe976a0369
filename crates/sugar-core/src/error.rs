//! Domain error types.

use thiserror::Error;

/// Top-level domain error type.
///
/// Every variant is recoverable: it aborts the attempted intent and leaves
/// the authoritative room document unchanged.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The referenced room does not exist.
    #[error("room not found: {0}")]
    NotFound(String),

    /// The room is full or already started and the caller is not a member.
    #[error("room unavailable: {0}")]
    RoomUnavailable(String),

    /// The game in this room has already been started.
    #[error("game already started in room {0}")]
    AlreadyStarted(String),

    /// Not every current player has answered the active round.
    #[error("round {round} in room {room_id} is not complete")]
    RoundNotComplete {
        /// The room being advanced.
        room_id: String,
        /// The round still awaiting answers.
        round: u32,
    },

    /// An intent referenced a round that is no longer active.
    #[error("round {submitted} is stale in room {room_id}: active round is {active}")]
    StaleRound {
        /// The room the intent targeted.
        room_id: String,
        /// The round named by the caller.
        submitted: u32,
        /// The round that is actually active.
        active: u32,
    },

    /// The caller may not perform this intent in the current state.
    #[error("not permitted: {0}")]
    NotPermitted(String),

    /// Optimistic concurrency conflict on a document.
    #[error("concurrency conflict on {key}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The document key that had the conflict.
        key: String,
        /// The expected version.
        expected: i64,
        /// The actual version found.
        actual: i64,
    },

    /// A field guard on a partial update did not hold at commit time.
    #[error("precondition failed on {key}: field {field}")]
    PreconditionFailed {
        /// The document key.
        key: String,
        /// Dotted path of the guarded field.
        field: String,
    },

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// The backing store could not be reached or the subscription closed.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A stored document could not be decoded or encoded.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

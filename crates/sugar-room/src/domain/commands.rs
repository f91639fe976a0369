//! Commands for the Room context.

use sugar_core::command::Command;
use sugar_core::model::{PlayerId, RoomId, RoundNo};
use uuid::Uuid;

/// Command to enter a room, creating it if it does not exist.
#[derive(Debug, Clone)]
pub struct EnterRoom {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The room to enter.
    pub room_id: RoomId,
    /// The entering caller.
    pub caller_id: PlayerId,
    /// Name shown to the other participants.
    pub display_name: String,
}

impl Command for EnterRoom {
    fn command_type(&self) -> &'static str {
        "room.enter"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn room_id(&self) -> &str {
        self.room_id.as_str()
    }
}

/// Command to start the game in a room.
#[derive(Debug, Clone)]
pub struct StartGame {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The room to start.
    pub room_id: RoomId,
    /// Language filter passed to the word deck.
    pub language: String,
}

impl Command for StartGame {
    fn command_type(&self) -> &'static str {
        "room.start"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn room_id(&self) -> &str {
        self.room_id.as_str()
    }
}

/// Command to record a caller's answer for a round.
#[derive(Debug, Clone)]
pub struct SubmitAnswer {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The room being played.
    pub room_id: RoomId,
    /// The answering caller.
    pub caller_id: PlayerId,
    /// The round the caller believes is active.
    pub round: RoundNo,
    /// The chosen answer.
    pub answer: String,
}

impl Command for SubmitAnswer {
    fn command_type(&self) -> &'static str {
        "room.submit_answer"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn room_id(&self) -> &str {
        self.room_id.as_str()
    }
}

/// Command to move past the active round once it is complete.
#[derive(Debug, Clone)]
pub struct AdvanceRound {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The room being played.
    pub room_id: RoomId,
}

impl Command for AdvanceRound {
    fn command_type(&self) -> &'static str {
        "room.advance_round"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn room_id(&self) -> &str {
        self.room_id.as_str()
    }
}

//! Command handlers for the Room context.
//!
//! Each handler loads the room document, runs the matching intent on the
//! `Room` aggregate, and commits the resulting partial write.

use serde::Serialize;
use sugar_core::deck::WordDeck;
use sugar_core::error::DomainError;
use sugar_core::model::{Player, RoomId};
use sugar_core::store::DocumentStore;
use tracing::{debug, info, instrument, warn};

use crate::domain::aggregates::{AdvanceOutcome, Admission, Room};
use crate::domain::commands::{AdvanceRound, EnterRoom, StartGame, SubmitAnswer};

/// How many times `handle_enter_room` re-decides after losing a race.
pub const ENTER_ATTEMPTS: usize = 3;

/// How the caller came to hold a seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnterOutcome {
    /// The room did not exist and was created around the caller.
    Created,
    /// The caller was already seated.
    Rejoined,
    /// The caller took the next free seat.
    Joined,
}

/// Result of a successful `EnterRoom`.
#[derive(Debug, Clone)]
pub struct EnterResult {
    pub outcome: EnterOutcome,
    /// The room as of the caller's entry.
    pub room: Room,
}

/// Loads and decodes a room.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the document does not exist and
/// `DomainError::Infrastructure` if it is corrupt.
pub(crate) async fn load_room(
    room_id: &RoomId,
    store: &dyn DocumentStore,
) -> Result<Room, DomainError> {
    let stored = store
        .load(room_id.as_str())
        .await?
        .ok_or_else(|| DomainError::NotFound(room_id.to_string()))?;
    Room::from_stored(&stored)
}

async fn try_enter(
    room_id: &RoomId,
    caller: &Player,
    store: &dyn DocumentStore,
) -> Result<EnterResult, DomainError> {
    let key = room_id.as_str();
    let Some(stored) = store.load(key).await? else {
        let created = store.create(key, Room::creation_body(caller)?).await?;
        return Ok(EnterResult {
            outcome: EnterOutcome::Created,
            room: Room::from_stored(&created)?,
        });
    };

    let room = Room::from_stored(&stored)?;
    match room.admit(caller)? {
        Admission::AlreadySeated => Ok(EnterResult {
            outcome: EnterOutcome::Rejoined,
            room,
        }),
        Admission::Seat(patch) => {
            let updated = store.update(key, patch).await?;
            Ok(EnterResult {
                outcome: EnterOutcome::Joined,
                room: Room::from_stored(&updated)?,
            })
        }
    }
}

/// Handles the `EnterRoom` command: creates the room, rejoins the caller, or
/// seats them.
///
/// Creation and joins are compare-and-set writes. A caller who loses either
/// race reloads and decides again, so only one of two entrants competing for
/// the last seat is seated.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a blank display name,
/// `DomainError::RoomUnavailable` if the room is full or started, and
/// `DomainError::ConcurrencyConflict` if every attempt lost a race.
#[instrument(skip(command, store), fields(
    correlation_id = %command.correlation_id,
    room_id = %command.room_id,
    caller_id = %command.caller_id,
))]
pub async fn handle_enter_room(
    command: &EnterRoom,
    store: &dyn DocumentStore,
) -> Result<EnterResult, DomainError> {
    let display_name = command.display_name.trim();
    if display_name.is_empty() {
        return Err(DomainError::Validation(
            "display name must not be blank".to_owned(),
        ));
    }
    let caller = Player::new(command.caller_id.clone(), display_name);

    let mut conflict = None;
    for attempt in 1..=ENTER_ATTEMPTS {
        match try_enter(&command.room_id, &caller, store).await {
            Ok(result) => {
                info!(outcome = ?result.outcome, seats = result.room.player_count(), "caller entered room");
                return Ok(result);
            }
            Err(lost @ DomainError::ConcurrencyConflict { .. }) => {
                debug!(attempt, error = %lost, "enter lost a concurrent write, retrying");
                conflict = Some(lost);
            }
            Err(e) => {
                warn!(error = %e, "enter rejected");
                return Err(e);
            }
        }
    }
    let error = conflict.unwrap_or_else(|| {
        DomainError::Infrastructure("enter made no attempts".to_owned())
    });
    warn!(error = %error, "enter gave up after repeated conflicts");
    Err(error)
}

/// Handles the `StartGame` command: draws one card per seat and starts
/// round 1 in a single write.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the room does not exist,
/// `DomainError::AlreadyStarted` if it has started (including when another
/// caller started it first), deck errors from `WordDeck::fetch`, and
/// `DomainError::ConcurrencyConflict` if a join landed between read and
/// write.
#[instrument(skip(command, store, deck), fields(
    correlation_id = %command.correlation_id,
    room_id = %command.room_id,
    language = %command.language,
))]
pub async fn handle_start_game(
    command: &StartGame,
    store: &dyn DocumentStore,
    deck: &dyn WordDeck,
) -> Result<Room, DomainError> {
    let room = load_room(&command.room_id, store).await?;
    if room.is_started() {
        warn!("start rejected: already started");
        return Err(DomainError::AlreadyStarted(command.room_id.to_string()));
    }

    let cards = deck.fetch(&command.language, room.player_count()).await?;
    let patch = room.start(&cards)?;

    let updated = match store.update(command.room_id.as_str(), patch).await {
        Err(conflict @ DomainError::ConcurrencyConflict { .. }) => {
            let error = match load_room(&command.room_id, store).await {
                Ok(current) if current.is_started() => {
                    DomainError::AlreadyStarted(command.room_id.to_string())
                }
                _ => conflict,
            };
            warn!(error = %error, "start lost a concurrent write");
            return Err(error);
        }
        other => other?,
    };

    let room = Room::from_stored(&updated)?;
    info!(rounds = room.last_round(), "game started");
    Ok(room)
}

/// Handles the `SubmitAnswer` command: records the caller's answer for the
/// active round, leaving other players' entries untouched.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the room does not exist,
/// `DomainError::NotPermitted` if the game has not started, is over, or the
/// caller holds no seat, `DomainError::StaleRound` if the round is not (or is no
/// longer, at commit time) the active round, and `DomainError::Validation`
/// for a blank answer.
#[instrument(skip(command, store), fields(
    correlation_id = %command.correlation_id,
    room_id = %command.room_id,
    caller_id = %command.caller_id,
    round = command.round,
))]
pub async fn handle_submit_answer(
    command: &SubmitAnswer,
    store: &dyn DocumentStore,
) -> Result<Room, DomainError> {
    let room = load_room(&command.room_id, store).await?;
    let patch = room
        .record_answer(&command.caller_id, command.round, &command.answer)
        .inspect_err(|e| warn!(error = %e, "answer rejected"))?;

    let updated = match store.update(command.room_id.as_str(), patch).await {
        Err(DomainError::PreconditionFailed { .. }) => {
            let current = load_room(&command.room_id, store).await?;
            warn!(active = current.active_round(), "answer arrived after the round advanced");
            return Err(DomainError::StaleRound {
                room_id: command.room_id.to_string(),
                submitted: command.round,
                active: current.active_round(),
            });
        }
        other => other?,
    };

    info!("answer recorded");
    Room::from_stored(&updated)
}

/// Handles the `AdvanceRound` command: moves past the active round once every
/// current player has answered it.
///
/// The write is guarded on the round being advanced, so two callers
/// advancing the same round move it forward once.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the room does not exist,
/// `DomainError::NotPermitted` if the game has not started or is over,
/// `DomainError::RoundNotComplete` while answers are missing, and
/// `DomainError::StaleRound` if another caller advanced the round first.
#[instrument(skip(command, store), fields(
    correlation_id = %command.correlation_id,
    room_id = %command.room_id,
))]
pub async fn handle_advance_round(
    command: &AdvanceRound,
    store: &dyn DocumentStore,
) -> Result<AdvanceOutcome, DomainError> {
    let room = load_room(&command.room_id, store).await?;
    let (patch, outcome) = room
        .advance()
        .inspect_err(|e| warn!(error = %e, "advance rejected"))?;

    if let Err(e) = store.update(command.room_id.as_str(), patch).await {
        let DomainError::PreconditionFailed { .. } = e else {
            return Err(e);
        };
        let current = load_room(&command.room_id, store).await?;
        warn!(active = current.active_round(), "round was advanced concurrently");
        return Err(DomainError::StaleRound {
            room_id: command.room_id.to_string(),
            submitted: room.active_round(),
            active: current.active_round(),
        });
    }

    info!(outcome = ?outcome, "round advanced");
    Ok(outcome)
}

//! Query handlers for the Room context.
//!
//! Queries decode the current room document and run the pure projections
//! over it; they never write.

use sugar_core::error::DomainError;
use sugar_core::model::{PlayerId, RoomId};
use sugar_core::store::DocumentStore;

use crate::application::command_handlers;
use crate::domain::aggregates::Room;
use crate::domain::scoring::{self, PlayerScore};
use crate::domain::view::{self, PlayerView};

/// Retrieves a room by its identifier.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the room does not exist.
/// Returns `DomainError::Infrastructure` if the document is corrupt.
pub async fn get_room(room_id: &RoomId, store: &dyn DocumentStore) -> Result<Room, DomainError> {
    command_handlers::load_room(room_id, store).await
}

/// Projects a room into `caller`'s views.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the room does not exist.
pub async fn get_views(
    room_id: &RoomId,
    caller: &PlayerId,
    store: &dyn DocumentStore,
) -> Result<PlayerView, DomainError> {
    let room = get_room(room_id, store).await?;
    Ok(view::project(&room, caller))
}

/// Scores a room, in seat order.
///
/// # Errors
///
/// Returns `DomainError::NotPermitted` until the game is complete.
pub fn scores_for(room: &Room) -> Result<Vec<PlayerScore>, DomainError> {
    if !room.is_game_complete() {
        return Err(DomainError::NotPermitted(format!(
            "game in room {} is not complete",
            room.id()
        )));
    }
    scoring::score(room.players(), room.rounds_info())
}

/// Retrieves the final scores of a finished game.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the room does not exist and
/// `DomainError::NotPermitted` until the game is complete.
pub async fn get_scores(
    room_id: &RoomId,
    store: &dyn DocumentStore,
) -> Result<Vec<PlayerScore>, DomainError> {
    let room = get_room(room_id, store).await?;
    scores_for(&room)
}

//! Routes for the Room context.
//!
//! Role gating lives here: only the host may start, only the active player
//! may advance, and answers are accepted only while the caller's view allows
//! a change.

use std::convert::Infallible;

use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sugar_core::error::DomainError;
use sugar_core::model::{PlayerId, RoomId, RoundNo};
use sugar_core::store::StoredDocument;
use sugar_room::application::command_handlers::{self, EnterOutcome};
use sugar_room::application::query_handlers;
use sugar_room::domain::aggregates::{AdvanceOutcome, Room};
use sugar_room::domain::commands;
use sugar_room::domain::scoring::PlayerScore;
use sugar_room::domain::view::{self, PlayerView};
use tokio_stream::{Stream, StreamExt};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /{room_id}/enter.
#[derive(Debug, Deserialize)]
pub struct EnterRequest {
    /// The anonymous caller identifier.
    pub caller_id: String,
    /// Name shown to the other participants.
    pub display_name: String,
}

/// Request body for POST /{room_id}/start.
#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub caller_id: String,
    /// Deck language; the server default when absent.
    #[serde(default)]
    pub language: Option<String>,
}

/// Request body for POST /{room_id}/answers.
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub caller_id: String,
    /// The round the caller is answering.
    pub round: RoundNo,
    pub answer: String,
}

/// Request body for POST /{room_id}/advance.
#[derive(Debug, Deserialize)]
pub struct AdvanceRequest {
    pub caller_id: String,
}

/// Query string for GET /{room_id}/events.
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub caller_id: String,
}

/// Response body returned after entering a room.
#[derive(Debug, Serialize)]
pub struct EnterResponse {
    pub outcome: EnterOutcome,
    pub room: Room,
}

fn parse_caller(raw: &str) -> Result<PlayerId, DomainError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation("caller id must not be blank".to_owned()));
    }
    Ok(PlayerId::new(trimmed))
}

/// POST /{room_id}/enter
#[instrument(skip(state, request), fields(caller_id = %request.caller_id))]
async fn enter_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<EnterRequest>,
) -> Result<Json<EnterResponse>, ApiError> {
    let command = commands::EnterRoom {
        correlation_id: Uuid::new_v4(),
        room_id: RoomId::parse(&room_id)?,
        caller_id: parse_caller(&request.caller_id)?,
        display_name: request.display_name,
    };

    info!(correlation_id = %command.correlation_id, "handling enter command");

    let result = command_handlers::handle_enter_room(&command, state.store.as_ref()).await?;

    Ok(Json(EnterResponse {
        outcome: result.outcome,
        room: result.room,
    }))
}

/// POST /{room_id}/start
#[instrument(skip(state, request), fields(caller_id = %request.caller_id))]
async fn start_game(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<StartRequest>,
) -> Result<Json<Room>, ApiError> {
    let room_id = RoomId::parse(&room_id)?;
    let caller = parse_caller(&request.caller_id)?;
    let room = query_handlers::get_room(&room_id, state.store.as_ref()).await?;
    if room.host().is_none_or(|host| host.id != caller) {
        return Err(DomainError::NotPermitted(format!("only the host may start room {room_id}")).into());
    }

    let command = commands::StartGame {
        correlation_id: Uuid::new_v4(),
        room_id,
        language: request
            .language
            .filter(|language| !language.trim().is_empty())
            .unwrap_or_else(|| state.default_language.clone()),
    };

    info!(correlation_id = %command.correlation_id, "handling start command");

    let room =
        command_handlers::handle_start_game(&command, state.store.as_ref(), state.deck.as_ref())
            .await?;

    Ok(Json(room))
}

/// POST /{room_id}/answers
#[instrument(skip(state, request), fields(caller_id = %request.caller_id, round = request.round))]
async fn submit_answer(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<Room>, ApiError> {
    let room_id = RoomId::parse(&room_id)?;
    let caller = parse_caller(&request.caller_id)?;
    let room = query_handlers::get_room(&room_id, state.store.as_ref()).await?;
    let allowed = view::turn_view(&room, &caller).is_some_and(|turn| turn.allow_change);
    if request.round == room.active_round() && !allowed {
        return Err(DomainError::NotPermitted(format!(
            "{caller} may not answer round {} right now",
            request.round
        ))
        .into());
    }

    let command = commands::SubmitAnswer {
        correlation_id: Uuid::new_v4(),
        room_id,
        caller_id: caller,
        round: request.round,
        answer: request.answer,
    };

    info!(correlation_id = %command.correlation_id, "handling submit_answer command");

    let room = command_handlers::handle_submit_answer(&command, state.store.as_ref()).await?;

    Ok(Json(room))
}

/// POST /{room_id}/advance
#[instrument(skip(state, request), fields(caller_id = %request.caller_id))]
async fn advance_round(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<AdvanceRequest>,
) -> Result<Json<AdvanceOutcome>, ApiError> {
    let room_id = RoomId::parse(&room_id)?;
    let caller = parse_caller(&request.caller_id)?;
    let room = query_handlers::get_room(&room_id, state.store.as_ref()).await?;
    if room.active_player().is_none_or(|active| active.id != caller) {
        return Err(DomainError::NotPermitted(format!(
            "only the active player may advance room {room_id}"
        ))
        .into());
    }

    let command = commands::AdvanceRound {
        correlation_id: Uuid::new_v4(),
        room_id,
    };

    info!(correlation_id = %command.correlation_id, "handling advance_round command");

    let outcome = command_handlers::handle_advance_round(&command, state.store.as_ref()).await?;

    Ok(Json(outcome))
}

/// GET /{room_id}
async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<Room>, ApiError> {
    let room_id = RoomId::parse(&room_id)?;
    let room = query_handlers::get_room(&room_id, state.store.as_ref()).await?;
    Ok(Json(room))
}

/// GET /{room_id}/views/{caller_id}
async fn get_views(
    State(state): State<AppState>,
    Path((room_id, caller_id)): Path<(String, String)>,
) -> Result<Json<PlayerView>, ApiError> {
    let room_id = RoomId::parse(&room_id)?;
    let caller = parse_caller(&caller_id)?;
    let views = query_handlers::get_views(&room_id, &caller, state.store.as_ref()).await?;
    Ok(Json(views))
}

/// GET /{room_id}/scores
async fn get_scores(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<Vec<PlayerScore>>, ApiError> {
    let room_id = RoomId::parse(&room_id)?;
    let scores = query_handlers::get_scores(&room_id, state.store.as_ref()).await?;
    Ok(Json(scores))
}

fn snapshot_event(document: &StoredDocument, caller: &PlayerId) -> Event {
    let id = document.version.to_string();
    let projected = Room::from_stored(document).and_then(|room| {
        Event::default()
            .event("snapshot")
            .id(&id)
            .json_data(view::project(&room, caller))
            .map_err(|e| DomainError::Infrastructure(format!("cannot encode view: {e}")))
    });
    projected.unwrap_or_else(|e| {
        warn!(error = %e, version = document.version, "snapshot could not be projected");
        error_event(&id, &ApiError(e))
    })
}

/// An `error` event carrying the same body as an error response.
fn error_event(id: &str, error: &ApiError) -> Event {
    let body = error.body();
    let data = serde_json::to_string(&body).unwrap_or(body.message);
    Event::default().event("error").id(id).data(data)
}

/// GET /{room_id}/events?caller_id=
///
/// Streams the caller's views, one `snapshot` event per pushed document,
/// starting with the current one. A document that cannot be projected is
/// sent as an `error` event. The subscription ends with the connection.
#[instrument(skip(state, query), fields(caller_id = %query.caller_id))]
async fn room_events(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Query(query): Query<EventsQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let room_id = RoomId::parse(&room_id)?;
    let caller = parse_caller(&query.caller_id)?;
    query_handlers::get_room(&room_id, state.store.as_ref()).await?;
    let subscription = state.store.subscribe(room_id.as_str()).await?;

    info!("snapshot stream opened");

    let stream = subscription
        .into_stream()
        .map(move |document| Ok(snapshot_event(&document, &caller)));

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Returns the router for the room context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{room_id}", get(get_room))
        .route("/{room_id}/enter", post(enter_room))
        .route("/{room_id}/start", post(start_game))
        .route("/{room_id}/answers", post(submit_answer))
        .route("/{room_id}/advance", post(advance_round))
        .route("/{room_id}/views/{caller_id}", get(get_views))
        .route("/{room_id}/scores", get(get_scores))
        .route("/{room_id}/events", get(room_events))
}

//! Caller-owned game session.
//!
//! A `GameSession` holds one caller's latest room snapshot and the live
//! subscription feeding it. The subscription is released when the session
//! is exited or dropped.

use std::sync::Arc;

use sugar_core::deck::WordDeck;
use sugar_core::error::DomainError;
use sugar_core::model::{PlayerId, RoomId};
use sugar_core::store::{DocumentStore, StoredDocument, Subscription};
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::command_handlers::{
    EnterOutcome, handle_advance_round, handle_enter_room, handle_start_game, handle_submit_answer,
};
use crate::application::query_handlers;
use crate::domain::aggregates::{AdvanceOutcome, Room};
use crate::domain::commands::{AdvanceRound, EnterRoom, StartGame, SubmitAnswer};
use crate::domain::scoring::PlayerScore;
use crate::domain::view::{self, CardView, PlayerView, TurnView};

/// Collaborators a session talks to.
#[derive(Clone)]
pub struct SessionContext {
    pub store: Arc<dyn DocumentStore>,
    pub deck: Arc<dyn WordDeck>,
}

impl SessionContext {
    /// Bundles a store and a deck.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, deck: Arc<dyn WordDeck>) -> Self {
        Self { store, deck }
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext").finish_non_exhaustive()
    }
}

/// One caller's view of one room.
#[derive(Debug)]
pub struct GameSession {
    ctx: SessionContext,
    caller: PlayerId,
    room: Room,
    subscription: Subscription,
}

impl GameSession {
    /// Enters the room and subscribes to it.
    ///
    /// # Errors
    ///
    /// Returns any error from `handle_enter_room`, or
    /// `DomainError::StoreUnavailable` if the subscription cannot be opened.
    pub async fn enter(
        ctx: SessionContext,
        room_id: RoomId,
        caller: PlayerId,
        display_name: &str,
    ) -> Result<(EnterOutcome, Self), DomainError> {
        let command = EnterRoom {
            correlation_id: Uuid::new_v4(),
            room_id,
            caller_id: caller.clone(),
            display_name: display_name.to_owned(),
        };
        let entered = handle_enter_room(&command, ctx.store.as_ref()).await?;
        let subscription = ctx.store.subscribe(command.room_id.as_str()).await?;

        let mut session = Self {
            ctx,
            caller,
            room: entered.room,
            subscription,
        };
        if let Some(latest) = session.subscription.latest() {
            session.observe(&latest)?;
        }
        info!(room_id = %command.room_id, caller_id = %session.caller, outcome = ?entered.outcome, "session opened");
        Ok((entered.outcome, session))
    }

    /// Replaces the snapshot if `document` is newer.
    fn observe(&mut self, document: &StoredDocument) -> Result<bool, DomainError> {
        if document.version <= self.room.version() {
            return Ok(false);
        }
        self.room = Room::from_stored(document)?;
        debug!(version = document.version, state = ?self.room.state(), "snapshot refreshed");
        Ok(true)
    }

    fn adopt(&mut self, room: Room) {
        if room.version() > self.room.version() {
            self.room = room;
        }
    }

    fn catch_up(&mut self) -> Result<(), DomainError> {
        if let Some(latest) = self.subscription.latest() {
            self.observe(&latest)?;
        }
        Ok(())
    }

    /// The room this session is in.
    #[must_use]
    pub fn room_id(&self) -> &RoomId {
        self.room.id()
    }

    /// The caller owning this session.
    #[must_use]
    pub fn caller(&self) -> &PlayerId {
        &self.caller
    }

    /// The latest snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &Room {
        &self.room
    }

    #[must_use]
    pub fn card_view(&self) -> CardView {
        view::card_view(&self.room, &self.caller)
    }

    #[must_use]
    pub fn turn_view(&self) -> Option<TurnView> {
        view::turn_view(&self.room, &self.caller)
    }

    #[must_use]
    pub fn view(&self) -> PlayerView {
        view::project(&self.room, &self.caller)
    }

    /// Final scores of the latest snapshot.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotPermitted` until the game is complete.
    pub fn scores(&self) -> Result<Vec<PlayerScore>, DomainError> {
        query_handlers::scores_for(&self.room)
    }

    /// Waits for a snapshot newer than the current one.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::StoreUnavailable` if the subscription closed.
    pub async fn next_snapshot(&mut self) -> Result<&Room, DomainError> {
        loop {
            let document = self.subscription.changed().await?;
            if self.observe(&document)? {
                return Ok(&self.room);
            }
        }
    }

    /// Starts the game. Only the host may start.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotPermitted` for anyone but the host, plus any
    /// error from `handle_start_game`.
    pub async fn start(&mut self, language: &str) -> Result<&Room, DomainError> {
        self.catch_up()?;
        if !self.card_view().is_host {
            return Err(DomainError::NotPermitted(format!(
                "only the host may start room {}",
                self.room.id()
            )));
        }
        let command = StartGame {
            correlation_id: Uuid::new_v4(),
            room_id: self.room.id().clone(),
            language: language.to_owned(),
        };
        let room = handle_start_game(&command, self.ctx.store.as_ref(), self.ctx.deck.as_ref())
            .await?;
        self.adopt(room);
        self.catch_up()?;
        Ok(&self.room)
    }

    /// Submits the caller's answer for the active round.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotPermitted` when no round is active or the
    /// caller may not change their answer yet, plus any error from
    /// `handle_submit_answer`.
    pub async fn submit_answer(&mut self, answer: &str) -> Result<&Room, DomainError> {
        self.catch_up()?;
        let allowed = self.turn_view().is_some_and(|turn| turn.allow_change);
        if !allowed {
            return Err(DomainError::NotPermitted(format!(
                "{} may not answer round {} right now",
                self.caller,
                self.room.active_round()
            )));
        }
        let command = SubmitAnswer {
            correlation_id: Uuid::new_v4(),
            room_id: self.room.id().clone(),
            caller_id: self.caller.clone(),
            round: self.room.active_round(),
            answer: answer.to_owned(),
        };
        let room = handle_submit_answer(&command, self.ctx.store.as_ref()).await?;
        self.adopt(room);
        self.catch_up()?;
        Ok(&self.room)
    }

    /// Advances past the active round. Only the round's active player may
    /// advance.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotPermitted` for anyone but the active player,
    /// plus any error from `handle_advance_round`.
    pub async fn advance_round(&mut self) -> Result<AdvanceOutcome, DomainError> {
        self.catch_up()?;
        if !self.card_view().is_active_player {
            return Err(DomainError::NotPermitted(format!(
                "only the active player may advance room {}",
                self.room.id()
            )));
        }
        let command = AdvanceRound {
            correlation_id: Uuid::new_v4(),
            room_id: self.room.id().clone(),
        };
        let outcome = handle_advance_round(&command, self.ctx.store.as_ref()).await?;
        self.catch_up()?;
        Ok(outcome)
    }

    /// Leaves the room view and releases the subscription.
    pub fn exit(self) {
        info!(room_id = %self.room.id(), caller_id = %self.caller, "session exited");
    }
}

//! Per-caller projection of a room snapshot.
//!
//! Views are recomputed from scratch on every snapshot and hold no state of
//! their own.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use sugar_core::model::{PlayerId, RoundNo, WordCard};

use crate::domain::aggregates::Room;

/// What the caller is asked to do right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Instruction {
    /// The caller is the active player.
    ActNow,
    /// The active player has not locked in their answer yet.
    WaitForActivePlayer,
    /// The caller may guess.
    GuessNow,
}

/// The caller's scorecard and the room's progress flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    /// One entry per round; the caller's own answer for past and present
    /// rounds, `None` for future or unanswered ones.
    pub answers: BTreeMap<RoundNo, Option<String>>,
    pub active_round: RoundNo,
    pub is_started: bool,
    pub is_round_over: bool,
    pub is_game_over: bool,
    pub is_active_player: bool,
    /// Whether the caller created the room and may start it.
    pub is_host: bool,
}

/// The active round as seen by the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnView {
    pub word_card: WordCard,
    pub selected_answer: Option<String>,
    /// Answers other players already submitted this round.
    pub used_answers: BTreeSet<String>,
    pub allow_change: bool,
    pub instruction: Instruction,
}

/// Both views for one caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub card: CardView,
    /// Absent before the game starts and after it ends.
    pub turn: Option<TurnView>,
}

fn is_active_player(room: &Room, caller: &PlayerId) -> bool {
    room.active_player().is_some_and(|p| &p.id == caller)
}

/// Projects the caller's scorecard.
#[must_use]
pub fn card_view(room: &Room, caller: &PlayerId) -> CardView {
    let active_round = room.active_round();
    let answers = if room.is_started() {
        (1..=room.last_round())
            .map(|round| {
                let answer = (round <= active_round)
                    .then(|| room.answer(round, caller))
                    .flatten()
                    .map(str::to_owned);
                (round, answer)
            })
            .collect()
    } else {
        BTreeMap::new()
    };

    CardView {
        answers,
        active_round,
        is_started: room.is_started(),
        is_round_over: room.is_started() && room.is_round_complete(active_round),
        is_game_over: room.is_game_complete(),
        is_active_player: is_active_player(room, caller),
        is_host: room.host().is_some_and(|p| &p.id == caller),
    }
}

/// Projects the active round, or `None` when no round is active.
#[must_use]
pub fn turn_view(room: &Room, caller: &PlayerId) -> Option<TurnView> {
    let active = room.active_player()?;
    let round = room.active_round();
    let index = usize::try_from(round.checked_sub(1)?).ok()?;
    let word_card = room.word_cards().get(index)?.clone();
    let answers = room.round_answers(round)?;

    let is_active = &active.id == caller;
    let selected_answer = answers.get(caller).cloned();
    let used_answers = answers
        .iter()
        .filter(|(id, _)| *id != caller)
        .map(|(_, answer)| answer.clone())
        .collect();
    let anchor_locked = answers.contains_key(&active.id);
    let allow_change = if is_active {
        selected_answer.is_none()
    } else {
        anchor_locked
    };
    let instruction = if is_active {
        Instruction::ActNow
    } else if allow_change {
        Instruction::GuessNow
    } else {
        Instruction::WaitForActivePlayer
    };

    Some(TurnView {
        word_card,
        selected_answer,
        used_answers,
        allow_change,
        instruction,
    })
}

/// Projects both views for `caller`.
#[must_use]
pub fn project(room: &Room, caller: &PlayerId) -> PlayerView {
    PlayerView {
        card: card_view(room, caller),
        turn: turn_view(room, caller),
    }
}

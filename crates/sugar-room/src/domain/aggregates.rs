//! Aggregate root for the Room context.
//!
//! A `Room` is decoded from the shared document on every read. Its intent
//! methods never mutate it; they validate against the snapshot and return
//! the partial write that would carry the room to its next state.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sugar_core::error::DomainError;
use sugar_core::model::{MAX_PLAYERS, Player, PlayerId, RoomId, RoundNo, WordCard};
use sugar_core::store::{DocumentPatch, FieldPath, StoredDocument};

/// Document field holding the ordered seats.
pub const PLAYERS_FIELD: &str = "players";
/// Document field flipped once when the game starts.
pub const IS_STARTED_FIELD: &str = "isStarted";
/// Document field holding the active round number.
pub const ACTIVE_ROUND_FIELD: &str = "activeRound";
/// Document field holding every round's answers.
pub const ROUNDS_INFO_FIELD: &str = "roundsInfo";
/// Document field holding the drawn cards, one per round.
pub const WORD_CARDS_FIELD: &str = "wordCards";

/// Answers recorded for one round, keyed by the answering player.
pub type RoundAnswers = BTreeMap<PlayerId, String>;

/// Persisted layout of a room document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoomDocument {
    #[serde(default)]
    players: Vec<Player>,
    #[serde(default)]
    is_started: bool,
    /// Zero until the game starts.
    #[serde(default)]
    active_round: RoundNo,
    #[serde(default)]
    rounds_info: BTreeMap<RoundNo, RoundAnswers>,
    #[serde(default)]
    word_cards: Vec<WordCard>,
}

/// Where a room is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "round", rename_all = "snake_case")]
pub enum RoomState {
    /// Seats are open; the game has not started.
    Lobby,
    /// The active round is still waiting for answers.
    RoundInProgress(RoundNo),
    /// Every current player has answered the active round.
    RoundComplete(RoundNo),
    /// Every player has had their turn.
    GameComplete,
}

/// How a caller is admitted by `Room::admit`.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    /// The caller already holds a seat; nothing to write.
    AlreadySeated,
    /// The caller takes the next seat by applying this write.
    Seat(DocumentPatch),
}

/// Result of advancing past a complete round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdvanceOutcome {
    /// The next round is now active.
    Advanced {
        /// The newly active round.
        round: RoundNo,
    },
    /// The last round finished; the room can now be scored.
    GameComplete,
}

/// The aggregate root for a room.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    id: RoomId,
    version: i64,
    #[serde(flatten)]
    document: RoomDocument,
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, DomainError> {
    serde_json::to_value(value)
        .map_err(|e| DomainError::Infrastructure(format!("room field serialization failed: {e}")))
}

impl Room {
    /// Decodes and validates a stored room document.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the body does not decode or
    /// breaks a room invariant (for example more than four seats, which only
    /// an unguarded concurrent join can produce).
    pub fn from_stored(stored: &StoredDocument) -> Result<Self, DomainError> {
        let id = RoomId::parse(&stored.key)?;
        let document: RoomDocument = serde_json::from_value(stored.body.clone()).map_err(|e| {
            DomainError::Infrastructure(format!("room {id} deserialization failed: {e}"))
        })?;
        let room = Self {
            id,
            version: stored.version,
            document,
        };
        room.check_invariants()?;
        Ok(room)
    }

    /// Body of a freshly created room seating only `caller`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if serialization fails.
    pub fn creation_body(caller: &Player) -> Result<Value, DomainError> {
        to_json(&RoomDocument {
            players: vec![caller.clone()],
            ..RoomDocument::default()
        })
    }

    fn check_invariants(&self) -> Result<(), DomainError> {
        let corrupt =
            |detail: String| DomainError::Infrastructure(format!("corrupt room {}: {detail}", self.id));
        let seats = self.player_count();
        if seats == 0 || seats > MAX_PLAYERS {
            return Err(corrupt(format!("{seats} players outside 1..={MAX_PLAYERS}")));
        }
        let unique: HashSet<&PlayerId> = self.document.players.iter().map(|p| &p.id).collect();
        if unique.len() != seats {
            return Err(corrupt("a player holds more than one seat".to_owned()));
        }

        let doc = &self.document;
        if doc.is_started {
            let last = self.last_round();
            if doc.word_cards.len() != seats {
                return Err(corrupt(format!(
                    "{} word cards for {seats} players",
                    doc.word_cards.len()
                )));
            }
            if !doc.rounds_info.keys().copied().eq(1..=last) {
                return Err(corrupt("rounds do not cover every seat".to_owned()));
            }
            if doc.active_round == 0 || doc.active_round > last + 1 {
                return Err(corrupt(format!("active round {} out of range", doc.active_round)));
            }
        } else if doc.active_round != 0 || !doc.rounds_info.is_empty() || !doc.word_cards.is_empty()
        {
            return Err(corrupt("round data present before start".to_owned()));
        }
        Ok(())
    }

    /// Returns the room identifier.
    #[must_use]
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Returns the document version this room was decoded from.
    #[must_use]
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Seats in join order.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.document.players
    }

    /// Number of seated players.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.document.players.len()
    }

    /// The last round number, equal to the number of seats.
    #[must_use]
    pub fn last_round(&self) -> RoundNo {
        RoundNo::try_from(self.player_count()).unwrap_or(RoundNo::MAX)
    }

    /// Whether the game has started.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.document.is_started
    }

    /// The active round; zero in the lobby and `last_round() + 1` once the
    /// game is over.
    #[must_use]
    pub fn active_round(&self) -> RoundNo {
        self.document.active_round
    }

    /// Every round's answers.
    #[must_use]
    pub fn rounds_info(&self) -> &BTreeMap<RoundNo, RoundAnswers> {
        &self.document.rounds_info
    }

    /// Answers recorded for `round`, if the round exists.
    #[must_use]
    pub fn round_answers(&self, round: RoundNo) -> Option<&RoundAnswers> {
        self.document.rounds_info.get(&round)
    }

    /// The answer `player` recorded for `round`.
    #[must_use]
    pub fn answer(&self, round: RoundNo, player: &PlayerId) -> Option<&str> {
        self.round_answers(round)
            .and_then(|answers| answers.get(player))
            .map(String::as_str)
    }

    /// Cards drawn at start; `word_cards()[r - 1]` belongs to round `r`.
    #[must_use]
    pub fn word_cards(&self) -> &[WordCard] {
        &self.document.word_cards
    }

    /// The player who created the room.
    #[must_use]
    pub fn host(&self) -> Option<&Player> {
        self.document.players.first()
    }

    /// Whether `player` holds a seat.
    #[must_use]
    pub fn is_member(&self, player: &PlayerId) -> bool {
        self.document.players.iter().any(|p| &p.id == player)
    }

    /// The player acting in `round`, i.e. `players[round - 1]`.
    #[must_use]
    pub fn player_for_round(&self, round: RoundNo) -> Option<&Player> {
        let index = usize::try_from(round.checked_sub(1)?).ok()?;
        self.document.players.get(index)
    }

    /// The player acting in the active round, while a round is active.
    #[must_use]
    pub fn active_player(&self) -> Option<&Player> {
        if !self.is_started() {
            return None;
        }
        self.player_for_round(self.active_round())
    }

    /// Whether every current player has an entry for `round`.
    #[must_use]
    pub fn is_round_complete(&self, round: RoundNo) -> bool {
        self.round_answers(round).is_some_and(|answers| {
            self.document
                .players
                .iter()
                .all(|p| answers.contains_key(&p.id))
        })
    }

    /// Whether every player has had their turn.
    #[must_use]
    pub fn is_game_complete(&self) -> bool {
        self.is_started() && self.active_round() > self.last_round()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> RoomState {
        let round = self.active_round();
        if !self.is_started() {
            RoomState::Lobby
        } else if self.is_game_complete() {
            RoomState::GameComplete
        } else if self.is_round_complete(round) {
            RoomState::RoundComplete(round)
        } else {
            RoomState::RoundInProgress(round)
        }
    }

    /// Decides whether `caller` may enter.
    ///
    /// A seat is written as the whole extended `players` list, guarded by
    /// this room's version so a concurrent join invalidates it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::RoomUnavailable` if the caller is not seated and
    /// the room has started or is full.
    pub fn admit(&self, caller: &Player) -> Result<Admission, DomainError> {
        if self.is_member(&caller.id) {
            return Ok(Admission::AlreadySeated);
        }
        if self.is_started() {
            return Err(DomainError::RoomUnavailable(format!(
                "room {} has already started",
                self.id
            )));
        }
        if self.player_count() >= MAX_PLAYERS {
            return Err(DomainError::RoomUnavailable(format!("room {} is full", self.id)));
        }

        let mut players = self.document.players.clone();
        players.push(caller.clone());
        Ok(Admission::Seat(
            DocumentPatch::new()
                .set(FieldPath::field(PLAYERS_FIELD), to_json(&players)?)
                .expect_version(self.version),
        ))
    }

    /// Builds the single write that starts the game with `cards`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AlreadyStarted` if the game has started and
    /// `DomainError::Validation` if there is not exactly one card per seat.
    pub fn start(&self, cards: &[WordCard]) -> Result<DocumentPatch, DomainError> {
        if self.is_started() {
            return Err(DomainError::AlreadyStarted(self.id.to_string()));
        }
        if cards.len() != self.player_count() {
            return Err(DomainError::Validation(format!(
                "expected {} word cards, got {}",
                self.player_count(),
                cards.len()
            )));
        }

        let rounds: BTreeMap<RoundNo, RoundAnswers> = (1..=self.last_round())
            .map(|round| (round, RoundAnswers::new()))
            .collect();
        Ok(DocumentPatch::new()
            .set(FieldPath::field(IS_STARTED_FIELD), json!(true))
            .set(FieldPath::field(ACTIVE_ROUND_FIELD), json!(1))
            .set(FieldPath::field(ROUNDS_INFO_FIELD), to_json(&rounds)?)
            .set(FieldPath::field(WORD_CARDS_FIELD), to_json(&cards)?)
            .expect_version(self.version))
    }

    /// Builds the write recording `caller`'s answer for `round`.
    ///
    /// Only the caller's own entry is touched, and only while `round` is
    /// still the active round at commit time. Whether the caller should be
    /// allowed to answer yet is a view-level policy, not checked here.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotPermitted` if the game has not started, is
    /// already complete, or the caller holds no seat. Returns
    /// `DomainError::StaleRound` if `round` is not the active round and
    /// `DomainError::Validation` for a blank answer.
    pub fn record_answer(
        &self,
        caller: &PlayerId,
        round: RoundNo,
        answer: &str,
    ) -> Result<DocumentPatch, DomainError> {
        if !self.is_started() {
            return Err(DomainError::NotPermitted(format!(
                "game in room {} has not started",
                self.id
            )));
        }
        if !self.is_member(caller) {
            return Err(DomainError::NotPermitted(format!(
                "{caller} holds no seat in room {}",
                self.id
            )));
        }
        // Past the last round there is no entry to write.
        if self.is_game_complete() {
            return Err(DomainError::NotPermitted(format!(
                "game in room {} is already complete",
                self.id
            )));
        }
        if round != self.active_round() {
            return Err(DomainError::StaleRound {
                room_id: self.id.to_string(),
                submitted: round,
                active: self.active_round(),
            });
        }
        if answer.trim().is_empty() {
            return Err(DomainError::Validation("answer must not be blank".to_owned()));
        }

        Ok(DocumentPatch::new()
            .guard(FieldPath::field(ACTIVE_ROUND_FIELD), json!(round))
            .set(
                FieldPath::field(ROUNDS_INFO_FIELD)
                    .child(round.to_string())
                    .child(caller.to_string()),
                json!(answer),
            ))
    }

    /// Builds the write moving past the active round.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotPermitted` if the game has not started or is
    /// already complete, and `DomainError::RoundNotComplete` while any
    /// current player has yet to answer.
    pub fn advance(&self) -> Result<(DocumentPatch, AdvanceOutcome), DomainError> {
        if !self.is_started() {
            return Err(DomainError::NotPermitted(format!(
                "game in room {} has not started",
                self.id
            )));
        }
        if self.is_game_complete() {
            return Err(DomainError::NotPermitted(format!(
                "game in room {} is already complete",
                self.id
            )));
        }
        let round = self.active_round();
        if !self.is_round_complete(round) {
            return Err(DomainError::RoundNotComplete {
                room_id: self.id.to_string(),
                round,
            });
        }

        let next = round + 1;
        let outcome = if next > self.last_round() {
            AdvanceOutcome::GameComplete
        } else {
            AdvanceOutcome::Advanced { round: next }
        };
        let patch = DocumentPatch::new()
            .guard(FieldPath::field(ACTIVE_ROUND_FIELD), json!(round))
            .set(FieldPath::field(ACTIVE_ROUND_FIELD), json!(next));
        Ok((patch, outcome))
    }
}

#[cfg(test)]
mod tests {
    use sugar_test_support::FixedClock;

    use super::*;

    fn stored(version: i64, body: Value) -> StoredDocument {
        StoredDocument {
            key: "kitchen".to_owned(),
            version,
            body,
            updated_at: FixedClock::default_instant().0,
        }
    }

    fn lobby(ids: &[&str]) -> Room {
        let players: Vec<Value> = ids
            .iter()
            .map(|id| json!({ "id": id, "displayName": id.to_uppercase() }))
            .collect();
        Room::from_stored(&stored(3, json!({ "players": players, "isStarted": false }))).unwrap()
    }

    fn started(ids: &[&str], active_round: u32, rounds: Value) -> Room {
        let players: Vec<Value> = ids
            .iter()
            .map(|id| json!({ "id": id, "displayName": id.to_uppercase() }))
            .collect();
        let cards: Vec<Value> = ids
            .iter()
            .map(|id| json!({ "word": format!("word-{id}"), "language": "tl" }))
            .collect();
        Room::from_stored(&stored(
            7,
            json!({
                "players": players,
                "isStarted": true,
                "activeRound": active_round,
                "roundsInfo": rounds,
                "wordCards": cards,
            }),
        ))
        .unwrap()
    }

    fn player(id: &str) -> Player {
        Player::new(PlayerId::new(id), id)
    }

    #[test]
    fn test_creation_body_seats_only_the_caller() {
        // Act
        let body = Room::creation_body(&player("a")).unwrap();
        let room = Room::from_stored(&stored(1, body)).unwrap();

        // Assert
        assert_eq!(room.players(), &[player("a")]);
        assert!(!room.is_started());
        assert_eq!(room.state(), RoomState::Lobby);
        assert_eq!(room.host().unwrap().id.as_str(), "a");
    }

    #[test]
    fn test_admit_existing_member_is_already_seated() {
        let room = lobby(&["a", "b"]);

        assert_eq!(room.admit(&player("b")).unwrap(), Admission::AlreadySeated);
    }

    #[test]
    fn test_admit_member_of_started_room_is_already_seated() {
        let room = started(&["a", "b"], 1, json!({ "1": {}, "2": {} }));

        assert_eq!(room.admit(&player("a")).unwrap(), Admission::AlreadySeated);
    }

    #[test]
    fn test_admit_new_player_appends_seat_with_version_guard() {
        // Arrange
        let room = lobby(&["a"]);

        // Act
        let admission = room.admit(&player("b")).unwrap();

        // Assert
        let Admission::Seat(patch) = admission else {
            panic!("expected a seat");
        };
        assert_eq!(patch.expected_version(), Some(3));
        let (path, value) = &patch.sets()[0];
        assert_eq!(path.to_string(), PLAYERS_FIELD);
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[1]["id"], "b");
    }

    #[test]
    fn test_admit_rejects_full_room() {
        let room = lobby(&["a", "b", "c", "d"]);

        match room.admit(&player("e")) {
            Err(DomainError::RoomUnavailable(msg)) => assert!(msg.contains("full")),
            other => panic!("expected RoomUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_admit_rejects_started_room_regardless_of_count() {
        let room = started(&["a", "b"], 1, json!({ "1": {}, "2": {} }));

        match room.admit(&player("c")) {
            Err(DomainError::RoomUnavailable(msg)) => assert!(msg.contains("started")),
            other => panic!("expected RoomUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_start_writes_all_four_fields_once() {
        // Arrange
        let room = lobby(&["a", "b", "c"]);
        let cards: Vec<WordCard> = ["x", "y", "z"].iter().map(|w| WordCard::new(*w, "tl")).collect();

        // Act
        let patch = room.start(&cards).unwrap();

        // Assert
        let fields: Vec<String> = patch.sets().iter().map(|(p, _)| p.to_string()).collect();
        assert_eq!(
            fields,
            vec![IS_STARTED_FIELD, ACTIVE_ROUND_FIELD, ROUNDS_INFO_FIELD, WORD_CARDS_FIELD]
        );
        assert_eq!(patch.sets()[2].1, json!({ "1": {}, "2": {}, "3": {} }));
        assert_eq!(patch.expected_version(), Some(3));
    }

    #[test]
    fn test_start_rejects_already_started_room() {
        let room = started(&["a", "b"], 1, json!({ "1": {}, "2": {} }));

        assert!(matches!(
            room.start(&[]),
            Err(DomainError::AlreadyStarted(id)) if id == "kitchen"
        ));
    }

    #[test]
    fn test_start_rejects_card_count_mismatch() {
        let room = lobby(&["a", "b"]);

        assert!(matches!(
            room.start(&[WordCard::new("x", "tl")]),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_record_answer_targets_only_the_callers_entry() {
        // Arrange
        let room = started(&["a", "b"], 2, json!({ "1": { "a": "x", "b": "x" }, "2": {} }));

        // Act
        let patch = room.record_answer(&PlayerId::new("a"), 2, "q").unwrap();

        // Assert
        assert_eq!(patch.sets().len(), 1);
        let (path, value) = &patch.sets()[0];
        assert_eq!(path.to_string(), "roundsInfo.2.a");
        assert_eq!(value, &json!("q"));
        assert_eq!(patch.expected_version(), None);
    }

    #[test]
    fn test_record_answer_for_past_round_is_stale() {
        let room = started(&["a", "b"], 2, json!({ "1": { "a": "x", "b": "x" }, "2": {} }));

        match room.record_answer(&PlayerId::new("b"), 1, "y") {
            Err(DomainError::StaleRound {
                submitted, active, ..
            }) => {
                assert_eq!(submitted, 1);
                assert_eq!(active, 2);
            }
            other => panic!("expected StaleRound, got {other:?}"),
        }
    }

    #[test]
    fn test_record_answer_after_game_over_is_not_permitted() {
        let room = started(
            &["a", "b"],
            3,
            json!({ "1": { "a": "x", "b": "y" }, "2": { "a": "p", "b": "p" } }),
        );

        for round in [2, 3] {
            match room.record_answer(&PlayerId::new("a"), round, "late") {
                Err(DomainError::NotPermitted(message)) => {
                    assert!(message.contains("already complete"));
                }
                other => panic!("expected NotPermitted, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_record_answer_before_start_is_not_permitted() {
        let room = lobby(&["a", "b"]);

        assert!(matches!(
            room.record_answer(&PlayerId::new("a"), 1, "x"),
            Err(DomainError::NotPermitted(_))
        ));
    }

    #[test]
    fn test_record_answer_by_stranger_is_not_permitted() {
        let room = started(&["a", "b"], 1, json!({ "1": {}, "2": {} }));

        assert!(matches!(
            room.record_answer(&PlayerId::new("z"), 1, "x"),
            Err(DomainError::NotPermitted(_))
        ));
    }

    #[test]
    fn test_advance_incomplete_round_is_rejected() {
        let room = started(&["a", "b"], 1, json!({ "1": { "a": "x" }, "2": {} }));

        assert_eq!(room.state(), RoomState::RoundInProgress(1));
        assert!(matches!(
            room.advance(),
            Err(DomainError::RoundNotComplete { round: 1, .. })
        ));
    }

    #[test]
    fn test_advance_complete_round_moves_to_next() {
        // Arrange
        let room = started(&["a", "b"], 1, json!({ "1": { "a": "x", "b": "y" }, "2": {} }));
        assert_eq!(room.state(), RoomState::RoundComplete(1));

        // Act
        let (patch, outcome) = room.advance().unwrap();

        // Assert
        assert_eq!(outcome, AdvanceOutcome::Advanced { round: 2 });
        assert_eq!(patch.sets()[0].1, json!(2));
    }

    #[test]
    fn test_advance_last_round_completes_game() {
        let room = started(
            &["a", "b"],
            2,
            json!({ "1": { "a": "x", "b": "y" }, "2": { "a": "p", "b": "p" } }),
        );

        let (_, outcome) = room.advance().unwrap();

        assert_eq!(outcome, AdvanceOutcome::GameComplete);
    }

    #[test]
    fn test_completed_game_cannot_advance() {
        let room = started(
            &["a", "b"],
            3,
            json!({ "1": { "a": "x", "b": "y" }, "2": { "a": "p", "b": "p" } }),
        );

        assert_eq!(room.state(), RoomState::GameComplete);
        assert!(room.active_player().is_none());
        assert!(matches!(room.advance(), Err(DomainError::NotPermitted(_))));
    }

    #[test]
    fn test_active_player_follows_join_order() {
        let room = started(&["a", "b", "c"], 2, json!({ "1": {}, "2": {}, "3": {} }));

        assert_eq!(room.active_player().unwrap().id.as_str(), "b");
    }

    #[test]
    fn test_round_with_departed_key_still_needs_every_seat() {
        let room = started(&["a", "b"], 1, json!({ "1": { "a": "x", "ghost": "x" }, "2": {} }));

        assert!(!room.is_round_complete(1));
    }

    #[test]
    fn test_five_seats_are_flagged_as_corrupt() {
        let players: Vec<Value> = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|id| json!({ "id": id, "displayName": id }))
            .collect();

        let result = Room::from_stored(&stored(5, json!({ "players": players })));

        match result {
            Err(DomainError::Infrastructure(msg)) => assert!(msg.contains("5 players")),
            other => panic!("expected Infrastructure, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_seat_is_flagged_as_corrupt() {
        let body = json!({ "players": [
            { "id": "a", "displayName": "A" },
            { "id": "a", "displayName": "A again" }
        ] });

        assert!(matches!(
            Room::from_stored(&stored(2, body)),
            Err(DomainError::Infrastructure(_))
        ));
    }

    #[test]
    fn test_started_room_with_missing_cards_is_flagged_as_corrupt() {
        let body = json!({
            "players": [{ "id": "a", "displayName": "A" }, { "id": "b", "displayName": "B" }],
            "isStarted": true,
            "activeRound": 1,
            "roundsInfo": { "1": {}, "2": {} },
            "wordCards": [{ "word": "x", "language": "tl" }]
        });

        assert!(matches!(
            Room::from_stored(&stored(2, body)),
            Err(DomainError::Infrastructure(_))
        ));
    }
}

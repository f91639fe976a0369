//! Final scores from completed round data.

use std::collections::BTreeMap;

use serde::Serialize;
use sugar_core::error::DomainError;
use sugar_core::model::{Player, RoundNo};

use crate::domain::aggregates::RoundAnswers;

/// A player's total across every round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerScore {
    /// The scored player.
    pub player: Player,
    /// Points earned.
    pub score: u32,
}

fn missing(round: RoundNo, player: &Player) -> DomainError {
    DomainError::Validation(format!(
        "round {round} has no answer from {}",
        player.id
    ))
}

/// Scores a finished game, in seat order.
///
/// In round `r` the anchor is `players[r - 1]`'s own answer. Each guesser who
/// matches it earns a point, and the active player earns one point per
/// other entry that matches.
///
/// # Errors
///
/// Returns `DomainError::Validation` if any round lacks an entry for any
/// player.
pub fn score(
    players: &[Player],
    rounds_info: &BTreeMap<RoundNo, RoundAnswers>,
) -> Result<Vec<PlayerScore>, DomainError> {
    let mut totals = vec![0u32; players.len()];

    for (round, active) in (1..).zip(players) {
        let answers = rounds_info
            .get(&round)
            .ok_or_else(|| missing(round, active))?;
        let anchor = answers.get(&active.id).ok_or_else(|| missing(round, active))?;

        for (index, player) in players.iter().enumerate() {
            let answer = answers.get(&player.id).ok_or_else(|| missing(round, player))?;
            let contribution = if player.id == active.id {
                let matches = answers.values().filter(|a| *a == anchor).count();
                u32::try_from(matches.saturating_sub(1)).unwrap_or(u32::MAX)
            } else {
                u32::from(answer == anchor)
            };
            totals[index] += contribution;
        }
    }

    Ok(players
        .iter()
        .cloned()
        .zip(totals)
        .map(|(player, score)| PlayerScore { player, score })
        .collect())
}

#[cfg(test)]
mod tests {
    use sugar_core::model::PlayerId;

    use super::*;

    fn players(ids: &[&str]) -> Vec<Player> {
        ids.iter().map(|id| Player::new(PlayerId::new(*id), *id)).collect()
    }

    fn round(entries: &[(&str, &str)]) -> RoundAnswers {
        entries
            .iter()
            .map(|(id, answer)| (PlayerId::new(*id), (*answer).to_owned()))
            .collect()
    }

    fn totals(scores: &[PlayerScore]) -> Vec<(&str, u32)> {
        scores
            .iter()
            .map(|s| (s.player.id.as_str(), s.score))
            .collect()
    }

    #[test]
    fn test_three_player_game_totals() {
        // Arrange
        let seats = players(&["A", "B", "C"]);
        let rounds = BTreeMap::from([
            (1, round(&[("A", "x"), ("B", "x"), ("C", "y")])),
            (2, round(&[("A", "p"), ("B", "p"), ("C", "p")])),
            (3, round(&[("A", "z"), ("B", "q"), ("C", "q")])),
        ]);

        // Act
        let scores = score(&seats, &rounds).unwrap();

        // Assert
        assert_eq!(totals(&scores), vec![("A", 2), ("B", 3), ("C", 1)]);
    }

    #[test]
    fn test_nobody_matching_the_anchor_scores_zero() {
        let seats = players(&["A", "B"]);
        let rounds = BTreeMap::from([
            (1, round(&[("A", "x"), ("B", "y")])),
            (2, round(&[("A", "x"), ("B", "y")])),
        ]);

        let scores = score(&seats, &rounds).unwrap();

        assert_eq!(totals(&scores), vec![("A", 0), ("B", 0)]);
    }

    #[test]
    fn test_lone_host_scores_zero() {
        let seats = players(&["A"]);
        let rounds = BTreeMap::from([(1, round(&[("A", "x")]))]);

        let scores = score(&seats, &rounds).unwrap();

        assert_eq!(totals(&scores), vec![("A", 0)]);
    }

    #[test]
    fn test_missing_guess_is_rejected() {
        let seats = players(&["A", "B"]);
        let rounds = BTreeMap::from([
            (1, round(&[("A", "x"), ("B", "x")])),
            (2, round(&[("B", "y")])),
        ]);

        match score(&seats, &rounds) {
            Err(DomainError::Validation(msg)) => assert!(msg.contains("round 2")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_round_is_rejected() {
        let seats = players(&["A", "B"]);
        let rounds = BTreeMap::from([(1, round(&[("A", "x"), ("B", "x")]))]);

        assert!(matches!(
            score(&seats, &rounds),
            Err(DomainError::Validation(_))
        ));
    }
}

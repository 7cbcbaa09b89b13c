//! Read-only aggregation over completed rounds.
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::category::HeatLevel;
use crate::model::{Player, PlayerId};
use crate::session::GameSession;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub player: Player,
    /// Completed rounds in which this player named the author.
    pub correct_guesses: usize,
    /// Completed rounds that revealed one of this player's confessions.
    pub confessions_revealed: usize,
    /// `correct_guesses / total_rounds * 100`, or 0 before any round completes.
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStats {
    pub total_rounds: usize,
    pub heat_level: HeatLevel,
    /// One entry per seated player, in roster order.
    pub player_stats: Vec<PlayerStats>,
}

impl GameStats {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_session(session: &GameSession) -> Self {
        let rounds = &session.completed_rounds;
        let total_rounds = rounds.len();
        let player_stats = session
            .players
            .iter()
            .map(|player| {
                let correct_guesses = rounds
                    .iter()
                    .filter(|round| round.correct_guesses.contains(&player.id))
                    .count();
                let confessions_revealed = rounds
                    .iter()
                    .filter(|round| round.author() == &player.id)
                    .count();
                let accuracy = if total_rounds == 0 {
                    0.0
                } else {
                    correct_guesses as f64 / total_rounds as f64 * 100.0
                };
                PlayerStats {
                    player: player.clone(),
                    correct_guesses,
                    confessions_revealed,
                    accuracy,
                }
            })
            .collect();

        Self {
            total_rounds,
            heat_level: session.heat_level,
            player_stats,
        }
    }

    #[must_use]
    pub fn for_player(&self, id: &PlayerId) -> Option<&PlayerStats> {
        self.player_stats.iter().find(|s| &s.player.id == id)
    }

    /// Leaderboard view: most correct guesses first, ties broken by accuracy
    /// and then roster order.
    #[must_use]
    pub fn ranked(&self) -> Vec<&PlayerStats> {
        let mut ranked: Vec<&PlayerStats> = self.player_stats.iter().collect();
        ranked.sort_by(|a, b| {
            b.correct_guesses.cmp(&a.correct_guesses).then_with(|| {
                b.accuracy
                    .partial_cmp(&a.accuracy)
                    .unwrap_or(Ordering::Equal)
            })
        });
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use crate::model::{Confession, ConfessionId, Round, SessionId};
    use chrono::Utc;

    fn session_with_rounds() -> GameSession {
        let mut session = GameSession::new(SessionId::from("s"), Utc::now());
        session.players = ["a", "b", "c", "d"]
            .iter()
            .enumerate()
            .map(|(slot, id)| Player::new(PlayerId::from(*id), id.to_uppercase(), slot))
            .collect();
        for (idx, (author, correct)) in [("b", vec!["a", "c"]), ("a", vec!["c"])]
            .into_iter()
            .enumerate()
        {
            let mut round = Round::new(Confession {
                id: ConfessionId::new(format!("c{idx}")),
                player_id: PlayerId::from(author),
                text: "I still eat cereal for dinner".into(),
                category: Category::Funny,
                is_used: true,
            });
            round.correct_guesses = correct.into_iter().map(PlayerId::from).collect();
            round.revealed = true;
            session.completed_rounds.push(round);
        }
        session
    }

    #[test]
    fn aggregates_correct_guesses_and_exposure() {
        let stats = GameStats::from_session(&session_with_rounds());
        assert_eq!(stats.total_rounds, 2);
        assert_eq!(stats.heat_level, HeatLevel::MIN);

        let c = stats.for_player(&PlayerId::from("c")).unwrap();
        assert_eq!(c.correct_guesses, 2);
        assert!((c.accuracy - 100.0).abs() < f64::EPSILON);

        let a = stats.for_player(&PlayerId::from("a")).unwrap();
        assert_eq!(a.correct_guesses, 1);
        assert_eq!(a.confessions_revealed, 1);
        assert!((a.accuracy - 50.0).abs() < f64::EPSILON);

        let d = stats.for_player(&PlayerId::from("d")).unwrap();
        assert_eq!(d.correct_guesses, 0);
        assert!(d.accuracy.abs() < f64::EPSILON);
    }

    #[test]
    fn accuracy_is_zero_without_rounds() {
        let mut session = session_with_rounds();
        session.completed_rounds.clear();
        let stats = GameStats::from_session(&session);
        assert!(stats.player_stats.iter().all(|s| s.accuracy == 0.0));
        assert_eq!(stats.player_stats.len(), 4);
    }

    #[test]
    fn ranked_puts_best_guessers_first() {
        let stats = GameStats::from_session(&session_with_rounds());
        let order: Vec<_> = stats.ranked().iter().map(|s| s.player.id.to_string()).collect();
        assert_eq!(order, ["c", "a", "b", "d"]);
    }
}

//! Reveal scoring: who guessed right, who guessed wrong, and the vote tally.
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::model::{Confession, Player, PlayerId, Round};

/// Votes received by one candidate. The author is never a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    pub player_id: PlayerId,
    pub player_name: String,
    pub votes: u32,
}

/// How a player fared in a revealed round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuessOutcome {
    /// Named the author; hands out drinks.
    Correct,
    /// Named someone else; drinks.
    Wrong,
    /// Wrote the confession. Their own vote is not scored.
    Author,
    /// Did not vote.
    Abstained,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
    pub confession: Confession,
    /// `None` when the author has since left the table.
    pub author: Option<Player>,
    /// Raw votes naming the author, the author's own included.
    pub author_votes: u32,
    pub tallies: Vec<VoteTally>,
    pub correct_guessers: Vec<Player>,
    pub wrong_guessers: Vec<Player>,
}

/// Voters other than the author whose vote named the author.
pub(crate) fn correct_voters(round: &Round) -> BTreeSet<PlayerId> {
    let author = round.author();
    round
        .votes
        .iter()
        .filter(|(voter, target)| *voter != author && *target == author)
        .map(|(voter, _)| voter.clone())
        .collect()
}

impl RoundResult {
    /// Derive the result bundle from a revealed round and the current roster.
    /// Guesser lists follow roster order.
    #[must_use]
    pub fn from_round(round: &Round, players: &[Player]) -> Self {
        let author_id = round.author();
        let counts = round.vote_counts();

        let tallies = players
            .iter()
            .filter(|p| &p.id != author_id)
            .map(|p| VoteTally {
                player_id: p.id.clone(),
                player_name: p.name.clone(),
                votes: counts.get(&p.id).copied().unwrap_or(0),
            })
            .collect();

        let mut correct_guessers = Vec::new();
        let mut wrong_guessers = Vec::new();
        for player in players {
            if &player.id == author_id || !round.has_voted(&player.id) {
                continue;
            }
            if round.correct_guesses.contains(&player.id) {
                correct_guessers.push(player.clone());
            } else {
                wrong_guessers.push(player.clone());
            }
        }

        Self {
            confession: round.confession.clone(),
            author: players.iter().find(|p| &p.id == author_id).cloned(),
            author_votes: counts.get(author_id).copied().unwrap_or(0),
            tallies,
            correct_guessers,
            wrong_guessers,
        }
    }

    #[must_use]
    pub fn outcome_for(&self, player: &PlayerId) -> GuessOutcome {
        if &self.confession.player_id == player {
            GuessOutcome::Author
        } else if self.correct_guessers.iter().any(|p| &p.id == player) {
            GuessOutcome::Correct
        } else if self.wrong_guessers.iter().any(|p| &p.id == player) {
            GuessOutcome::Wrong
        } else {
            GuessOutcome::Abstained
        }
    }

    /// Votes received by `player`, the author included; zero for an unknown id.
    #[must_use]
    pub fn tally_for(&self, player: &PlayerId) -> u32 {
        if &self.confession.player_id == player {
            return self.author_votes;
        }
        self.tallies
            .iter()
            .find(|t| &t.player_id == player)
            .map_or(0, |t| t.votes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use crate::model::ConfessionId;

    fn roster() -> Vec<Player> {
        ["a", "b", "c", "d"]
            .iter()
            .enumerate()
            .map(|(slot, id)| Player::new(PlayerId::from(*id), id.to_uppercase(), slot))
            .collect()
    }

    fn round_by(author: &str, votes: &[(&str, &str)]) -> Round {
        let mut round = Round::new(Confession {
            id: ConfessionId::from("c1"),
            player_id: PlayerId::from(author),
            text: "I once fake-laughed at a joke".into(),
            category: Category::Funny,
            is_used: true,
        });
        for (voter, target) in votes {
            round.votes.insert(PlayerId::from(*voter), PlayerId::from(*target));
        }
        round.correct_guesses = correct_voters(&round);
        round.revealed = true;
        round
    }

    #[test]
    fn author_vote_is_not_scored() {
        let round = round_by("b", &[("a", "b"), ("b", "c"), ("c", "b"), ("d", "a")]);
        let result = RoundResult::from_round(&round, &roster());

        let ids = |players: &[Player]| players.iter().map(|p| p.id.to_string()).collect::<Vec<_>>();
        assert_eq!(ids(&result.correct_guessers), ["a", "c"]);
        assert_eq!(ids(&result.wrong_guessers), ["d"]);
        assert_eq!(result.author.as_ref().map(|p| p.name.as_str()), Some("B"));

        assert_eq!(result.tallies.len(), 3);
        assert!(result.tallies.iter().all(|t| t.player_id.as_str() != "b"));
        assert_eq!(result.tally_for(&PlayerId::from("c")), 1);
        assert_eq!(result.tally_for(&PlayerId::from("a")), 1);
        assert_eq!(result.tally_for(&PlayerId::from("b")), 2);
        assert_eq!(result.tally_for(&PlayerId::from("z")), 0);

        assert_eq!(result.outcome_for(&PlayerId::from("b")), GuessOutcome::Author);
        assert_eq!(result.outcome_for(&PlayerId::from("a")), GuessOutcome::Correct);
        assert_eq!(result.outcome_for(&PlayerId::from("d")), GuessOutcome::Wrong);
    }

    #[test]
    fn missing_voters_abstain() {
        let round = round_by("a", &[("b", "a")]);
        let result = RoundResult::from_round(&round, &roster());
        assert_eq!(result.outcome_for(&PlayerId::from("c")), GuessOutcome::Abstained);
        assert_eq!(result.correct_guessers.len(), 1);
        assert!(result.wrong_guessers.is_empty());
    }

    #[test]
    fn departed_author_resolves_to_none() {
        let round = round_by("z", &[("a", "b"), ("b", "c")]);
        let result = RoundResult::from_round(&round, &roster());
        assert!(result.author.is_none());
        assert_eq!(result.tallies.len(), 4);
        assert_eq!(result.wrong_guessers.len(), 2);
    }
}

//! The game session record and the rules that mutate it.
//!
//! Methods here validate and mutate a session in place. They never persist or
//! publish; `SessionEngine` runs them against a draft copy and commits the
//! draft only when they succeed.
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::category::{Category, HeatLevel};
use crate::config::RulesConfig;
use crate::error::{GameError, StateError, ValidationError};
use crate::model::{Confession, ConfessionId, Player, PlayerId, Round, SessionId};
use crate::reveal::{RoundResult, correct_voters};
use crate::rng::SessionRng;
use crate::selection::pick_confession;

/// Session phase. Only ever advances.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    #[default]
    Setup,
    Confessions,
    Playing,
    Finished,
}

impl GameStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Confessions => "confessions",
            Self::Playing => "playing",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    pub id: SessionId,
    pub players: Vec<Player>,
    pub confessions: Vec<Confession>,
    pub current_round: Option<Round>,
    pub completed_rounds: Vec<Round>,
    pub heat_level: HeatLevel,
    pub created_at: DateTime<Utc>,
    pub status: GameStatus,
}

impl GameSession {
    #[must_use]
    pub fn new(id: SessionId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            players: Vec::new(),
            confessions: Vec::new(),
            current_round: None,
            completed_rounds: Vec::new(),
            heat_level: HeatLevel::MIN,
            created_at,
            status: GameStatus::Setup,
        }
    }

    #[must_use]
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    #[must_use]
    pub fn has_player(&self, id: &PlayerId) -> bool {
        self.player(id).is_some()
    }

    fn require_player(&self, id: &PlayerId) -> Result<&Player, GameError> {
        self.player(id).ok_or_else(|| GameError::NotFound(id.clone()))
    }

    fn require_phase(
        &self,
        operation: &'static str,
        allowed: &[GameStatus],
    ) -> Result<(), StateError> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(StateError::WrongPhase {
                operation,
                status: self.status,
            })
        }
    }

    // Roster -----------------------------------------------------------------

    /// Seat a new player styled by their roster position.
    ///
    /// # Errors
    ///
    /// `Validation` for a name outside the configured length, `Capacity` when
    /// the table is full, `DuplicateName` for a case-insensitive name clash.
    pub fn add_player(
        &mut self,
        name: &str,
        rules: &RulesConfig,
        rng: &mut SessionRng,
    ) -> Result<Player, GameError> {
        let name = name.trim();
        let chars = name.chars().count();
        if !rules.name_length.contains(chars) {
            return Err(ValidationError::NameLength {
                min: rules.name_length.min,
                max: rules.name_length.max,
                actual: chars,
            }
            .into());
        }
        if self.players.len() >= rules.max_players {
            return Err(GameError::Capacity {
                max: rules.max_players,
            });
        }
        let folded = name.to_lowercase();
        if self.players.iter().any(|p| p.name.to_lowercase() == folded) {
            return Err(GameError::DuplicateName {
                name: name.to_string(),
            });
        }

        let id = rng.next_id(|candidate| self.players.iter().any(|p| p.id.as_str() == candidate));
        let player = Player::new(PlayerId::new(id), name.to_string(), self.players.len());
        log::debug!("seated {} as {} (slot {})", player.name, player.id, self.players.len());
        self.players.push(player.clone());
        Ok(player)
    }

    /// Remove a player and reflow every remaining seat's color and avatar.
    /// Returns `false` when no such player is seated.
    ///
    /// Their confessions and any completed rounds are left untouched. A vote
    /// they cast in an unrevealed round is withdrawn.
    pub fn remove_player(&mut self, id: &PlayerId) -> bool {
        let before = self.players.len();
        self.players.retain(|p| &p.id != id);
        if self.players.len() == before {
            return false;
        }
        for (slot, player) in self.players.iter_mut().enumerate() {
            player.restyle(slot);
        }
        if let Some(round) = self.current_round.as_mut().filter(|round| !round.revealed) {
            round.votes.remove(id);
        }
        log::debug!("removed player {id}, {} remain", self.players.len());
        true
    }

    // Confessions ------------------------------------------------------------

    /// Open the confession-writing phase.
    ///
    /// # Errors
    ///
    /// `State` once play has started, `Validation` below the minimum roster.
    pub fn start_confessions(&mut self, rules: &RulesConfig) -> Result<(), GameError> {
        self.require_phase(
            "start_confessions",
            &[GameStatus::Setup, GameStatus::Confessions],
        )?;
        if self.players.len() < rules.min_players {
            return Err(ValidationError::NotEnoughPlayers {
                min: rules.min_players,
                actual: self.players.len(),
            }
            .into());
        }
        self.status = GameStatus::Confessions;
        log::info!("session {} collecting confessions", self.id);
        Ok(())
    }

    /// Add a confession to the pool on behalf of `author`.
    ///
    /// # Errors
    ///
    /// `Validation` when the trimmed text is outside the configured length,
    /// `NotFound` when `author` is not seated.
    pub fn add_confession(
        &mut self,
        author: &PlayerId,
        text: &str,
        category: Category,
        rules: &RulesConfig,
        rng: &mut SessionRng,
    ) -> Result<Confession, GameError> {
        let text = text.trim();
        let chars = text.chars().count();
        if !rules.confession_length.contains(chars) {
            return Err(ValidationError::ConfessionLength {
                min: rules.confession_length.min,
                max: rules.confession_length.max,
                actual: chars,
            }
            .into());
        }
        self.require_player(author)?;

        let id = rng.next_id(|candidate| {
            self.confessions
                .iter()
                .any(|c| c.id.as_str() == candidate)
        });
        let confession = Confession {
            id: ConfessionId::new(id),
            player_id: author.clone(),
            text: text.to_string(),
            category,
            is_used: false,
        };
        log::debug!(
            "player {author} added confession {} ({category})",
            confession.id
        );
        self.confessions.push(confession.clone());
        Ok(confession)
    }

    pub fn player_confessions<'a>(
        &'a self,
        author: &'a PlayerId,
    ) -> impl Iterator<Item = &'a Confession> + 'a {
        self.confessions
            .iter()
            .filter(move |c| &c.player_id == author)
    }

    #[must_use]
    pub fn confession_count(&self, author: &PlayerId) -> usize {
        self.player_confessions(author).count()
    }

    /// Seated players still below `min` confessions.
    #[must_use]
    pub fn players_missing_confessions(&self, min: usize) -> Vec<&Player> {
        self.players
            .iter()
            .filter(|p| self.confession_count(&p.id) < min)
            .collect()
    }

    #[must_use]
    pub fn all_players_have_confessions(&self, min: usize) -> bool {
        self.players_missing_confessions(min).is_empty()
    }

    // Rounds -----------------------------------------------------------------

    /// Begin play and draw the first round. Returns whether a round started;
    /// a pool with nothing eligible at heat 1 finishes the game immediately.
    ///
    /// # Errors
    ///
    /// `State` once play has started, `Validation` when the roster is short
    /// or somebody has not written enough confessions.
    pub fn start_game<R: Rng + ?Sized>(
        &mut self,
        rules: &RulesConfig,
        rng: &mut R,
    ) -> Result<bool, GameError> {
        self.require_phase("start_game", &[GameStatus::Setup, GameStatus::Confessions])?;
        if self.players.len() < rules.min_players {
            return Err(ValidationError::NotEnoughPlayers {
                min: rules.min_players,
                actual: self.players.len(),
            }
            .into());
        }
        let missing = self
            .players_missing_confessions(rules.min_confessions_per_player)
            .len();
        if missing > 0 {
            return Err(ValidationError::MissingConfessions {
                min: rules.min_confessions_per_player,
                missing,
            }
            .into());
        }
        self.status = GameStatus::Playing;
        log::info!(
            "session {} started with {} players and {} confessions",
            self.id,
            self.players.len(),
            self.confessions.len()
        );
        self.next_round(rules, rng)
    }

    /// Archive a revealed round, escalate heat on every Nth completed round,
    /// then draw the next confession. Returns `false` once the game is over.
    ///
    /// # Errors
    ///
    /// `State` before play has started or while the current round is still
    /// unrevealed.
    pub fn next_round<R: Rng + ?Sized>(
        &mut self,
        rules: &RulesConfig,
        rng: &mut R,
    ) -> Result<bool, GameError> {
        match self.status {
            GameStatus::Finished => return Ok(false),
            GameStatus::Playing => {}
            status => {
                return Err(StateError::WrongPhase {
                    operation: "next_round",
                    status,
                }
                .into());
            }
        }
        if self.current_round.as_ref().is_some_and(|r| !r.revealed) {
            return Err(StateError::RoundNotRevealed.into());
        }

        if let Some(round) = self.current_round.take() {
            self.completed_rounds.push(round);
            let completed = self.completed_rounds.len();
            // A zero step never escalates.
            let step_done = completed.checked_rem(rules.rounds_per_heat_step) == Some(0);
            if step_done && !self.heat_level.is_max() {
                self.heat_level = self.heat_level.escalated();
                log::info!(
                    "session {} heat rose to {} after {completed} rounds",
                    self.id,
                    self.heat_level
                );
            }
        }

        let Some(idx) = pick_confession(&self.confessions, self.heat_level, rng) else {
            self.status = GameStatus::Finished;
            log::info!(
                "session {} finished after {} rounds",
                self.id,
                self.completed_rounds.len()
            );
            return Ok(false);
        };
        let confession = &mut self.confessions[idx];
        confession.is_used = true;
        self.current_round = Some(Round::new(confession.clone()));
        Ok(true)
    }

    fn open_round_mut(&mut self) -> Result<&mut Round, StateError> {
        let round = self
            .current_round
            .as_mut()
            .ok_or(StateError::NoCurrentRound)?;
        if round.revealed {
            return Err(StateError::RoundAlreadyRevealed);
        }
        Ok(round)
    }

    /// Record `voter`'s guess. The author votes like everyone else.
    ///
    /// # Errors
    ///
    /// `State` without an open round, `NotFound` for an unseated id,
    /// `DuplicateVote` on a second vote, `SelfVote` when voting for oneself.
    pub fn vote(&mut self, voter: &PlayerId, voted_for: &PlayerId) -> Result<(), GameError> {
        self.open_round_mut()?;
        self.require_player(voter)?;
        self.require_player(voted_for)?;
        let round = self.open_round_mut()?;
        if round.has_voted(voter) {
            return Err(GameError::DuplicateVote(voter.clone()));
        }
        if voter == voted_for {
            return Err(GameError::SelfVote(voter.clone()));
        }
        round.votes.insert(voter.clone(), voted_for.clone());
        log::debug!("{voter} cast a vote ({} in)", round.votes.len());
        Ok(())
    }

    #[must_use]
    pub fn has_voted(&self, voter: &PlayerId) -> bool {
        self.current_round
            .as_ref()
            .is_some_and(|round| round.has_voted(voter))
    }

    /// True when every seated player has voted in the current round.
    #[must_use]
    pub fn all_players_voted(&self) -> bool {
        self.current_round.as_ref().is_some_and(|round| {
            self.players.iter().all(|p| round.has_voted(&p.id))
        })
    }

    #[must_use]
    pub fn pending_voters(&self) -> Vec<&Player> {
        match &self.current_round {
            Some(round) => self
                .players
                .iter()
                .filter(|p| !round.has_voted(&p.id))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Players that can be named as the author: everyone but the author.
    #[must_use]
    pub fn vote_candidates(&self) -> Vec<&Player> {
        match &self.current_round {
            Some(round) => self
                .players
                .iter()
                .filter(|p| &p.id != round.author())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Flip the current round to revealed and record correct guesses.
    /// Returns `false` when it was already revealed; nothing changes then.
    ///
    /// # Errors
    ///
    /// `State` when there is no current round.
    pub fn reveal_round(&mut self) -> Result<bool, GameError> {
        let round = self
            .current_round
            .as_mut()
            .ok_or(StateError::NoCurrentRound)?;
        if round.revealed {
            return Ok(false);
        }
        round.correct_guesses = correct_voters(round);
        round.table.clone_from(&self.players);
        round.revealed = true;
        log::info!(
            "revealed confession {}: {}/{} guessed right",
            round.confession.id,
            round.correct_guesses.len(),
            round.votes.len()
        );
        Ok(true)
    }

    /// Result bundle for the current round, once revealed. Scored against
    /// the table as it sat at reveal, so later departures do not change it.
    #[must_use]
    pub fn round_result(&self) -> Option<RoundResult> {
        let round = self.current_round.as_ref().filter(|round| round.revealed)?;
        let table = if round.table.is_empty() {
            &self.players
        } else {
            &round.table
        };
        Some(RoundResult::from_round(round, table))
    }
}

//! Error taxonomy for engine operations.
//!
//! Every variant is recoverable: a failed operation leaves the live session
//! exactly as it was before the call.
use thiserror::Error;

use crate::model::PlayerId;
use crate::session::GameStatus;

/// Preconditions on the session, its phase, or submitted input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no active game session")]
    NoActiveSession,
    #[error("at least {min} players are required (have {actual})")]
    NotEnoughPlayers { min: usize, actual: usize },
    #[error("player name must be {min}-{max} characters (got {actual})")]
    NameLength { min: usize, max: usize, actual: usize },
    #[error("confession must be {min}-{max} characters (got {actual})")]
    ConfessionLength { min: usize, max: usize, actual: usize },
    #[error("every player needs at least {min} confessions ({missing} still short)")]
    MissingConfessions { min: usize, missing: usize },
}

/// Operation is invalid for the current round or phase.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("no round in progress")]
    NoCurrentRound,
    #[error("the current round has already been revealed")]
    RoundAlreadyRevealed,
    #[error("the current round must be revealed first")]
    RoundNotRevealed,
    #[error("{operation} is not allowed while the game is {status}")]
    WrongPhase {
        operation: &'static str,
        status: GameStatus,
    },
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("the table is full ({max} players)")]
    Capacity { max: usize },
    #[error("a player named {name:?} already exists")]
    DuplicateName { name: String },
    #[error("player {0} has already voted this round")]
    DuplicateVote(PlayerId),
    #[error("player {0} cannot vote for themselves")]
    SelfVote(PlayerId),
    #[error("no player with id {0}")]
    NotFound(PlayerId),
    #[error(transparent)]
    State(#[from] StateError),
    #[error("failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to persist session: {0}")]
    Storage(#[source] anyhow::Error),
}

impl GameError {
    pub(crate) fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage(anyhow::Error::new(err))
    }

    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    #[must_use]
    pub const fn is_state(&self) -> bool {
        matches!(self, Self::State(_))
    }
}

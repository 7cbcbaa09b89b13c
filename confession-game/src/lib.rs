//! Confession Box Game Engine
//!
//! Platform-agnostic rules engine for "Confession Box", a pass-the-phone party
//! game: players write anonymous confessions, the table guesses each author,
//! and the pool of eligible categories grows spicier as rounds go by.
//! This crate provides all game mechanics without UI or platform-specific dependencies.

pub mod category;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod model;
pub mod reveal;
pub mod rng;
pub mod selection;
pub mod session;
pub mod stats;
pub mod storage;
pub mod suggestions;

// Re-export commonly used types
pub use category::{Category, HeatLevel};
pub use config::{LengthRange, RulesConfig, RulesConfigError};
pub use constants::{PLAYER_AVATARS, PLAYER_COLORS, SESSION_STORAGE_KEY};
pub use engine::{SessionEngine, SubscriptionId};
pub use error::{GameError, StateError, ValidationError};
pub use model::{Confession, ConfessionId, Player, PlayerId, Round, SessionId};
pub use reveal::{GuessOutcome, RoundResult, VoteTally};
pub use rng::SessionRng;
pub use selection::{eligible_indices, is_eligible, pick_confession};
pub use session::{GameSession, GameStatus};
pub use stats::{GameStats, PlayerStats};
pub use storage::{FileStorage, GameStorage, MemoryStorage, decode_session, encode_session};
pub use suggestions::suggestions;

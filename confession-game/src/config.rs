//! Table rules: roster bounds, confession quotas, heat pacing, input lengths.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_MAX_PLAYERS, DEFAULT_MIN_CONFESSIONS_PER_PLAYER, DEFAULT_MIN_PLAYERS,
    DEFAULT_NAME_MAX_CHARS, DEFAULT_NAME_MIN_CHARS, DEFAULT_ROUNDS_PER_HEAT_STEP,
    DEFAULT_TEXT_MAX_CHARS, DEFAULT_TEXT_MIN_CHARS, PALETTE_SLOTS,
};

/// Errors raised when a rules configuration violates its invariants.
#[derive(Debug, Error)]
pub enum RulesConfigError {
    #[error("rules config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("min_players {min} exceeds max_players {max}")]
    PlayerBounds { min: usize, max: usize },
    #[error("max_players {max} exceeds the {slots} palette slots")]
    PaletteOverflow { max: usize, slots: usize },
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: usize,
        value: usize,
    },
    #[error("{field} range invalid (min {min} > max {max})")]
    LengthBounds {
        field: &'static str,
        min: usize,
        max: usize,
    },
}

/// Inclusive character-count bounds for trimmed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthRange {
    pub min: usize,
    pub max: usize,
}

impl LengthRange {
    #[must_use]
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub const fn contains(self, chars: usize) -> bool {
        chars >= self.min && chars <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "RulesConfig::default_min_players")]
    pub min_players: usize,
    #[serde(default = "RulesConfig::default_max_players")]
    pub max_players: usize,
    #[serde(default = "RulesConfig::default_min_confessions")]
    pub min_confessions_per_player: usize,
    /// Heat rises each time the completed-round count hits a multiple of this.
    #[serde(default = "RulesConfig::default_rounds_per_heat_step")]
    pub rounds_per_heat_step: usize,
    #[serde(default = "RulesConfig::default_name_length")]
    pub name_length: LengthRange,
    #[serde(default = "RulesConfig::default_confession_length")]
    pub confession_length: LengthRange,
}

impl RulesConfig {
    const fn default_min_players() -> usize {
        DEFAULT_MIN_PLAYERS
    }

    const fn default_max_players() -> usize {
        DEFAULT_MAX_PLAYERS
    }

    const fn default_min_confessions() -> usize {
        DEFAULT_MIN_CONFESSIONS_PER_PLAYER
    }

    const fn default_rounds_per_heat_step() -> usize {
        DEFAULT_ROUNDS_PER_HEAT_STEP
    }

    const fn default_name_length() -> LengthRange {
        LengthRange::new(DEFAULT_NAME_MIN_CHARS, DEFAULT_NAME_MAX_CHARS)
    }

    const fn default_confession_length() -> LengthRange {
        LengthRange::new(DEFAULT_TEXT_MIN_CHARS, DEFAULT_TEXT_MAX_CHARS)
    }

    /// Parse and validate a rules document. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the rules are inconsistent.
    pub fn from_json(json: &str) -> Result<Self, RulesConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    ///
    /// Returns the first invariant the configuration breaks.
    pub fn validate(&self) -> Result<(), RulesConfigError> {
        // Somebody other than the author has to be able to guess.
        if self.min_players < 3 {
            return Err(RulesConfigError::MinViolation {
                field: "min_players",
                min: 3,
                value: self.min_players,
            });
        }
        if self.min_players > self.max_players {
            return Err(RulesConfigError::PlayerBounds {
                min: self.min_players,
                max: self.max_players,
            });
        }
        if self.max_players > PALETTE_SLOTS {
            return Err(RulesConfigError::PaletteOverflow {
                max: self.max_players,
                slots: PALETTE_SLOTS,
            });
        }
        for (field, value) in [
            ("min_confessions_per_player", self.min_confessions_per_player),
            ("rounds_per_heat_step", self.rounds_per_heat_step),
            ("name_length.min", self.name_length.min),
            ("confession_length.min", self.confession_length.min),
        ] {
            if value == 0 {
                return Err(RulesConfigError::MinViolation {
                    field,
                    min: 1,
                    value,
                });
            }
        }
        for (field, range) in [
            ("name_length", self.name_length),
            ("confession_length", self.confession_length),
        ] {
            if range.min > range.max {
                return Err(RulesConfigError::LengthBounds {
                    field,
                    min: range.min,
                    max: range.max,
                });
            }
        }
        Ok(())
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            min_players: Self::default_min_players(),
            max_players: Self::default_max_players(),
            min_confessions_per_player: Self::default_min_confessions(),
            rounds_per_heat_step: Self::default_rounds_per_heat_step(),
            name_length: Self::default_name_length(),
            confession_length: Self::default_confession_length(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = RulesConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.min_players, 4);
        assert_eq!(cfg.max_players, 8);
        assert_eq!(cfg.min_confessions_per_player, 3);
        assert!(cfg.name_length.contains(2));
        assert!(!cfg.name_length.contains(21));
        assert!(cfg.confession_length.contains(200));
        assert!(!cfg.confession_length.contains(9));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = RulesConfig::from_json(r#"{"min_confessions_per_player": 2}"#).unwrap();
        assert_eq!(cfg.min_confessions_per_player, 2);
        assert_eq!(cfg.rounds_per_heat_step, 3);
        assert_eq!(cfg.max_players, 8);
    }

    #[test]
    fn palette_bounds_roster_size() {
        let err = RulesConfig::from_json(r#"{"max_players": 9}"#).unwrap_err();
        assert!(matches!(
            err,
            RulesConfigError::PaletteOverflow { max: 9, slots: 8 }
        ));
    }

    #[test]
    fn rejects_inverted_ranges_and_zero_steps() {
        let err = RulesConfig::from_json(r#"{"min_players": 6, "max_players": 5}"#).unwrap_err();
        assert!(matches!(err, RulesConfigError::PlayerBounds { .. }));

        let err = RulesConfig::from_json(r#"{"rounds_per_heat_step": 0}"#).unwrap_err();
        assert!(matches!(
            err,
            RulesConfigError::MinViolation {
                field: "rounds_per_heat_step",
                ..
            }
        ));

        let err =
            RulesConfig::from_json(r#"{"name_length": {"min": 10, "max": 4}}"#).unwrap_err();
        assert!(matches!(err, RulesConfigError::LengthBounds { .. }));

        assert!(matches!(
            RulesConfig::from_json("{not json").unwrap_err(),
            RulesConfigError::Parse(_)
        ));
    }
}

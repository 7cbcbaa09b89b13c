//! Entity records shared by the session, the selection policy, and scoring.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::category::Category;
use crate::constants::{PLAYER_AVATARS, PLAYER_COLORS};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(
    /// Stable player identifier, unique for the lifetime of a session.
    PlayerId
);
string_id!(ConfessionId);
string_id!(SessionId);

/// A seat at the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: String,
    pub avatar: String,
}

impl Player {
    /// Build a player styled for roster position `slot`.
    #[must_use]
    pub fn new(id: PlayerId, name: String, slot: usize) -> Self {
        let mut player = Self {
            id,
            name,
            color: String::new(),
            avatar: String::new(),
        };
        player.restyle(slot);
        player
    }

    /// Reassign color and avatar from the palettes for roster position `slot`.
    pub fn restyle(&mut self, slot: usize) {
        let slot = slot % PLAYER_COLORS.len();
        PLAYER_COLORS[slot].clone_into(&mut self.color);
        PLAYER_AVATARS[slot].clone_into(&mut self.avatar);
    }
}

/// An anonymous confession awaiting (or past) its reveal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confession {
    pub id: ConfessionId,
    pub player_id: PlayerId,
    pub text: String,
    pub category: Category,
    /// Set once the confession has been drawn into a round.
    pub is_used: bool,
}

/// One drawn confession plus the votes cast on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub confession: Confession,
    /// Voter id to guessed-author id, one entry per voter.
    #[serde(default)]
    pub votes: BTreeMap<PlayerId, PlayerId>,
    #[serde(default)]
    pub revealed: bool,
    /// Voters who named the author. Only populated at reveal.
    #[serde(default)]
    pub correct_guesses: BTreeSet<PlayerId>,
    /// Roster as seated at reveal; the result bundle is scored against it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub table: Vec<Player>,
}

impl Round {
    #[must_use]
    pub fn new(confession: Confession) -> Self {
        Self {
            confession,
            votes: BTreeMap::new(),
            revealed: false,
            correct_guesses: BTreeSet::new(),
            table: Vec::new(),
        }
    }

    #[must_use]
    pub fn author(&self) -> &PlayerId {
        &self.confession.player_id
    }

    #[must_use]
    pub fn has_voted(&self, voter: &PlayerId) -> bool {
        self.votes.contains_key(voter)
    }

    /// Raw tally of votes received per target.
    #[must_use]
    pub fn vote_counts(&self) -> BTreeMap<&PlayerId, u32> {
        let mut counts = BTreeMap::new();
        for target in self.votes.values() {
            *counts.entry(target).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restyle_wraps_palette_slots() {
        let mut player = Player::new(PlayerId::from("p1"), "Ana".into(), 0);
        assert_eq!(player.color, PLAYER_COLORS[0]);
        assert_eq!(player.avatar, PLAYER_AVATARS[0]);
        player.restyle(3);
        assert_eq!(player.color, PLAYER_COLORS[3]);
        assert_eq!(player.avatar, PLAYER_AVATARS[3]);
    }

    #[test]
    fn vote_counts_group_by_target() {
        let confession = Confession {
            id: ConfessionId::from("c1"),
            player_id: PlayerId::from("b"),
            text: "I still sleep with a plush toy".into(),
            category: Category::Childish,
            is_used: true,
        };
        let mut round = Round::new(confession);
        round.votes.insert("a".into(), "b".into());
        round.votes.insert("c".into(), "b".into());
        round.votes.insert("d".into(), "a".into());

        let counts = round.vote_counts();
        assert_eq!(counts.get(&PlayerId::from("b")), Some(&2));
        assert_eq!(counts.get(&PlayerId::from("a")), Some(&1));
        assert!(round.has_voted(&PlayerId::from("d")));
        assert!(!round.has_voted(&PlayerId::from("b")));
    }

    #[test]
    fn persisted_field_names_are_camel_case() {
        let confession = Confession {
            id: ConfessionId::from("c1"),
            player_id: PlayerId::from("p1"),
            text: "I laughed at a funeral once".into(),
            category: Category::Embarrassing,
            is_used: false,
        };
        let json = serde_json::to_value(Round::new(confession)).unwrap();
        assert_eq!(json["confession"]["playerId"], "p1");
        assert_eq!(json["confession"]["isUsed"], false);
        assert_eq!(json["confession"]["category"], "embarrassing");
        assert!(json["correctGuesses"].as_array().unwrap().is_empty());
        assert!(json.get("table").is_none());
    }
}

//! Confession categories and the heat tiers that unlock them.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{HEAT_MAX, HEAT_MIN};

/// Confession category, ordered mildest to spiciest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Funny,
    Childish,
    Embarrassing,
    Romantic,
    Spicy,
}

impl Category {
    pub const ALL: [Self; 5] = [
        Self::Funny,
        Self::Childish,
        Self::Embarrassing,
        Self::Romantic,
        Self::Spicy,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Funny => "funny",
            Self::Childish => "childish",
            Self::Embarrassing => "embarrassing",
            Self::Romantic => "romantic",
            Self::Spicy => "spicy",
        }
    }

    /// Human-facing label for selectors and result cards.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Funny => "Funny",
            Self::Childish => "Childish",
            Self::Embarrassing => "Embarrassing",
            Self::Romantic => "Romantic",
            Self::Spicy => "Spicy",
        }
    }

    #[must_use]
    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Funny => "🤣",
            Self::Childish => "🧸",
            Self::Embarrassing => "😳",
            Self::Romantic => "💕",
            Self::Spicy => "🌶️",
        }
    }

    /// Lowest heat level at which this category may be drawn.
    #[must_use]
    pub const fn min_heat(self) -> HeatLevel {
        match self {
            Self::Funny | Self::Childish => HeatLevel(1),
            Self::Embarrassing => HeatLevel(3),
            Self::Romantic => HeatLevel(4),
            Self::Spicy => HeatLevel(5),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "funny" => Ok(Self::Funny),
            "childish" => Ok(Self::Childish),
            "embarrassing" => Ok(Self::Embarrassing),
            "romantic" => Ok(Self::Romantic),
            "spicy" => Ok(Self::Spicy),
            _ => Err(()),
        }
    }
}

const TIER_MILD: &[Category] = &[Category::Funny, Category::Childish];
const TIER_WARM: &[Category] = &[Category::Funny, Category::Childish, Category::Embarrassing];
const TIER_HOT: &[Category] = &[
    Category::Funny,
    Category::Childish,
    Category::Embarrassing,
    Category::Romantic,
];
const TIER_ALL: &[Category] = &Category::ALL;

/// Session intensity, 1 through 5. Never decreases within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct HeatLevel(u8);

impl HeatLevel {
    pub const MIN: Self = Self(HEAT_MIN);
    pub const MAX: Self = Self(HEAT_MAX);

    #[must_use]
    pub const fn new(level: u8) -> Option<Self> {
        if level >= HEAT_MIN && level <= HEAT_MAX {
            Some(Self(level))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn is_max(self) -> bool {
        self.0 >= HEAT_MAX
    }

    /// One step hotter, saturating at the maximum.
    #[must_use]
    pub const fn escalated(self) -> Self {
        if self.is_max() { self } else { Self(self.0 + 1) }
    }

    /// Categories eligible for the next draw. Each tier is a strict superset
    /// of the tier below it (levels 1 and 2 share a tier).
    #[must_use]
    pub const fn allowed_categories(self) -> &'static [Category] {
        match self.0 {
            0..=2 => TIER_MILD,
            3 => TIER_WARM,
            4 => TIER_HOT,
            _ => TIER_ALL,
        }
    }

    #[must_use]
    pub fn allows(self, category: Category) -> bool {
        category.min_heat() <= self
    }
}

impl Default for HeatLevel {
    fn default() -> Self {
        Self::MIN
    }
}

impl fmt::Display for HeatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for HeatLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
            .ok_or_else(|| format!("heat level {value} outside {HEAT_MIN}..={HEAT_MAX}"))
    }
}

impl From<HeatLevel> for u8 {
    fn from(value: HeatLevel) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_nested_supersets() {
        let mut previous: &[Category] = &[];
        for level in HEAT_MIN..=HEAT_MAX {
            let allowed = HeatLevel::new(level).unwrap().allowed_categories();
            assert!(previous.iter().all(|c| allowed.contains(c)));
            assert!(allowed.len() >= previous.len());
            previous = allowed;
        }
        assert_eq!(previous, &Category::ALL);
    }

    #[test]
    fn first_two_levels_only_allow_mild_categories() {
        for level in [1, 2] {
            let heat = HeatLevel::new(level).unwrap();
            assert_eq!(
                heat.allowed_categories(),
                &[Category::Funny, Category::Childish]
            );
        }
        assert_eq!(HeatLevel::new(3).unwrap().allowed_categories().len(), 3);
        assert_eq!(HeatLevel::new(4).unwrap().allowed_categories().len(), 4);
    }

    #[test]
    fn allows_agrees_with_allowed_categories() {
        for level in HEAT_MIN..=HEAT_MAX {
            let heat = HeatLevel::new(level).unwrap();
            for category in Category::ALL {
                assert_eq!(
                    heat.allows(category),
                    heat.allowed_categories().contains(&category),
                    "level {level} category {category}"
                );
            }
        }
    }

    #[test]
    fn escalation_saturates() {
        let mut heat = HeatLevel::MIN;
        for _ in 0..10 {
            heat = heat.escalated();
        }
        assert_eq!(heat, HeatLevel::MAX);
    }

    #[test]
    fn out_of_range_heat_rejected_on_load() {
        assert!(serde_json::from_str::<HeatLevel>("0").is_err());
        assert!(serde_json::from_str::<HeatLevel>("6").is_err());
        assert_eq!(serde_json::from_str::<HeatLevel>("3").unwrap().get(), 3);
    }

    #[test]
    fn category_ids_parse_back() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
        assert!("mild".parse::<Category>().is_err());
    }
}

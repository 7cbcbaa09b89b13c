//! Fixed tables and default tuning for the confession game.
//!
//! Palettes are indexed by roster position, so their length is also the hard
//! ceiling on how many players a session can hold. Rule thresholds here are
//! only defaults; `RulesConfig` can tighten them.

// Persistence ----------------------------------------------------------------
pub const SESSION_STORAGE_KEY: &str = "confession_box_game";

// Roster palettes ------------------------------------------------------------
pub const PALETTE_SLOTS: usize = 8;

pub const PLAYER_COLORS: [&str; PALETTE_SLOTS] = [
    "#6c5ce7", "#a29bfe", "#fd79a8", "#fdcb6e", "#e84393", "#00b894", "#e17055", "#74b9ff",
];

pub const PLAYER_AVATARS: [&str; PALETTE_SLOTS] = ["🎭", "🎪", "🎨", "🎯", "🎲", "🎸", "🎺", "🎼"];

// Rule defaults --------------------------------------------------------------
pub(crate) const DEFAULT_MIN_PLAYERS: usize = 4;
pub(crate) const DEFAULT_MAX_PLAYERS: usize = PALETTE_SLOTS;
pub(crate) const DEFAULT_MIN_CONFESSIONS_PER_PLAYER: usize = 3;
pub(crate) const DEFAULT_ROUNDS_PER_HEAT_STEP: usize = 3;
pub(crate) const DEFAULT_NAME_MIN_CHARS: usize = 2;
pub(crate) const DEFAULT_NAME_MAX_CHARS: usize = 20;
pub(crate) const DEFAULT_TEXT_MIN_CHARS: usize = 10;
pub(crate) const DEFAULT_TEXT_MAX_CHARS: usize = 200;

// Heat ----------------------------------------------------------------------
pub const HEAT_MIN: u8 = 1;
pub const HEAT_MAX: u8 = 5;

// Ids -----------------------------------------------------------------------
pub(crate) const ID_LEN: usize = 9;
pub(crate) const ID_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

// RNG stream domains ---------------------------------------------------------
pub(crate) const RNG_DOMAIN_SELECTION: &[u8] = b"selection";
pub(crate) const RNG_DOMAIN_IDS: &[u8] = b"ids";

//! Centralized rule constants for the Peloton race engine.
//!
//! Deck compositions and space-kind overrides are fixed by the board game
//! itself; anything a table might house-rule lives in [`crate::RulesConfig`]
//! instead.

// Power bounds -------------------------------------------------------------
pub const DEFAULT_MAX_ADVANCE: u8 = 9;
pub const DEFAULT_MIN_ADVANCE: u8 = 2;
pub const UPHILL_MAX_ADVANCE: u8 = 5;
pub const DOWNHILL_MIN_ADVANCE: u8 = 5;
pub const SUPPLY_MIN_ADVANCE: u8 = 4;

// Slipstream ---------------------------------------------------------------
/// Movement delta reserved for the slipstream step; never clamped.
pub const SLIPSTREAM_ADVANCE: u8 = 1;

// Lanes --------------------------------------------------------------------
pub const MIN_LANES: u8 = 1;
pub const MAX_LANES: u8 = 3;

// Deck ---------------------------------------------------------------------
pub const DEFAULT_HAND_SIZE: usize = 4;
pub const EXHAUSTION_VALUE: u8 = 2;
pub const COPIES_PER_VALUE: usize = 3;
pub const SPRINTEUR_VALUES: [u8; 5] = [2, 3, 4, 5, 9];
pub const ROULEUR_VALUES: [u8; 5] = [3, 4, 5, 6, 7];
pub const DECK_SIZE: usize = COPIES_PER_VALUE * SPRINTEUR_VALUES.len();

// Seeding ------------------------------------------------------------------
pub(crate) const SEED_DOMAIN: &[u8; 6] = b"PELOT-";

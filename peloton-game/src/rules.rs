//! Table rules that shape movement bounds and hand sizes.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_HAND_SIZE, DEFAULT_MAX_ADVANCE, DEFAULT_MIN_ADVANCE, EXHAUSTION_VALUE,
};

/// Errors raised when rule configuration invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RulesConfigError {
    #[error("minimum advance {min} exceeds maximum advance {max}")]
    AdvanceMinExceedsMax { min: u8, max: u8 },
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: u8,
        value: u8,
    },
    #[error("hand size must be at least 1")]
    EmptyHand,
}

/// Rule knobs shared by every space and deck of a race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Power cap applied on spaces without an override.
    #[serde(default = "RulesConfig::default_max_advance")]
    pub max_advance: u8,
    /// Power floor applied on spaces without an override.
    #[serde(default = "RulesConfig::default_min_advance")]
    pub min_advance: u8,
    #[serde(default = "RulesConfig::default_hand_size")]
    pub hand_size: usize,
    /// Movement granted by playing an exhaustion card.
    #[serde(default = "RulesConfig::default_exhaustion_value")]
    pub exhaustion_value: u8,
}

impl RulesConfig {
    const fn default_max_advance() -> u8 {
        DEFAULT_MAX_ADVANCE
    }

    const fn default_min_advance() -> u8 {
        DEFAULT_MIN_ADVANCE
    }

    const fn default_hand_size() -> usize {
        DEFAULT_HAND_SIZE
    }

    const fn default_exhaustion_value() -> u8 {
        EXHAUSTION_VALUE
    }

    /// Check the invariants the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns an error if a bound is zero, the bounds are inverted, or the
    /// hand holds no cards.
    pub fn validate(&self) -> Result<(), RulesConfigError> {
        if self.min_advance < 1 {
            return Err(RulesConfigError::MinViolation {
                field: "min_advance",
                min: 1,
                value: self.min_advance,
            });
        }
        if self.exhaustion_value < 1 {
            return Err(RulesConfigError::MinViolation {
                field: "exhaustion_value",
                min: 1,
                value: self.exhaustion_value,
            });
        }
        if self.min_advance > self.max_advance {
            return Err(RulesConfigError::AdvanceMinExceedsMax {
                min: self.min_advance,
                max: self.max_advance,
            });
        }
        if self.hand_size == 0 {
            return Err(RulesConfigError::EmptyHand);
        }
        Ok(())
    }

    /// Parse rules from JSON, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            max_advance: Self::default_max_advance(),
            min_advance: Self::default_min_advance(),
            hand_size: Self::default_hand_size(),
            exhaustion_value: Self::default_exhaustion_value(),
        }
    }
}

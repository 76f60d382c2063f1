//! Encounter tuning constants.
//!
//! [`EncounterConfig::default`] holds the standard values. A RON file can
//! override any subset of fields; missing fields fall back to the defaults.
//!
//! # Example RON
//!
//! ```ron
//! EncounterConfig(
//!     sprite_buffer: 80.0,
//!     melee_offset: 100.0,
//!     knockback_decay: 0.9,
//!     removal_delay_ticks: 3000,
//! )
//! ```

use serde::{Deserialize, Serialize};

use crate::data::parse_ron;
use crate::error::{EncounterError, Result};
use crate::math::{fixed_decimal, Fixed, WORLD_LIMIT};

/// Nominal ticks per second (one tick per rendered frame).
pub const TICK_RATE: u32 = 60;

/// Tuning constants shared by all systems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    /// Subtracted from anchor-to-anchor distance to get edge distance.
    #[serde(with = "fixed_decimal")]
    pub sprite_buffer: Fixed,
    /// Horizontal gap between a target's anchor and the attacker's melee spot.
    #[serde(with = "fixed_decimal")]
    pub melee_offset: Fixed,
    /// Multiplier applied to knockback every tick.
    #[serde(with = "fixed_decimal")]
    pub knockback_decay: Fixed,
    /// Per-axis magnitude below which knockback snaps to zero.
    #[serde(with = "fixed_decimal")]
    pub knockback_snap: Fixed,
    /// Ticks a corpse stays before removal. Removal happens on the tick after.
    pub removal_delay_ticks: u32,
    /// Ticks per second, for converting durations in tooling.
    pub tick_rate: u32,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            sprite_buffer: Fixed::from_num(80),
            melee_offset: Fixed::from_num(100),
            knockback_decay: Fixed::from_num(0.9),
            knockback_snap: Fixed::from_num(0.1),
            removal_delay_ticks: 3000,
            tick_rate: TICK_RATE,
        }
    }
}

impl EncounterConfig {
    /// Parse a config from RON text. `origin` names the source in errors.
    pub fn from_ron(text: &str, origin: &str) -> Result<Self> {
        let config: Self = parse_ron(text, origin)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would break system invariants.
    pub fn validate(&self) -> Result<()> {
        if self.sprite_buffer < Fixed::ZERO {
            return Err(EncounterError::InvalidConfig(
                "sprite_buffer must not be negative".to_string(),
            ));
        }
        if self.melee_offset < Fixed::ZERO {
            return Err(EncounterError::InvalidConfig(
                "melee_offset must not be negative".to_string(),
            ));
        }
        if self.sprite_buffer > WORLD_LIMIT || self.melee_offset > WORLD_LIMIT {
            return Err(EncounterError::InvalidConfig(
                "sprite_buffer and melee_offset must not exceed the world bound".to_string(),
            ));
        }
        if self.knockback_decay <= Fixed::ZERO || self.knockback_decay >= Fixed::ONE {
            return Err(EncounterError::InvalidConfig(
                "knockback_decay must lie strictly between 0 and 1".to_string(),
            ));
        }
        if self.knockback_snap <= Fixed::ZERO {
            return Err(EncounterError::InvalidConfig(
                "knockback_snap must be positive".to_string(),
            ));
        }
        if self.tick_rate == 0 {
            return Err(EncounterError::InvalidConfig(
                "tick_rate must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = EncounterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sprite_buffer, Fixed::from_num(80));
        assert_eq!(config.removal_delay_ticks, 3000);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config =
            EncounterConfig::from_ron("(removal_delay_ticks: 10, melee_offset: 64.5)", "inline")
                .unwrap();
        assert_eq!(config.removal_delay_ticks, 10);
        assert_eq!(config.melee_offset, Fixed::from_num(64.5));
        assert_eq!(config.sprite_buffer, Fixed::from_num(80));
    }

    #[test]
    fn test_rejects_non_decaying_knockback() {
        let err = EncounterConfig::from_ron("(knockback_decay: 1.0)", "inline").unwrap_err();
        assert!(matches!(err, EncounterError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_offsets_beyond_world() {
        let err = EncounterConfig::from_ron("(melee_offset: 5000000.0)", "inline").unwrap_err();
        assert!(matches!(err, EncounterError::InvalidConfig(_)));
    }

    #[test]
    fn test_parse_error_names_origin() {
        let err = EncounterConfig::from_ron("(sprite_buffer: ", "assets/data/encounter.ron")
            .unwrap_err();
        match err {
            EncounterError::DataParseError { path, .. } => {
                assert_eq!(path, "assets/data/encounter.ron");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

//! Scenario loading and configuration.
//!
//! A scenario is a starting roster plus a script of orders keyed by tick.
//! Units in orders are referred to by their index in the roster, so the
//! file does not depend on which entity ids the encounter hands out.
//!
//! # Example RON
//!
//! ```ron
//! Scenario(
//!     name: "Duel",
//!     description: "One knight against one skeleton",
//!     roster: [
//!         ("knight", 200.0, 600.0),
//!         ("skeleton", 500.0, 400.0),
//!     ],
//!     orders: [
//!         (0, 0, Attack(1)),
//!     ],
//!     max_ticks: 3600,
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use skirmish_core::config::EncounterConfig;
use skirmish_core::data::ArchetypeCatalog;
use skirmish_core::encounter::STARTING_ROSTER;
use skirmish_core::error::EncounterError;
use thiserror::Error;

/// Error type for scenario and data file operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Scenario refers to something that does not exist.
    #[error("Invalid scenario: {0}")]
    Invalid(String),
    /// Decimal coordinates that fixed-point cannot hold.
    #[error("Coordinates ({x}, {y}) are out of range")]
    OutOfRange {
        /// Horizontal coordinate.
        x: f64,
        /// Vertical coordinate.
        y: f64,
    },
    /// The encounter refused the setup.
    #[error(transparent)]
    Encounter(#[from] EncounterError),
}

/// An order issued before a given tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Order {
    /// Walk to a point.
    Move(f64, f64),
    /// Engage the unit at this roster index.
    Attack(usize),
    /// Shove by this impulse.
    Knockback(f64, f64),
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Tuning overrides. Defaults apply when absent.
    #[serde(default)]
    pub config: Option<EncounterConfig>,
    /// Archetype and top-left corner of each starting unit.
    pub roster: Vec<(String, f64, f64)>,
    /// `(tick, roster index, order)`, applied before that tick runs.
    #[serde(default)]
    pub orders: Vec<(u64, usize, Order)>,
    /// Hard stop.
    pub max_ticks: u64,
    /// Stop as soon as one side has no living units.
    #[serde(default = "default_stop_when_decided")]
    pub stop_when_decided: bool,
}

fn default_stop_when_decided() -> bool {
    true
}

impl Default for Scenario {
    fn default() -> Self {
        Self::opening_lineup()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Three knights against three skeletons, no orders.
    ///
    /// Skeletons close in on their own. Knights never pick targets without
    /// an order, so left alone this ends with the skeletons winning.
    #[must_use]
    pub fn opening_lineup() -> Self {
        Self {
            name: "Opening Lineup".to_string(),
            description: "The stock three-on-three with no player orders".to_string(),
            config: None,
            roster: STARTING_ROSTER
                .iter()
                .map(|&(kind, x, y)| (kind.to_string(), f64::from(x), f64::from(y)))
                .collect(),
            orders: Vec::new(),
            max_ticks: 36_000,
            stop_when_decided: true,
        }
    }

    /// Tuning for this scenario, falling back to `base`.
    #[must_use]
    pub fn config_or(&self, base: &EncounterConfig) -> EncounterConfig {
        self.config.clone().unwrap_or_else(|| base.clone())
    }

    /// Check the scenario against the archetypes it will be spawned from.
    pub fn validate(&self, catalog: &ArchetypeCatalog) -> Result<(), ScenarioError> {
        if self.max_ticks == 0 {
            return Err(ScenarioError::Invalid("max_ticks must be positive".into()));
        }
        if let Some(config) = &self.config {
            config.validate()?;
        }
        for (kind, _, _) in &self.roster {
            catalog.require(kind)?;
        }

        let units = self.roster.len();
        for (tick, unit, order) in &self.orders {
            let target = match order {
                Order::Attack(target) => Some(*target),
                Order::Move(..) | Order::Knockback(..) => None,
            };
            for index in std::iter::once(*unit).chain(target) {
                if index >= units {
                    return Err(ScenarioError::Invalid(format!(
                        "order at tick {tick} refers to unit {index}, roster has {units}"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scenario_is_opening_lineup() {
        let scenario = Scenario::default();
        assert_eq!(scenario.roster.len(), 6);
        assert_eq!(scenario.roster[3], ("skeleton".to_string(), 341.0, 467.0));
        assert!(scenario.orders.is_empty());
        assert!(scenario.validate(&ArchetypeCatalog::builtin()).is_ok());
    }

    #[test]
    fn test_parse_from_ron() {
        let ron = r#"
            Scenario(
                name: "Test",
                roster: [("knight", 0.0, 0.0), ("skeleton", 200.0, 0.0)],
                orders: [(0, 0, Attack(1)), (30, 0, Move(10.5, -4.0))],
                max_ticks: 100,
            )
        "#;
        let scenario = Scenario::from_ron_str(ron).unwrap();
        assert_eq!(scenario.name, "Test");
        assert!(scenario.description.is_empty());
        assert!(scenario.config.is_none());
        assert!(scenario.stop_when_decided);
        assert_eq!(scenario.orders[1], (30, 0, Order::Move(10.5, -4.0)));
    }

    #[test]
    fn test_parse_config_override() {
        let ron = r#"
            Scenario(
                name: "Short corpses",
                config: Some(EncounterConfig(removal_delay_ticks: 10)),
                roster: [],
                max_ticks: 5,
                stop_when_decided: false,
            )
        "#;
        let scenario = Scenario::from_ron_str(ron).unwrap();
        let config = scenario.config_or(&EncounterConfig::default());
        assert_eq!(config.removal_delay_ticks, 10);
        assert_eq!(
            config.sprite_buffer,
            EncounterConfig::default().sprite_buffer
        );
    }

    #[test]
    fn test_validate_rejects_out_of_range_units() {
        let mut scenario = Scenario::opening_lineup();
        scenario.orders.push((0, 0, Order::Attack(6)));
        let err = scenario.validate(&ArchetypeCatalog::builtin()).unwrap_err();
        assert!(matches!(err, ScenarioError::Invalid(_)));
    }

    #[test]
    fn test_validate_rejects_unknown_archetype() {
        let mut scenario = Scenario::opening_lineup();
        scenario.roster.push(("dragon".to_string(), 0.0, 0.0));
        let err = scenario.validate(&ArchetypeCatalog::builtin()).unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::Encounter(EncounterError::UnknownArchetype(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Scenario::load("does/not/exist.ron").unwrap_err();
        assert!(matches!(err, ScenarioError::FileNotFound(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lineup.ron");
        let text = ron::ser::to_string_pretty(
            &Scenario::opening_lineup(),
            ron::ser::PrettyConfig::default(),
        )
        .unwrap();
        std::fs::write(&path, text).unwrap();

        let scenario = Scenario::load(&path).unwrap();
        assert_eq!(scenario, Scenario::opening_lineup());
    }
}

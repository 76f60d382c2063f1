//! Faction definitions.
//!
//! An encounter has exactly two sides. Targeting only ever crosses
//! between them.

use serde::{Deserialize, Serialize};

/// The side an entity fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    /// Player-directed side. Acquires targets only through orders.
    Allied,
    /// AI-driven side. Re-acquires the nearest allied entity every tick.
    Opposing,
}

impl Faction {
    /// Both factions, in a fixed order.
    pub const ALL: [Self; 2] = [Self::Allied, Self::Opposing];

    /// The faction this one fights.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Allied => Self::Opposing,
            Self::Opposing => Self::Allied,
        }
    }

    /// Whether entities of this faction pick their own targets.
    #[must_use]
    pub const fn auto_acquires_targets(self) -> bool {
        matches!(self, Self::Opposing)
    }

    /// Get the short name for this faction.
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Allied => "allied",
            Self::Opposing => "opposing",
        }
    }
}

impl std::fmt::Display for Faction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_is_involution() {
        for faction in Faction::ALL {
            assert_ne!(faction, faction.opposite());
            assert_eq!(faction, faction.opposite().opposite());
        }
    }

    #[test]
    fn test_only_opposing_auto_acquires() {
        assert!(!Faction::Allied.auto_acquires_targets());
        assert!(Faction::Opposing.auto_acquires_targets());
    }

    #[test]
    fn test_faction_ron_names() {
        let parsed: Faction = ron::from_str("opposing").unwrap();
        assert_eq!(parsed, Faction::Opposing);
        assert_eq!(Faction::Allied.to_string(), "allied");
    }
}

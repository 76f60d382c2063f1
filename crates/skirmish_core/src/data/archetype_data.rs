//! Archetype data structures for data-driven spawn presets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::parse_ron;
use crate::components::Attack;
use crate::error::{EncounterError, Result};
use crate::factions::Faction;
use crate::math::{fixed_decimal, Fixed, WORLD_LIMIT};

/// Attack statistics for an archetype.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttackData {
    /// Damage per landed swing.
    pub damage: u32,

    /// Maximum edge distance for attacking.
    #[serde(with = "fixed_decimal")]
    pub range: Fixed,

    /// Ticks between swings, counted from the swing frame.
    pub cooldown: u32,

    /// Ticks one attack lasts.
    pub duration: u32,

    /// Tick within the attack at which damage lands.
    pub swing_frame: u32,
}

impl AttackData {
    /// Build a fresh attack component from these stats.
    #[must_use]
    pub fn to_component(&self) -> Attack {
        Attack::new(self.damage, self.range)
            .with_cooldown(self.cooldown)
            .with_timing(self.duration, self.swing_frame)
    }
}

/// Data-driven combatant preset.
///
/// # Example RON
///
/// ```ron
/// ArchetypeData(
///     name: "skeleton",
///     label: "Skeleton",
///     faction: opposing,
///     max_hp: 50,
///     speed: 0.5,
///     attack: AttackData(
///         damage: 15,
///         range: 120.0,
///         cooldown: 90,
///         duration: 80,
///         swing_frame: 30,
///     ),
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArchetypeData {
    /// Unique key used by `spawn`.
    pub name: String,

    /// Display label shown above the entity.
    pub label: String,

    /// Side entities of this archetype fight for.
    pub faction: Faction,

    /// Bounding box width.
    #[serde(default = "default_width", with = "fixed_decimal")]
    pub width: Fixed,

    /// Bounding box height.
    #[serde(default = "default_height", with = "fixed_decimal")]
    pub height: Fixed,

    /// Maximum health points.
    pub max_hp: u32,

    /// Maximum displacement per tick.
    #[serde(with = "fixed_decimal")]
    pub speed: Fixed,

    /// Attack statistics.
    pub attack: AttackData,
}

fn default_width() -> Fixed {
    Fixed::from_num(80)
}

fn default_height() -> Fixed {
    Fixed::from_num(100)
}

impl ArchetypeData {
    /// Check spawn invariants.
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: &str| {
            Err(EncounterError::InvalidArchetype {
                name: self.name.clone(),
                reason: reason.to_string(),
            })
        };

        if self.name.is_empty() {
            return fail("name must not be empty");
        }
        if self.speed <= Fixed::ZERO {
            return fail("speed must be positive");
        }
        if self.max_hp == 0 {
            return fail("max_hp must be positive");
        }
        if self.width <= Fixed::ZERO || self.height <= Fixed::ZERO {
            return fail("bounding box must have positive size");
        }
        if self.attack.range < Fixed::ZERO {
            return fail("attack range must not be negative");
        }
        let lengths = [self.speed, self.width, self.height, self.attack.range];
        if lengths.iter().any(|&length| length > WORLD_LIMIT) {
            return fail("speed, size and range must not exceed the world bound");
        }
        if self.attack.duration == 0 {
            return fail("attack duration must be positive");
        }
        // The swing timer is advanced before it is compared, so frame 0 never lands.
        if self.attack.swing_frame == 0 || self.attack.swing_frame >= self.attack.duration {
            return fail("swing_frame must lie in 1..duration");
        }
        Ok(())
    }
}

/// Named archetypes available to an encounter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchetypeCatalog {
    archetypes: BTreeMap<String, ArchetypeData>,
}

impl ArchetypeCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock presets: knight, skeleton, skirmisher and heavy.
    #[must_use]
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for data in builtin_presets() {
            catalog.archetypes.insert(data.name.clone(), data);
        }
        catalog
    }

    /// Build a catalog from a list, validating each entry.
    pub fn from_entries(entries: impl IntoIterator<Item = ArchetypeData>) -> Result<Self> {
        let mut catalog = Self::new();
        for data in entries {
            if catalog.archetypes.contains_key(&data.name) {
                return Err(EncounterError::InvalidArchetype {
                    name: data.name,
                    reason: "duplicate archetype name".to_string(),
                });
            }
            catalog.insert(data)?;
        }
        Ok(catalog)
    }

    /// Parse a RON list of [`ArchetypeData`]. `origin` names the source in errors.
    pub fn from_ron(text: &str, origin: &str) -> Result<Self> {
        let entries: Vec<ArchetypeData> = parse_ron(text, origin)?;
        Self::from_entries(entries)
    }

    /// Add or replace an archetype after validating it.
    pub fn insert(&mut self, data: ArchetypeData) -> Result<()> {
        data.validate()?;
        self.archetypes.insert(data.name.clone(), data);
        Ok(())
    }

    /// Look up an archetype.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ArchetypeData> {
        self.archetypes.get(name)
    }

    /// Look up an archetype or fail with [`EncounterError::UnknownArchetype`].
    pub fn require(&self, name: &str) -> Result<&ArchetypeData> {
        self.get(name)
            .ok_or_else(|| EncounterError::UnknownArchetype(name.to_string()))
    }

    /// Validate every entry.
    pub fn validate(&self) -> Result<()> {
        self.archetypes.values().try_for_each(ArchetypeData::validate)
    }

    /// Archetype names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.archetypes.keys().map(String::as_str)
    }

    /// Number of archetypes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }
}

fn builtin_presets() -> Vec<ArchetypeData> {
    let preset = |name: &str,
                  label: &str,
                  faction: Faction,
                  max_hp: u32,
                  speed: Fixed,
                  attack: AttackData| ArchetypeData {
        name: name.to_string(),
        label: label.to_string(),
        faction,
        width: default_width(),
        height: default_height(),
        max_hp,
        speed,
        attack,
    };

    vec![
        preset(
            "knight",
            "Knight",
            Faction::Allied,
            1000,
            Fixed::from_num(2),
            AttackData {
                damage: 10,
                range: Fixed::from_num(120),
                cooldown: 60,
                duration: 30,
                swing_frame: 15,
            },
        ),
        preset(
            "skeleton",
            "Skeleton",
            Faction::Opposing,
            50,
            Fixed::from_num(0.5),
            AttackData {
                damage: 15,
                range: Fixed::from_num(120),
                cooldown: 90,
                duration: 80,
                swing_frame: 30,
            },
        ),
        preset(
            "skirmisher",
            "Skirmisher",
            Faction::Allied,
            60,
            Fixed::from_num(4),
            AttackData {
                damage: 8,
                range: Fixed::from_num(110),
                cooldown: 40,
                duration: 20,
                swing_frame: 8,
            },
        ),
        preset(
            "heavy",
            "Heavy",
            Faction::Opposing,
            400,
            Fixed::from_num(1),
            AttackData {
                damage: 30,
                range: Fixed::from_num(160),
                cooldown: 120,
                duration: 60,
                swing_frame: 40,
            },
        ),
    ]
}

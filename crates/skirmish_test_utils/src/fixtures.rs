//! Test fixtures and helpers.
//!
//! Pre-built encounters and archetypes for consistent testing.

use fixed::types::I32F32;
use skirmish_core::components::EntityId;
use skirmish_core::data::{ArchetypeData, AttackData};
use skirmish_core::encounter::Encounter;
use skirmish_core::error::Result;
use skirmish_core::factions::Faction;
use skirmish_core::math::Vec2Fixed;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: systems never see floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point point from integers.
#[must_use]
pub fn point(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::from_int(x, y)
}

/// Build an archetype with an 80x100 box.
#[must_use]
pub fn archetype(
    name: &str,
    faction: Faction,
    max_hp: u32,
    speed: i32,
    attack: AttackData,
) -> ArchetypeData {
    ArchetypeData {
        name: name.to_string(),
        label: name.to_string(),
        faction,
        width: fixed(80),
        height: fixed(100),
        max_hp,
        speed: fixed(speed),
        attack,
    }
}

/// Attack stats with the given damage and range, 60 tick cooldown, 30 tick
/// swing landing on frame 15.
#[must_use]
pub fn attack(damage: u32, range: i32) -> AttackData {
    AttackData {
        damage,
        range: fixed(range),
        cooldown: 60,
        duration: 30,
        swing_frame: 15,
    }
}

/// A knight and a skeleton level with each other, `edge` apart.
///
/// The knight's box sits at the origin. Edge distance is the anchor gap
/// minus the 80 unit sprite buffer, so the skeleton's box starts at
/// `edge + 80`.
pub fn duel(edge: i32) -> Result<(Encounter, EntityId, EntityId)> {
    let mut encounter = Encounter::new();
    let knight = encounter.spawn("knight", point(0, 0))?;
    let skeleton = encounter.spawn("skeleton", point(edge + 80, 0))?;
    Ok((encounter, knight, skeleton))
}

/// An order a scripted encounter applies between ticks.
///
/// Units are indices into the spawn roster, not entity ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedOrder {
    /// Walk to a point.
    Move {
        /// Roster index.
        unit: usize,
        /// Destination.
        to: Vec2Fixed,
    },
    /// Engage another roster unit.
    Attack {
        /// Roster index.
        unit: usize,
        /// Roster index of the target.
        target: usize,
    },
    /// Shove a unit.
    Knockback {
        /// Roster index.
        unit: usize,
        /// Impulse added to its knockback.
        impulse: Vec2Fixed,
    },
}

/// Apply an order, ignoring refusals such as same-side attacks or units
/// that were already removed.
pub fn apply_order(encounter: &mut Encounter, roster: &[EntityId], order: &ScriptedOrder) {
    let unit = |index: usize| roster.get(index).copied();
    let _ = match *order {
        ScriptedOrder::Move { unit: u, to } => unit(u).map(|id| encounter.issue_move(id, to)),
        ScriptedOrder::Attack { unit: u, target } => unit(u)
            .zip(unit(target))
            .map(|(id, target)| encounter.issue_attack(id, target)),
        ScriptedOrder::Knockback { unit: u, impulse } => {
            unit(u).map(|id| encounter.apply_knockback(id, impulse))
        }
    };
}

/// A roster plus a timed order script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedEncounter {
    /// Archetype and top-left corner per unit.
    pub roster: Vec<(String, Vec2Fixed)>,
    /// Orders keyed by the tick before which they apply.
    pub orders: Vec<(u64, ScriptedOrder)>,
}

impl ScriptedEncounter {
    /// Spawn the roster into a fresh encounter.
    pub fn build(&self) -> Result<(Encounter, Vec<EntityId>)> {
        let mut encounter = Encounter::new();
        let ids = self
            .roster
            .iter()
            .map(|(kind, at)| encounter.spawn(kind, *at))
            .collect::<Result<Vec<_>>>()?;
        Ok((encounter, ids))
    }

    /// Build, then run `ticks` ticks applying orders as their tick comes up.
    pub fn run(&self, ticks: u64) -> Result<Encounter> {
        let (mut encounter, ids) = self.build()?;
        for _ in 0..ticks {
            self.step(&mut encounter, &ids);
        }
        Ok(encounter)
    }

    /// Apply the orders due this tick, then advance once.
    pub fn step(&self, encounter: &mut Encounter, ids: &[EntityId]) {
        let now = encounter.tick();
        for (_, order) in self.orders.iter().filter(|(at, _)| *at == now) {
            apply_order(encounter, ids, order);
        }
        encounter.advance();
    }
}

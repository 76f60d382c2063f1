//! Encounter events.
//!
//! Systems push events as they make decisions; the façade hands them to
//! subscribed observers and returns them from every tick. Nothing in the
//! decision logic depends on who, if anyone, is listening.

use serde::{Deserialize, Serialize};

use crate::components::EntityId;
use crate::factions::Faction;

/// Why an in-progress attack was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// Target moved beyond attack range mid-swing.
    OutOfRange,
    /// Target died or vanished mid-swing.
    TargetDied,
}

/// Something observable that happened in the encounter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EncounterEvent {
    /// An entity was created from an archetype.
    Spawned {
        /// New entity.
        entity: EntityId,
        /// Archetype name.
        archetype: String,
        /// Side it fights for.
        faction: Faction,
    },
    /// An entity picked a new combat target.
    TargetAcquired {
        /// Entity that retargeted.
        entity: EntityId,
        /// New target.
        target: EntityId,
    },
    /// An entity dropped its combat target.
    TargetLost {
        /// Entity that lost its target.
        entity: EntityId,
        /// Target that was dropped.
        target: EntityId,
    },
    /// A move-to-point order reached its destination.
    MoveCompleted {
        /// Entity that arrived.
        entity: EntityId,
    },
    /// An attack began.
    AttackStarted {
        /// Attacker.
        attacker: EntityId,
        /// Target at the start of the swing.
        target: EntityId,
    },
    /// A swing committed its damage.
    AttackLanded {
        /// Attacker.
        attacker: EntityId,
        /// Entity that took the hit.
        target: EntityId,
        /// Damage applied.
        damage: u32,
        /// Target hp after the hit.
        remaining_hp: u32,
    },
    /// An attack was abandoned before finishing.
    AttackCancelled {
        /// Attacker.
        attacker: EntityId,
        /// Target of the abandoned attack.
        target: EntityId,
        /// Why it was abandoned.
        reason: CancelReason,
    },
    /// An attack ran its full duration.
    AttackFinished {
        /// Attacker.
        attacker: EntityId,
    },
    /// An entity's hp reached zero.
    EntityDied {
        /// Entity that died.
        entity: EntityId,
        /// Entity that landed the killing blow, if any.
        killer: Option<EntityId>,
    },
    /// A corpse was removed from the registry.
    EntityRemoved {
        /// Entity that was removed.
        entity: EntityId,
    },
}

/// Events produced by one call to `Encounter::advance`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvents {
    /// Tick that was simulated.
    pub tick: u64,
    /// Events in emission order, including any queued by commands issued
    /// since the previous tick.
    pub events: Vec<EncounterEvent>,
}

impl TickEvents {
    /// Entities that died this tick.
    #[must_use]
    pub fn deaths(&self) -> Vec<EntityId> {
        self.events
            .iter()
            .filter_map(|event| match event {
                EncounterEvent::EntityDied { entity, .. } => Some(*entity),
                _ => None,
            })
            .collect()
    }

    /// Total damage landed this tick.
    #[must_use]
    pub fn damage_dealt(&self) -> u64 {
        self.events
            .iter()
            .map(|event| match event {
                EncounterEvent::AttackLanded { damage, .. } => u64::from(*damage),
                _ => 0,
            })
            .sum()
    }
}

/// Receives every event an encounter emits.
pub trait EventObserver {
    /// Called once per event, in emission order.
    fn on_event(&mut self, tick: u64, event: &EncounterEvent);
}

impl<F> EventObserver for F
where
    F: FnMut(u64, &EncounterEvent),
{
    fn on_event(&mut self, tick: u64, event: &EncounterEvent) {
        self(tick, event);
    }
}

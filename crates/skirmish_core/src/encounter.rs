//! The encounter façade.
//!
//! An [`Encounter`] owns one self-contained combat: its registry, tick
//! counter, tuning and archetype presets. Input layers talk to it through
//! commands issued between ticks; renderers read [`Encounter::snapshot`].
//! Encounters share nothing, so any number can run side by side.
//!
//! # Example
//!
//! ```
//! use skirmish_core::encounter::Encounter;
//! use skirmish_core::factions::Faction;
//!
//! let mut encounter = Encounter::new();
//! encounter.spawn_starting_roster().unwrap();
//!
//! for _ in 0..120 {
//!     encounter.advance();
//! }
//!
//! assert_eq!(encounter.tick(), 120);
//! assert_eq!(encounter.faction_alive_count(Faction::Allied), 3);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use tracing::debug;

use crate::components::{Ai, AnimationState, EntityId, Health, Movement, Position};
use crate::config::EncounterConfig;
use crate::data::ArchetypeCatalog;
use crate::error::{EncounterError, Result};
use crate::events::{EncounterEvent, EventObserver, TickEvents};
use crate::factions::Faction;
use crate::math::Vec2Fixed;
use crate::registry::Registry;
use crate::snapshot::EntityView;
use crate::systems::{combat_system, movement_system, vitality_system};

/// Opening lineup: archetype and top-left corner.
pub const STARTING_ROSTER: [(&str, i32, i32); 6] = [
    ("knight", 200, 600),
    ("knight", 400, 600),
    ("knight", 600, 600),
    ("skeleton", 341, 467),
    ("skeleton", 500, 400),
    ("skeleton", 700, 400),
];

/// One tactical combat encounter.
///
/// # System Execution Order
///
/// Each call to [`advance`](Self::advance) runs:
/// 1. **Movement** - velocity and knockback
/// 2. **Combat** - targeting, approach and attacks
/// 3. **Vitality** - corpse timers and removal
pub struct Encounter {
    tick: u64,
    registry: Registry,
    config: EncounterConfig,
    catalog: ArchetypeCatalog,
    observers: Vec<Box<dyn EventObserver>>,
    /// Events raised by commands, delivered with the next tick.
    pending: Vec<EncounterEvent>,
}

impl std::fmt::Debug for Encounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encounter")
            .field("tick", &self.tick)
            .field("entities", &self.registry.len())
            .field("config", &self.config)
            .field("archetypes", &self.catalog.len())
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl Default for Encounter {
    fn default() -> Self {
        Self::new()
    }
}

impl Encounter {
    /// Create an empty encounter with the stock presets and default tuning.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tick: 0,
            registry: Registry::new(),
            config: EncounterConfig::default(),
            catalog: ArchetypeCatalog::builtin(),
            observers: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Create an empty encounter with custom tuning and presets.
    ///
    /// # Errors
    ///
    /// Returns an error if either the config or any archetype is invalid.
    pub fn with_setup(config: EncounterConfig, catalog: ArchetypeCatalog) -> Result<Self> {
        config.validate()?;
        catalog.validate()?;
        Ok(Self {
            config,
            catalog,
            ..Self::new()
        })
    }

    /// Current tick. Starts at 0 and increments once per [`advance`](Self::advance).
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Read access to every entity.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Active tuning.
    #[must_use]
    pub fn config(&self) -> &EncounterConfig {
        &self.config
    }

    /// Available spawn presets.
    #[must_use]
    pub fn catalog(&self) -> &ArchetypeCatalog {
        &self.catalog
    }

    /// Register an observer for every future event.
    pub fn subscribe(&mut self, observer: impl EventObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Spawn a combatant of a named archetype with its box's top-left at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`EncounterError::UnknownArchetype`] if `kind` is not in the
    /// catalog, or [`EncounterError::OutOfBounds`] if `position` is outside
    /// the world.
    pub fn spawn(&mut self, kind: &str, position: Vec2Fixed) -> Result<EntityId> {
        let data = self.catalog.require(kind)?;
        in_world(position)?;

        let id = self.registry.create_entity();
        self.registry
            .attach(id, Position::new(position, data.width, data.height))?;
        self.registry.attach(id, Health::new(data.max_hp))?;
        self.registry.attach(id, Movement::new(data.speed))?;
        self.registry.attach(id, data.attack.to_component())?;
        self.registry
            .attach(id, Ai::new(data.faction, data.label.clone()))?;
        self.registry.attach(
            id,
            AnimationState {
                since_tick: self.tick,
                ..AnimationState::default()
            },
        )?;

        debug!(entity = %id, archetype = kind, faction = %data.faction, "spawned");
        self.pending.push(EncounterEvent::Spawned {
            entity: id,
            archetype: kind.to_string(),
            faction: data.faction,
        });
        Ok(id)
    }

    /// Spawn the standard three knights and three skeletons.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog lacks `knight` or `skeleton`.
    pub fn spawn_starting_roster(&mut self) -> Result<Vec<EntityId>> {
        STARTING_ROSTER
            .iter()
            .map(|&(kind, x, y)| self.spawn(kind, Vec2Fixed::from_int(x, y)))
            .collect()
    }

    /// Entity of `faction` whose box contains `point`, lowest id first.
    ///
    /// Corpses still count until they are removed.
    #[must_use]
    pub fn hit_test(&self, point: Vec2Fixed, faction: Faction) -> Option<EntityId> {
        self.registry.iter().find_map(|(id, record)| {
            let (position, ai) = (record.position.as_ref()?, record.ai.as_ref()?);
            (ai.faction == faction && position.bounds().contains(point)).then_some(id)
        })
    }

    /// Order an entity to walk to `point`, dropping any combat target.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is missing, has no AI, or if `point`
    /// is outside the world.
    pub fn issue_move(&mut self, entity: EntityId, point: Vec2Fixed) -> Result<()> {
        in_world(point)?;
        self.ai_mut(entity)?.order_move(point);
        debug!(entity = %entity, x = %point.x, y = %point.y, "move ordered");
        Ok(())
    }

    /// Order an entity to fight `target`, dropping any move order.
    ///
    /// # Errors
    ///
    /// Returns an error if either entity is missing, if `target` is the
    /// entity itself, or if both fight for the same side.
    pub fn issue_attack(&mut self, entity: EntityId, target: EntityId) -> Result<()> {
        if entity == target {
            return Err(EncounterError::InvalidTarget {
                entity,
                target,
                reason: "an entity cannot target itself",
            });
        }
        let target_faction = self.registry.require::<Ai>(target)?.faction;

        let ai = self.ai_mut(entity)?;
        if ai.faction == target_faction {
            return Err(EncounterError::InvalidTarget {
                entity,
                target,
                reason: "target fights for the same side",
            });
        }
        ai.order_attack(target);
        debug!(entity = %entity, target = %target, "attack ordered");
        Ok(())
    }

    /// Add an impulse to an entity's knockback.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is missing, cannot move, or if either
    /// impulse component exceeds the world bound.
    pub fn apply_knockback(&mut self, entity: EntityId, impulse: Vec2Fixed) -> Result<()> {
        in_world(impulse)?;
        self.registry.require_mut::<Movement>(entity)?.knockback += impulse;
        Ok(())
    }

    /// Advance the encounter by one tick.
    ///
    /// Returns every event raised since the previous tick: first those
    /// queued by commands, then those from the systems in run order.
    pub fn advance(&mut self) -> TickEvents {
        let tick = self.tick;
        let mut events = std::mem::take(&mut self.pending);

        movement_system(&mut self.registry, &self.config);
        combat_system(&mut self.registry, &self.config, tick, &mut events);
        vitality_system(&mut self.registry, &self.config, tick, &mut events);

        for observer in &mut self.observers {
            for event in &events {
                observer.on_event(tick, event);
            }
        }

        self.tick += 1;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::trace!(tick = self.tick, state_hash = hash, "encounter state hash");
        }

        TickEvents { tick, events }
    }

    /// Render view of every positioned entity, in ascending id order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<EntityView> {
        self.registry
            .iter()
            .filter_map(|(id, record)| EntityView::from_record(id, record))
            .collect()
    }

    /// Number of living entities fighting for `faction`.
    #[must_use]
    pub fn faction_alive_count(&self, faction: Faction) -> usize {
        self.registry
            .iter()
            .filter(|(_, record)| {
                record.ai.as_ref().is_some_and(|ai| ai.faction == faction)
                    && record.health.as_ref().is_some_and(|health| !health.dead)
            })
            .count()
    }

    /// Calculate a hash of the current encounter state.
    ///
    /// Two encounters that received the same commands on the same ticks
    /// produce the same hash.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);
        self.registry.len().hash(&mut hasher);
        for (id, record) in self.registry.iter() {
            id.hash(&mut hasher);
            record.hash(&mut hasher);
        }
        hasher.finish()
    }

    fn ai_mut(&mut self, entity: EntityId) -> Result<&mut Ai> {
        self.registry.require_mut::<Ai>(entity)
    }
}

fn in_world(point: Vec2Fixed) -> Result<()> {
    if point.within_world() {
        Ok(())
    } else {
        Err(EncounterError::OutOfBounds {
            x: point.x,
            y: point.y,
        })
    }
}

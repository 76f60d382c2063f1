//! Entity registry.
//!
//! Owns every entity and its components. Storage is a closed set of
//! optional slots per entity, so typed access is a field lookup rather
//! than a runtime type-id map.
//!
//! # Determinism
//!
//! Entities live in a `BTreeMap` keyed by [`EntityId`]. Every query walks
//! ids in ascending order, which is what makes target selection and tie
//! breaking reproducible.

use std::collections::BTreeMap;

use crate::components::{AnimationState, Ai, Attack, EntityId, Health, Movement, Position};
use crate::error::{EncounterError, Result};

/// All components of one entity.
///
/// Only slots that are `Some` are active. Fields are public so a system can
/// borrow several components of the same entity mutably at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EntityRecord {
    /// Bounding box and facing.
    pub position: Option<Position>,
    /// Hit points and death state.
    pub health: Option<Health>,
    /// Velocity, speed and knockback.
    pub movement: Option<Movement>,
    /// Attack timeline.
    pub attack: Option<Attack>,
    /// Faction and orders.
    pub ai: Option<Ai>,
    /// Last signalled animation intent.
    pub animation: Option<AnimationState>,
}

mod sealed {
    pub trait Sealed {}
}

/// A component type stored in an [`EntityRecord`] slot.
///
/// Sealed: the component set is closed.
pub trait Component: sealed::Sealed + Sized {
    /// Component name for diagnostics.
    const NAME: &'static str;

    /// Shared access to this type's slot.
    fn slot(record: &EntityRecord) -> &Option<Self>;

    /// Exclusive access to this type's slot.
    fn slot_mut(record: &mut EntityRecord) -> &mut Option<Self>;
}

macro_rules! impl_component {
    ($ty:ty, $field:ident, $name:literal) => {
        impl sealed::Sealed for $ty {}

        impl Component for $ty {
            const NAME: &'static str = $name;

            fn slot(record: &EntityRecord) -> &Option<Self> {
                &record.$field
            }

            fn slot_mut(record: &mut EntityRecord) -> &mut Option<Self> {
                &mut record.$field
            }
        }
    };
}

impl_component!(Position, position, "Position");
impl_component!(Health, health, "Health");
impl_component!(Movement, movement, "Movement");
impl_component!(Attack, attack, "Attack");
impl_component!(Ai, ai, "Ai");
impl_component!(AnimationState, animation, "AnimationState");

/// A set of component types an entity must carry to match a query.
pub trait ComponentSet {
    /// Whether `record` has every component in the set.
    fn matches(record: &EntityRecord) -> bool;
}

impl<A: Component> ComponentSet for (A,) {
    fn matches(record: &EntityRecord) -> bool {
        A::slot(record).is_some()
    }
}

impl<A: Component, B: Component> ComponentSet for (A, B) {
    fn matches(record: &EntityRecord) -> bool {
        A::slot(record).is_some() && B::slot(record).is_some()
    }
}

impl<A: Component, B: Component, C: Component> ComponentSet for (A, B, C) {
    fn matches(record: &EntityRecord) -> bool {
        A::slot(record).is_some() && B::slot(record).is_some() && C::slot(record).is_some()
    }
}

/// Owner of all entities in an encounter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    entities: BTreeMap<EntityId, EntityRecord>,
    next_id: u64,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create an empty registry. The first entity gets id 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Create an entity with no components.
    pub fn create_entity(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.insert(id, EntityRecord::default());
        id
    }

    /// Attach a component, replacing any existing one of the same type.
    pub fn attach<T: Component>(&mut self, entity: EntityId, component: T) -> Result<()> {
        let record = self
            .entities
            .get_mut(&entity)
            .ok_or(EncounterError::EntityNotFound(entity))?;
        *T::slot_mut(record) = Some(component);
        Ok(())
    }

    /// Detach and return a component.
    pub fn detach<T: Component>(&mut self, entity: EntityId) -> Option<T> {
        self.entities
            .get_mut(&entity)
            .and_then(|record| T::slot_mut(record).take())
    }

    /// Look up a component.
    #[must_use]
    pub fn get<T: Component>(&self, entity: EntityId) -> Option<&T> {
        self.entities
            .get(&entity)
            .and_then(|record| T::slot(record).as_ref())
    }

    /// Look up a component mutably.
    pub fn get_mut<T: Component>(&mut self, entity: EntityId) -> Option<&mut T> {
        self.entities
            .get_mut(&entity)
            .and_then(|record| T::slot_mut(record).as_mut())
    }

    /// Look up a component or report which one is missing.
    pub fn require<T: Component>(&self, entity: EntityId) -> Result<&T> {
        let record = self
            .entities
            .get(&entity)
            .ok_or(EncounterError::EntityNotFound(entity))?;
        T::slot(record)
            .as_ref()
            .ok_or(EncounterError::MissingComponent {
                entity,
                component: T::NAME,
            })
    }

    /// Mutable variant of [`require`](Self::require).
    pub fn require_mut<T: Component>(&mut self, entity: EntityId) -> Result<&mut T> {
        let record = self
            .entities
            .get_mut(&entity)
            .ok_or(EncounterError::EntityNotFound(entity))?;
        T::slot_mut(record)
            .as_mut()
            .ok_or(EncounterError::MissingComponent {
                entity,
                component: T::NAME,
            })
    }

    /// All components of an entity.
    #[must_use]
    pub fn record(&self, entity: EntityId) -> Option<&EntityRecord> {
        self.entities.get(&entity)
    }

    /// All components of an entity, mutably.
    pub fn record_mut(&mut self, entity: EntityId) -> Option<&mut EntityRecord> {
        self.entities.get_mut(&entity)
    }

    /// Ids of every entity carrying all components in `Q`, ascending.
    ///
    /// Returns an owned list so callers can mutate the registry while
    /// walking it.
    #[must_use]
    pub fn query<Q: ComponentSet>(&self) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, record)| Q::matches(record))
            .map(|(&id, _)| id)
            .collect()
    }

    /// Remove an entity and all its components.
    pub fn remove(&mut self, entity: EntityId) -> Option<EntityRecord> {
        self.entities.remove(&entity)
    }

    /// Check if an entity exists.
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    /// Get the number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterate over all entities in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &EntityRecord)> {
        self.entities.iter().map(|(&id, record)| (id, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factions::Faction;
    use crate::math::{Fixed, Vec2Fixed};

    fn position() -> Position {
        Position::new(Vec2Fixed::ZERO, Fixed::from_num(80), Fixed::from_num(100))
    }

    #[test]
    fn test_ids_are_monotonic_and_never_reused() {
        let mut registry = Registry::new();
        let a = registry.create_entity();
        let b = registry.create_entity();
        assert_eq!(a, EntityId(1));
        assert_eq!(b, EntityId(2));

        registry.remove(b);
        let c = registry.create_entity();
        assert_eq!(c, EntityId(3));
        assert!(!registry.contains(b));
    }

    #[test]
    fn test_attach_and_get() {
        let mut registry = Registry::new();
        let e = registry.create_entity();
        registry.attach(e, Health::new(40)).unwrap();

        assert_eq!(registry.get::<Health>(e).map(|h| h.hp), Some(40));
        assert!(registry.get::<Movement>(e).is_none());

        registry.get_mut::<Health>(e).unwrap().take_damage(15);
        assert_eq!(registry.get::<Health>(e).unwrap().hp, 25);
    }

    #[test]
    fn test_attach_to_missing_entity_fails() {
        let mut registry = Registry::new();
        let result = registry.attach(EntityId(99), Health::new(1));
        assert!(matches!(result, Err(EncounterError::EntityNotFound(EntityId(99)))));
    }

    #[test]
    fn test_require_names_missing_component() {
        let mut registry = Registry::new();
        let e = registry.create_entity();
        let err = registry.require::<Attack>(e).unwrap_err();
        assert!(matches!(
            err,
            EncounterError::MissingComponent {
                component: "Attack",
                ..
            }
        ));
    }

    #[test]
    fn test_query_is_superset_match_in_id_order() {
        let mut registry = Registry::new();
        let a = registry.create_entity();
        let b = registry.create_entity();
        let c = registry.create_entity();

        for id in [c, a, b] {
            registry.attach(id, position()).unwrap();
        }
        registry.attach(a, Health::new(10)).unwrap();
        registry.attach(c, Health::new(10)).unwrap();
        registry.attach(c, Ai::new(Faction::Allied, "Knight")).unwrap();

        assert_eq!(registry.query::<(Position,)>(), vec![a, b, c]);
        assert_eq!(registry.query::<(Position, Health)>(), vec![a, c]);
        assert_eq!(registry.query::<(Position, Health, Ai)>(), vec![c]);
    }

    #[test]
    fn test_remove_drops_all_components() {
        let mut registry = Registry::new();
        let e = registry.create_entity();
        registry.attach(e, position()).unwrap();
        registry.attach(e, Health::new(5)).unwrap();

        let record = registry.remove(e).unwrap();
        assert!(record.health.is_some());
        assert!(registry.get::<Position>(e).is_none());
        assert!(registry.query::<(Position,)>().is_empty());
        assert!(registry.remove(e).is_none());
    }

    #[test]
    fn test_detach() {
        let mut registry = Registry::new();
        let e = registry.create_entity();
        registry.attach(e, Movement::new(Fixed::from_num(2))).unwrap();
        assert!(registry.detach::<Movement>(e).is_some());
        assert!(registry.get::<Movement>(e).is_none());
        assert!(registry.contains(e));
    }
}

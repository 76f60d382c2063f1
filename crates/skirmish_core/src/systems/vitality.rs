//! Death timers and corpse removal.

use tracing::debug;

use crate::components::{AnimationIntent, EntityId, Health};
use crate::config::EncounterConfig;
use crate::events::EncounterEvent;
use crate::math::Fixed;
use crate::registry::Registry;

use super::signal;

/// Ages every corpse by one tick and removes those past the removal delay.
///
/// A corpse is removed on the tick its timer first exceeds
/// `removal_delay_ticks`. Removal drops every component, so AI targets
/// that still name the entity stop resolving.
pub fn vitality_system(
    registry: &mut Registry,
    config: &EncounterConfig,
    tick: u64,
    events: &mut Vec<EncounterEvent>,
) {
    let mut expired = Vec::new();

    for id in registry.query::<(Health,)>() {
        let Some(record) = registry.record_mut(id) else {
            continue;
        };
        let Some(health) = record.health.as_mut() else {
            continue;
        };
        if !health.dead {
            continue;
        }

        health.removal_timer = health.removal_timer.saturating_add(1);
        let timer = health.removal_timer;
        signal(record, AnimationIntent::Death, tick);

        if timer > config.removal_delay_ticks {
            expired.push(id);
        }
    }

    for id in expired {
        registry.remove(id);
        debug!(entity = %id, "corpse removed");
        events.push(EncounterEvent::EntityRemoved { entity: id });
    }
}

/// Health fraction for bar rendering, if the entity has health.
#[must_use]
pub fn hp_ratio(registry: &Registry, entity: EntityId) -> Option<Fixed> {
    registry.get::<Health>(entity).map(Health::ratio)
}

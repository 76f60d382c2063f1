//! Encounter systems.
//!
//! Systems contain the logic that processes components. Each one walks the
//! registry in ascending entity id order and mutates it in place, so a
//! system always sees what earlier systems (and earlier entities within the
//! same system) wrote this tick.
//!
//! Per-tick order is fixed:
//! 1. [`movement_system`] integrates velocity and knockback.
//! 2. [`combat_system`] runs the per-entity decision state machine.
//! 3. [`vitality_system`] ages corpses and removes expired ones.

mod combat;
mod movement;
mod vitality;

pub use combat::{combat_system, edge_distance, nearest_target};
pub use movement::{decay_knockback, integrate_motion, movement_system};
pub use vitality::{hp_ratio, vitality_system};

use crate::components::AnimationIntent;
use crate::registry::EntityRecord;

/// Signal an animation intent if the entity carries animation state.
fn signal(record: &mut EntityRecord, intent: AnimationIntent, tick: u64) {
    if let Some(animation) = record.animation.as_mut() {
        animation.switch(intent, tick);
    }
}

/// Zero velocity if the entity can move.
fn halt(record: &mut EntityRecord) {
    if let Some(movement) = record.movement.as_mut() {
        movement.stop();
    }
}

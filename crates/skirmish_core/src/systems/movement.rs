//! Movement integration.

use crate::components::{Movement, Position};
use crate::config::EncounterConfig;
use crate::math::{Fixed, Vec2Fixed};
use crate::registry::Registry;

/// Applies velocity and knockback to every entity with Position and Movement.
pub fn movement_system(registry: &mut Registry, config: &EncounterConfig) {
    for id in registry.query::<(Position, Movement)>() {
        let Some(record) = registry.record_mut(id) else {
            continue;
        };
        if let (Some(position), Some(movement)) =
            (record.position.as_mut(), record.movement.as_mut())
        {
            integrate_motion(position, movement, config);
        }
    }
}

/// One tick of motion for a single entity.
///
/// Velocity moves the box directly. Knockback moves the anchor, then
/// decays. The box never leaves the world bounds. Facing follows horizontal
/// velocity and is kept when it is zero.
pub fn integrate_motion(
    position: &mut Position,
    movement: &mut Movement,
    config: &EncounterConfig,
) {
    position.translate(movement.velocity);

    if !movement.knockback.is_zero() {
        let anchor = position.anchor() + movement.knockback;
        position.set_from_anchor(anchor);
        movement.knockback = decay_knockback(movement.knockback, config);
    }
    position.clamp_to_world();

    position.face_toward(movement.velocity.x);
}

/// Scale knockback by the decay factor, snapping each axis to zero once
/// its magnitude falls below the snap threshold.
#[must_use]
pub fn decay_knockback(knockback: Vec2Fixed, config: &EncounterConfig) -> Vec2Fixed {
    let snap = |v: Fixed| {
        if v.saturating_abs() < config.knockback_snap {
            Fixed::ZERO
        } else {
            v
        }
    };
    let decayed = knockback.scale(config.knockback_decay);
    Vec2Fixed::new(snap(decayed.x), snap(decayed.y))
}

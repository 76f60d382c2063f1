//! Combat and AI decisions.
//!
//! Every entity with Position, Attack and Ai is evaluated once per tick,
//! in ascending id order. The rules below are checked in strict priority
//! order and the first that applies ends the entity's turn:
//!
//! 1. Dead entities drop their attack, stop, and do nothing else.
//! 2. Opposing entities re-acquire the nearest live allied entity.
//! 3. With no target, a move order walks toward its point.
//! 4. With neither a target nor a move order, the entity idles.
//! 5. A target that is gone or dead is dropped.
//! 6. An attack in progress cancels when out of range, lands on its swing
//!    frame, or otherwise waits.
//! 7. In range: start an attack when off cooldown, else wait.
//! 8. Out of range: walk toward a melee spot beside the target.
//!
//! Attack timers advance once per tick, after the death check and before
//! everything else. Surviving targets of a landed swing show `Hit` for the
//! rest of the tick, whatever they decided for themselves.

use tracing::debug;

use crate::components::{Ai, AnimationIntent, Attack, EntityId, Facing, Position};
use crate::config::EncounterConfig;
use crate::events::{CancelReason, EncounterEvent};
use crate::factions::Faction;
use crate::math::{Fixed, Vec2Fixed};
use crate::registry::{EntityRecord, Registry};

use super::{halt, signal};

/// A landed swing waiting to be applied to its target.
struct Strike {
    attacker: EntityId,
    target: EntityId,
    damage: u32,
}

/// What the decision steps need to know about a target.
struct TargetView {
    anchor: Vec2Fixed,
    dead: bool,
}

impl TargetView {
    fn of(record: &EntityRecord) -> Option<Self> {
        let position = record.position.as_ref()?;
        let health = record.health.as_ref()?;
        Some(Self {
            anchor: position.anchor(),
            dead: health.dead,
        })
    }
}

/// Runs the decision state machine for every combatant.
pub fn combat_system(
    registry: &mut Registry,
    config: &EncounterConfig,
    tick: u64,
    events: &mut Vec<EncounterEvent>,
) {
    for id in registry.query::<(Position, Attack, Ai)>() {
        evaluate(registry, id, config, tick, events);
    }

    let struck: Vec<EntityId> = events
        .iter()
        .filter_map(|event| match event {
            EncounterEvent::AttackLanded {
                target,
                remaining_hp,
                ..
            } if *remaining_hp > 0 => Some(*target),
            _ => None,
        })
        .collect();
    for id in struck {
        if let Some(record) = registry.record_mut(id) {
            if record.health.as_ref().is_some_and(|health| !health.dead) {
                signal(record, AnimationIntent::Hit, tick);
            }
        }
    }
}

/// Anchor-to-anchor distance minus the sprite buffer, floored at zero.
#[must_use]
pub fn edge_distance(from: Vec2Fixed, to: Vec2Fixed, sprite_buffer: Fixed) -> Fixed {
    (from.distance(to) - sprite_buffer).max(Fixed::ZERO)
}

/// Closest live entity of `faction` by edge distance.
///
/// Ties go to the lowest entity id: candidates are visited in ascending
/// order and only a strictly smaller distance replaces the current best.
#[must_use]
pub fn nearest_target(
    registry: &Registry,
    seeker: EntityId,
    from: Vec2Fixed,
    faction: Faction,
    sprite_buffer: Fixed,
) -> Option<EntityId> {
    let mut best: Option<(EntityId, Fixed)> = None;

    for (candidate, record) in registry.iter() {
        if candidate == seeker {
            continue;
        }
        let (Some(position), Some(health), Some(ai)) =
            (&record.position, &record.health, &record.ai)
        else {
            continue;
        };
        if ai.faction != faction || health.dead {
            continue;
        }

        let distance = edge_distance(from, position.anchor(), sprite_buffer);
        if best.map_or(true, |(_, closest)| distance < closest) {
            best = Some((candidate, distance));
        }
    }

    best.map(|(id, _)| id)
}

fn evaluate(
    registry: &mut Registry,
    id: EntityId,
    config: &EncounterConfig,
    tick: u64,
    events: &mut Vec<EncounterEvent>,
) {
    let Some(record) = registry.record_mut(id) else {
        return;
    };

    // 1. Death override
    if record.health.as_ref().is_some_and(|health| health.dead) {
        hold_dead(record, tick);
        return;
    }

    if let Some(attack) = record.attack.as_mut() {
        if attack.advance_timers() {
            events.push(EncounterEvent::AttackFinished { attacker: id });
        }
    }

    // 2. Retargeting
    retarget(registry, id, config, events);

    let Some((target, move_target)) = registry
        .record(id)
        .and_then(|record| record.ai.as_ref())
        .map(|ai| (ai.target, ai.move_target))
    else {
        return;
    };

    let Some(target) = target else {
        let Some(record) = registry.record_mut(id) else {
            return;
        };
        match move_target {
            // 3. Move-to-point
            Some(point) => walk_to_point(record, id, point, tick, events),
            // 4. Idle
            None => {
                halt(record);
                signal(record, AnimationIntent::Idle, tick);
            }
        }
        return;
    };

    // 5. Target validity
    let view = registry.record(target).and_then(TargetView::of);
    let Some(record) = registry.record_mut(id) else {
        return;
    };
    let target_anchor = match view {
        Some(view) if !view.dead => view.anchor,
        _ => {
            drop_target(record, id, target, tick, events);
            return;
        }
    };

    // 6-8.
    if let Some(strike) = engage(record, id, target, target_anchor, config, tick, events) {
        land_strike(registry, strike, tick, events);
    }
}

fn hold_dead(record: &mut EntityRecord, tick: u64) {
    if let Some(attack) = record.attack.as_mut() {
        attack.attacking = false;
        attack.swing_timer = 0;
    }
    halt(record);
    signal(record, AnimationIntent::Death, tick);
}

fn retarget(
    registry: &mut Registry,
    id: EntityId,
    config: &EncounterConfig,
    events: &mut Vec<EncounterEvent>,
) {
    let Some(record) = registry.record(id) else {
        return;
    };
    let (Some(position), Some(ai)) = (&record.position, &record.ai) else {
        return;
    };
    if !ai.faction.auto_acquires_targets() {
        return;
    }

    let previous = ai.target;
    let nearest = nearest_target(
        registry,
        id,
        position.anchor(),
        ai.faction.opposite(),
        config.sprite_buffer,
    );
    if nearest == previous {
        return;
    }

    if let Some(ai) = registry.get_mut::<Ai>(id) {
        ai.target = nearest;
    }
    match (nearest, previous) {
        (Some(target), _) => {
            debug!(entity = %id, target = %target, "target acquired");
            events.push(EncounterEvent::TargetAcquired { entity: id, target });
        }
        (None, Some(target)) => {
            debug!(entity = %id, target = %target, "no targets left");
            events.push(EncounterEvent::TargetLost { entity: id, target });
        }
        (None, None) => {}
    }
}

fn walk_to_point(
    record: &mut EntityRecord,
    id: EntityId,
    point: Vec2Fixed,
    tick: u64,
    events: &mut Vec<EncounterEvent>,
) {
    let (Some(position), Some(movement)) = (record.position.as_mut(), record.movement.as_mut())
    else {
        signal(record, AnimationIntent::Idle, tick);
        return;
    };

    let delta = point - position.anchor();
    if delta.length() <= movement.speed {
        position.set_from_anchor(point);
        movement.stop();
        if let Some(ai) = record.ai.as_mut() {
            ai.move_target = None;
        }
        signal(record, AnimationIntent::Idle, tick);
        events.push(EncounterEvent::MoveCompleted { entity: id });
    } else {
        let direction = delta.normalize();
        movement.velocity = direction.scale(movement.speed);
        position.face_toward(direction.x);
        signal(record, AnimationIntent::Move, tick);
    }
}

/// Clear a target that is gone or dead, abandoning any swing at it.
fn drop_target(
    record: &mut EntityRecord,
    id: EntityId,
    target: EntityId,
    tick: u64,
    events: &mut Vec<EncounterEvent>,
) {
    if let Some(attack) = record.attack.as_mut() {
        if attack.attacking {
            attack.cancel();
            debug!(attacker = %id, target = %target, "attack cancelled, target died");
            events.push(EncounterEvent::AttackCancelled {
                attacker: id,
                target,
                reason: CancelReason::TargetDied,
            });
            signal(record, AnimationIntent::Idle, tick);
        }
    }
    if let Some(ai) = record.ai.as_mut() {
        ai.target = None;
    }
    events.push(EncounterEvent::TargetLost { entity: id, target });
}

/// Steps 6 to 8. Returns a strike when this tick is the swing frame.
fn engage(
    record: &mut EntityRecord,
    id: EntityId,
    target: EntityId,
    target_anchor: Vec2Fixed,
    config: &EncounterConfig,
    tick: u64,
    events: &mut Vec<EncounterEvent>,
) -> Option<Strike> {
    let (Some(position), Some(attack)) = (record.position.as_mut(), record.attack.as_mut()) else {
        return None;
    };
    let anchor = position.anchor();
    let distance = edge_distance(anchor, target_anchor, config.sprite_buffer);

    // 6. In-progress attack
    if attack.attacking {
        if distance > attack.range {
            attack.cancel();
            debug!(attacker = %id, target = %target, "attack cancelled, out of range");
            events.push(EncounterEvent::AttackCancelled {
                attacker: id,
                target,
                reason: CancelReason::OutOfRange,
            });
            signal(record, AnimationIntent::Idle, tick);
            return None;
        }
        if attack.is_swing_frame() {
            attack.start_cooldown();
            return Some(Strike {
                attacker: id,
                target,
                damage: attack.damage,
            });
        }
        return None;
    }

    // 7. In range
    if distance <= attack.range {
        if attack.can_attack() {
            attack.begin();
            position.face_toward(target_anchor.x - anchor.x);
            debug!(attacker = %id, target = %target, "attack started");
            events.push(EncounterEvent::AttackStarted {
                attacker: id,
                target,
            });
            signal(record, AnimationIntent::Attack, tick);
        } else {
            halt(record);
            signal(record, AnimationIntent::Idle, tick);
        }
        return None;
    }

    // 8. Out of range
    approach(record, target_anchor, config, tick);
    None
}

/// Walk toward the melee spot on whichever side of the target we are on.
fn approach(
    record: &mut EntityRecord,
    target_anchor: Vec2Fixed,
    config: &EncounterConfig,
    tick: u64,
) {
    let (Some(position), Some(movement)) = (record.position.as_mut(), record.movement.as_mut())
    else {
        return;
    };

    let anchor = position.anchor();
    let (spot_x, facing) = if anchor.x < target_anchor.x {
        (target_anchor.x - config.melee_offset, Facing::Right)
    } else {
        (target_anchor.x + config.melee_offset, Facing::Left)
    };
    position.facing = facing;

    let delta = Vec2Fixed::new(spot_x, target_anchor.y) - anchor;
    movement.velocity = if delta.length() > movement.speed {
        delta.normalize().scale(movement.speed)
    } else {
        delta
    };
    signal(record, AnimationIntent::Move, tick);
}

fn land_strike(
    registry: &mut Registry,
    strike: Strike,
    tick: u64,
    events: &mut Vec<EncounterEvent>,
) {
    let Some(record) = registry.record_mut(strike.target) else {
        return;
    };
    let Some(health) = record.health.as_mut() else {
        return;
    };

    let died = health.take_damage(strike.damage);
    let remaining_hp = health.hp;
    debug!(
        attacker = %strike.attacker,
        target = %strike.target,
        damage = strike.damage,
        remaining_hp,
        "attack landed"
    );
    events.push(EncounterEvent::AttackLanded {
        attacker: strike.attacker,
        target: strike.target,
        damage: strike.damage,
        remaining_hp,
    });

    if died {
        debug!(entity = %strike.target, killer = %strike.attacker, "entity died");
        signal(record, AnimationIntent::Death, tick);
        events.push(EncounterEvent::EntityDied {
            entity: strike.target,
            killer: Some(strike.attacker),
        });
    }
}

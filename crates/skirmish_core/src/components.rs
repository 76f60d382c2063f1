//! ECS component definitions.
//!
//! Components are plain data with small helpers that keep their own
//! invariants. Every combatant carries the same fixed set: [`Position`],
//! [`Health`], [`Movement`], [`Attack`], [`Ai`] and [`AnimationState`].

use serde::{Deserialize, Serialize};

use crate::factions::Faction;
use crate::math::{fixed_decimal, Fixed, Vec2Fixed};

/// Unique identifier for entities.
///
/// Ids are handed out in increasing order and never reused, so a stale
/// id simply stops resolving once its entity is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// Spatial
// ============================================================================

/// Horizontal facing of a sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    /// Facing toward negative x.
    Left,
    /// Facing toward positive x.
    #[default]
    Right,
}

impl Facing {
    /// Facing implied by a horizontal direction; zero keeps `current`.
    #[must_use]
    pub fn from_direction(dx: Fixed, current: Self) -> Self {
        if dx > Fixed::ZERO {
            Self::Right
        } else if dx < Fixed::ZERO {
            Self::Left
        } else {
            current
        }
    }
}

/// Axis-aligned rectangle, origin at the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    #[serde(with = "fixed_decimal")]
    pub x: Fixed,
    /// Top edge.
    #[serde(with = "fixed_decimal")]
    pub y: Fixed,
    /// Width.
    #[serde(with = "fixed_decimal")]
    pub width: Fixed,
    /// Height.
    #[serde(with = "fixed_decimal")]
    pub height: Fixed,
}

impl Rect {
    /// Whether the point lies inside the rectangle, edges included.
    #[must_use]
    pub fn contains(&self, point: Vec2Fixed) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// Position component: a bounding rectangle plus facing.
///
/// `x`/`y` is the top-left corner. All distance and knockback math goes
/// through the [`anchor`](Self::anchor), the bottom-center of the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Left edge.
    #[serde(with = "fixed_decimal")]
    pub x: Fixed,
    /// Top edge.
    #[serde(with = "fixed_decimal")]
    pub y: Fixed,
    /// Box width.
    #[serde(with = "fixed_decimal")]
    pub width: Fixed,
    /// Box height.
    #[serde(with = "fixed_decimal")]
    pub height: Fixed,
    /// Current facing.
    pub facing: Facing,
}

impl Position {
    /// Create a position from a top-left corner and box size.
    #[must_use]
    pub fn new(origin: Vec2Fixed, width: Fixed, height: Fixed) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            width,
            height,
            facing: Facing::default(),
        }
    }

    /// Top-left corner.
    #[must_use]
    pub fn origin(&self) -> Vec2Fixed {
        Vec2Fixed::new(self.x, self.y)
    }

    /// Bottom-center point of the box.
    #[must_use]
    pub fn anchor(&self) -> Vec2Fixed {
        self.origin() + Vec2Fixed::new(self.width / 2, self.height)
    }

    /// Move the box so its anchor lands on `anchor`.
    pub fn set_from_anchor(&mut self, anchor: Vec2Fixed) {
        let origin = anchor - Vec2Fixed::new(self.width / 2, self.height);
        self.x = origin.x;
        self.y = origin.y;
    }

    /// Shift the box by `delta`.
    pub fn translate(&mut self, delta: Vec2Fixed) {
        let origin = self.origin() + delta;
        self.x = origin.x;
        self.y = origin.y;
    }

    /// Pull the top-left corner back inside the world bounds.
    pub fn clamp_to_world(&mut self) {
        let origin = self.origin().clamp_to_world();
        self.x = origin.x;
        self.y = origin.y;
    }

    /// Update facing from a horizontal direction; zero keeps the current facing.
    pub fn face_toward(&mut self, dx: Fixed) {
        self.facing = Facing::from_direction(dx, self.facing);
    }

    /// Current bounding rectangle.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

// ============================================================================
// Vitality
// ============================================================================

/// Health component.
///
/// `hp` never leaves `[0, max_hp]`, and `dead` flips to true exactly once,
/// on the hit that brings `hp` to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub hp: u32,
    /// Maximum health points.
    pub max_hp: u32,
    /// Set once when `hp` reaches zero.
    pub dead: bool,
    /// Ticks spent dead. Meaningless while alive.
    pub removal_timer: u32,
}

impl Health {
    /// Create new health component at full health.
    #[must_use]
    pub const fn new(max_hp: u32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            dead: max_hp == 0,
            removal_timer: 0,
        }
    }

    /// Apply damage, flooring at zero.
    ///
    /// Returns `true` only on the call that kills the entity; hitting an
    /// already-dead entity keeps `hp` at zero and returns `false`.
    pub fn take_damage(&mut self, amount: u32) -> bool {
        self.hp = self.hp.saturating_sub(amount);
        if self.hp == 0 && !self.dead {
            self.dead = true;
            return true;
        }
        false
    }

    /// `hp / max_hp` in `[0, 1]`; zero when `max_hp` is zero.
    #[must_use]
    pub fn ratio(&self) -> Fixed {
        if self.max_hp == 0 {
            return Fixed::ZERO;
        }
        let bits = (u64::from(self.hp.min(self.max_hp)) << 32) / u64::from(self.max_hp);
        Fixed::from_bits(i64::try_from(bits).unwrap_or(i64::MAX))
    }
}

// ============================================================================
// Motion
// ============================================================================

/// Movement component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Movement {
    /// Displacement applied by the next movement pass.
    pub velocity: Vec2Fixed,
    /// Maximum displacement per tick.
    #[serde(with = "fixed_decimal")]
    pub speed: Fixed,
    /// Transient displacement that decays independently of velocity.
    pub knockback: Vec2Fixed,
}

impl Movement {
    /// Create a stationary movement component.
    #[must_use]
    pub const fn new(speed: Fixed) -> Self {
        Self {
            velocity: Vec2Fixed::ZERO,
            speed,
            knockback: Vec2Fixed::ZERO,
        }
    }

    /// Zero the velocity. Knockback is left alone.
    pub fn stop(&mut self) {
        self.velocity = Vec2Fixed::ZERO;
    }
}

// ============================================================================
// Combat
// ============================================================================

/// Melee attack timeline and cooldown.
///
/// An attack runs for `duration` ticks and commits damage on the single
/// tick where `swing_timer == swing_frame`. Cooldown starts at the swing,
/// not at the start of the attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attack {
    /// Ticks between swings.
    pub cooldown: u32,
    /// Ticks until the next attack may start.
    pub cooldown_remaining: u32,
    /// Damage per landed swing.
    pub damage: u32,
    /// Maximum edge distance for starting or continuing an attack.
    #[serde(with = "fixed_decimal")]
    pub range: Fixed,
    /// Length of one attack in ticks.
    pub duration: u32,
    /// Tick within the attack at which damage lands.
    pub swing_frame: u32,
    /// Ticks elapsed in the current attack.
    pub swing_timer: u32,
    /// Whether an attack is in progress.
    pub attacking: bool,
}

impl Default for Attack {
    fn default() -> Self {
        Self {
            cooldown: 60,
            cooldown_remaining: 0,
            damage: 10,
            range: Fixed::from_num(120),
            duration: 30,
            swing_frame: 15,
            swing_timer: 0,
            attacking: false,
        }
    }
}

impl Attack {
    /// Create an attack with default timing.
    #[must_use]
    pub fn new(damage: u32, range: Fixed) -> Self {
        Self {
            damage,
            range,
            ..Self::default()
        }
    }

    /// Set the cooldown between swings.
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: u32) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Set the attack duration and swing frame.
    #[must_use]
    pub fn with_timing(mut self, duration: u32, swing_frame: u32) -> Self {
        self.duration = duration;
        self.swing_frame = swing_frame;
        self
    }

    /// Whether a new attack may start now.
    #[must_use]
    pub fn can_attack(&self) -> bool {
        self.cooldown_remaining == 0 && !self.attacking
    }

    /// Whether this tick is the one that commits damage.
    #[must_use]
    pub fn is_swing_frame(&self) -> bool {
        self.attacking && self.swing_timer == self.swing_frame
    }

    /// Start a new attack.
    pub fn begin(&mut self) {
        self.attacking = true;
        self.swing_timer = 0;
    }

    /// Abort the attack. Forfeits any remaining cooldown.
    pub fn cancel(&mut self) {
        self.attacking = false;
        self.swing_timer = 0;
        self.cooldown_remaining = 0;
    }

    /// Begin the cooldown after a landed swing.
    pub fn start_cooldown(&mut self) {
        self.cooldown_remaining = self.cooldown;
    }

    /// Advance the swing timer and cooldown by one tick.
    ///
    /// Returns `true` when the attack ran its full duration and ended.
    pub fn advance_timers(&mut self) -> bool {
        let mut finished = false;
        if self.attacking {
            self.swing_timer += 1;
            if self.swing_timer >= self.duration {
                self.attacking = false;
                self.swing_timer = 0;
                finished = true;
            }
        }
        self.cooldown_remaining = self.cooldown_remaining.saturating_sub(1);
        finished
    }
}

// ============================================================================
// Decision state
// ============================================================================

/// AI and order state.
///
/// `target` is a weak reference. It may name an entity that has since been
/// removed, so it is re-validated on every use.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ai {
    /// Side this entity fights for.
    pub faction: Faction,
    /// Current combat target.
    pub target: Option<EntityId>,
    /// Point to walk to while no combat target is set.
    pub move_target: Option<Vec2Fixed>,
    /// Display label.
    pub label: String,
}

impl Ai {
    /// Create AI state with no orders.
    #[must_use]
    pub fn new(faction: Faction, label: impl Into<String>) -> Self {
        Self {
            faction,
            target: None,
            move_target: None,
            label: label.into(),
        }
    }

    /// Whether a combat target is set.
    #[must_use]
    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }

    /// Whether a move-to-point target is set.
    #[must_use]
    pub fn has_move_target(&self) -> bool {
        self.move_target.is_some()
    }

    /// Replace any combat target with a move order.
    pub fn order_move(&mut self, point: Vec2Fixed) {
        self.target = None;
        self.move_target = Some(point);
    }

    /// Replace any move order with a combat target.
    pub fn order_attack(&mut self, target: EntityId) {
        self.move_target = None;
        self.target = Some(target);
    }
}

/// Discrete animation intent for the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationIntent {
    /// Standing still.
    #[default]
    Idle,
    /// Walking.
    Move,
    /// Mid-attack.
    Attack,
    /// Just took damage.
    Hit,
    /// Dead, until removed.
    Death,
}

/// Last signalled animation intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AnimationState {
    /// Current intent.
    pub intent: AnimationIntent,
    /// Tick at which `intent` last changed.
    pub since_tick: u64,
}

impl AnimationState {
    /// Signal an intent. Re-signalling the current intent keeps `since_tick`.
    ///
    /// Returns `true` if the intent changed.
    pub fn switch(&mut self, intent: AnimationIntent, tick: u64) -> bool {
        if self.intent == intent {
            return false;
        }
        self.intent = intent;
        self.since_tick = tick;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(n: i32) -> Fixed {
        Fixed::from_num(n)
    }

    #[test]
    fn test_anchor_round_trip() {
        let mut pos = Position::new(Vec2Fixed::from_int(200, 600), fixed(80), fixed(100));
        assert_eq!(pos.anchor(), Vec2Fixed::from_int(240, 700));

        pos.set_from_anchor(Vec2Fixed::from_int(0, 0));
        assert_eq!(pos.origin(), Vec2Fixed::from_int(-40, -100));
        assert_eq!(pos.anchor(), Vec2Fixed::ZERO);
    }

    #[test]
    fn test_rect_contains_is_edge_inclusive() {
        let rect = Position::new(Vec2Fixed::from_int(10, 20), fixed(80), fixed(100)).bounds();
        assert!(rect.contains(Vec2Fixed::from_int(10, 20)));
        assert!(rect.contains(Vec2Fixed::from_int(90, 120)));
        assert!(rect.contains(Vec2Fixed::from_int(50, 70)));
        assert!(!rect.contains(Vec2Fixed::from_int(91, 70)));
        assert!(!rect.contains(Vec2Fixed::from_int(50, 19)));
    }

    #[test]
    fn test_facing_zero_direction_keeps_current() {
        assert_eq!(Facing::from_direction(fixed(0), Facing::Left), Facing::Left);
        assert_eq!(Facing::from_direction(fixed(3), Facing::Left), Facing::Right);
        assert_eq!(Facing::from_direction(fixed(-3), Facing::Right), Facing::Left);
    }

    #[test]
    fn test_health_take_damage_sequence() {
        let mut health = Health::new(50);
        for _ in 0..3 {
            assert!(!health.take_damage(15));
        }
        assert_eq!(health.hp, 5);
        assert!(!health.dead);

        assert!(health.take_damage(15));
        assert_eq!(health.hp, 0);
        assert!(health.dead);

        // Already dead: still clamped, no second death
        assert!(!health.take_damage(15));
        assert_eq!(health.hp, 0);
        assert!(health.dead);
    }

    #[test]
    fn test_health_ratio() {
        let mut health = Health::new(200);
        assert_eq!(health.ratio(), Fixed::from_num(1));
        health.take_damage(50);
        assert_eq!(health.ratio(), Fixed::from_num(0.75));
        health.take_damage(500);
        assert_eq!(health.ratio(), Fixed::ZERO);
        assert_eq!(Health::new(0).ratio(), Fixed::ZERO);
    }

    #[test]
    fn test_attack_timeline() {
        let mut attack = Attack::new(10, fixed(120)).with_cooldown(5).with_timing(4, 2);
        assert!(attack.can_attack());

        attack.begin();
        assert!(!attack.can_attack());
        assert!(!attack.advance_timers());
        assert!(!attack.is_swing_frame());
        assert!(!attack.advance_timers());
        assert!(attack.is_swing_frame());
        attack.start_cooldown();

        assert!(!attack.advance_timers());
        assert!(attack.advance_timers());
        assert!(!attack.attacking);
        assert_eq!(attack.cooldown_remaining, 3);
        assert!(!attack.can_attack());
    }

    #[test]
    fn test_attack_cancel_forfeits_cooldown() {
        let mut attack = Attack::default();
        attack.begin();
        attack.start_cooldown();
        attack.cancel();
        assert!(attack.can_attack());
        assert_eq!(attack.swing_timer, 0);
    }

    #[test]
    fn test_orders_are_mutually_exclusive() {
        let mut ai = Ai::new(Faction::Allied, "Knight");
        ai.order_attack(EntityId(7));
        assert!(ai.has_target());

        ai.order_move(Vec2Fixed::from_int(5, 5));
        assert!(!ai.has_target());
        assert!(ai.has_move_target());

        ai.order_attack(EntityId(7));
        assert!(!ai.has_move_target());
    }

    #[test]
    fn test_animation_switch_tracks_changes_only() {
        let mut anim = AnimationState::default();
        assert!(!anim.switch(AnimationIntent::Idle, 5));
        assert_eq!(anim.since_tick, 0);
        assert!(anim.switch(AnimationIntent::Move, 7));
        assert!(!anim.switch(AnimationIntent::Move, 9));
        assert_eq!(anim.since_tick, 7);
    }
}

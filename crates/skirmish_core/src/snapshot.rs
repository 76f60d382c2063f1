//! Read-only render view of an encounter.

use serde::{Deserialize, Serialize};

use crate::components::{AnimationIntent, EntityId, Facing, Rect};
use crate::factions::Faction;
use crate::registry::EntityRecord;

/// What a renderer needs to draw one entity for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    /// Entity shown.
    pub id: EntityId,
    /// Display label, empty if the entity has no AI.
    pub label: String,
    /// Side, if the entity has AI.
    pub faction: Option<Faction>,
    /// Bounding box.
    pub bounds: Rect,
    /// Sprite facing.
    pub facing: Facing,
    /// Animation to play.
    pub intent: AnimationIntent,
    /// Tick at which `intent` began.
    pub intent_since: u64,
    /// Health bar fill in `[0, 1]`, if the entity has health.
    pub hp_ratio: Option<f32>,
    /// Current hp, 0 without health.
    pub hp: u32,
    /// Maximum hp, 0 without health.
    pub max_hp: u32,
    /// Whether the entity is a corpse awaiting removal.
    pub dead: bool,
    /// Whether the entity is mid-attack.
    pub attacking: bool,
}

impl EntityView {
    /// Build a view; entities without a position are not drawn.
    #[must_use]
    pub fn from_record(id: EntityId, record: &EntityRecord) -> Option<Self> {
        let position = record.position.as_ref()?;
        let animation = record.animation.unwrap_or_default();
        let health = record.health.as_ref();

        Some(Self {
            id,
            label: record
                .ai
                .as_ref()
                .map(|ai| ai.label.clone())
                .unwrap_or_default(),
            faction: record.ai.as_ref().map(|ai| ai.faction),
            bounds: position.bounds(),
            facing: position.facing,
            intent: animation.intent,
            intent_since: animation.since_tick,
            hp_ratio: health.map(|health| health.ratio().to_num::<f32>()),
            hp: health.map_or(0, |health| health.hp),
            max_hp: health.map_or(0, |health| health.max_hp),
            dead: health.is_some_and(|health| health.dead),
            attacking: record.attack.as_ref().is_some_and(|attack| attack.attacking),
        })
    }
}

//! # Skirmish Core
//!
//! Deterministic core for small real-time tactical encounters: a roster of
//! melee combatants that move, pick targets, swing on a tick-quantized
//! timeline, take damage and die.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No randomness
//! - No floating-point math in the systems (uses fixed-point)
//!
//! This separation enables:
//! - Headless drivers and scripted scenarios
//! - Any number of encounters side by side
//! - Determinism testing via [`Encounter::state_hash`](encounter::Encounter::state_hash)
//!
//! ## Crate Structure
//!
//! - [`registry`] - Entity and component storage
//! - [`components`] - Component definitions
//! - [`systems`] - Movement, combat and vitality systems
//! - [`encounter`] - The façade that owns an encounter and drives the systems
//! - [`events`] - Observable events emitted while ticking
//! - [`snapshot`] - Read-only render view
//! - [`data`] - Data-driven archetype presets
//! - [`config`] - Tuning constants
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod components;
pub mod config;
pub mod data;
pub mod encounter;
pub mod error;
pub mod events;
pub mod factions;
pub mod math;
pub mod registry;
pub mod snapshot;
pub mod systems;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::EncounterConfig;
    pub use crate::data::{ArchetypeCatalog, ArchetypeData, AttackData};
    pub use crate::encounter::Encounter;
    pub use crate::error::{EncounterError, Result};
    pub use crate::events::{CancelReason, EncounterEvent, EventObserver, TickEvents};
    pub use crate::factions::Faction;
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::registry::{Component, ComponentSet, EntityRecord, Registry};
    pub use crate::snapshot::EntityView;
}

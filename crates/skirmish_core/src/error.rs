//! Error types for the encounter core.

use thiserror::Error;

use crate::components::EntityId;
use crate::math::{Fixed, WORLD_LIMIT};

/// Result type alias using [`EncounterError`].
pub type Result<T> = std::result::Result<T, EncounterError>;

/// Top-level error type for encounter commands and data loading.
///
/// Resolvers never produce errors; anything that goes wrong mid-tick
/// degrades to an idle entity. Errors only surface from commands issued
/// between ticks and from loading data files.
#[derive(Debug, Error)]
pub enum EncounterError {
    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Entity exists but lacks a component the command needs.
    #[error("Entity {entity} has no {component} component")]
    MissingComponent {
        /// Entity the command was issued to.
        entity: EntityId,
        /// Name of the missing component.
        component: &'static str,
    },

    /// Attack order that would not cross factions, or targets itself.
    #[error("Entity {entity} cannot target {target}: {reason}")]
    InvalidTarget {
        /// Entity the order was issued to.
        entity: EntityId,
        /// Requested target.
        target: EntityId,
        /// Why the target was refused.
        reason: &'static str,
    },

    /// Command point or impulse outside the world bounds.
    #[error("Point ({x}, {y}) lies outside the world bounds of ±{limit}", limit = WORLD_LIMIT)]
    OutOfBounds {
        /// Horizontal component.
        x: Fixed,
        /// Vertical component.
        y: Fixed,
    },

    /// No archetype registered under this name.
    #[error("Unknown archetype: {0}")]
    UnknownArchetype(String),

    /// Archetype preset violates a spawn invariant.
    #[error("Invalid archetype '{name}': {reason}")]
    InvalidArchetype {
        /// Archetype name.
        name: String,
        /// Violated constraint.
        reason: String,
    },

    /// Encounter configuration violates an invariant.
    #[error("Invalid encounter config: {0}")]
    InvalidConfig(String),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },
}

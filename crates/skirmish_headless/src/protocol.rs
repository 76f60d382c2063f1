//! JSON protocol for driving an encounter from outside.
//!
//! The session communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the controller
//! **Output (stdout):** Responses and encounter state
//!
//! # Protocol Flow
//!
//! 1. Session starts, outputs `{"type":"ready","version":"1.0","tick":0}`
//! 2. Controller sends commands as JSON lines
//! 3. Each `tick` answers with the events it produced, then the new state
//! 4. `quit` (or end of input) ends the session with `{"type":"bye"}`
//!
//! Coordinates are decimal world units. They are converted to fixed-point
//! once, on the way in, and are rejected if not representable.
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","tick":0}
//! -> {"cmd":"spawn","kind":"knight","x":200,"y":600}
//! <- {"type":"spawned","entity_id":1,"kind":"knight"}
//! -> {"cmd":"spawn","kind":"skeleton","x":500,"y":400}
//! <- {"type":"spawned","entity_id":2,"kind":"skeleton"}
//! -> {"cmd":"pick","x":530,"y":450,"faction":"opposing"}
//! <- {"type":"picked","entity_id":2}
//! -> {"cmd":"attack","entity_id":1,"target_id":2}
//! <- {"type":"ack","cmd":"attack"}
//! -> {"cmd":"tick","count":60}
//! <- {"type":"events","ticks":[...]}
//! <- {"type":"state","tick":60,"entities":[...],"hash":...}
//! ```

use serde::{Deserialize, Serialize};
use skirmish_core::events::TickEvents;
use skirmish_core::factions::Faction;
use skirmish_core::snapshot::EntityView;

/// Version string announced in [`Response::Ready`].
pub const PROTOCOL_VERSION: &str = "1.0";

// ============================================================================
// Input Commands (Controller -> Session)
// ============================================================================

/// Commands that can be sent to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Advance the encounter by N ticks (default: 1).
    Tick {
        #[serde(default = "default_tick_count")]
        count: u32,
    },

    /// Query current state without advancing time.
    Query,

    /// Spawn an archetype with its box's top-left corner at a point.
    Spawn { kind: String, x: f64, y: f64 },

    /// Order an entity to walk to a point.
    Move { entity_id: u64, x: f64, y: f64 },

    /// Order an entity to engage a target.
    Attack { entity_id: u64, target_id: u64 },

    /// Shove an entity.
    Knockback { entity_id: u64, dx: f64, dy: f64 },

    /// Find the entity of a faction whose box contains a point.
    Pick { x: f64, y: f64, faction: Faction },

    /// Report the current state hash (for determinism verification).
    Hash,

    /// End the session.
    Quit,
}

fn default_tick_count() -> u32 {
    1
}

// ============================================================================
// Output Responses (Session -> Controller)
// ============================================================================

/// Responses sent from a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Session is ready to accept commands.
    Ready { version: String, tick: u64 },

    /// Acknowledgment of a command.
    Ack { cmd: String },

    /// Error processing a command.
    Error {
        message: String,
        cmd: Option<String>,
    },

    /// Entity was spawned.
    Spawned { entity_id: u64, kind: String },

    /// Result of a pick. `None` if nothing was under the point.
    Picked { entity_id: Option<u64> },

    /// Current encounter state.
    State {
        tick: u64,
        entities: Vec<EntityView>,
        hash: u64,
    },

    /// Events from a `tick` command, one entry per tick that produced any.
    Events { ticks: Vec<TickEvents> },

    /// State hash for determinism verification.
    StateHash { tick: u64, hash: u64 },

    /// Goodbye message before shutdown.
    Bye,
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response.
    pub fn ready(tick: u64) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            tick,
        }
    }

    /// Create an acknowledgment.
    pub fn ack(cmd: &str) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for acknowledgment.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::Query => "query",
            Self::Spawn { .. } => "spawn",
            Self::Move { .. } => "move",
            Self::Attack { .. } => "attack",
            Self::Knockback { .. } => "knockback",
            Self::Pick { .. } => "pick",
            Self::Hash => "hash",
            Self::Quit => "quit",
        }
    }
}

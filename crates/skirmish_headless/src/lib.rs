//! Headless encounter runner for scripted scenarios and external controllers.
//!
//! The encounter core has no input layer of its own. This crate provides
//! one that works without a window:
//!
//! - **Scenarios**: RON files describing a roster and timed orders, run to
//!   completion with a JSON match summary
//! - **Interactive sessions**: an external controller (a renderer, a test
//!   harness, an AI agent) drives the encounter over JSON lines
//! - **Determinism checks**: the same scenario run repeatedly must finish
//!   with the same state hash
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from controller (tick, spawn, move, etc.)
//! - **stdout**: State updates and responses (JSON)
//! - **stderr**: Debug logs (human-readable)
//!
//! See [`protocol`] module for the full command/response format.
//!
//! # Example
//!
//! ```bash
//! # Run interactively
//! echo '{"cmd":"tick","count":60}' | cargo run -p skirmish_headless -- interactive
//!
//! # Run a scenario
//! cargo run -p skirmish_headless -- run --scenario assets/scenarios/opening_lineup.ron
//!
//! # Verify determinism
//! cargo run -p skirmish_headless -- verify --scenario assets/scenarios/duel.ron --runs 5
//! ```

pub mod data_loader;
pub mod protocol;
pub mod runner;
pub mod scenario;

pub use data_loader::{default_data_dir, load_catalog, load_config, load_data_dir};
pub use protocol::{Command, Response};
pub use runner::{EventCounts, MatchSummary, ScenarioRunner, Session};
pub use scenario::{Order, Scenario, ScenarioError};

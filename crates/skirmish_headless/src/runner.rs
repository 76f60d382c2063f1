//! Headless encounter drivers.
//!
//! [`ScenarioRunner`] plays a [`Scenario`] to completion and summarizes it.
//! [`Session`] hands control to an external process over the JSON-lines
//! [`protocol`](crate::protocol).

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

use serde::{Deserialize, Serialize};
use skirmish_core::components::EntityId;
use skirmish_core::config::EncounterConfig;
use skirmish_core::data::ArchetypeCatalog;
use skirmish_core::encounter::Encounter;
use skirmish_core::events::{EncounterEvent, TickEvents};
use skirmish_core::factions::Faction;
use skirmish_core::math::{fixed_from_decimal, Vec2Fixed};

use crate::protocol::{Command, Response};
use crate::scenario::{Order, Scenario, ScenarioError};

/// Convert decimal world coordinates, rejecting values fixed-point cannot hold.
fn point(x: f64, y: f64) -> Result<Vec2Fixed, ScenarioError> {
    fixed_from_decimal(x)
        .zip(fixed_from_decimal(y))
        .map(|(x, y)| Vec2Fixed::new(x, y))
        .ok_or(ScenarioError::OutOfRange { x, y })
}

// ============================================================================
// Match summary
// ============================================================================

/// How many of each event kind an encounter produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCounts {
    pub spawned: u64,
    pub targets_acquired: u64,
    pub targets_lost: u64,
    pub moves_completed: u64,
    pub attacks_started: u64,
    pub attacks_landed: u64,
    pub attacks_cancelled: u64,
    pub attacks_finished: u64,
    pub deaths: u64,
    pub removals: u64,
    /// Sum of damage over every landed swing.
    pub damage_dealt: u64,
}

impl EventCounts {
    /// Count one tick's events.
    pub fn record(&mut self, tick: &TickEvents) {
        for event in &tick.events {
            let counter = match event {
                EncounterEvent::Spawned { .. } => &mut self.spawned,
                EncounterEvent::TargetAcquired { .. } => &mut self.targets_acquired,
                EncounterEvent::TargetLost { .. } => &mut self.targets_lost,
                EncounterEvent::MoveCompleted { .. } => &mut self.moves_completed,
                EncounterEvent::AttackStarted { .. } => &mut self.attacks_started,
                EncounterEvent::AttackLanded { .. } => &mut self.attacks_landed,
                EncounterEvent::AttackCancelled { .. } => &mut self.attacks_cancelled,
                EncounterEvent::AttackFinished { .. } => &mut self.attacks_finished,
                EncounterEvent::EntityDied { .. } => &mut self.deaths,
                EncounterEvent::EntityRemoved { .. } => &mut self.removals,
            };
            *counter += 1;
        }
        self.damage_dealt += tick.damage_dealt();
    }
}

/// Outcome of a scenario run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    /// Scenario name.
    pub scenario: String,
    /// Ticks simulated.
    pub ticks_run: u64,
    /// Whether a side that started with units was wiped out.
    pub decided: bool,
    /// Last side standing, if the encounter was decided in someone's favour.
    pub winner: Option<Faction>,
    /// Living units per faction at the end.
    pub survivors: BTreeMap<Faction, usize>,
    /// Event totals over the whole run.
    pub events: EventCounts,
    /// State hash after the final tick.
    pub final_hash: u64,
}

// ============================================================================
// Scenario runner
// ============================================================================

/// Plays a scenario's roster and order script.
#[derive(Debug)]
pub struct ScenarioRunner {
    scenario: Scenario,
    encounter: Encounter,
    /// Entity spawned for each roster index.
    roster: Vec<EntityId>,
    /// Factions that had units at the start.
    contenders: Vec<Faction>,
    counts: EventCounts,
}

impl ScenarioRunner {
    /// Set up a scenario with the stock presets and default tuning.
    pub fn new(scenario: Scenario) -> Result<Self, ScenarioError> {
        Self::with_data(scenario, &EncounterConfig::default(), ArchetypeCatalog::builtin())
    }

    /// Set up a scenario with loaded data. The scenario's own config, if
    /// any, replaces `base_config`.
    pub fn with_data(
        scenario: Scenario,
        base_config: &EncounterConfig,
        catalog: ArchetypeCatalog,
    ) -> Result<Self, ScenarioError> {
        scenario.validate(&catalog)?;
        let mut encounter = Encounter::with_setup(scenario.config_or(base_config), catalog)?;

        let mut roster = Vec::with_capacity(scenario.roster.len());
        for (kind, x, y) in &scenario.roster {
            roster.push(encounter.spawn(kind, point(*x, *y)?)?);
        }

        let contenders = Faction::ALL
            .into_iter()
            .filter(|&faction| encounter.faction_alive_count(faction) > 0)
            .collect();

        tracing::info!(
            scenario = %scenario.name,
            units = roster.len(),
            orders = scenario.orders.len(),
            "scenario loaded"
        );

        Ok(Self {
            scenario,
            encounter,
            roster,
            contenders,
            counts: EventCounts::default(),
        })
    }

    /// The encounter being driven.
    pub fn encounter(&self) -> &Encounter {
        &self.encounter
    }

    /// Entity ids in roster order.
    pub fn roster(&self) -> &[EntityId] {
        &self.roster
    }

    /// Whether a side that started with units has none left alive.
    pub fn decided(&self) -> bool {
        self.contenders
            .iter()
            .any(|&faction| self.encounter.faction_alive_count(faction) == 0)
    }

    /// The only side with living units, once decided.
    pub fn winner(&self) -> Option<Faction> {
        if !self.decided() {
            return None;
        }
        let mut alive = Faction::ALL
            .into_iter()
            .filter(|&faction| self.encounter.faction_alive_count(faction) > 0);
        match (alive.next(), alive.next()) {
            (Some(faction), None) => Some(faction),
            _ => None,
        }
    }

    /// Apply the orders due this tick, then advance once.
    pub fn step(&mut self) -> TickEvents {
        let now = self.encounter.tick();
        for (_, unit, order) in self.scenario.orders.iter().filter(|(at, ..)| *at == now) {
            if let Err(e) = apply_order(&mut self.encounter, &self.roster, *unit, order) {
                tracing::warn!(tick = now, unit, ?order, "order refused: {e}");
            }
        }
        let events = self.encounter.advance();
        self.counts.record(&events);
        events
    }

    /// Run until the scenario's stop condition or `max_ticks` total ticks.
    pub fn run(mut self) -> MatchSummary {
        let limit = self.scenario.max_ticks;
        self.run_for(limit);
        self.summary()
    }

    /// Run up to `ticks` more ticks, stopping early once decided if the
    /// scenario asks for it. Returns the number of ticks run.
    pub fn run_for(&mut self, ticks: u64) -> u64 {
        let mut ran = 0;
        while ran < ticks {
            if self.scenario.stop_when_decided && self.decided() {
                tracing::info!(
                    tick = self.encounter.tick(),
                    winner = ?self.winner(),
                    "encounter decided"
                );
                break;
            }
            self.step();
            ran += 1;
        }
        ran
    }

    /// Summarize the encounter as it stands.
    pub fn summary(&self) -> MatchSummary {
        MatchSummary {
            scenario: self.scenario.name.clone(),
            ticks_run: self.encounter.tick(),
            decided: self.decided(),
            winner: self.winner(),
            survivors: Faction::ALL
                .into_iter()
                .map(|faction| (faction, self.encounter.faction_alive_count(faction)))
                .collect(),
            events: self.counts.clone(),
            final_hash: self.encounter.state_hash(),
        }
    }
}

fn apply_order(
    encounter: &mut Encounter,
    roster: &[EntityId],
    unit: usize,
    order: &Order,
) -> Result<(), ScenarioError> {
    let lookup = |index: usize| {
        roster
            .get(index)
            .copied()
            .ok_or_else(|| ScenarioError::Invalid(format!("no unit at roster index {index}")))
    };
    let entity = lookup(unit)?;
    match *order {
        Order::Move(x, y) => encounter.issue_move(entity, point(x, y)?)?,
        Order::Attack(target) => encounter.issue_attack(entity, lookup(target)?)?,
        Order::Knockback(dx, dy) => encounter.apply_knockback(entity, point(dx, dy)?)?,
    }
    Ok(())
}

// ============================================================================
// Interactive session
// ============================================================================

/// An encounter driven by JSON-lines commands.
#[derive(Debug)]
pub struct Session<R, W> {
    encounter: Encounter,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Session<R, W> {
    /// Wrap an encounter with a command source and a response sink.
    pub fn new(encounter: Encounter, input: R, output: W) -> Self {
        Self {
            encounter,
            input,
            output,
        }
    }

    /// The encounter being driven.
    pub fn encounter(&self) -> &Encounter {
        &self.encounter
    }

    /// Give back the response sink.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Process commands until `quit` or end of input.
    ///
    /// Malformed lines are answered with an error and otherwise skipped.
    pub fn run(&mut self) -> io::Result<()> {
        self.send(&Response::ready(self.encounter.tick()))?;

        let mut line = String::new();
        loop {
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                tracing::debug!("input closed");
                return self.send(&Response::Bye);
            }
            let text = line.trim();
            if text.is_empty() {
                continue;
            }

            let command = match Command::from_json(text) {
                Ok(command) => command,
                Err(e) => {
                    tracing::warn!("unparseable command: {e}");
                    self.send(&Response::error(format!("Invalid command: {e}"), None))?;
                    continue;
                }
            };
            tracing::debug!(cmd = command.name(), "command received");

            let quit = command == Command::Quit;
            for response in self.handle(command) {
                self.send(&response)?;
            }
            if quit {
                return Ok(());
            }
        }
    }

    /// Execute one command against the encounter.
    pub fn handle(&mut self, command: Command) -> Vec<Response> {
        let name = command.name();
        match self.execute(command) {
            Ok(responses) => responses,
            Err(e) => vec![Response::error(e.to_string(), Some(name))],
        }
    }

    fn execute(&mut self, command: Command) -> Result<Vec<Response>, ScenarioError> {
        let name = command.name();
        let encounter = &mut self.encounter;
        let responses = match command {
            Command::Tick { count } => {
                let ticks = (0..count)
                    .map(|_| encounter.advance())
                    .filter(|tick| !tick.events.is_empty())
                    .collect();
                vec![Response::Events { ticks }, self.state()]
            }
            Command::Query => vec![self.state()],
            Command::Spawn { kind, x, y } => {
                let entity = encounter.spawn(&kind, point(x, y)?)?;
                vec![Response::Spawned {
                    entity_id: entity.0,
                    kind,
                }]
            }
            Command::Move { entity_id, x, y } => {
                encounter.issue_move(EntityId(entity_id), point(x, y)?)?;
                vec![Response::ack(name)]
            }
            Command::Attack {
                entity_id,
                target_id,
            } => {
                encounter.issue_attack(EntityId(entity_id), EntityId(target_id))?;
                vec![Response::ack(name)]
            }
            Command::Knockback { entity_id, dx, dy } => {
                encounter.apply_knockback(EntityId(entity_id), point(dx, dy)?)?;
                vec![Response::ack(name)]
            }
            Command::Pick { x, y, faction } => vec![Response::Picked {
                entity_id: encounter.hit_test(point(x, y)?, faction).map(|id| id.0),
            }],
            Command::Hash => vec![Response::StateHash {
                tick: encounter.tick(),
                hash: encounter.state_hash(),
            }],
            Command::Quit => vec![Response::Bye],
        };
        Ok(responses)
    }

    fn state(&self) -> Response {
        Response::State {
            tick: self.encounter.tick(),
            entities: self.encounter.snapshot(),
            hash: self.encounter.state_hash(),
        }
    }

    fn send(&mut self, response: &Response) -> io::Result<()> {
        self.output.write_all(response.to_json_line().as_bytes())?;
        self.output.flush()
    }
}

// sandfall_headless — drives the Sandfall simulation without a renderer.
//
// A host normally calls `SimState::tick` once per rendered frame. This crate
// stands in for that loop: it loads a scenario map and a config, then feeds
// the simulation synthetic frame timestamps (`frame * frame_ms`) so a run is
// reproducible from its arguments alone.
//
// Module overview:
// - `scenario.rs`: Scenario map parsing (terrain plus refinery markers).
//
// The binary (`main.rs`) is a thin argument parser around `run`.

pub mod scenario;

use std::path::PathBuf;

use sandfall_sim::config::SimConfig;
use sandfall_sim::error::SimError;
use sandfall_sim::scheduler::FixedClock;
use sandfall_sim::sim::SimState;
use sandfall_sim::types::{AiAction, Owner, UnitClass};

use crate::scenario::{DEMO_MAP, Scenario};

/// Everything a headless run needs.
#[derive(Clone, Debug)]
pub struct RunOptions {
    pub map: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub frames: u64,
    pub frame_ms: f64,
    /// Log a progress line every this many frames (0 disables).
    pub report_every: u64,
    /// Write the final state as JSON here.
    pub save: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            map: None,
            config: None,
            frames: 3600,
            frame_ms: 1000.0 / 60.0,
            report_every: 600,
            save: None,
        }
    }
}

/// Final tallies of a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunSummary {
    pub game_time_ms: f64,
    pub player_credits: i64,
    pub ai_credits: i64,
    pub harvesters: usize,
    pub pending_effects: usize,
}

impl RunSummary {
    fn of(sim: &SimState) -> Self {
        Self {
            game_time_ms: sim.now(),
            player_credits: sim.ledger.credits(Owner::Player),
            ai_credits: sim.ledger.credits(Owner::Ai),
            harvesters: sim.unit_count(UnitClass::Harvester),
            pending_effects: sim.scheduler.len(),
        }
    }
}

/// Build the starting state described by `options`.
pub fn load(options: &RunOptions) -> Result<SimState, SimError> {
    let config = match &options.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    config.validate()?;

    let text = match &options.map {
        Some(path) => std::fs::read_to_string(path)?,
        None => DEMO_MAP.to_string(),
    };
    let scenario = Scenario::parse(&text)?;
    tracing::info!(
        width = scenario.grid.width(),
        height = scenario.grid.height(),
        refineries = scenario.refineries.len(),
        "scenario loaded"
    );
    Ok(scenario.into_sim(config))
}

/// Advance `sim` by `options.frames` frames of `options.frame_ms` each.
pub fn advance(sim: &mut SimState, options: &RunOptions) -> Result<RunSummary, SimError> {
    let start = sim.scheduler.last_render();
    for frame in 1..=options.frames {
        let timestamp = start + frame as f64 * options.frame_ms;
        sim.tick_with_clock(timestamp, &FixedClock(timestamp))?;

        if options.report_every > 0 && frame % options.report_every == 0 {
            let summary = RunSummary::of(sim);
            let returning = sim
                .world
                .units()
                .filter(|u| u.ai_action == AiAction::HarvesterReturn)
                .count();
            tracing::info!(
                frame,
                game_time_ms = summary.game_time_ms,
                player_credits = summary.player_credits,
                ai_credits = summary.ai_credits,
                returning,
                effects = summary.pending_effects,
                "progress"
            );
        }
    }
    Ok(RunSummary::of(sim))
}

/// Load, advance and optionally save.
pub fn run(options: &RunOptions) -> Result<RunSummary, SimError> {
    let mut sim = load(options)?;
    let summary = advance(&mut sim, options)?;

    if let Some(path) = &options.save {
        std::fs::write(path, sim.to_json()?)?;
        tracing::info!(path = %path.display(), "final state saved");
    }
    Ok(summary)
}

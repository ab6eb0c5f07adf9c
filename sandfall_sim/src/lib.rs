// sandfall_sim — event-driven simulation core for Sandfall.
//
// This crate contains the simulation logic of the game: the effect
// scheduler that advances a game clock and interpolates state, the A* grid
// pathfinder, the navigation compiler that turns paths into chains of
// motion effects, and the per-unit AI state machines driven by effect
// completions. It has no rendering dependencies and runs headless.
//
// Module overview:
// - `sim.rs`:         Top-level SimState, tick, spawning, commands, save/load.
// - `effect.rs`:      Effect — time-bounded linear interpolation + persisted shape.
// - `scheduler.rs`:   EffectScheduler — game clock, active set, cancellation filters.
// - `registry.rs`:    Store handlers (action, world) that effects dispatch into.
// - `pathfinding.rs`: 8-connected A* over the tile grid.
// - `navigation.rs`:  MotionStep compilation and `navigate_to`.
// - `ai.rs`:          Harvester state machine (`handle_ai`).
// - `world.rs`:       TileGrid, actor table, nearest-tile/building queries.
// - `actor.rs`:       Actor factories and build rules.
// - `command.rs`:     SimCommand / SimAction — external mutations.
// - `ledger.rs`:      Credits per owner.
// - `config.rs`:      SimConfig + per-class unit/building tables.
// - `error.rs`:       Error enums.
// - `types.rs`:       TileCoord, Rect, IDs, tile/actor/AI enums.
//
// The companion crate `sandfall_headless` drives this library from the
// command line in place of a render loop.
//
// **Critical constraint: determinism.** The simulation is single-threaded
// and a pure function of config, map, commands and frame timestamps. No
// `HashMap`, no randomness. Use `BTreeMap` for ordered collections.

pub mod actor;
pub mod ai;
pub mod command;
pub mod config;
pub mod effect;
pub mod error;
pub mod ledger;
pub mod navigation;
pub mod pathfinding;
pub mod registry;
pub mod scheduler;
pub mod sim;
pub mod types;
pub mod world;

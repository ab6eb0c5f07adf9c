// Commands that mutate simulation state from outside.
//
// Player input (and a scripted opponent, if a host has one) reaches the sim
// as `SimCommand`s applied through `SimState::apply_command()` between
// ticks. Everything else that changes state happens inside `tick()` as the
// consequence of a maturing effect.
//
// Current actions:
// - `AssignTarget` — send the selected units to a tile.
// - `ConstructBuilding` — pay for and place a building; a refinery comes
//   with a free harvester.
// - `BuildUnit` — pay for a unit from the matching production building.
// - `SetGameState` — pause, resume, or end the game.
// - `FocusOn` — glide the viewport focus to a point.
//
// See also: `sim.rs` for the handlers, `error.rs` for `CommandError`.

use crate::types::{ActorId, BuildingClass, GameState, Owner, TileCoord, UnitClass};
use serde::{Deserialize, Serialize};

/// A command issued on behalf of `owner`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimCommand {
    pub owner: Owner,
    pub action: SimAction,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SimAction {
    /// Navigate each selected unit to `(x, y)` (rounded to a tile).
    /// Buildings and other owners' actors in the selection are skipped.
    AssignTarget { selection: Vec<ActorId>, x: f64, y: f64 },
    /// Place a building with its top-left corner at `at`.
    ConstructBuilding { class: BuildingClass, at: TileCoord },
    /// Produce one unit next to the building that enables it.
    BuildUnit { class: UnitClass },
    SetGameState { state: GameState },
    /// Move the viewport focus to `(x, y)` over `duration_ms`.
    FocusOn { x: f64, y: f64, duration_ms: f64 },
}

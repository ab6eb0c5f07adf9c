// Core simulation state and tick.
//
// `SimState` is the single source of truth for a running game. It owns the
// config, the effect scheduler (clock plus active effects), the world
// (terrain, actors, viewport focus) and the credit ledger.
//
// ## Tick
//
// The host calls `tick(timestamp)` once per rendered frame. A tick:
//
//   1. Builds a `Registry` with the two store handlers, borrowing the actor
//      table and the focus point (see `registry.rs`).
//   2. Runs the scheduler pass (see `scheduler.rs`): every active effect is
//      interpolated against the new game time, completed ones are dropped.
//      Completion callbacks (`AdvanceAi`) only queue the actor id.
//   3. Drains the decision queue in completion order, running each actor's
//      AI decision function (see `ai.rs`). Decisions may cancel effects,
//      enqueue new ones and mutate terrain; nothing they enqueue runs before
//      the next tick.
//
// There is no per-frame AI tick. A unit acts only when one of its effects
// matures, so an idle world costs one pass over an empty effect list.
//
// ## Spawning
//
// `spawn_unit` places a unit (clamped into bounds) and immediately runs its
// decision function so a fresh harvester goes looking for work.
// `spawn_building` only places the footprint; `spawn_unit_for_building`
// adds the unit that comes free with it, at the tile diagonally past the
// footprint's bottom-right corner.
//
// ## Commands
//
// External input goes through `apply_command()` (see `command.rs`).
// Construction and production check the build rules in `actor.rs` and pay
// through the `Ledger`; a refused command leaves the state untouched.
//
// ## Save/load
//
// `SimState` derives `Serialize`/`Deserialize`. The wall clock used for
// first-frame substitution is `#[serde(skip)]` and restarts on load.
// `to_json()`/`from_json()` wrap the round trip.
//
// See also: `navigation.rs` for `navigate_to`, `ai.rs` for the harvester
// state machine, `config.rs` for `SimConfig`.
//
// **Critical constraint: determinism.** Given the same config, map,
// commands and frame timestamps, two runs produce identical state. The only
// outside input besides those is the first-frame wall-clock read, which
// hosts can pin with `tick_with_clock`.

use crate::actor::{self, Actor};
use crate::command::{SimAction, SimCommand};
use crate::config::SimConfig;
use crate::effect::{Effect, EffectAction, EffectCallback, StoreId};
use crate::error::{CommandError, EffectError};
use crate::ledger::Ledger;
use crate::registry::{ActionStore, Registry, WorldStore};
use crate::scheduler::{Clock, EffectScheduler, SystemClock};
use crate::types::{ActorId, AiAction, BuildingClass, GameState, Owner, TileCoord, UnitClass};
use crate::world::{TileGrid, World};
use serde::{Deserialize, Serialize};

/// Top-level simulation state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimState {
    pub config: SimConfig,
    pub scheduler: EffectScheduler,
    pub world: World,
    pub ledger: Ledger,
    #[serde(skip)]
    clock: SystemClock,
}

impl SimState {
    /// A fresh game on `grid` with the default config.
    pub fn new(grid: TileGrid) -> Self {
        Self::with_config(grid, SimConfig::default())
    }

    pub fn with_config(grid: TileGrid, config: SimConfig) -> Self {
        let ledger = Ledger::new(config.starting_credits);
        Self {
            config,
            scheduler: EffectScheduler::new(),
            world: World::new(grid),
            ledger,
            clock: SystemClock::new(),
        }
    }

    /// Advance the simulation to the host timestamp `timestamp` (ms).
    /// `FIRST_FRAME` (0) reads the wall clock instead.
    ///
    /// Returns the number of effects that completed.
    pub fn tick(&mut self, timestamp: f64) -> Result<usize, EffectError> {
        let clock = self.clock;
        self.tick_with_clock(timestamp, &clock)
    }

    /// `tick` with an explicit clock for first-frame substitution.
    pub fn tick_with_clock<C: Clock + ?Sized>(&mut self, timestamp: f64, clock: &C) -> Result<usize, EffectError> {
        let max_position = self.world.max_position();
        let (width, height) = (self.world.grid.width(), self.world.grid.height());
        let mut decisions = Vec::new();

        let completed = {
            let mut actions = ActionStore::new(&mut self.world.actors, max_position, &mut decisions);
            let mut focus = WorldStore::new(&mut self.world.focus, width, height);
            let mut registry = Registry::new()
                .with(StoreId::Action, &mut actions)
                .with(StoreId::World, &mut focus);
            self.scheduler.tick(timestamp, clock, &mut registry)?
        };

        for id in decisions {
            self.handle_ai(id);
        }
        Ok(completed)
    }

    /// Current game time in ms.
    pub fn now(&self) -> f64 {
        self.scheduler.clock_ms()
    }

    pub fn game_state(&self) -> GameState {
        self.scheduler.state()
    }

    pub fn set_game_state(&mut self, state: GameState) {
        if self.scheduler.state() != state {
            tracing::info!(?state, "game state changed");
        }
        self.scheduler.set_state(state);
    }

    // -----------------------------------------------------------------------
    // Spawning
    // -----------------------------------------------------------------------

    /// Place a unit at `at` (clamped into bounds) and start its AI.
    pub fn spawn_unit(&mut self, class: UnitClass, owner: Owner, at: TileCoord) -> ActorId {
        let at = self.clamp_to_grid(at);
        let config = &self.config;
        let id = self
            .world
            .spawn(|id| Actor::unit(id, class, owner, at, config));
        tracing::debug!(%id, ?class, ?owner, %at, "unit spawned");
        self.handle_ai(id);
        id
    }

    /// Place a building with its top-left corner at `at`.
    pub fn spawn_building(&mut self, class: BuildingClass, owner: Owner, at: TileCoord) -> ActorId {
        let config = &self.config;
        let id = self
            .world
            .spawn(|id| Actor::building(id, class, owner, at, config));
        tracing::debug!(%id, ?class, ?owner, %at, "building placed");
        id
    }

    /// Spawn the unit that comes free with `building`, if its class has one.
    pub fn spawn_unit_for_building(&mut self, building: ActorId) -> Option<ActorId> {
        let b = self.world.actor(building)?;
        let class = actor::unit_for_building(b.building_class()?)?;
        let at = b.tile();
        let exit = TileCoord::new(at.x + b.width, at.y + b.height);
        let owner = b.owner;
        Some(self.spawn_unit(class, owner, exit))
    }

    pub fn remove_actor(&mut self, id: ActorId) -> Option<Actor> {
        let cancelled = self.scheduler.remove_effects_by_target(id);
        tracing::debug!(%id, cancelled, "actor removed");
        self.world.remove_actor(id)
    }

    fn clamp_to_grid(&self, at: TileCoord) -> TileCoord {
        let (max_x, max_y) = self.world.max_position();
        TileCoord::new(at.x.clamp(0, max_x as i32), at.y.clamp(0, max_y as i32))
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Apply one external command.
    pub fn apply_command(&mut self, cmd: &SimCommand) -> Result<(), CommandError> {
        match &cmd.action {
            SimAction::AssignTarget { selection, x, y } => {
                let target = TileCoord::from_position(*x, *y);
                let own: Vec<ActorId> = selection
                    .iter()
                    .copied()
                    .filter(|id| self.world.actor(*id).is_some_and(|a| a.owner == cmd.owner))
                    .collect();
                self.assign_target(&own, target);
            }
            SimAction::ConstructBuilding { class, at } => {
                self.construct_building(cmd.owner, *class, *at)?;
            }
            SimAction::BuildUnit { class } => {
                self.build_unit(cmd.owner, *class)?;
            }
            SimAction::SetGameState { state } => self.set_game_state(*state),
            SimAction::FocusOn { x, y, duration_ms } => self.focus_on(*x, *y, *duration_ms),
        }
        Ok(())
    }

    /// Send every unit in `selection` to `target`. Buildings are skipped.
    /// Pending effects of each commanded unit are cancelled first.
    ///
    /// Returns how many units were commanded.
    pub fn assign_target(&mut self, selection: &[ActorId], target: TileCoord) -> usize {
        let mut commanded = 0;
        for &id in selection {
            if !self.world.actor(id).is_some_and(Actor::is_unit) {
                continue;
            }
            self.scheduler.remove_effects_by_target(id);
            self.navigate_to(id, target, AiAction::GotoWaypoint);
            commanded += 1;
        }
        commanded
    }

    /// Pay for and place a building. A building that comes with a free unit
    /// spawns it too.
    pub fn construct_building(
        &mut self,
        owner: Owner,
        class: BuildingClass,
        at: TileCoord,
    ) -> Result<ActorId, CommandError> {
        let data = self.config.building(class);
        if !data.constructable {
            return Err(CommandError::NotConstructable(class));
        }
        self.pay(owner, i64::from(data.cost))?;
        let id = self.spawn_building(class, owner, at);
        self.spawn_unit_for_building(id);
        Ok(id)
    }

    /// Pay for one unit and spawn it at the exit of the first building that
    /// can produce it.
    pub fn build_unit(&mut self, owner: Owner, class: UnitClass) -> Result<ActorId, CommandError> {
        if !actor::can_build_unit(class, self.world.buildings_of(owner)) {
            return Err(CommandError::MissingPrerequisite(class));
        }
        let producer = self
            .world
            .buildings_of(owner)
            .find(|b| actor::can_build_unit(class, [*b]))
            .map(|b| {
                let at = b.tile();
                TileCoord::new(at.x + b.width, at.y + b.height)
            })
            .ok_or(CommandError::MissingPrerequisite(class))?;
        self.pay(owner, i64::from(self.config.unit(class).cost))?;
        Ok(self.spawn_unit(class, owner, producer))
    }

    fn pay(&mut self, owner: Owner, cost: i64) -> Result<(), CommandError> {
        if self.ledger.deduct(owner, cost) {
            Ok(())
        } else {
            Err(CommandError::InsufficientCredits {
                needed: cost,
                available: self.ledger.credits(owner),
            })
        }
    }

    /// Glide the viewport focus to `(x, y)` over `duration_ms` of game time.
    /// A non-positive duration jumps immediately.
    pub fn focus_on(&mut self, x: f64, y: f64, duration_ms: f64) {
        let (width, height) = (self.world.grid.width(), self.world.grid.height());
        if duration_ms <= 0.0 {
            self.world.focus.x = x.clamp(0.0, f64::from(width.max(0)));
            self.world.focus.y = y.clamp(0.0, f64::from(height.max(0)));
            return;
        }
        self.scheduler
            .remove_effects_by_action(&[EffectAction::SetFocusX, EffectAction::SetFocusY]);
        let now = self.now();
        let focus = self.world.focus;
        self.scheduler.add_effect(
            Effect::builder(StoreId::World, now, duration_ms, focus.x, x)
                .action(EffectAction::SetFocusX)
                .build(),
        );
        self.scheduler.add_effect(
            Effect::builder(StoreId::World, now, duration_ms, focus.y, y)
                .action(EffectAction::SetFocusY)
                .build(),
        );
    }

    /// Queue an AI re-entry for `id` after the idle retry delay.
    pub(crate) fn retry_later(&mut self, id: ActorId) {
        let now = self.now();
        self.scheduler.add_effect(
            Effect::builder(StoreId::Action, now, self.config.idle_retry_ms, 0.0, 0.0)
                .callback(EffectCallback::AdvanceAi)
                .target(id)
                .build(),
        );
    }

    // -----------------------------------------------------------------------
    // Save/load
    // -----------------------------------------------------------------------

    /// Serialize the simulation state to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize a simulation state from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Number of units of `class`.
    pub fn unit_count(&self, class: UnitClass) -> usize {
        self.world
            .units()
            .filter(|u| u.unit_class() == Some(class))
            .count()
    }
}

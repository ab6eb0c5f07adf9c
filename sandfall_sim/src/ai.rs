// Per-unit AI decision functions.
//
// `handle_ai` is invoked when one of a unit's `AdvanceAi` callbacks
// completes (and once at spawn). It dispatches on the unit's class and
// runs the matching state machine for a single transition; the transition
// schedules whatever effect will call it again. There is no per-frame AI.
//
// ## Harvester
//
//   Idle ──▶ GotoWaypoint ──▶ HarvesterHarvest ──▶ HarvesterReturn ──▶ Idle
//
// - `Idle` (and any state without its own arm): navigate to the nearest
//   harvestable tile not under a building, arriving in `GotoWaypoint`. A
//   harvester that is still full goes looking for a refinery instead.
// - `GotoWaypoint` (arrival): if the tile is no longer harvestable (another
//   harvester got there first), reset to `Idle` and decide again. Otherwise
//   ramp `ai_value` up by `harvest_fill_rate` over `harvest_duration_ms`
//   and wait in `HarvesterHarvest`.
// - `HarvesterHarvest` (fill complete): deplete the tile. A full load
//   (`ai_value >= 1`) heads for the entrance of the nearest refinery of the
//   same owner in `HarvesterReturn`; anything less goes back to `Idle`.
// - `HarvesterReturn` (arrival): credit the owner with
//   `credits_per_load * max(1, ai_value)` (rounded), decay `ai_value` to 0
//   over `unload_decay_ms` and restart from `Idle` when the decay ends.
//
// Failed queries (no harvestable tile, no refinery, no route) park the unit
// in `Idle` and schedule a retry after `idle_retry_ms`. An unreachable
// harvestable tile is skipped in favor of the next-nearest one, up to
// `seek_attempts` candidates per decision.
//
// See also: `navigation.rs` for `navigate_to`, `config.rs` for the tunables,
// `world.rs` for the nearest-tile and nearest-building queries.

use crate::effect::{Effect, EffectAction, EffectCallback, StoreId};
use crate::sim::SimState;
use crate::types::{ActorId, AiAction, BuildingClass, UnitClass};

impl SimState {
    /// Run one AI transition for `id`. A missing actor is a no-op.
    pub fn handle_ai(&mut self, id: ActorId) {
        let Some(actor) = self.world.actor(id) else {
            tracing::debug!(%id, "AI callback for a removed actor");
            return;
        };
        match actor.unit_class() {
            Some(UnitClass::Harvester) => self.harvester_ai(id),
            Some(UnitClass::Scout) | None => {}
        }
    }

    fn harvester_ai(&mut self, id: ActorId) {
        let Some(unit) = self.world.actor(id) else {
            return;
        };
        let action = unit.ai_action;
        tracing::debug!(%id, ?action, ai_value = unit.ai_value, "harvester decision");

        match action {
            AiAction::GotoWaypoint => self.harvester_arrived(id),
            AiAction::HarvesterHarvest => self.harvester_filled(id),
            AiAction::HarvesterReturn => self.harvester_unload(id),
            AiAction::Idle | AiAction::ReturnToBase => self.harvester_seek(id),
        }
    }

    /// Head for the nearest harvestable tile. A full harvester (one that
    /// found no refinery earlier) heads for a refinery instead.
    ///
    /// Tiles under buildings are never candidates. When the route to a
    /// candidate fails, the next-nearest is tried, up to `seek_attempts`.
    fn harvester_seek(&mut self, id: ActorId) {
        let Some(unit) = self.world.actor(id) else {
            return;
        };
        let from = unit.tile();
        if unit.ai_value >= 1.0 {
            self.harvester_return(id);
            return;
        }
        let harvestable = self.config.harvestable_tile;

        let mut unreachable = Vec::new();
        for _ in 0..self.config.seek_attempts {
            let Some(tile) = self
                .world
                .find_nearest_open_tile_of_type(from, harvestable, &unreachable)
            else {
                break;
            };
            if !self.navigate_to(id, tile, AiAction::GotoWaypoint).is_empty() {
                return;
            }
            unreachable.push(tile);
        }
        tracing::warn!(%id, tried = unreachable.len(), "no reachable harvestable tile");
        self.idle_and_retry(id);
    }

    fn harvester_arrived(&mut self, id: ActorId) {
        let Some(unit) = self.world.actor(id) else {
            return;
        };
        let here = unit.tile();
        let ai_value = unit.ai_value;

        if self.world.grid.get(here) != Some(self.config.harvestable_tile) {
            tracing::debug!(%id, %here, "waypoint no longer harvestable");
            self.set_ai_action(id, AiAction::Idle);
            self.harvester_seek(id);
            return;
        }

        let fill = Effect::builder(
            StoreId::Action,
            self.now(),
            self.config.harvest_duration_ms,
            ai_value,
            ai_value + self.config.harvest_fill_rate,
        )
        .action(EffectAction::SetAiValue)
        .callback(EffectCallback::AdvanceAi)
        .target(id)
        .build();
        self.scheduler.add_effect(fill);
        self.set_ai_action(id, AiAction::HarvesterHarvest);
    }

    fn harvester_filled(&mut self, id: ActorId) {
        let Some(unit) = self.world.actor(id) else {
            return;
        };
        let here = unit.tile();
        let full = unit.ai_value >= 1.0;

        self.world.grid.set(here, self.config.depleted_tile);
        tracing::debug!(%id, %here, full, "tile harvested");

        if full {
            self.harvester_return(id);
        } else {
            self.set_ai_action(id, AiAction::Idle);
            self.harvester_seek(id);
        }
    }

    /// Take a full load to the entrance of the nearest refinery of the same
    /// owner.
    fn harvester_return(&mut self, id: ActorId) {
        let Some(unit) = self.world.actor(id) else {
            return;
        };
        let here = unit.tile();
        let owner = unit.owner;
        let Some(entrance) = self
            .world
            .find_nearest_building_of_class(here, BuildingClass::Refinery, owner)
        else {
            tracing::warn!(%id, ?owner, "no refinery to return to");
            self.idle_and_retry(id);
            return;
        };
        if self
            .navigate_to(id, entrance, AiAction::HarvesterReturn)
            .is_empty()
        {
            self.idle_and_retry(id);
        }
    }

    fn harvester_unload(&mut self, id: ActorId) {
        let Some(unit) = self.world.actor(id) else {
            return;
        };
        let owner = unit.owner;
        let load = unit.ai_value;
        let credits = (f64::from(self.config.credits_per_load) * load.max(1.0)).round() as i64;

        self.ledger.award(owner, credits);
        tracing::debug!(%id, ?owner, credits, balance = self.ledger.credits(owner), "load unloaded");

        self.set_ai_action(id, AiAction::Idle);
        let decay = Effect::builder(StoreId::Action, self.now(), self.config.unload_decay_ms, load, 0.0)
            .action(EffectAction::SetAiValue)
            .callback(EffectCallback::AdvanceAi)
            .target(id)
            .build();
        self.scheduler.add_effect(decay);
    }

    fn idle_and_retry(&mut self, id: ActorId) {
        self.set_ai_action(id, AiAction::Idle);
        self.retry_later(id);
    }
}

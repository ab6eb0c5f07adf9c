// Whole harvest cycles driven through `SimState::tick`, the way a host's
// render loop drives them: fixed-size frames, no direct AI calls.

use sandfall_sim::effect::EffectCallback;
use sandfall_sim::scheduler::FixedClock;
use sandfall_sim::sim::SimState;
use sandfall_sim::types::{ActorId, AiAction, BuildingClass, Owner, TileCoord, TileType, UnitClass};
use sandfall_sim::world::TileGrid;

const FRAME_MS: f64 = 16.0;

// 16×12, a 2×2 grass patch at (6..=7, 6..=7).
const MAP: &str = "\
................
................
................
................
................
................
......,,........
......,,........
................
................
................
................
";

struct Scenario {
    sim: SimState,
    harvester: ActorId,
    t: f64,
}

impl Scenario {
    fn new() -> Self {
        let grid = TileGrid::from_ascii(MAP).unwrap();
        let mut sim = SimState::new(grid);
        // Player refinery west of the patch, another far away, and a closer
        // one that belongs to the opponent.
        sim.spawn_building(BuildingClass::Refinery, Owner::Player, TileCoord::new(3, 6));
        sim.spawn_building(BuildingClass::Refinery, Owner::Player, TileCoord::new(13, 0));
        sim.spawn_building(BuildingClass::Refinery, Owner::Ai, TileCoord::new(9, 6));
        let harvester = sim.spawn_unit(UnitClass::Harvester, Owner::Player, TileCoord::new(6, 4));
        Self {
            sim,
            harvester,
            t: 0.0,
        }
    }

    fn frame(&mut self) {
        self.t += FRAME_MS;
        self.sim.tick_with_clock(self.t, &FixedClock(self.t)).unwrap();
    }

    /// Run frames until `done` holds; panics after `limit_ms` of game time.
    fn run_until(&mut self, limit_ms: f64, mut done: impl FnMut(&SimState, ActorId) -> bool) {
        while !done(&self.sim, self.harvester) {
            assert!(self.t < limit_ms, "condition not reached within {limit_ms} ms");
            self.frame();
        }
    }

    fn action(&self) -> AiAction {
        self.sim.world.actor(self.harvester).unwrap().ai_action
    }

    fn sand_tiles(&self) -> usize {
        let grid = &self.sim.world.grid;
        (0..grid.len())
            .filter_map(|i| grid.index_to_coordinate(i))
            .filter(|c| grid.get(*c) == Some(TileType::Sand))
            .count()
    }
}

#[test]
fn four_harvest_cycles_fill_the_harvester_and_send_it_home() {
    let mut s = Scenario::new();
    assert_eq!(s.action(), AiAction::GotoWaypoint);

    let mut harvests_seen = 0;
    let mut was_harvesting = false;
    s.run_until(120_000.0, |sim, id| {
        let action = sim.world.actor(id).unwrap().ai_action;
        if action == AiAction::HarvesterHarvest && !was_harvesting {
            harvests_seen += 1;
        }
        was_harvesting = action == AiAction::HarvesterHarvest;
        action == AiAction::HarvesterReturn
    });

    assert_eq!(harvests_seen, 4);
    assert_eq!(s.sand_tiles(), 4);
    let unit = s.sim.world.actor(s.harvester).unwrap();
    assert!(unit.ai_value >= 1.0);

    // Exactly one arrival callback, on the last step of the trip.
    let arrivals: Vec<_> = s
        .sim
        .scheduler
        .effects_for(s.harvester)
        .filter(|e| e.callback() == Some(EffectCallback::AdvanceAi))
        .collect();
    assert_eq!(arrivals.len(), 1);
    let trip_end = s
        .sim
        .scheduler
        .effects_for(s.harvester)
        .map(|e| e.end())
        .fold(0.0, f64::max);
    assert_eq!(arrivals[0].end(), trip_end);

    // The route ends at the entrance of the nearest player-owned refinery,
    // right below its footprint: (3, 6 + 2).
    s.run_until(120_000.0, |sim, id| sim.world.actor(id).unwrap().ai_action == AiAction::Idle);
    assert_eq!(
        s.sim.world.actor(s.harvester).unwrap().tile(),
        TileCoord::new(3, 8)
    );
}

#[test]
fn unloading_pays_the_owner_once_per_load() {
    let mut s = Scenario::new();
    let start = s.sim.ledger.credits(Owner::Player);
    let ai_start = s.sim.ledger.credits(Owner::Ai);

    s.run_until(120_000.0, |sim, _| sim.ledger.credits(Owner::Player) != start);
    assert_eq!(s.sim.ledger.credits(Owner::Player), start + 500);
    assert_eq!(s.sim.ledger.credits(Owner::Ai), ai_start);
    assert_eq!(s.action(), AiAction::Idle);

    // The fill ratio decays to zero, then the harvester looks for more grass.
    // None is left, so it parks with a pending retry.
    s.run_until(150_000.0, |sim, id| sim.world.actor(id).unwrap().ai_value == 0.0);
    s.frame();
    assert_eq!(s.action(), AiAction::Idle);
    assert_eq!(s.sim.scheduler.effects_for(s.harvester).count(), 1);
    assert_eq!(s.sim.ledger.credits(Owner::Player), start + 500);
}

#[test]
fn identical_inputs_give_identical_runs() {
    let mut a = Scenario::new();
    let mut b = Scenario::new();
    for _ in 0..2000 {
        a.frame();
        b.frame();
    }
    assert_eq!(a.sim.to_json().unwrap(), b.sim.to_json().unwrap());
}

#[test]
fn removing_the_harvester_mid_route_is_harmless() {
    let mut s = Scenario::new();
    for _ in 0..20 {
        s.frame();
    }
    s.sim.remove_actor(s.harvester);
    assert_eq!(s.sim.scheduler.effects_for(s.harvester).count(), 0);
    for _ in 0..100 {
        s.frame();
    }
    assert_eq!(s.sim.unit_count(UnitClass::Harvester), 0);
}

// Navigation — compiles a path into a chain of motion effects.
//
// `navigate_to` cancels the actor's pending motion, asks the pathfinder for
// a route from its rounded position, sets the requested AI action and
// schedules one `MotionStep` per waypoint transition. A step moves x and y
// at the same time when both change (diagonal glide); each step starts when
// the previous one ends. Steps are compiled from the actor's actual
// position, so a unit re-targeted halfway between tiles glides back onto
// the grid during its first step.
//
// The AI re-entry callback belongs to the final step and is attached to
// exactly one of its effects: the y effect when y changes, otherwise the x
// effect. When the actor already stands on the target, the single step is a
// dwell (x from itself to itself) so arrival still fires after one step.
//
// An empty path means the target is unreachable. The actor keeps its
// position, drops back to `Idle`, and the caller decides whether to retry
// (see `ai.rs`).
//
// See also: `pathfinding.rs` for the search, `scheduler.rs` for the effect
// set the steps land in.

use crate::effect::{Effect, EffectAction, EffectCallback, StoreId};
use crate::pathfinding::find_path;
use crate::sim::SimState;
use crate::types::{ActorId, AiAction, TileCoord};
use smallvec::SmallVec;

/// Effect actions that move an actor.
pub const MOTION_ACTIONS: [EffectAction; 2] = [EffectAction::SetActorX, EffectAction::SetActorY];

/// One waypoint transition: up to two axis moves sharing a start time, plus
/// the completion callback it owns.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionStep {
    pub start: f64,
    pub duration: f64,
    /// `(from, to)` along x, if x changes.
    pub x: Option<(f64, f64)>,
    /// `(from, to)` along y, if y changes.
    pub y: Option<(f64, f64)>,
    pub callback: Option<EffectCallback>,
}

impl MotionStep {
    /// The effects that carry out this step for `target`, x first. The
    /// callback rides on the last of them.
    pub fn effects(&self, target: ActorId) -> SmallVec<[Effect; 2]> {
        let mut out = SmallVec::new();
        let axes = [
            (EffectAction::SetActorX, self.x),
            (EffectAction::SetActorY, self.y),
        ];
        let last_axis = if self.y.is_some() { 1 } else { 0 };
        for (i, (action, span)) in axes.into_iter().enumerate() {
            let Some((from, to)) = span else {
                continue;
            };
            let callback = if i == last_axis { self.callback } else { None };
            out.push(
                Effect::builder(StoreId::Action, self.start, self.duration, from, to)
                    .action(action)
                    .maybe_callback(callback)
                    .target(target)
                    .build(),
            );
        }
        out
    }
}

/// Turn `path` into motion steps beginning at game time `start`, `step_ms`
/// apart. `from` is the mover's actual position and `path` starts at the
/// tile it rounds to. `callback` is attached to the final step.
///
/// An actor caught mid-glide is off the grid on one or both axes; the first
/// step moves every such axis onto the next waypoint so the actor comes to
/// rest on whole tiles. An empty path compiles to no steps. A path that
/// never leaves the start tile compiles to a single dwell step, which also
/// settles any fractional axis.
pub fn compile_motion(
    from: (f64, f64),
    path: &[TileCoord],
    start: f64,
    step_ms: f64,
    callback: Option<EffectCallback>,
) -> Vec<MotionStep> {
    let origin = TileCoord::from_position(from.0, from.1);
    let mut steps = Vec::with_capacity(path.len());
    let mut last_tile = origin;
    let (mut x, mut y) = from;
    let mut step_start = start;

    for &waypoint in path {
        if waypoint == last_tile {
            continue;
        }
        let (to_x, to_y) = (f64::from(waypoint.x), f64::from(waypoint.y));
        steps.push(MotionStep {
            start: step_start,
            duration: step_ms,
            x: (x != to_x).then_some((x, to_x)),
            y: (y != to_y).then_some((y, to_y)),
            callback: None,
        });
        step_start += step_ms;
        last_tile = waypoint;
        (x, y) = (to_x, to_y);
    }

    if steps.is_empty() && !path.is_empty() {
        let (to_x, to_y) = (f64::from(origin.x), f64::from(origin.y));
        steps.push(MotionStep {
            start,
            duration: step_ms,
            x: Some((from.0, to_x)),
            y: (from.1 != to_y).then_some((from.1, to_y)),
            callback: None,
        });
    }

    if let Some(final_step) = steps.last_mut() {
        final_step.callback = callback;
    }
    steps
}

impl SimState {
    /// Send actor `id` to `target`, switching its AI action to `next_action`.
    ///
    /// Returns the computed path (empty when the target is unreachable or
    /// the actor is not a unit).
    pub fn navigate_to(&mut self, id: ActorId, target: TileCoord, next_action: AiAction) -> Vec<TileCoord> {
        let cancelled = self
            .scheduler
            .remove_effects_by_target_and_action(id, &MOTION_ACTIONS);

        let Some(actor) = self.world.actor(id) else {
            tracing::warn!(%id, "navigation requested for a missing actor");
            return Vec::new();
        };
        let Some(class) = actor.unit_class() else {
            tracing::warn!(%id, "navigation requested for a building");
            return Vec::new();
        };
        let position = (actor.x, actor.y);
        let from = actor.tile();
        let max_walkable = self.config.unit(class).max_walkable_tile;
        let step_ms = self.config.walk_step_for(class);

        let blockers = self.world.building_footprints();
        let path = find_path(&self.world.grid, from, target, max_walkable, &blockers);

        if path.is_empty() {
            tracing::warn!(%id, %from, %target, "target unreachable");
            self.set_ai_action(id, AiAction::Idle);
            return path;
        }

        self.set_ai_action(id, next_action);
        let steps = compile_motion(
            position,
            &path,
            self.now(),
            step_ms,
            Some(EffectCallback::AdvanceAi),
        );
        for step in &steps {
            for effect in step.effects(id) {
                self.scheduler.add_effect(effect);
            }
        }
        tracing::debug!(
            %id,
            %target,
            waypoints = path.len(),
            steps = steps.len(),
            cancelled,
            ?next_action,
            "navigating"
        );
        path
    }

    pub(crate) fn set_ai_action(&mut self, id: ActorId, action: AiAction) {
        if let Some(actor) = self.world.actor_mut(id) {
            actor.ai_action = action;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Owner, TileType, UnitClass};
    use crate::world::TileGrid;

    fn coords(points: &[(i32, i32)]) -> Vec<TileCoord> {
        points.iter().map(|&(x, y)| TileCoord::new(x, y)).collect()
    }

    #[test]
    fn diagonal_step_glides_both_axes() {
        let path = coords(&[(0, 0), (1, 1), (2, 1)]);
        let steps = compile_motion((0.0, 0.0), &path, 100.0, 800.0, Some(EffectCallback::AdvanceAi));
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].start, 100.0);
        assert_eq!(steps[0].x, Some((0.0, 1.0)));
        assert_eq!(steps[0].y, Some((0.0, 1.0)));
        assert_eq!(steps[0].callback, None);
        assert_eq!(steps[1].start, 900.0);
        assert_eq!(steps[1].x, Some((1.0, 2.0)));
        assert_eq!(steps[1].y, None);
        assert_eq!(steps[1].callback, Some(EffectCallback::AdvanceAi));
    }

    #[test]
    fn callback_attached_exactly_once() {
        let path = coords(&[(0, 0), (1, 0), (2, 1)]);
        let steps = compile_motion((0.0, 0.0), &path, 0.0, 800.0, Some(EffectCallback::AdvanceAi));
        let effects: Vec<Effect> = steps.iter().flat_map(|s| s.effects(ActorId(4))).collect();
        assert_eq!(effects.len(), 3);
        let with_callback: Vec<&Effect> = effects.iter().filter(|e| e.callback().is_some()).collect();
        assert_eq!(with_callback.len(), 1);
        // Final step moves both axes; the y effect carries the callback.
        assert_eq!(with_callback[0].action(), Some(EffectAction::SetActorY));
        assert_eq!(with_callback[0].start(), 800.0);
        assert!(effects.iter().all(|e| e.target() == Some(ActorId(4))));
    }

    #[test]
    fn standing_on_target_dwells_one_step() {
        let here = TileCoord::new(3, 3);
        let steps = compile_motion((3.0, 3.0), &[here], 50.0, 800.0, Some(EffectCallback::AdvanceAi));
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].x, Some((3.0, 3.0)));
        assert_eq!(steps[0].callback, Some(EffectCallback::AdvanceAi));
        let effects = steps[0].effects(ActorId(0));
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].end(), 850.0);
    }

    #[test]
    fn off_grid_start_settles_both_axes_on_first_step() {
        let path = coords(&[(0, 1), (1, 1), (2, 1)]);
        let steps = compile_motion((0.0, 1.4), &path, 0.0, 800.0, Some(EffectCallback::AdvanceAi));
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].x, Some((0.0, 1.0)));
        assert_eq!(steps[0].y, Some((1.4, 1.0)));
        assert_eq!(steps[1].x, Some((1.0, 2.0)));
        assert_eq!(steps[1].y, None);
    }

    #[test]
    fn off_grid_dwell_moves_onto_the_tile() {
        let steps = compile_motion((2.6, 3.3), &[TileCoord::new(3, 3)], 0.0, 800.0, None);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].x, Some((2.6, 3.0)));
        assert_eq!(steps[0].y, Some((3.3, 3.0)));
    }

    #[test]
    fn empty_path_compiles_to_nothing() {
        let steps = compile_motion((0.0, 0.0), &[], 0.0, 800.0, Some(EffectCallback::AdvanceAi));
        assert!(steps.is_empty());
    }

    fn scout_sim() -> (SimState, ActorId) {
        let mut sim = SimState::new(TileGrid::new(10, 10, TileType::Ground));
        let id = sim.spawn_unit(UnitClass::Scout, Owner::Player, TileCoord::new(0, 0));
        (sim, id)
    }

    #[test]
    fn navigate_enqueues_motion_and_sets_action() {
        let (mut sim, id) = scout_sim();
        let path = sim.navigate_to(id, TileCoord::new(9, 9), AiAction::GotoWaypoint);
        assert_eq!(path.len(), 10);
        assert_eq!(sim.world.actor(id).unwrap().ai_action, AiAction::GotoWaypoint);
        // Nine diagonal steps, two effects each.
        assert_eq!(sim.scheduler.effects_for(id).count(), 18);
        let last_end = sim
            .scheduler
            .effects_for(id)
            .map(Effect::end)
            .fold(0.0, f64::max);
        assert_eq!(last_end, 9.0 * sim.config.walk_step_ms);
    }

    #[test]
    fn renavigating_cancels_previous_motion() {
        let (mut sim, id) = scout_sim();
        sim.navigate_to(id, TileCoord::new(9, 0), AiAction::GotoWaypoint);
        sim.navigate_to(id, TileCoord::new(0, 3), AiAction::GotoWaypoint);
        let effects: Vec<&Effect> = sim.scheduler.effects_for(id).collect();
        assert_eq!(effects.len(), 3);
        assert!(effects.iter().all(|e| e.action() == Some(EffectAction::SetActorY)));
        assert_eq!(effects.iter().filter(|e| e.callback().is_some()).count(), 1);
    }

    #[test]
    fn unreachable_target_leaves_actor_idle_in_place() {
        let (mut sim, id) = scout_sim();
        sim.world.grid.set(TileCoord::new(5, 5), TileType::Water);
        sim.navigate_to(id, TileCoord::new(9, 0), AiAction::GotoWaypoint);
        let path = sim.navigate_to(id, TileCoord::new(5, 5), AiAction::GotoWaypoint);
        assert!(path.is_empty());
        let actor = sim.world.actor(id).unwrap();
        assert_eq!(actor.ai_action, AiAction::Idle);
        assert_eq!((actor.x, actor.y), (0.0, 0.0));
        assert_eq!(sim.scheduler.effects_for(id).count(), 0);
    }

    #[test]
    fn motion_runs_to_completion_through_tick() {
        let (mut sim, id) = scout_sim();
        sim.navigate_to(id, TileCoord::new(3, 0), AiAction::GotoWaypoint);
        sim.tick(1200.0).unwrap();
        let actor = sim.world.actor(id).unwrap();
        assert_eq!(actor.y, 0.0);
        assert!((actor.x - 1.5).abs() < 1e-9);

        sim.tick(2400.0).unwrap();
        assert_eq!(sim.world.actor(id).unwrap().x, 3.0);
        assert!(sim.scheduler.is_empty());
    }

    #[test]
    fn retargeting_mid_glide_ends_on_whole_tiles() {
        let (mut sim, id) = scout_sim();
        sim.navigate_to(id, TileCoord::new(0, 5), AiAction::GotoWaypoint);
        sim.tick(1120.0).unwrap();
        let actor = sim.world.actor(id).unwrap();
        assert_eq!(actor.x, 0.0);
        assert!((actor.y - 1.4).abs() < 1e-9);

        sim.navigate_to(id, TileCoord::new(4, 1), AiAction::GotoWaypoint);
        sim.tick(60_000.0).unwrap();
        let actor = sim.world.actor(id).unwrap();
        assert_eq!((actor.x, actor.y), (4.0, 1.0));
        assert_eq!(actor.tile(), TileCoord::new(4, 1));
        assert_eq!(sim.scheduler.effects_for(id).count(), 0);
    }
}

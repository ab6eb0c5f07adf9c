// Effect scheduler — the simulation clock and the active-effect set.
//
// The host's render loop calls `tick(timestamp)` once per frame. The
// scheduler turns the wall-clock delta since the previous frame into game
// time, updates every active effect against the new clock value in
// insertion order, and drops the effects that completed. Nothing happens
// while the game state is anything but `Active`.
//
// A timestamp of `FIRST_FRAME` (0) means "now": the host's first frame has
// no timestamp of its own, so the scheduler asks its `Clock` instead.
//
// Effects get a scheduler-assigned `EffectId` on insertion, which is their
// identity for `add_effect` idempotence and `remove_effect`. Bulk
// cancellation filters by action, callback, target, or target and action.
//
// The effect pass cannot reach the scheduler (dispatch goes through the
// `Registry`, which only borrows actor and world state), so the active set
// is never appended to mid-traversal. Effects enqueued as a consequence of
// a completion are added after the pass and first run on the next tick.
//
// See also: `effect.rs` for the per-effect update rule, `sim.rs` for the
// tick that wires the registry and drains AI decisions.
//
// **Critical constraint: determinism.** Given the same timestamps, the
// scheduler produces the same sequence of dispatches. Identity is a
// counter, never an address.

use crate::effect::{Dispatch, Effect, EffectAction, EffectCallback};
use crate::error::EffectError;
use crate::types::{ActorId, EffectId, GameState};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Timestamp value meaning "no timestamp yet, use the current time".
pub const FIRST_FRAME: f64 = 0.0;

/// Source of "now" for the first-frame substitution.
pub trait Clock {
    /// Milliseconds on the same scale as the host's frame timestamps.
    fn now_ms(&self) -> f64;
}

/// Monotonic wall clock, measured from construction.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// A clock that always reads the same value. For tests and replays.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FixedClock(pub f64);

impl Clock for FixedClock {
    fn now_ms(&self) -> f64 {
        self.0
    }
}

/// The active-effect set plus the simulated clock that drives it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(from = "SchedulerData", into = "SchedulerData")]
pub struct EffectScheduler {
    /// Game time in ms.
    clock_ms: f64,
    /// Host timestamp of the previous tick.
    last_render: f64,
    state: GameState,
    active: Vec<Effect>,
    next_id: u64,
}

impl EffectScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock to `timestamp` and update every active effect.
    ///
    /// Returns the number of effects that completed. An `EffectError` aborts
    /// the pass immediately; the clock has already advanced and the failing
    /// effect stays in the set.
    pub fn tick<C, D>(&mut self, timestamp: f64, clock: &C, dispatch: &mut D) -> Result<usize, EffectError>
    where
        C: Clock + ?Sized,
        D: Dispatch + ?Sized,
    {
        if self.state != GameState::Active {
            return Ok(0);
        }
        let timestamp = if timestamp == FIRST_FRAME {
            clock.now_ms()
        } else {
            timestamp
        };

        let delta = timestamp - self.last_render;
        self.advance_clock(delta);
        let now = self.clock_ms;

        let mut completed = 0;
        let mut i = 0;
        while i < self.active.len() {
            if self.active[i].update(now, dispatch)? {
                self.active.remove(i);
                completed += 1;
            } else {
                i += 1;
            }
        }

        self.last_render = timestamp;
        Ok(completed)
    }

    /// Take ownership of `effect` and return its identity.
    ///
    /// An effect that already carries an id which is still active is not
    /// added twice.
    pub fn add_effect(&mut self, mut effect: Effect) -> EffectId {
        let id = match effect.id() {
            Some(id) if self.contains(id) => return id,
            Some(id) => {
                self.next_id = self.next_id.max(id.0 + 1);
                id
            }
            None => {
                let id = self.allocate_id();
                effect.assign_id(id);
                id
            }
        };
        self.active.push(effect);
        id
    }

    /// Remove one effect by identity. Returns whether it was active.
    pub fn remove_effect(&mut self, id: EffectId) -> bool {
        let before = self.active.len();
        self.active.retain(|e| e.id() != Some(id));
        self.active.len() != before
    }

    /// Remove every effect whose action is in `actions`. Returns the count.
    pub fn remove_effects_by_action(&mut self, actions: &[EffectAction]) -> usize {
        self.remove_where(|e| e.action().is_some_and(|a| actions.contains(&a)))
    }

    /// Remove every effect whose callback is in `callbacks`.
    pub fn remove_effects_by_callback(&mut self, callbacks: &[EffectCallback]) -> usize {
        self.remove_where(|e| e.callback().is_some_and(|c| callbacks.contains(&c)))
    }

    /// Remove every effect targeting `target`.
    pub fn remove_effects_by_target(&mut self, target: ActorId) -> usize {
        self.remove_where(|e| e.target() == Some(target))
    }

    /// Remove every effect targeting `target` whose action is in `actions`.
    pub fn remove_effects_by_target_and_action(&mut self, target: ActorId, actions: &[EffectAction]) -> usize {
        self.remove_where(|e| {
            e.target() == Some(target) && e.action().is_some_and(|a| actions.contains(&a))
        })
    }

    fn remove_where(&mut self, mut doomed: impl FnMut(&Effect) -> bool) -> usize {
        let before = self.active.len();
        self.active.retain(|e| !doomed(e));
        before - self.active.len()
    }

    pub fn contains(&self, id: EffectId) -> bool {
        self.active.iter().any(|e| e.id() == Some(id))
    }

    pub fn effects(&self) -> &[Effect] {
        &self.active
    }

    /// Active effects targeting `target`, in processing order.
    pub fn effects_for(&self, target: ActorId) -> impl Iterator<Item = &Effect> {
        self.active.iter().filter(move |e| e.target() == Some(target))
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Current game time in ms.
    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    pub fn set_clock(&mut self, ms: f64) {
        self.clock_ms = ms;
    }

    pub fn advance_clock(&mut self, delta_ms: f64) {
        self.clock_ms += delta_ms;
    }

    pub fn last_render(&self) -> f64 {
        self.last_render
    }

    pub fn set_last_render(&mut self, timestamp: f64) {
        self.last_render = timestamp;
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn set_state(&mut self, state: GameState) {
        self.state = state;
    }

    fn allocate_id(&mut self) -> EffectId {
        let id = EffectId(self.next_id);
        self.next_id += 1;
        id
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Persisted scheduler state. Effect ids are not part of the effect
/// contract, so they are reassigned on load.
#[derive(Clone, Serialize, Deserialize)]
struct SchedulerData {
    clock_ms: f64,
    last_render: f64,
    state: GameState,
    effects: Vec<Effect>,
}

impl From<EffectScheduler> for SchedulerData {
    fn from(scheduler: EffectScheduler) -> Self {
        Self {
            clock_ms: scheduler.clock_ms,
            last_render: scheduler.last_render,
            state: scheduler.state,
            effects: scheduler.active,
        }
    }
}

impl From<SchedulerData> for EffectScheduler {
    fn from(data: SchedulerData) -> Self {
        let mut scheduler = Self {
            clock_ms: data.clock_ms,
            last_render: data.last_render,
            state: data.state,
            active: Vec::with_capacity(data.effects.len()),
            next_id: 0,
        };
        for effect in data.effects {
            scheduler.add_effect(effect);
        }
        scheduler
    }
}

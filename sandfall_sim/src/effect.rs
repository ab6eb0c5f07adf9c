// Effects — time-bounded linear interpolation of a single scalar.
//
// An `Effect` describes "move this value from `from` to `to` over `duration`
// milliseconds of game time, starting at `start`", plus what to do with the
// value: an optional `EffectAction` applied on every update and an optional
// `EffectCallback` fired once on completion. Waiting in the simulation is
// expressed as an effect that matures in the future — there are no
// suspended execution contexts.
//
// Mutations are a closed set (`EffectAction`, `EffectCallback`) addressed to
// a `StoreId`. Effects never touch state directly; `update()` hands values to
// a `Dispatch` implementation, normally the `Registry` in `registry.rs`,
// which resolves the store to its handler.
//
// Effects are immutable once built. The scheduler owns them (see
// `scheduler.rs`) and drops them on completion or cancellation.
//
// The serialized shape (`st`, `a`, `s`, `d`, `sv`, `ev`, `c`, `t`) is a fixed
// persistence contract shared with saved games. `increment` is derived and
// recomputed on load; the scheduler-assigned `id` is never persisted.
//
// **Critical constraint: determinism.** The final update applies `to`
// exactly rather than `from + increment * duration`, so chained effects never
// accumulate floating-point drift.

use crate::error::EffectError;
use crate::types::{ActorId, EffectId};
use serde::{Deserialize, Serialize};

/// A mutation target an effect can address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StoreId {
    /// Per-actor state: position, AI payload, AI re-entry.
    Action,
    /// World-level state: the viewport focus point.
    World,
}

/// Mutations applied with the effect's current value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectAction {
    SetActorX,
    SetActorY,
    SetAiValue,
    SetFocusX,
    SetFocusY,
}

/// Notifications fired once when an effect completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectCallback {
    /// Re-enter the target actor's AI decision function.
    AdvanceAi,
}

/// The argument a handler receives: the bare value, or the value plus the
/// actor it is meant for when the effect has a target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Payload {
    Value(f64),
    Targeted { value: f64, target: ActorId },
}

impl Payload {
    pub fn value(self) -> f64 {
        match self {
            Self::Value(value) | Self::Targeted { value, .. } => value,
        }
    }

    pub fn target(self) -> Option<ActorId> {
        match self {
            Self::Value(_) => None,
            Self::Targeted { target, .. } => Some(target),
        }
    }
}

/// Receives the values produced by `Effect::update`.
pub trait Dispatch {
    fn apply(
        &mut self,
        store: StoreId,
        action: EffectAction,
        payload: Payload,
    ) -> Result<(), EffectError>;

    fn complete(
        &mut self,
        store: StoreId,
        callback: EffectCallback,
        payload: Payload,
    ) -> Result<(), EffectError>;
}

/// A scheduled linear interpolation. Build with `Effect::builder`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SerializedEffect", into = "SerializedEffect")]
pub struct Effect {
    id: Option<EffectId>,
    store: StoreId,
    action: Option<EffectAction>,
    callback: Option<EffectCallback>,
    start: f64,
    duration: f64,
    from: f64,
    to: f64,
    increment: f64,
    target: Option<ActorId>,
}

/// Collects the optional parts of an effect before `build()` freezes it.
#[derive(Clone, Debug)]
pub struct EffectBuilder {
    store: StoreId,
    start: f64,
    duration: f64,
    from: f64,
    to: f64,
    action: Option<EffectAction>,
    callback: Option<EffectCallback>,
    target: Option<ActorId>,
}

impl EffectBuilder {
    pub fn action(mut self, action: EffectAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn callback(mut self, callback: EffectCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Set or clear the callback. Used by navigation, which decides per step
    /// whether the callback is attached.
    pub fn maybe_callback(mut self, callback: Option<EffectCallback>) -> Self {
        self.callback = callback;
        self
    }

    pub fn target(mut self, target: ActorId) -> Self {
        self.target = Some(target);
        self
    }

    /// Freeze the effect.
    ///
    /// Debug builds panic on an effect that could never do anything (neither
    /// action nor callback) or on a non-positive duration; release builds
    /// accept them.
    pub fn build(self) -> Effect {
        debug_assert!(
            self.action.is_some() || self.callback.is_some(),
            "cannot build an Effect without either an action or a callback"
        );
        debug_assert!(self.duration > 0.0, "Effect duration must be positive");
        Effect {
            id: None,
            store: self.store,
            action: self.action,
            callback: self.callback,
            start: self.start,
            duration: self.duration,
            from: self.from,
            to: self.to,
            increment: (self.to - self.from) / self.duration,
            target: self.target,
        }
    }
}

impl Effect {
    /// Start describing an effect on `store` that moves a value from `from`
    /// to `to` over `duration` ms of game time beginning at `start`.
    pub fn builder(store: StoreId, start: f64, duration: f64, from: f64, to: f64) -> EffectBuilder {
        EffectBuilder {
            store,
            start,
            duration,
            from,
            to,
            action: None,
            callback: None,
            target: None,
        }
    }

    /// Advance the effect to game time `now`, dispatching its value.
    ///
    /// Returns `Ok(true)` once the effect has completed and should be
    /// dropped. Before `start` nothing is dispatched.
    pub fn update<D: Dispatch + ?Sized>(&self, now: f64, dispatch: &mut D) -> Result<bool, EffectError> {
        let elapsed = now - self.start;
        if elapsed < 0.0 {
            return Ok(false);
        }

        if elapsed >= self.duration {
            let payload = self.payload(self.to);
            if let Some(action) = self.action {
                dispatch.apply(self.store, action, payload)?;
            }
            if let Some(callback) = self.callback {
                dispatch.complete(self.store, callback, payload)?;
            }
            return Ok(true);
        }

        if let Some(action) = self.action {
            let value = self.from + self.increment * elapsed;
            dispatch.apply(self.store, action, self.payload(value))?;
        }
        Ok(false)
    }

    fn payload(&self, value: f64) -> Payload {
        match self.target {
            Some(target) => Payload::Targeted { value, target },
            None => Payload::Value(value),
        }
    }

    pub fn id(&self) -> Option<EffectId> {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: EffectId) {
        self.id = Some(id);
    }

    pub fn store(&self) -> StoreId {
        self.store
    }

    pub fn action(&self) -> Option<EffectAction> {
        self.action
    }

    pub fn callback(&self) -> Option<EffectCallback> {
        self.callback
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Game time at which the effect matures.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Value at `start`.
    pub fn start_value(&self) -> f64 {
        self.from
    }

    /// Value applied on completion.
    pub fn end_value(&self) -> f64 {
        self.to
    }

    pub fn increment(&self) -> f64 {
        self.increment
    }

    pub fn target(&self) -> Option<ActorId> {
        self.target
    }
}

// ---------------------------------------------------------------------------
// Persistence contract
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
struct SerializedEffect {
    st: StoreId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    a: Option<EffectAction>,
    s: f64,
    d: f64,
    sv: f64,
    ev: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    c: Option<EffectCallback>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    t: Option<ActorId>,
}

impl From<Effect> for SerializedEffect {
    fn from(effect: Effect) -> Self {
        Self {
            st: effect.store,
            a: effect.action,
            s: effect.start,
            d: effect.duration,
            sv: effect.from,
            ev: effect.to,
            c: effect.callback,
            t: effect.target,
        }
    }
}

impl TryFrom<SerializedEffect> for Effect {
    type Error = EffectError;

    fn try_from(data: SerializedEffect) -> Result<Self, Self::Error> {
        if data.a.is_none() && data.c.is_none() {
            return Err(EffectError::MissingMutation);
        }
        if data.d.is_nan() || data.d <= 0.0 {
            return Err(EffectError::NonPositiveDuration);
        }
        let mut builder = Effect::builder(data.st, data.s, data.d, data.sv, data.ev)
            .maybe_callback(data.c);
        if let Some(action) = data.a {
            builder = builder.action(action);
        }
        if let Some(target) = data.t {
            builder = builder.target(target);
        }
        Ok(builder.build())
    }
}

// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------

/// A `Dispatch` that records every call, for tests across the crate.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct Recorder {
    pub applied: Vec<(StoreId, EffectAction, Payload)>,
    pub completed: Vec<(StoreId, EffectCallback, Payload)>,
}

#[cfg(test)]
impl Dispatch for Recorder {
    fn apply(
        &mut self,
        store: StoreId,
        action: EffectAction,
        payload: Payload,
    ) -> Result<(), EffectError> {
        self.applied.push((store, action, payload));
        Ok(())
    }

    fn complete(
        &mut self,
        store: StoreId,
        callback: EffectCallback,
        payload: Payload,
    ) -> Result<(), EffectError> {
        self.completed.push((store, callback, payload));
        Ok(())
    }
}

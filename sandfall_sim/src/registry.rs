// Mutation registry — resolves an effect's `StoreId` to the handler that
// owns that slice of state.
//
// A `Registry` is built per tick with exactly the handlers it may address,
// each borrowing the state it mutates. An effect addressed to a store the
// registry was not built with is a wiring bug and surfaces as
// `EffectError::UnresolvedStore`.
//
// Two handlers exist:
// - `ActionStore` — per-actor state. Position setters clamp into world
//   bounds, `SetAiValue` writes the AI payload, and `AdvanceAi` queues the
//   target actor for an AI decision. Every handler is a no-op for an actor
//   that no longer exists.
// - `WorldStore` — the viewport focus point, clamped to `[0, width] ×
//   [0, height]`.
//
// AI decisions are queued rather than run inline: the scheduler is iterating
// its active set while effects dispatch, and the decision function needs to
// enqueue and cancel effects. `SimState::tick` drains the queue once the
// effect pass is over (see `sim.rs`), which is also what defers effects
// created by callbacks to the next tick.

use crate::actor::Actor;
use crate::effect::{Dispatch, EffectAction, EffectCallback, Payload, StoreId};
use crate::error::EffectError;
use crate::types::ActorId;
use crate::world::Focus;
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// The exhaustive handler for one store.
pub trait StoreHandler {
    fn apply(&mut self, action: EffectAction, payload: Payload) -> Result<(), EffectError>;

    fn complete(&mut self, callback: EffectCallback, payload: Payload) -> Result<(), EffectError>;
}

/// Store-to-handler table for one dispatch pass.
#[derive(Default)]
pub struct Registry<'a> {
    handlers: SmallVec<[(StoreId, &'a mut dyn StoreHandler); 2]>,
}

impl<'a> Registry<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `store`, replacing any earlier registration.
    pub fn with(mut self, store: StoreId, handler: &'a mut dyn StoreHandler) -> Self {
        self.handlers.retain(|(id, _)| *id != store);
        self.handlers.push((store, handler));
        self
    }

    fn resolve(&mut self, store: StoreId) -> Result<&mut (dyn StoreHandler + 'a), EffectError> {
        self.handlers
            .iter_mut()
            .find(|(id, _)| *id == store)
            .map(|(_, handler)| &mut **handler)
            .ok_or(EffectError::UnresolvedStore(store))
    }
}

impl Dispatch for Registry<'_> {
    fn apply(&mut self, store: StoreId, action: EffectAction, payload: Payload) -> Result<(), EffectError> {
        self.resolve(store)?.apply(action, payload)
    }

    fn complete(
        &mut self,
        store: StoreId,
        callback: EffectCallback,
        payload: Payload,
    ) -> Result<(), EffectError> {
        self.resolve(store)?.complete(callback, payload)
    }
}

// ---------------------------------------------------------------------------
// Action store
// ---------------------------------------------------------------------------

/// Per-actor mutations.
pub struct ActionStore<'a> {
    actors: &'a mut BTreeMap<ActorId, Actor>,
    max_x: f64,
    max_y: f64,
    decisions: &'a mut Vec<ActorId>,
}

impl<'a> ActionStore<'a> {
    /// `max_position` is the largest in-bounds position (see
    /// `World::max_position`); AI decisions are pushed onto `decisions`.
    pub fn new(
        actors: &'a mut BTreeMap<ActorId, Actor>,
        max_position: (f64, f64),
        decisions: &'a mut Vec<ActorId>,
    ) -> Self {
        Self {
            actors,
            max_x: max_position.0,
            max_y: max_position.1,
            decisions,
        }
    }

    fn actor(&mut self, payload: Payload) -> Option<&mut Actor> {
        let Some(id) = payload.target() else {
            tracing::warn!("action store received an untargeted payload");
            return None;
        };
        let actor = self.actors.get_mut(&id);
        if actor.is_none() {
            tracing::debug!(%id, "effect target no longer exists");
        }
        actor
    }
}

impl StoreHandler for ActionStore<'_> {
    fn apply(&mut self, action: EffectAction, payload: Payload) -> Result<(), EffectError> {
        let (max_x, max_y) = (self.max_x, self.max_y);
        let value = payload.value();
        match action {
            EffectAction::SetActorX => {
                if let Some(actor) = self.actor(payload) {
                    actor.x = value.clamp(0.0, max_x);
                }
            }
            EffectAction::SetActorY => {
                if let Some(actor) = self.actor(payload) {
                    actor.y = value.clamp(0.0, max_y);
                }
            }
            EffectAction::SetAiValue => {
                if let Some(actor) = self.actor(payload) {
                    actor.ai_value = value;
                }
            }
            EffectAction::SetFocusX | EffectAction::SetFocusY => {
                return Err(EffectError::UnsupportedAction {
                    store: StoreId::Action,
                    action,
                });
            }
        }
        Ok(())
    }

    fn complete(&mut self, callback: EffectCallback, payload: Payload) -> Result<(), EffectError> {
        match callback {
            EffectCallback::AdvanceAi => {
                if let Some(actor) = self.actor(payload) {
                    let id = actor.id;
                    self.decisions.push(id);
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// World store
// ---------------------------------------------------------------------------

/// Viewport focus mutations.
pub struct WorldStore<'a> {
    focus: &'a mut Focus,
    width: f64,
    height: f64,
}

impl<'a> WorldStore<'a> {
    pub fn new(focus: &'a mut Focus, width: i32, height: i32) -> Self {
        Self {
            focus,
            width: f64::from(width.max(0)),
            height: f64::from(height.max(0)),
        }
    }
}

impl StoreHandler for WorldStore<'_> {
    fn apply(&mut self, action: EffectAction, payload: Payload) -> Result<(), EffectError> {
        match action {
            EffectAction::SetFocusX => self.focus.x = payload.value().clamp(0.0, self.width),
            EffectAction::SetFocusY => self.focus.y = payload.value().clamp(0.0, self.height),
            EffectAction::SetActorX | EffectAction::SetActorY | EffectAction::SetAiValue => {
                return Err(EffectError::UnsupportedAction {
                    store: StoreId::World,
                    action,
                });
            }
        }
        Ok(())
    }

    fn complete(&mut self, callback: EffectCallback, _payload: Payload) -> Result<(), EffectError> {
        Err(EffectError::UnsupportedCallback {
            store: StoreId::World,
            callback,
        })
    }
}

// Error types for the simulation crate.
//
// Only wiring and input errors live here. Expected simulation outcomes — no
// path, no harvestable tile, a vanished actor — are not errors: they come
// back as `Option`/empty `Vec` and are logged (see `ai.rs`, `navigation.rs`).
//
// `EffectError` is fatal by contract: it means an effect addressed a store or
// mutation the registry was not built with (see `registry.rs`), and `tick()`
// propagates it immediately.

use crate::effect::{EffectAction, EffectCallback, StoreId};
use crate::types::{BuildingClass, UnitClass};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EffectError {
    #[error("no handler registered for store {0:?}")]
    UnresolvedStore(StoreId),
    #[error("store {store:?} does not support action {action:?}")]
    UnsupportedAction {
        store: StoreId,
        action: EffectAction,
    },
    #[error("store {store:?} does not support callback {callback:?}")]
    UnsupportedCallback {
        store: StoreId,
        callback: EffectCallback,
    },
    #[error("effect has neither an action nor a callback")]
    MissingMutation,
    #[error("effect duration must be positive")]
    NonPositiveDuration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("map has no rows")]
    Empty,
    #[error("row {row} has width {found}, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown glyph {glyph:?} at ({x}, {y})")]
    UnknownGlyph { glyph: char, x: usize, y: usize },
}

/// A player or AI command the simulation refused. The world is unchanged.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("{0:?} cannot be constructed")]
    NotConstructable(BuildingClass),
    #[error("{0:?} requires a production building that is not present")]
    MissingPrerequisite(UnitClass),
    #[error("insufficient credits: need {needed}, have {available}")]
    InsufficientCredits { needed: i64, available: i64 },
}

/// Umbrella error for hosts that drive the whole simulation.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Effect(#[from] EffectError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Map(#[from] MapError),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not serialize state: {0}")]
    Save(#[from] serde_json::Error),
}

// Data-driven simulation configuration.
//
// All tunable parameters live in `SimConfig`, loaded from JSON at startup.
// Simulation logic reads durations, rates and rewards from here instead of
// hard-coding them, so balance can be iterated on without recompiling.
// Fields missing from a JSON file fall back to their defaults.
//
// Per-class data lives in two tables: `UnitData` keyed by `UnitClass` and
// `BuildingData` keyed by `BuildingClass`. The sim has a single `Actor` type
// and reads class-specific values (footprint, walk speed, walkable terrain)
// from these tables at runtime.
//
// See also: `sim.rs` which owns the `SimConfig` as part of `SimState`,
// `ai.rs` for the harvester constants, `navigation.rs` for step timing.
//
// **Critical constraint: determinism.** Config values feed directly into
// simulation logic; identical configs and inputs give identical runs.

use crate::error::ConfigError;
use crate::types::{BuildingClass, TileType, UnitClass};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Data-driven parameters for a unit class.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitData {
    /// Highest-ranked tile this unit can walk onto.
    pub max_walkable_tile: TileType,
    /// Per-class override of `SimConfig::walk_step_ms`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub walk_step_ms: Option<f64>,
    /// Credits required to build one.
    pub cost: u32,
    pub width: i32,
    pub height: i32,
}

impl UnitData {
    /// Built-in table entry for `class`.
    pub fn defaults(class: UnitClass) -> Self {
        let cost = match class {
            UnitClass::Scout => 50,
            UnitClass::Harvester => 750,
        };
        Self {
            max_walkable_tile: TileType::Road,
            walk_step_ms: None,
            cost,
            width: 1,
            height: 1,
        }
    }
}

/// Data-driven parameters for a building class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingData {
    pub cost: u32,
    pub width: i32,
    pub height: i32,
    /// Whether the player can place this building. The construction yard is
    /// only ever granted at game start.
    pub constructable: bool,
}

impl BuildingData {
    /// Built-in table entry for `class`.
    pub fn defaults(class: BuildingClass) -> Self {
        let (cost, width, height, constructable) = match class {
            BuildingClass::ConstructionYard => (1000, 2, 2, false),
            BuildingClass::Refinery => (300, 3, 2, true),
            BuildingClass::Barracks => (1000, 3, 3, true),
            BuildingClass::Turret => (2500, 1, 1, true),
        };
        Self {
            cost,
            width,
            height,
            constructable,
        }
    }
}

const UNIT_CLASSES: [UnitClass; 2] = [UnitClass::Scout, UnitClass::Harvester];
const BUILDING_CLASSES: [BuildingClass; 4] = [
    BuildingClass::ConstructionYard,
    BuildingClass::Refinery,
    BuildingClass::Barracks,
    BuildingClass::Turret,
];

/// Top-level simulation configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Game-time milliseconds a unit spends on one waypoint step.
    pub walk_step_ms: f64,

    /// Fill ratio a harvester gains per harvest cycle. A load is full at 1.0.
    pub harvest_fill_rate: f64,

    /// Duration of one harvest cycle on a single tile.
    pub harvest_duration_ms: f64,

    /// Duration of the fill-ratio decay after a load has been unloaded.
    pub unload_decay_ms: f64,

    /// Credits awarded per unloaded load, scaled by the fill ratio
    /// (multiplier floored at 1).
    pub credits_per_load: u32,

    /// Delay before an idle unit whose last query failed tries again.
    pub idle_retry_ms: f64,

    /// Harvestable tiles a harvester tries, nearest first, before giving up
    /// on a seek and waiting for the retry.
    pub seek_attempts: u32,

    /// Tile type harvesters look for.
    pub harvestable_tile: TileType,

    /// What a harvested tile turns into.
    pub depleted_tile: TileType,

    /// Credits each owner starts with.
    pub starting_credits: i64,

    pub units: BTreeMap<UnitClass, UnitData>,

    pub buildings: BTreeMap<BuildingClass, BuildingData>,
}

impl Default for SimConfig {
    fn default() -> Self {
        let units = UNIT_CLASSES
            .into_iter()
            .map(|class| (class, UnitData::defaults(class)))
            .collect();
        let buildings = BUILDING_CLASSES
            .into_iter()
            .map(|class| (class, BuildingData::defaults(class)))
            .collect();

        Self {
            walk_step_ms: 800.0,
            harvest_fill_rate: 0.25,
            harvest_duration_ms: 5000.0,
            unload_decay_ms: 2500.0,
            credits_per_load: 500,
            idle_retry_ms: 2500.0,
            seek_attempts: 4,
            harvestable_tile: TileType::Grass,
            depleted_tile: TileType::Sand,
            starting_credits: 500,
            units,
            buildings,
        }
    }
}

impl SimConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let durations = [
            ("walk_step_ms", self.walk_step_ms),
            ("harvest_duration_ms", self.harvest_duration_ms),
            ("unload_decay_ms", self.unload_decay_ms),
            ("idle_retry_ms", self.idle_retry_ms),
        ];
        for (field, value) in durations {
            positive(field, value)?;
        }
        positive("harvest_fill_rate", self.harvest_fill_rate)?;
        if self.seek_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "seek_attempts",
                reason: "must be at least 1".into(),
            });
        }

        if self.harvestable_tile == self.depleted_tile {
            return Err(ConfigError::Invalid {
                field: "depleted_tile",
                reason: "must differ from harvestable_tile".into(),
            });
        }

        for (class, data) in &self.units {
            if let Some(step) = data.walk_step_ms {
                positive("units.walk_step_ms", step)?;
            }
            if data.width <= 0 || data.height <= 0 {
                return Err(ConfigError::Invalid {
                    field: "units",
                    reason: format!("{class:?} has an empty footprint"),
                });
            }
        }
        for (class, data) in &self.buildings {
            if data.width <= 0 || data.height <= 0 {
                return Err(ConfigError::Invalid {
                    field: "buildings",
                    reason: format!("{class:?} has an empty footprint"),
                });
            }
        }
        Ok(())
    }

    /// Table entry for a unit class, falling back to the built-in values
    /// when the loaded table omits it.
    pub fn unit(&self, class: UnitClass) -> UnitData {
        self.units
            .get(&class)
            .copied()
            .unwrap_or_else(|| UnitData::defaults(class))
    }

    /// Table entry for a building class, with the same fallback as `unit()`.
    pub fn building(&self, class: BuildingClass) -> BuildingData {
        self.buildings
            .get(&class)
            .copied()
            .unwrap_or_else(|| BuildingData::defaults(class))
    }

    /// Effective waypoint step duration for a unit class.
    pub fn walk_step_for(&self, class: UnitClass) -> f64 {
        self.unit(class).walk_step_ms.unwrap_or(self.walk_step_ms)
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be a positive number, got {value}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = SimConfig::default();
        let json = config.to_json().unwrap();
        let restored = SimConfig::from_json(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn defaults_match_game_balance() {
        let config = SimConfig::default();
        assert_eq!(config.walk_step_ms, 800.0);
        assert_eq!(config.harvest_fill_rate, 0.25);
        assert_eq!(config.harvest_duration_ms, 5000.0);
        assert_eq!(config.unit(UnitClass::Harvester).max_walkable_tile, TileType::Road);
        assert_eq!(config.building(BuildingClass::Refinery).width, 3);
        assert!(!config.building(BuildingClass::ConstructionYard).constructable);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = SimConfig::from_json(r#"{ "harvest_fill_rate": 0.5 }"#).unwrap();
        assert_eq!(config.harvest_fill_rate, 0.5);
        assert_eq!(config.credits_per_load, 500);
        assert_eq!(config.units.len(), 2);
    }

    #[test]
    fn unit_override_replaces_walk_step() {
        let json = r#"{
            "units": {
                "Scout": { "max_walkable_tile": "Road", "walk_step_ms": 400.0,
                           "cost": 50, "width": 1, "height": 1 }
            }
        }"#;
        let config = SimConfig::from_json(json).unwrap();
        assert_eq!(config.walk_step_for(UnitClass::Scout), 400.0);
        // Harvester is missing from the table and falls back.
        assert_eq!(config.walk_step_for(UnitClass::Harvester), 800.0);
    }

    #[test]
    fn rejects_non_positive_fill_rate() {
        let err = SimConfig::from_json(r#"{ "harvest_fill_rate": 0.0 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "harvest_fill_rate",
                ..
            }
        ));
    }

    #[test]
    fn rejects_zero_duration() {
        let err = SimConfig::from_json(r#"{ "walk_step_ms": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "walk_step_ms", .. }));
    }

    #[test]
    fn rejects_zero_seek_attempts() {
        let err = SimConfig::from_json(r#"{ "seek_attempts": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "seek_attempts", .. }));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let err = SimConfig::from_json("{ nope").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = SimConfig::load("/nonexistent/sandfall.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

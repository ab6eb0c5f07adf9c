// Actors — units and buildings placed in the world.
//
// A single `Actor` struct covers both kinds; `ActorKind` carries the type and
// subclass together. Class-specific data (footprint, walkable terrain, walk
// speed) is read from the config tables in `config.rs` at spawn time.
//
// Position is fractional while a unit glides between waypoints and is only
// ever written through the action store (see `registry.rs`), which clamps it
// into world bounds. `ai_action` is owned by the AI state machine (`ai.rs`);
// `ai_value` is the scalar payload its effects interpolate (a harvester's
// fill ratio).
//
// Also holds the build-rule helpers: which units a base can produce and which
// unit comes free with a building.

use crate::config::SimConfig;
use crate::types::{
    ActorId, ActorKind, ActorType, AiAction, BuildingClass, Owner, Rect, TileCoord, UnitClass,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub kind: ActorKind,
    pub owner: Owner,
    pub x: f64,
    pub y: f64,
    pub width: i32,
    pub height: i32,
    pub ai_action: AiAction,
    pub ai_value: f64,
}

impl Actor {
    /// Factory for a unit of `class` at `at`, sized from the unit table.
    pub fn unit(id: ActorId, class: UnitClass, owner: Owner, at: TileCoord, config: &SimConfig) -> Self {
        let data = config.unit(class);
        Self::with_size(id, ActorKind::Unit(class), owner, at, data.width, data.height)
    }

    /// Factory for a building of `class` whose top-left corner is `at`.
    pub fn building(
        id: ActorId,
        class: BuildingClass,
        owner: Owner,
        at: TileCoord,
        config: &SimConfig,
    ) -> Self {
        let data = config.building(class);
        Self::with_size(id, ActorKind::Building(class), owner, at, data.width, data.height)
    }

    fn with_size(id: ActorId, kind: ActorKind, owner: Owner, at: TileCoord, width: i32, height: i32) -> Self {
        Self {
            id,
            kind,
            owner,
            x: f64::from(at.x),
            y: f64::from(at.y),
            width,
            height,
            ai_action: AiAction::Idle,
            ai_value: 0.0,
        }
    }

    pub fn actor_type(&self) -> ActorType {
        self.kind.actor_type()
    }

    pub fn is_unit(&self) -> bool {
        self.actor_type() == ActorType::Unit
    }

    pub fn unit_class(&self) -> Option<UnitClass> {
        match self.kind {
            ActorKind::Unit(class) => Some(class),
            ActorKind::Building(_) => None,
        }
    }

    pub fn building_class(&self) -> Option<BuildingClass> {
        match self.kind {
            ActorKind::Building(class) => Some(class),
            ActorKind::Unit(_) => None,
        }
    }

    /// The tile the actor is standing on (or closest to, mid-glide).
    pub fn tile(&self) -> TileCoord {
        TileCoord::from_position(self.x, self.y)
    }

    /// Footprint rectangle anchored at the actor's rounded position.
    pub fn footprint(&self) -> Rect {
        let at = self.tile();
        Rect::new(at.x, at.y, self.width, self.height)
    }
}

// ---------------------------------------------------------------------------
// Build rules
// ---------------------------------------------------------------------------

/// Whether `class` can be produced given the owner's current buildings.
/// Scouts need a barracks, harvesters a refinery.
pub fn can_build_unit<'a>(class: UnitClass, buildings: impl IntoIterator<Item = &'a Actor>) -> bool {
    let required = match class {
        UnitClass::Scout => BuildingClass::Barracks,
        UnitClass::Harvester => BuildingClass::Refinery,
    };
    buildings
        .into_iter()
        .any(|b| b.building_class() == Some(required))
}

/// The unit that comes free with a building, if any.
pub fn unit_for_building(class: BuildingClass) -> Option<UnitClass> {
    match class {
        BuildingClass::Refinery => Some(UnitClass::Harvester),
        BuildingClass::ConstructionYard | BuildingClass::Barracks | BuildingClass::Turret => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn building(id: u32, class: BuildingClass) -> Actor {
        Actor::building(
            ActorId(id),
            class,
            Owner::Player,
            TileCoord::new(0, 0),
            &SimConfig::default(),
        )
    }

    #[test]
    fn factory_defaults() {
        let config = SimConfig::default();
        let unit = Actor::unit(ActorId(1), UnitClass::Harvester, Owner::Ai, TileCoord::new(4, 5), &config);
        assert_eq!(unit.ai_action, AiAction::Idle);
        assert_eq!(unit.ai_value, 0.0);
        assert_eq!((unit.x, unit.y), (4.0, 5.0));
        assert_eq!((unit.width, unit.height), (1, 1));
        assert!(unit.is_unit());
        assert_eq!(unit.unit_class(), Some(UnitClass::Harvester));
        assert_eq!(unit.building_class(), None);
    }

    #[test]
    fn building_footprint_comes_from_table() {
        let refinery = building(1, BuildingClass::Refinery);
        assert_eq!(refinery.footprint(), Rect::new(0, 0, 3, 2));
        assert!(!refinery.is_unit());
    }

    #[test]
    fn build_rules_require_matching_building() {
        let base = [building(1, BuildingClass::ConstructionYard)];
        assert!(!can_build_unit(UnitClass::Scout, &base));
        assert!(!can_build_unit(UnitClass::Harvester, &base));

        let base = [
            building(1, BuildingClass::ConstructionYard),
            building(2, BuildingClass::Refinery),
        ];
        assert!(can_build_unit(UnitClass::Harvester, &base));
        assert!(!can_build_unit(UnitClass::Scout, &base));

        let base = [building(3, BuildingClass::Barracks)];
        assert!(can_build_unit(UnitClass::Scout, &base));
    }

    #[test]
    fn refinery_comes_with_harvester() {
        assert_eq!(unit_for_building(BuildingClass::Refinery), Some(UnitClass::Harvester));
        assert_eq!(unit_for_building(BuildingClass::Barracks), None);
    }
}

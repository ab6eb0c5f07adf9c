// Core types shared across the simulation.
//
// Defines grid coordinates (`TileCoord`), footprint rectangles (`Rect`),
// compact entity identifiers, and the small closed enums every other module
// speaks: tile types, actor classes, owners, AI actions and the game state.
// All types derive `Serialize` and `Deserialize` so hosts can persist them.
//
// Tile types double as walkability ranks: the discriminant order is the
// ordinal a mover's `max_walkable_tile` is compared against (see
// `pathfinding.rs`). Do not reorder the `TileType` variants.
//
// **Critical constraint: determinism.** IDs are sequential integers handed
// out by the world, never random.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A position on the tile grid. `x` grows east, `y` grows south.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Round a fractional (mid-glide) position to the tile it is closest to.
    pub fn from_position(x: f64, y: f64) -> Self {
        Self::new(x.round() as i32, y.round() as i32)
    }

    /// Chebyshev distance: the number of 8-connected steps between two tiles
    /// on an open grid.
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        (self.x - other.x)
            .unsigned_abs()
            .max((self.y - other.y).unsigned_abs())
    }

    /// Straight-line distance, used for "nearest" queries.
    pub fn euclidean_distance(self, other: Self) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        (dx * dx + dy * dy).sqrt()
    }

    /// True if `other` is one of the 8 neighbors of `self`.
    pub fn is_adjacent(self, other: Self) -> bool {
        self != other && self.chebyshev_distance(other) == 1
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An axis-aligned rectangle in tile units. Covers `[left, left + width)` ×
/// `[top, top + height)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn contains(&self, coord: TileCoord) -> bool {
        coord.x >= self.left
            && coord.x < self.left + self.width
            && coord.y >= self.top
            && coord.y < self.top + self.height
    }
}

// ---------------------------------------------------------------------------
// Entity IDs — compact sequential integers
// ---------------------------------------------------------------------------

/// Identifier of an actor (unit or building) in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({})", self.0)
    }
}

/// Identity of an effect inside the scheduler's active set. Assigned on
/// first insertion; not part of the persisted effect contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EffectId(pub u64);

// ---------------------------------------------------------------------------
// Terrain
// ---------------------------------------------------------------------------

/// The type of a single tile. The discriminant is the tile's walkability
/// rank: a mover can enter a tile iff `tile.rank() <= max_walkable.rank()`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum TileType {
    #[default]
    Ground = 0,
    Grass = 1,
    Sand = 2,
    Road = 3,
    Water = 4,
    Mountain = 5,
    Tree = 6,
}

impl TileType {
    pub const fn rank(self) -> u8 {
        self as u8
    }

    /// ASCII glyph used by `TileGrid::from_ascii` and debug dumps.
    pub const fn glyph(self) -> char {
        match self {
            Self::Ground => '.',
            Self::Grass => ',',
            Self::Sand => ':',
            Self::Road => '=',
            Self::Water => '~',
            Self::Mountain => '^',
            Self::Tree => 'T',
        }
    }

    pub fn from_glyph(glyph: char) -> Option<Self> {
        Some(match glyph {
            '.' => Self::Ground,
            ',' => Self::Grass,
            ':' => Self::Sand,
            '=' => Self::Road,
            '~' => Self::Water,
            '^' => Self::Mountain,
            'T' => Self::Tree,
            _ => return None,
        })
    }
}

// ---------------------------------------------------------------------------
// Actors
// ---------------------------------------------------------------------------

/// Which side an actor belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Owner {
    Player,
    Ai,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActorType {
    Building,
    Unit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitClass {
    Scout,
    Harvester,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BuildingClass {
    ConstructionYard,
    Refinery,
    Barracks,
    Turret,
}

/// Actor type and subclass in one value, so a building can never carry a
/// unit subclass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActorKind {
    Unit(UnitClass),
    Building(BuildingClass),
}

impl ActorKind {
    pub fn actor_type(self) -> ActorType {
        match self {
            Self::Unit(_) => ActorType::Unit,
            Self::Building(_) => ActorType::Building,
        }
    }
}

/// A named state in a unit's behavior state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiAction {
    #[default]
    Idle,
    GotoWaypoint,
    ReturnToBase,
    HarvesterHarvest,
    HarvesterReturn,
}

/// Whether the simulation clock is running.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    Idle,
    #[default]
    Active,
    GameOver,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_ranks_follow_declaration_order() {
        assert!(TileType::Ground.rank() < TileType::Grass.rank());
        assert!(TileType::Sand.rank() < TileType::Road.rank());
        assert!(TileType::Road.rank() < TileType::Water.rank());
        assert_eq!(TileType::Tree.rank(), 6);
    }

    #[test]
    fn glyphs_map_back_to_tiles() {
        for tile in [
            TileType::Ground,
            TileType::Grass,
            TileType::Sand,
            TileType::Road,
            TileType::Water,
            TileType::Mountain,
            TileType::Tree,
        ] {
            assert_eq!(TileType::from_glyph(tile.glyph()), Some(tile));
        }
        assert_eq!(TileType::from_glyph('?'), None);
    }

    #[test]
    fn chebyshev_counts_diagonal_as_one() {
        let a = TileCoord::new(0, 0);
        assert_eq!(a.chebyshev_distance(TileCoord::new(9, 9)), 9);
        assert_eq!(a.chebyshev_distance(TileCoord::new(3, -7)), 7);
        assert!(a.is_adjacent(TileCoord::new(1, 1)));
        assert!(!a.is_adjacent(a));
    }

    #[test]
    fn position_rounds_to_nearest_tile() {
        assert_eq!(TileCoord::from_position(2.4, 6.6), TileCoord::new(2, 7));
    }

    #[test]
    fn rect_is_half_open() {
        let r = Rect::new(2, 3, 3, 2);
        assert!(r.contains(TileCoord::new(2, 3)));
        assert!(r.contains(TileCoord::new(4, 4)));
        assert!(!r.contains(TileCoord::new(5, 4)));
        assert!(!r.contains(TileCoord::new(4, 5)));
    }

    #[test]
    fn actor_kind_reports_type() {
        assert_eq!(
            ActorKind::Unit(UnitClass::Harvester).actor_type(),
            ActorType::Unit
        );
        assert_eq!(
            ActorKind::Building(BuildingClass::Refinery).actor_type(),
            ActorType::Building
        );
    }
}

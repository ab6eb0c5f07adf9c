// Tile grid, actor table and the spatial queries the AI runs against them.
//
// `TileGrid` stores terrain as a flat `Vec<TileType>` indexed by
// `x + width * y`. Out-of-bounds reads return `None`; out-of-bounds writes
// are no-ops. Grids can be parsed from ASCII (one glyph per tile, see
// `TileType::glyph`), which is what the headless runner and the tests use.
//
// `World` wraps the grid together with every actor (a `BTreeMap` keyed by
// `ActorId` for deterministic iteration) and the viewport focus point. The
// only terrain mutation the simulation performs is flipping a harvested
// tile; nothing here knows about rendering.
//
// See also: `pathfinding.rs` which searches the grid, `ai.rs` which runs the
// nearest-tile and nearest-building queries, `registry.rs` for the store
// handlers that mutate actors and focus.
//
// **Critical constraint: determinism.** "Nearest" queries break distance
// ties by lowest linear index (tiles) or lowest `ActorId` (buildings).

use crate::actor::Actor;
use crate::error::MapError;
use crate::types::{ActorId, BuildingClass, Owner, Rect, TileCoord, TileType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// TileGrid
// ---------------------------------------------------------------------------

/// Dense 2D terrain grid.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    width: i32,
    height: i32,
    /// Flat storage: index = x + width * y.
    tiles: Vec<TileType>,
}

impl TileGrid {
    /// Create a grid filled with `fill`.
    pub fn new(width: i32, height: i32, fill: TileType) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            tiles: vec![fill; (width as usize) * (height as usize)],
        }
    }

    /// Parse an ASCII map, one row per line. Blank lines are ignored.
    pub fn from_ascii(text: &str) -> Result<Self, MapError> {
        let rows: Vec<&str> = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty())
            .collect();
        let Some(first) = rows.first() else {
            return Err(MapError::Empty);
        };
        let width = first.chars().count();

        let mut tiles = Vec::with_capacity(width * rows.len());
        for (y, row) in rows.iter().enumerate() {
            let found = row.chars().count();
            if found != width {
                return Err(MapError::Ragged {
                    row: y,
                    expected: width,
                    found,
                });
            }
            for (x, glyph) in row.chars().enumerate() {
                let tile = TileType::from_glyph(glyph).ok_or(MapError::UnknownGlyph { glyph, x, y })?;
                tiles.push(tile);
            }
        }

        Ok(Self {
            width: width as i32,
            height: rows.len() as i32,
            tiles,
        })
    }

    /// Render the grid back to ASCII, one line per row.
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(self.tiles.len() + self.height as usize);
        for row in self.tiles.chunks(self.width.max(1) as usize) {
            out.extend(row.iter().map(|tile| tile.glyph()));
            out.push('\n');
        }
        out
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Number of tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn in_bounds(&self, coord: TileCoord) -> bool {
        coord.x >= 0 && coord.y >= 0 && coord.x < self.width && coord.y < self.height
    }

    /// Convert a coordinate to a flat index. Returns `None` if out of bounds.
    pub fn coordinate_to_index(&self, coord: TileCoord) -> Option<usize> {
        if self.in_bounds(coord) {
            Some(coord.x as usize + self.width as usize * coord.y as usize)
        } else {
            None
        }
    }

    /// Convert a flat index back to a coordinate. Returns `None` past the end.
    pub fn index_to_coordinate(&self, index: usize) -> Option<TileCoord> {
        if index >= self.tiles.len() {
            return None;
        }
        let width = self.width as usize;
        Some(TileCoord::new((index % width) as i32, (index / width) as i32))
    }

    pub fn get(&self, coord: TileCoord) -> Option<TileType> {
        self.coordinate_to_index(coord).map(|idx| self.tiles[idx])
    }

    /// Overwrite one tile. Returns false (and does nothing) out of bounds.
    pub fn set(&mut self, coord: TileCoord, tile: TileType) -> bool {
        match self.coordinate_to_index(coord) {
            Some(idx) => {
                self.tiles[idx] = tile;
                true
            }
            None => false,
        }
    }

    /// The tile of type `tile` closest to `from` in straight-line distance.
    pub fn find_nearest_tile_of_type(&self, from: TileCoord, tile: TileType) -> Option<TileCoord> {
        self.find_nearest_tile_where(from, tile, |_| false)
    }

    /// Like `find_nearest_tile_of_type`, ignoring every coordinate for which
    /// `skip` returns true.
    pub fn find_nearest_tile_where(
        &self,
        from: TileCoord,
        tile: TileType,
        skip: impl Fn(TileCoord) -> bool,
    ) -> Option<TileCoord> {
        let mut best: Option<(f64, TileCoord)> = None;
        for (idx, &t) in self.tiles.iter().enumerate() {
            if t != tile {
                continue;
            }
            let Some(coord) = self.index_to_coordinate(idx) else {
                continue;
            };
            if skip(coord) {
                continue;
            }
            let distance = from.euclidean_distance(coord);
            if best.is_none_or(|(d, _)| distance < d) {
                best = Some((distance, coord));
            }
        }
        best.map(|(_, coord)| coord)
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// The viewport focus point, in tile units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Focus {
    pub x: f64,
    pub y: f64,
}

/// Terrain plus everything standing on it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct World {
    pub grid: TileGrid,
    pub actors: BTreeMap<ActorId, Actor>,
    pub focus: Focus,
    next_actor_id: u32,
}

impl World {
    pub fn new(grid: TileGrid) -> Self {
        Self {
            grid,
            actors: BTreeMap::new(),
            focus: Focus::default(),
            next_actor_id: 0,
        }
    }

    /// Allocate an id and insert the actor `make` builds for it.
    pub fn spawn(&mut self, make: impl FnOnce(ActorId) -> Actor) -> ActorId {
        let id = ActorId(self.next_actor_id);
        self.next_actor_id += 1;
        self.actors.insert(id, make(id));
        id
    }

    pub fn remove_actor(&mut self, id: ActorId) -> Option<Actor> {
        self.actors.remove(&id)
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    pub fn units(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values().filter(|a| a.is_unit())
    }

    pub fn buildings(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values().filter(|a| !a.is_unit())
    }

    /// Buildings owned by `owner`.
    pub fn buildings_of(&self, owner: Owner) -> impl Iterator<Item = &Actor> {
        self.buildings().filter(move |b| b.owner == owner)
    }

    /// Building footprints, used as pathfinder blockers.
    pub fn building_footprints(&self) -> Vec<Rect> {
        self.buildings().map(Actor::footprint).collect()
    }

    /// Nearest `tile` not covered by a building footprint and not listed in
    /// `excluded`.
    pub fn find_nearest_open_tile_of_type(
        &self,
        from: TileCoord,
        tile: TileType,
        excluded: &[TileCoord],
    ) -> Option<TileCoord> {
        let footprints = self.building_footprints();
        self.grid.find_nearest_tile_where(from, tile, |coord| {
            excluded.contains(&coord) || footprints.iter().any(|rect| rect.contains(coord))
        })
    }

    /// Largest in-bounds tile coordinate as a position: `(width - 1,
    /// height - 1)`. Actor positions are clamped to `[0, max]`.
    pub fn max_position(&self) -> (f64, f64) {
        (
            f64::from((self.grid.width() - 1).max(0)),
            f64::from((self.grid.height() - 1).max(0)),
        )
    }

    /// Entrance tile of the nearest `class` building owned by `owner`: the
    /// tile directly below its footprint's left edge, `(b.x, b.y + b.height)`.
    pub fn find_nearest_building_of_class(
        &self,
        from: TileCoord,
        class: BuildingClass,
        owner: Owner,
    ) -> Option<TileCoord> {
        let mut best: Option<(f64, &Actor)> = None;
        for building in self.buildings_of(owner) {
            if building.building_class() != Some(class) {
                continue;
            }
            let distance = from.euclidean_distance(building.tile());
            if best.is_none_or(|(d, _)| distance < d) {
                best = Some((distance, building));
            }
        }
        best.map(|(_, b)| {
            let at = b.tile();
            TileCoord::new(at.x, at.y + b.height)
        })
    }
}

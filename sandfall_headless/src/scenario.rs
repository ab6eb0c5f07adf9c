// Scenario maps — terrain plus starting refineries in one text file.
//
// A scenario is a terrain map in the `TileGrid::from_ascii` format with two
// extra glyphs marking the top-left corner of a refinery: `R` for the
// player and `r` for the AI. The marker tile itself becomes ground. Each
// refinery comes with its free harvester (see `SimState::spawn_unit_for_building`).

use sandfall_sim::config::SimConfig;
use sandfall_sim::error::MapError;
use sandfall_sim::sim::SimState;
use sandfall_sim::types::{BuildingClass, Owner, TileCoord, TileType};
use sandfall_sim::world::TileGrid;

/// Built-in map used when no `--map` is given.
pub const DEMO_MAP: &str = include_str!("../maps/demo.txt");

/// A parsed scenario, not yet turned into a running game.
#[derive(Clone, Debug)]
pub struct Scenario {
    pub grid: TileGrid,
    pub refineries: Vec<(Owner, TileCoord)>,
}

impl Scenario {
    pub fn parse(text: &str) -> Result<Self, MapError> {
        let mut refineries = Vec::new();
        let mut terrain = String::with_capacity(text.len());
        let ground = TileType::Ground.glyph();

        let rows = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty());
        for (y, row) in rows.enumerate() {
            for (x, glyph) in row.chars().enumerate() {
                let owner = match glyph {
                    'R' => Some(Owner::Player),
                    'r' => Some(Owner::Ai),
                    _ => None,
                };
                match owner {
                    Some(owner) => {
                        refineries.push((owner, TileCoord::new(x as i32, y as i32)));
                        terrain.push(ground);
                    }
                    None => terrain.push(glyph),
                }
            }
            terrain.push('\n');
        }

        let grid = TileGrid::from_ascii(&terrain)?;
        Ok(Self { grid, refineries })
    }

    /// Start a game: place every refinery and its harvester.
    pub fn into_sim(self, config: SimConfig) -> SimState {
        let mut sim = SimState::with_config(self.grid, config);
        for (owner, at) in self.refineries {
            let refinery = sim.spawn_building(BuildingClass::Refinery, owner, at);
            sim.spawn_unit_for_building(refinery);
        }
        sim
    }
}

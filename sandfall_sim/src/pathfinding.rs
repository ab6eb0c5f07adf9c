// A* pathfinding over the tile grid.
//
// 8-connected search with uniform step cost and the Chebyshev heuristic
// (admissible and consistent when diagonals cost the same as cardinals).
// Diagonal moves are only taken when both orthogonally adjacent tiles are
// walkable, so movers never squeeze between two blocked corners.
//
// The open list is a plain `Vec` scanned linearly for the lowest f-score;
// maps are around 100×100 tiles (see `benches/pathfinding.rs`). Ties go to
// the entry that was opened first.
// Tiles are marked visited when they are first opened and never reopened.
// Search nodes live in an arena `Vec` with parent indices; nothing is
// hashed.
//
// A tile is walkable iff its rank is `<=` the mover's `max_walkable` rank
// and no blocker rectangle (building footprint) covers it.
//
// See also: `world.rs` for `TileGrid`, `navigation.rs` which turns the
// returned waypoints into motion effects.
//
// **Critical constraint: determinism.** The search is a pure function of
// the grid, the blockers and the endpoints. Neighbor expansion order is
// fixed (N, E, S, W, then NE, NW, SE, SW).

use crate::types::{Rect, TileCoord, TileType};
use crate::world::TileGrid;

/// One entry of the search arena.
struct PathNode {
    coord: TileCoord,
    parent: Option<usize>,
    g: u32,
    f: u32,
}

/// Find a route from `start` to `target`, both inclusive.
///
/// Returns an empty `Vec` when the target is out of bounds, unwalkable, or
/// unreachable. When `start == target` the result is the single element
/// `[target]`.
pub fn find_path(
    grid: &TileGrid,
    start: TileCoord,
    target: TileCoord,
    max_walkable: TileType,
    blockers: &[Rect],
) -> Vec<TileCoord> {
    let (Some(start_idx), Some(target_idx)) = (
        grid.coordinate_to_index(start),
        grid.coordinate_to_index(target),
    ) else {
        return Vec::new();
    };
    if start_idx == target_idx {
        return vec![target];
    }

    let can_walk = |coord: TileCoord| {
        grid.get(coord)
            .is_some_and(|tile| tile.rank() <= max_walkable.rank())
            && !blockers.iter().any(|rect| rect.contains(coord))
    };
    if !can_walk(target) {
        return Vec::new();
    }

    let mut visited = vec![false; grid.len()];
    visited[start_idx] = true;

    let mut nodes = vec![PathNode {
        coord: start,
        parent: None,
        g: 0,
        f: start.chebyshev_distance(target),
    }];
    let mut open: Vec<usize> = vec![0];
    let mut neighbors: Vec<TileCoord> = Vec::with_capacity(8);

    while !open.is_empty() {
        let mut best = 0;
        for (i, &node_idx) in open.iter().enumerate().skip(1) {
            if nodes[node_idx].f < nodes[open[best]].f {
                best = i;
            }
        }
        let current = open.remove(best);
        let coord = nodes[current].coord;

        if coord == target {
            return reconstruct_path(&nodes, current);
        }

        collect_neighbors(coord, &can_walk, &mut neighbors);
        let g = nodes[current].g + 1;
        for &next in &neighbors {
            let Some(next_idx) = grid.coordinate_to_index(next) else {
                continue;
            };
            if visited[next_idx] {
                continue;
            }
            visited[next_idx] = true;
            nodes.push(PathNode {
                coord: next,
                parent: Some(current),
                g,
                f: g + next.chebyshev_distance(target),
            });
            open.push(nodes.len() - 1);
        }
    }

    Vec::new()
}

/// Fill `out` with the walkable neighbors of `coord` in expansion order.
fn collect_neighbors(
    coord: TileCoord,
    can_walk: &impl Fn(TileCoord) -> bool,
    out: &mut Vec<TileCoord>,
) {
    out.clear();
    let north = TileCoord::new(coord.x, coord.y - 1);
    let east = TileCoord::new(coord.x + 1, coord.y);
    let south = TileCoord::new(coord.x, coord.y + 1);
    let west = TileCoord::new(coord.x - 1, coord.y);

    let n = can_walk(north);
    let e = can_walk(east);
    let s = can_walk(south);
    let w = can_walk(west);

    for (open, tile) in [(n, north), (e, east), (s, south), (w, west)] {
        if open {
            out.push(tile);
        }
    }

    // Diagonals require both orthogonal neighbors (no corner cutting).
    let diagonals = [
        (n && e, TileCoord::new(coord.x + 1, coord.y - 1)),
        (n && w, TileCoord::new(coord.x - 1, coord.y - 1)),
        (s && e, TileCoord::new(coord.x + 1, coord.y + 1)),
        (s && w, TileCoord::new(coord.x - 1, coord.y + 1)),
    ];
    for (allowed, tile) in diagonals {
        if allowed && can_walk(tile) {
            out.push(tile);
        }
    }
}

fn reconstruct_path(nodes: &[PathNode], goal: usize) -> Vec<TileCoord> {
    let mut path = Vec::new();
    let mut current = Some(goal);
    while let Some(idx) = current {
        path.push(nodes[idx].coord);
        current = nodes[idx].parent;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_grid(width: i32, height: i32) -> TileGrid {
        TileGrid::new(width, height, TileType::Ground)
    }

    /// Every consecutive pair must be 8-adjacent and never cut a corner.
    fn assert_valid_path(grid: &TileGrid, path: &[TileCoord], max: TileType, blockers: &[Rect]) {
        for coord in path {
            let tile = grid.get(*coord).expect("waypoint in bounds");
            assert!(tile.rank() <= max.rank(), "waypoint {coord} is unwalkable");
            assert!(!blockers.iter().any(|r| r.contains(*coord)));
        }
        for pair in path.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            assert!(a.is_adjacent(b), "{a} -> {b} is not a single step");
            if a.x != b.x && a.y != b.y {
                let side_a = grid.get(TileCoord::new(b.x, a.y)).unwrap();
                let side_b = grid.get(TileCoord::new(a.x, b.y)).unwrap();
                assert!(side_a.rank() <= max.rank() && side_b.rank() <= max.rank());
            }
        }
    }

    #[test]
    fn open_grid_diagonal_takes_nine_steps() {
        let grid = open_grid(10, 10);
        let path = find_path(
            &grid,
            TileCoord::new(0, 0),
            TileCoord::new(9, 9),
            TileType::Road,
            &[],
        );
        assert_eq!(path.len(), 10);
        assert_eq!(path.first(), Some(&TileCoord::new(0, 0)));
        assert_eq!(path.last(), Some(&TileCoord::new(9, 9)));
        assert_valid_path(&grid, &path, TileType::Road, &[]);
    }

    #[test]
    fn start_equals_target_yields_single_waypoint() {
        let grid = open_grid(5, 5);
        let here = TileCoord::new(2, 3);
        let path = find_path(&grid, here, here, TileType::Road, &[]);
        assert_eq!(path, vec![here]);
    }

    #[test]
    fn unwalkable_target_yields_empty_path() {
        let mut grid = open_grid(5, 5);
        grid.set(TileCoord::new(4, 4), TileType::Water);
        let path = find_path(
            &grid,
            TileCoord::new(0, 0),
            TileCoord::new(4, 4),
            TileType::Road,
            &[],
        );
        assert!(path.is_empty());
    }

    #[test]
    fn out_of_bounds_target_yields_empty_path() {
        let grid = open_grid(5, 5);
        let path = find_path(
            &grid,
            TileCoord::new(0, 0),
            TileCoord::new(5, 2),
            TileType::Road,
            &[],
        );
        assert!(path.is_empty());
    }

    #[test]
    fn target_enclosed_by_blockers_yields_empty_path() {
        let grid = open_grid(9, 9);
        // A ring of 1×1 blockers around (6, 6).
        let mut blockers = Vec::new();
        for y in 5..=7 {
            for x in 5..=7 {
                if (x, y) != (6, 6) {
                    blockers.push(Rect::new(x, y, 1, 1));
                }
            }
        }
        let path = find_path(
            &grid,
            TileCoord::new(0, 0),
            TileCoord::new(6, 6),
            TileType::Road,
            &blockers,
        );
        assert!(path.is_empty());
    }

    #[test]
    fn no_corner_cutting_between_blocked_orthogonals() {
        let mut grid = open_grid(2, 2);
        grid.set(TileCoord::new(1, 0), TileType::Water);
        grid.set(TileCoord::new(0, 1), TileType::Water);
        let path = find_path(
            &grid,
            TileCoord::new(0, 0),
            TileCoord::new(1, 1),
            TileType::Road,
            &[],
        );
        assert!(path.is_empty());
    }

    #[test]
    fn routes_around_a_wall_through_its_gap() {
        let mut grid = open_grid(10, 10);
        for y in 0..9 {
            grid.set(TileCoord::new(5, y), TileType::Mountain);
        }
        let path = find_path(
            &grid,
            TileCoord::new(0, 0),
            TileCoord::new(9, 0),
            TileType::Road,
            &[],
        );
        assert_eq!(path.last(), Some(&TileCoord::new(9, 0)));
        assert!(path.contains(&TileCoord::new(5, 9)));
        assert_valid_path(&grid, &path, TileType::Road, &[]);
    }

    #[test]
    fn routes_around_building_footprint() {
        let grid = open_grid(10, 10);
        let blockers = [Rect::new(3, 0, 3, 8)];
        let path = find_path(
            &grid,
            TileCoord::new(0, 2),
            TileCoord::new(8, 2),
            TileType::Road,
            &blockers,
        );
        assert_eq!(path.last(), Some(&TileCoord::new(8, 2)));
        assert_valid_path(&grid, &path, TileType::Road, &blockers);
    }

    #[test]
    fn walkability_threshold_is_inclusive() {
        let mut grid = open_grid(3, 1);
        grid.set(TileCoord::new(1, 0), TileType::Road);
        let start = TileCoord::new(0, 0);
        let target = TileCoord::new(2, 0);
        assert_eq!(find_path(&grid, start, target, TileType::Road, &[]).len(), 3);
        assert!(find_path(&grid, start, target, TileType::Sand, &[]).is_empty());
    }

    #[test]
    fn search_is_deterministic() {
        let mut grid = open_grid(12, 12);
        for x in 2..10 {
            grid.set(TileCoord::new(x, 6), TileType::Water);
        }
        let a = find_path(
            &grid,
            TileCoord::new(6, 0),
            TileCoord::new(6, 11),
            TileType::Road,
            &[],
        );
        let b = find_path(
            &grid,
            TileCoord::new(6, 0),
            TileCoord::new(6, 11),
            TileType::Road,
            &[],
        );
        assert!(!a.is_empty());
        assert_eq!(a, b);
    }
}

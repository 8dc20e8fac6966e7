//! Descends a distance field into a waypoint path.

use glam::Vec2;
use libra_core::TileCoords;

use crate::{grid::Grid, navigation::DistanceField};

/// Neighbour offsets in tie-breaking order.
const DESCENT_OFFSETS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Walks a field seeded at `start` from `goal` back to `start`.
///
/// Waypoints are tile centres in goal-to-start order, so consumers pop the
/// next waypoint from the back. The start tile itself is excluded. An
/// unreachable goal yields an empty path, and the walk never takes more
/// steps than there are tiles.
#[must_use]
pub(crate) fn descend(grid: &Grid, field: &DistanceField, start: TileCoords, goal: TileCoords) -> Vec<Vec2> {
    if !field.is_reachable(goal) {
        return Vec::new();
    }

    let mut path = Vec::new();
    let mut current = goal;
    while current != start {
        if path.len() >= grid.tile_count() {
            return Vec::new();
        }
        path.push(current.center());
        let Some(next) = best_neighbor(grid, field, current) else {
            return Vec::new();
        };
        current = next;
    }
    path
}

fn best_neighbor(grid: &Grid, field: &DistanceField, tile: TileCoords) -> Option<TileCoords> {
    let mut best = None;
    let mut lowest = DistanceField::UNREACHABLE;
    for (dx, dy) in DESCENT_OFFSETS {
        let neighbor = tile.offset(dx, dy);
        if grid.is_solid(neighbor) {
            continue;
        }
        let Some(value) = field.value(neighbor) else {
            continue;
        };
        if value < lowest {
            lowest = value;
            best = Some(neighbor);
        }
    }
    best
}

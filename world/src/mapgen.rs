//! Procedural layout of a map from its definition.

use glam::Vec2;
use libra_core::{MapDefinition, TileCoords, WormSpec};
use log::info;
use rand::Rng;

use crate::grid::Grid;

/// Cardinal steps a worm may take, indexed by a random draw.
const WORM_STEPS: [(i32, i32); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];
/// Tiles of the start bunker, an L shape sheltering the start tile.
const START_BUNKER: [(i32, i32); 5] = [(2, 4), (3, 4), (4, 4), (4, 3), (4, 2)];
/// Edge length of the square nest floors.
const START_FLOOR_EXTENT: i32 = 5;
/// Edge length of the end nest floor.
const END_FLOOR_EXTENT: i32 = 6;
/// Distance of the end floor's lower corner from the far edge.
const END_FLOOR_OFFSET: i32 = 7;
/// Length of each arm of the end bunker.
const END_BUNKER_ARM: i32 = 4;

/// Positions produced by map generation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct MapLayout {
    pub(crate) start_position: Vec2,
    pub(crate) end_position: Vec2,
}

/// Paints the map over a grid already filled with the definition's fill tile.
pub(crate) fn generate<R: Rng>(grid: &mut Grid, map: &MapDefinition, rng: &mut R) -> MapLayout {
    paint_border(grid, map);
    for worm in &map.worms {
        for _ in 0..worm.count {
            carve_worm(grid, worm, rng);
        }
    }
    let layout = paint_nests(grid, map);
    info!(
        "generated map `{}` ({}x{}) with {} worm kinds",
        map.name,
        map.width,
        map.height,
        map.worms.len()
    );
    layout
}

/// Neutral layout for grids built by hand.
pub(crate) fn default_layout(grid: &Grid) -> MapLayout {
    MapLayout {
        start_position: TileCoords::new(1, 1).center(),
        end_position: TileCoords::new(grid.width() - 2, grid.height() - 2).center(),
    }
}

fn paint_border(grid: &mut Grid, map: &MapDefinition) {
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let coords = TileCoords::new(x, y);
            if grid.is_border(coords) {
                let _ = grid.set_definition(coords, map.edge);
            }
        }
    }
}

fn carve_worm<R: Rng>(grid: &mut Grid, worm: &WormSpec, rng: &mut R) {
    let length = rng.gen_range(1..=worm.max_length.max(1));
    let mut tile = worm_start(grid, rng);
    for _ in 0..length {
        if !grid.is_in_bounds(tile) || grid.is_in_nest(tile) || grid.is_border(tile) {
            break;
        }
        let _ = grid.set_definition(tile, worm.tile);
        let (dx, dy) = WORM_STEPS[rng.gen_range(0..WORM_STEPS.len())];
        tile = tile.offset(dx, dy);
    }
}

fn worm_start<R: Rng>(grid: &Grid, rng: &mut R) -> TileCoords {
    let x = rng.gen_range(1..(grid.width() - 1).max(2));
    let y = rng.gen_range(1..(grid.height() - 1).max(2));
    TileCoords::new(x, y)
}

fn paint_nests(grid: &mut Grid, map: &MapDefinition) -> MapLayout {
    for y in 1..=START_FLOOR_EXTENT {
        for x in 1..=START_FLOOR_EXTENT {
            let _ = grid.set_definition(TileCoords::new(x, y), map.start_floor);
        }
    }
    for (x, y) in START_BUNKER {
        let _ = grid.set_definition(TileCoords::new(x, y), map.start_bunker);
    }
    let start = TileCoords::new(1, 1);
    let _ = grid.set_definition(start, map.start_tile);

    let end_x = grid.width() - END_FLOOR_OFFSET;
    let end_y = grid.height() - END_FLOOR_OFFSET;
    for y in end_y..end_y + END_FLOOR_EXTENT {
        for x in end_x..end_x + END_FLOOR_EXTENT {
            let _ = grid.set_definition(TileCoords::new(x, y), map.end_floor);
        }
    }
    for offset in 0..END_BUNKER_ARM {
        let _ = grid.set_definition(TileCoords::new(end_x + 1 + offset, end_y + 1), map.end_bunker);
        let _ = grid.set_definition(TileCoords::new(end_x + 1, end_y + 1 + offset), map.end_bunker);
    }
    let end = TileCoords::new(grid.width() - 2, grid.height() - 2);
    let _ = grid.set_definition(end, map.end_tile);

    MapLayout {
        start_position: start.center(),
        end_position: end.center(),
    }
}

//! Grid DDA raycasting against solid tiles.

use glam::Vec2;
use libra_core::{
    geometry::{Ray, RaycastHit},
    TileCoords,
};

use crate::grid::Grid;

/// Casts a ray through the grid and reports the first solid tile it enters.
///
/// A ray that starts inside a solid tile impacts immediately with a zero
/// normal. Otherwise the ray steps across whichever axis reaches its next
/// grid line first; the reported normal opposes the step on the axis just
/// crossed. The walk never allocates and is fully deterministic.
#[must_use]
pub fn raycast_vs_tiles(grid: &Grid, ray: &Ray) -> RaycastHit {
    let mut tile = TileCoords::containing(ray.origin);
    if grid.is_solid(tile) {
        return RaycastHit {
            did_impact: true,
            distance: 0.0,
            position: ray.origin,
            normal: Vec2::ZERO,
        };
    }

    let (step_x, distance_per_x, mut next_x) = axis_setup(ray.origin.x, ray.direction.x, tile.x());
    let (step_y, distance_per_y, mut next_y) = axis_setup(ray.origin.y, ray.direction.y, tile.y());

    loop {
        if next_x < next_y {
            if next_x > ray.max_length {
                break;
            }
            tile = tile.offset(step_x, 0);
            if grid.is_solid(tile) {
                return RaycastHit::impact(ray, next_x, Vec2::new(-step_x as f32, 0.0));
            }
            next_x += distance_per_x;
        } else {
            if next_y > ray.max_length {
                break;
            }
            tile = tile.offset(0, step_y);
            if grid.is_solid(tile) {
                return RaycastHit::impact(ray, next_y, Vec2::new(0.0, -step_y as f32));
            }
            next_y += distance_per_y;
        }
    }

    RaycastHit::miss(ray)
}

/// Step direction, distance per crossing and distance to the first crossing.
fn axis_setup(origin: f32, direction: f32, tile: i32) -> (i32, f32, f32) {
    let step = if direction < 0.0 { -1 } else { 1 };
    if direction == 0.0 {
        return (step, f32::INFINITY, f32::INFINITY);
    }
    let distance_per_crossing = 1.0 / direction.abs();
    let first_crossing = (tile + (step + 1) / 2) as f32;
    let first_distance = (first_crossing - origin).abs() * distance_per_crossing;
    (step, distance_per_crossing, first_distance)
}

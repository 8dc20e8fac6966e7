//! Line-of-sight checks between an observer and a target disc.

use glam::Vec2;
use libra_core::geometry::{raycast_vs_disc, Ray};
use libra_world::World;

/// Result of a sight check.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SightLine {
    /// Whether the target disc is hit before any solid tile.
    pub visible: bool,
    /// Where the sight line ends: on the target, on a wall, or at full range.
    pub end: Vec2,
}

/// Casts a sight line from `from` toward a target disc.
///
/// The target is visible when the ray reaches its disc within `range` and no
/// solid tile is struck first.
#[must_use]
pub fn line_of_sight(world: &World, from: Vec2, target: Vec2, target_radius: f32, range: f32) -> SightLine {
    let ray = Ray::new(from, target - from, range);
    let wall = world.raycast_vs_tiles(&ray);
    let disc = raycast_vs_disc(&ray, target, target_radius);

    if !disc.did_impact || (wall.did_impact && wall.distance < disc.distance) {
        return SightLine {
            visible: false,
            end: wall.position,
        };
    }
    SightLine {
        visible: true,
        end: disc.position,
    }
}

//! Distance-field builder shared by map-level navigation and per-agent heat maps.

use std::collections::VecDeque;

use libra_core::TileCoords;

use crate::grid::Grid;

/// Four-connected neighbour offsets in relaxation order.
const NEIGHBOR_OFFSETS: [(i32, i32); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

/// Which tile classes, beyond solid ones, block a distance field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockingPolicy {
    /// Water tiles block the field.
    pub water_is_solid: bool,
    /// Tiles occupied by a turret block the field.
    pub turrets_are_solid: bool,
}

impl BlockingPolicy {
    /// Land vehicles that may drive past turrets.
    pub const LAND_ONLY: BlockingPolicy = BlockingPolicy {
        water_is_solid: true,
        turrets_are_solid: false,
    };

    /// Amphibious vehicles that must route around turrets.
    pub const AMPHIBIOUS_AVOID_TURRETS: BlockingPolicy = BlockingPolicy {
        water_is_solid: false,
        turrets_are_solid: true,
    };

    /// Land vehicles that must route around turrets.
    pub const STRICT: BlockingPolicy = BlockingPolicy {
        water_is_solid: true,
        turrets_are_solid: true,
    };
}

/// Dense tile-step distances from a seed tile.
///
/// The field mirrors the grid dimensions and stores breadth-first search
/// results. Tiles not connected to the seed under the blocking policy keep
/// [`DistanceField::UNREACHABLE`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DistanceField {
    width: i32,
    height: i32,
    values: Vec<f32>,
}

impl DistanceField {
    /// Sentinel stored for tiles the seed cannot reach.
    pub const UNREACHABLE: f32 = 999.0;

    /// Creates a field of the provided dimensions with every tile unreachable.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        let count = (width.max(0) as usize).saturating_mul(height.max(0) as usize);
        Self {
            width: width.max(0),
            height: height.max(0),
            values: vec![Self::UNREACHABLE; count],
        }
    }

    /// Recomputes the field from a seed tile.
    ///
    /// The seed index is clamped into the grid, and the seed itself is never
    /// tested against the blocking predicate. `is_turret` reports whether a
    /// turret occupies a tile; it is only consulted when the policy asks for it.
    pub fn populate<F>(&mut self, grid: &Grid, seed: TileCoords, policy: BlockingPolicy, is_turret: F)
    where
        F: Fn(TileCoords) -> bool,
    {
        let count = grid.tile_count();
        self.width = grid.width();
        self.height = grid.height();
        if self.values.len() != count {
            self.values = vec![Self::UNREACHABLE; count];
        } else {
            self.values.fill(Self::UNREACHABLE);
        }
        if count == 0 {
            return;
        }

        let raw_index = i64::from(seed.x()) + i64::from(seed.y()) * i64::from(grid.width());
        let seed_index = raw_index.clamp(0, count as i64 - 1) as usize;
        let Some(seed) = grid.coords_of(seed_index) else {
            return;
        };
        self.values[seed_index] = 0.0;

        let is_blocked = |coords: TileCoords| {
            grid.is_solid(coords)
                || (policy.water_is_solid && grid.is_water(coords))
                || (policy.turrets_are_solid && is_turret(coords))
        };

        let mut queue = VecDeque::new();
        queue.push_back(seed);

        while let Some(tile) = queue.pop_front() {
            let Some(current_index) = grid.index_of(tile) else {
                continue;
            };
            let next_value = self.values[current_index] + 1.0;

            for (dx, dy) in NEIGHBOR_OFFSETS {
                let neighbor = tile.offset(dx, dy);
                let Some(neighbor_index) = grid.index_of(neighbor) else {
                    continue;
                };
                if self.values[neighbor_index] <= next_value || is_blocked(neighbor) {
                    continue;
                }
                self.values[neighbor_index] = next_value;
                queue.push_back(neighbor);
            }
        }
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Dense values stored in row-major order.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Value stored for the tile, if it lies within the field.
    #[must_use]
    pub fn value(&self, coords: TileCoords) -> Option<f32> {
        if coords.x() < 0 || coords.y() < 0 || coords.x() >= self.width || coords.y() >= self.height {
            return None;
        }
        let index = coords.y() as usize * self.width as usize + coords.x() as usize;
        self.values.get(index).copied()
    }

    /// Reports whether the tile is connected to the seed.
    #[must_use]
    pub fn is_reachable(&self, coords: TileCoords) -> bool {
        self.value(coords)
            .map_or(false, |value| value < Self::UNREACHABLE)
    }

    /// Largest finite value in the field, useful for normalising debug views.
    #[must_use]
    pub fn max_reachable(&self) -> f32 {
        self.values
            .iter()
            .copied()
            .filter(|value| *value < Self::UNREACHABLE)
            .fold(0.0, f32::max)
    }
}

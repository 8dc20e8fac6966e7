//! Fixed-size tile grid with destructible terrain.

use std::sync::Arc;

use glam::Vec2;
use libra_core::{geometry::Aabb2, TileCoords, TileDefId, TileDefinition, TileDefinitionTable};

/// Inclusive lower corner of the start nest.
const START_NEST_MIN: i32 = 1;
/// Inclusive upper corner of the start nest.
const START_NEST_MAX: i32 = 6;
/// Offset of the end nest's lower corner from the far edge.
const END_NEST_NEAR_OFFSET: i32 = 8;
/// Offset of the end nest's upper corner from the far edge.
const END_NEST_FAR_OFFSET: i32 = 2;

/// Mutable state of one grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tile {
    definition: TileDefId,
    health: i32,
}

impl Tile {
    /// Definition the tile currently references.
    #[must_use]
    pub const fn definition(&self) -> TileDefId {
        self.definition
    }

    /// Remaining hit points.
    #[must_use]
    pub const fn health(&self) -> i32 {
        self.health
    }
}

/// Result of a projectile striking a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileStrike {
    /// The tile has no health left to lose or lies outside the grid.
    Unaffected,
    /// The tile lost health but keeps its definition.
    Damaged {
        /// Remaining hit points.
        health: i32,
    },
    /// The tile ran out of health and turned into its replacement.
    Destroyed {
        /// Definition the tile now references.
        replacement: TileDefId,
    },
}

/// Rectangular array of tiles sharing one definition table.
///
/// One tile spans one world unit: tile `(x, y)` covers `[x, x+1] × [y, y+1]`.
#[derive(Clone, Debug)]
pub struct Grid {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    definitions: Arc<TileDefinitionTable>,
}

impl Grid {
    /// Creates a grid where every tile references `fill` at full health.
    #[must_use]
    pub fn filled(
        width: u32,
        height: u32,
        fill: TileDefId,
        definitions: Arc<TileDefinitionTable>,
    ) -> Self {
        let width = i32::try_from(width).unwrap_or(i32::MAX);
        let height = i32::try_from(height).unwrap_or(i32::MAX);
        let count = (width as usize).saturating_mul(height as usize);
        let health = definitions.get(fill).map_or(0, |definition| definition.health);
        Self {
            width,
            height,
            tiles: vec![
                Tile {
                    definition: fill,
                    health,
                };
                count
            ],
            definitions,
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

    /// Total number of tiles.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Shared definition table.
    #[must_use]
    pub fn definitions(&self) -> &Arc<TileDefinitionTable> {
        &self.definitions
    }

    /// Tile containing the world-space position.
    #[must_use]
    pub fn tile_coords_for_world_pos(&self, position: Vec2) -> TileCoords {
        TileCoords::containing(position)
    }

    /// Reports whether the coordinates address a tile of this grid.
    #[must_use]
    pub const fn is_in_bounds(&self, coords: TileCoords) -> bool {
        coords.x() >= 0 && coords.y() >= 0 && coords.x() < self.width && coords.y() < self.height
    }

    /// Row-major index of an in-bounds tile.
    #[must_use]
    pub fn index_of(&self, coords: TileCoords) -> Option<usize> {
        if !self.is_in_bounds(coords) {
            return None;
        }
        Some(coords.y() as usize * self.width as usize + coords.x() as usize)
    }

    /// Coordinates of the tile stored at a row-major index.
    #[must_use]
    pub fn coords_of(&self, index: usize) -> Option<TileCoords> {
        if index >= self.tiles.len() || self.width <= 0 {
            return None;
        }
        let width = self.width as usize;
        Some(TileCoords::new((index % width) as i32, (index / width) as i32))
    }

    /// Tile at the coordinates.
    #[must_use]
    pub fn tile(&self, coords: TileCoords) -> Option<&Tile> {
        self.index_of(coords).and_then(|index| self.tiles.get(index))
    }

    /// Dense tile storage in row-major order.
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Definition referenced by the tile at the coordinates.
    #[must_use]
    pub fn definition_at(&self, coords: TileCoords) -> Option<&TileDefinition> {
        self.tile(coords)
            .and_then(|tile| self.definitions.get(tile.definition))
    }

    /// Reports whether the tile blocks movement. Out-of-bounds tiles are solid.
    #[must_use]
    pub fn is_solid(&self, coords: TileCoords) -> bool {
        if !self.is_in_bounds(coords) {
            return true;
        }
        self.definition_at(coords)
            .map_or(false, |definition| definition.solid)
    }

    /// Reports whether the tile is water. Out-of-bounds tiles are never water.
    #[must_use]
    pub fn is_water(&self, coords: TileCoords) -> bool {
        self.definition_at(coords)
            .map_or(false, |definition| definition.water)
    }

    /// Reports whether the tile belongs to the outermost ring.
    #[must_use]
    pub const fn is_border(&self, coords: TileCoords) -> bool {
        coords.x() == 0
            || coords.y() == 0
            || coords.x() == self.width - 1
            || coords.y() == self.height - 1
    }

    /// Reports whether the tile lies in the start or end nest.
    #[must_use]
    pub const fn is_in_nest(&self, coords: TileCoords) -> bool {
        let (x, y) = (coords.x(), coords.y());
        let in_start = x >= START_NEST_MIN
            && x <= START_NEST_MAX
            && y >= START_NEST_MIN
            && y <= START_NEST_MAX;
        let in_end = x >= self.width - END_NEST_NEAR_OFFSET
            && x <= self.width - END_NEST_FAR_OFFSET
            && y >= self.height - END_NEST_NEAR_OFFSET
            && y <= self.height - END_NEST_FAR_OFFSET;
        in_start || in_end
    }

    /// World-space box covered by the tile.
    #[must_use]
    pub fn tile_bounds(&self, coords: TileCoords) -> Aabb2 {
        let min = Vec2::new(coords.x() as f32, coords.y() as f32);
        Aabb2::new(min, min + Vec2::ONE)
    }

    /// World-space centre of the tile.
    #[must_use]
    pub fn tile_center(&self, coords: TileCoords) -> Vec2 {
        coords.center()
    }

    /// Points the tile at a new definition and restores its starting health.
    ///
    /// Returns `false` when the coordinates lie outside the grid.
    pub fn set_definition(&mut self, coords: TileCoords, definition: TileDefId) -> bool {
        let health = self
            .definitions
            .get(definition)
            .map_or(0, |found| found.health);
        let Some(index) = self.index_of(coords) else {
            return false;
        };
        self.tiles[index] = Tile { definition, health };
        true
    }

    /// Removes one hit point from the tile.
    ///
    /// A tile whose health runs out turns into its replacement definition at
    /// the replacement's starting health, unless it lies on the border or in
    /// a nest.
    pub fn strike(&mut self, coords: TileCoords) -> TileStrike {
        let exempt = self.is_border(coords) || self.is_in_nest(coords);
        let Some(index) = self.index_of(coords) else {
            return TileStrike::Unaffected;
        };
        let tile = &mut self.tiles[index];
        if tile.health <= 0 {
            return TileStrike::Unaffected;
        }
        tile.health -= 1;
        let health = tile.health;
        let replacement = self
            .definitions
            .get(tile.definition)
            .and_then(|definition| definition.destroyed_into);

        match replacement {
            Some(replacement) if health <= 0 && !exempt => {
                let _ = self.set_definition(coords, replacement);
                TileStrike::Destroyed { replacement }
            }
            _ => TileStrike::Damaged { health },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Arc<TileDefinitionTable> {
        Arc::new(
            TileDefinitionTable::from_toml_str(
                r#"
                [[tile]]
                name = "Grass"

                [[tile]]
                name = "Brick"
                solid = true
                health = 1
                destroyed_into = "Rubble"

                [[tile]]
                name = "Rubble"

                [[tile]]
                name = "Water"
                water = true

                [[tile]]
                name = "Wall"
                solid = true
                health = 1
                destroyed_into = "Crack"

                [[tile]]
                name = "Crack"
                solid = true
                health = 2
                destroyed_into = "Rubble"
                "#,
            )
            .expect("tiles parse"),
        )
    }

    #[test]
    fn solidity_follows_definitions_and_bounds() {
        let definitions = table();
        let brick = definitions.id("Brick").expect("brick");
        let water = definitions.id("Water").expect("water");
        let grass = definitions.id("Grass").expect("grass");
        let mut grid = Grid::filled(12, 12, grass, definitions);
        assert!(grid.set_definition(TileCoords::new(3, 3), brick));
        assert!(grid.set_definition(TileCoords::new(4, 3), water));

        assert!(grid.is_solid(TileCoords::new(3, 3)));
        assert!(!grid.is_water(TileCoords::new(3, 3)));
        assert!(grid.is_water(TileCoords::new(4, 3)));
        assert!(!grid.is_solid(TileCoords::new(4, 3)));
        assert!(grid.is_solid(TileCoords::new(-1, 0)));
        assert!(grid.is_solid(TileCoords::new(12, 5)));
        assert!(!grid.is_water(TileCoords::new(-1, 0)));
    }

    #[test]
    fn nests_and_border_are_classified() {
        let definitions = table();
        let grass = definitions.id("Grass").expect("grass");
        let grid = Grid::filled(20, 16, grass, definitions);
        assert!(grid.is_border(TileCoords::new(0, 7)));
        assert!(grid.is_border(TileCoords::new(19, 7)));
        assert!(grid.is_border(TileCoords::new(7, 15)));
        assert!(!grid.is_border(TileCoords::new(7, 7)));
        assert!(grid.is_in_nest(TileCoords::new(1, 1)));
        assert!(grid.is_in_nest(TileCoords::new(6, 6)));
        assert!(!grid.is_in_nest(TileCoords::new(7, 6)));
        assert!(grid.is_in_nest(TileCoords::new(12, 8)));
        assert!(grid.is_in_nest(TileCoords::new(18, 14)));
        assert!(!grid.is_in_nest(TileCoords::new(11, 8)));
    }

    #[test]
    fn strike_destroys_interior_tile() {
        let definitions = table();
        let grass = definitions.id("Grass").expect("grass");
        let brick = definitions.id("Brick").expect("brick");
        let rubble = definitions.id("Rubble").expect("rubble");
        let mut grid = Grid::filled(20, 20, grass, definitions);
        let interior = TileCoords::new(10, 3);
        assert!(grid.set_definition(interior, brick));

        assert_eq!(
            grid.strike(interior),
            TileStrike::Destroyed {
                replacement: rubble
            }
        );
        assert!(!grid.is_solid(interior));
        assert_eq!(grid.strike(interior), TileStrike::Unaffected);
    }

    #[test]
    fn destroyed_tile_takes_replacement_health() {
        let definitions = table();
        let grass = definitions.id("Grass").expect("grass");
        let wall = definitions.id("Wall").expect("wall");
        let crack = definitions.id("Crack").expect("crack");
        let rubble = definitions.id("Rubble").expect("rubble");
        let mut grid = Grid::filled(20, 20, grass, definitions);
        let interior = TileCoords::new(10, 3);
        assert!(grid.set_definition(interior, wall));

        assert_eq!(
            grid.strike(interior),
            TileStrike::Destroyed { replacement: crack }
        );
        assert_eq!(grid.tile(interior).map(Tile::health), Some(2));
        assert!(grid.is_solid(interior));

        assert_eq!(grid.strike(interior), TileStrike::Damaged { health: 1 });
        assert_eq!(
            grid.strike(interior),
            TileStrike::Destroyed {
                replacement: rubble
            }
        );
        assert!(!grid.is_solid(interior));
    }

    #[test]
    fn strike_spares_border_and_nest_tiles() {
        let definitions = table();
        let grass = definitions.id("Grass").expect("grass");
        let brick = definitions.id("Brick").expect("brick");
        let mut grid = Grid::filled(20, 20, grass, definitions);
        for coords in [TileCoords::new(0, 10), TileCoords::new(3, 3)] {
            assert!(grid.set_definition(coords, brick));
            assert_eq!(grid.strike(coords), TileStrike::Damaged { health: 0 });
            assert!(grid.is_solid(coords));
            assert_eq!(grid.strike(coords), TileStrike::Unaffected);
        }
    }

    #[test]
    fn index_round_trips_through_coordinates() {
        let definitions = table();
        let grass = definitions.id("Grass").expect("grass");
        let grid = Grid::filled(7, 5, grass, definitions);
        let coords = TileCoords::new(4, 3);
        let index = grid.index_of(coords).expect("in bounds");
        assert_eq!(index, 25);
        assert_eq!(grid.coords_of(index), Some(coords));
        assert_eq!(grid.index_of(TileCoords::new(7, 0)), None);
    }
}

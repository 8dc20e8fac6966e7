#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the Libra tank simulation.
//!
//! The world owns the tile grid, the entity registry, the cached map-level
//! distance fields and the cosmetic explosions. Systems read it through the
//! [`query`] module and the navigation helpers on [`World`], and mutate it
//! through [`apply`] or the narrow mutable accessors used by the collision
//! passes.

use std::sync::Arc;

use glam::Vec2;
use libra_core::{
    geometry::{Ray, RaycastHit},
    Command, DefinitionError, EnemyCounts, EntityId, EntityKind, Event, Faction, MapDefinition,
    MapDefinitionTable, SimulationConfig, TileCoords, TileDefinitionTable,
};
use log::{debug, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

mod entity;
mod grid;
mod mapgen;
mod navigation;
mod path;
mod raycast;
mod registry;

pub use entity::{BehaviorState, Entity, PatrolState, PlayerState, ProjectileState, TurretState};
pub use grid::{Grid, Tile, TileStrike};
pub use navigation::{BlockingPolicy, DistanceField};
pub use raycast::raycast_vs_tiles;
pub use registry::{EntityRegistry, IndexList, RegistryError};

use mapgen::MapLayout;

/// Tile every map-level distance field is seeded from.
const MAP_FIELD_SEED: TileCoords = TileCoords::new(1, 1);
/// Heading the player tank starts with.
const PLAYER_START_ORIENTATION: f32 = 45.0;
/// Random draws attempted before a position query scans every tile.
const SAMPLING_ATTEMPTS_PER_TILE: usize = 4;

/// Policies of the three cached map-level fields, in storage order.
const MAP_FIELD_POLICIES: [BlockingPolicy; 3] = [
    BlockingPolicy::LAND_ONLY,
    BlockingPolicy::AMPHIBIOUS_AVOID_TURRETS,
    BlockingPolicy::STRICT,
];

/// Failures raised while building or mutating the world.
#[derive(Debug, Error)]
pub enum WorldError {
    /// Registry bookkeeping was violated.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// A definition lookup failed.
    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

/// Cosmetic explosion aged by the simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Explosion {
    /// World-space centre.
    pub position: Vec2,
    /// Diameter in world units.
    pub size: f32,
    /// Lifetime in seconds.
    pub duration: f32,
    /// Seconds since the explosion started.
    pub age: f32,
}

impl Explosion {
    /// Reports whether the explosion has run its course.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.age >= self.duration
    }

    /// Fraction of the lifetime already elapsed, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.age / self.duration).clamp(0.0, 1.0)
    }
}

/// Represents the authoritative simulation state of one map.
#[derive(Debug)]
pub struct World {
    map_name: String,
    grid: Grid,
    registry: EntityRegistry,
    map_fields: [DistanceField; 3],
    explosions: Vec<Explosion>,
    config: SimulationConfig,
    enemies: EnemyCounts,
    layout: MapLayout,
    player: Option<EntityId>,
    rng: ChaCha8Rng,
}

impl World {
    /// Generates a world from a map definition.
    #[must_use]
    pub fn new(
        definitions: Arc<TileDefinitionTable>,
        map: &MapDefinition,
        config: SimulationConfig,
        seed: u64,
    ) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut grid = Grid::filled(map.width, map.height, map.fill, definitions);
        let layout = mapgen::generate(&mut grid, map, &mut rng);
        Self::assemble(map.name.clone(), grid, layout, map.enemies, config, rng)
    }

    /// Generates a world from the map with the provided name.
    pub fn from_tables(
        definitions: Arc<TileDefinitionTable>,
        maps: &MapDefinitionTable,
        map_name: &str,
        config: SimulationConfig,
        seed: u64,
    ) -> Result<Self, WorldError> {
        let map = maps.get(map_name)?;
        Ok(Self::new(definitions, map, config, seed))
    }

    /// Wraps a hand-built grid. No enemies are scheduled for placement.
    #[must_use]
    pub fn from_grid(grid: Grid, config: SimulationConfig, seed: u64) -> Self {
        let layout = mapgen::default_layout(&grid);
        Self::assemble(
            String::from("custom"),
            grid,
            layout,
            EnemyCounts::default(),
            config,
            ChaCha8Rng::seed_from_u64(seed),
        )
    }

    fn assemble(
        map_name: String,
        grid: Grid,
        layout: MapLayout,
        enemies: EnemyCounts,
        config: SimulationConfig,
        rng: ChaCha8Rng,
    ) -> Self {
        let (width, height) = (grid.width(), grid.height());
        let mut world = Self {
            map_name,
            grid,
            registry: EntityRegistry::default(),
            map_fields: [
                DistanceField::new(width, height),
                DistanceField::new(width, height),
                DistanceField::new(width, height),
            ],
            explosions: Vec::new(),
            config,
            enemies,
            layout,
            player: None,
            rng,
        };
        world.rebuild_map_fields();
        world
    }

    /// Constructs and registers an entity with the defaults of its kind.
    pub fn spawn(
        &mut self,
        kind: EntityKind,
        faction: Faction,
        position: Vec2,
        orientation: f32,
        out_events: &mut Vec<Event>,
    ) -> EntityId {
        let entity = Entity::spawn(
            kind,
            faction,
            position,
            orientation,
            &self.config,
            (self.grid.width(), self.grid.height()),
        );
        let id = self.registry.insert(entity);
        if kind == EntityKind::PlayerTank {
            self.player = Some(id);
        }
        if kind == EntityKind::Scorpio {
            self.rebuild_map_fields();
        }
        debug!("spawned {kind:?} ({faction:?}) at {position} as {id:?}");
        out_events.push(Event::EntitySpawned {
            entity: id,
            kind,
            faction,
        });
        id
    }

    /// Places the player tank at the start tile, reviving it if it exists.
    pub fn spawn_player(&mut self, out_events: &mut Vec<Event>) -> EntityId {
        let start = self.layout.start_position;
        let health = self.config.player_health;
        if let Some(id) = self.player {
            if let Some(player) = self.registry.get_mut(id) {
                player.position = start;
                player.orientation = PLAYER_START_ORIENTATION;
                player.velocity = Vec2::ZERO;
                player.health = health;
                player.is_dead = false;
                return id;
            }
        }
        self.spawn(
            EntityKind::PlayerTank,
            Faction::Good,
            start,
            PLAYER_START_ORIENTATION,
            out_events,
        )
    }

    /// Places the enemies scheduled by the map definition at random open tiles.
    pub fn populate_enemies(&mut self, out_events: &mut Vec<Event>) {
        let schedule = [
            (EntityKind::Scorpio, self.enemies.scorpio),
            (EntityKind::Leo, self.enemies.leo),
            (EntityKind::Aries, self.enemies.aries),
        ];
        for (kind, count) in schedule {
            for _ in 0..count {
                let Some(position) = self.valid_spawn_position() else {
                    warn!("no open tile left for {kind:?}");
                    return;
                };
                let orientation = self.random_range(0.0, 360.0);
                let _ = self.spawn(kind, Faction::Evil, position, orientation, out_events);
            }
        }
    }

    /// Removes an entity from the registry and every index.
    ///
    /// Removing an agent recomputes the map-level distance fields.
    pub fn remove(&mut self, id: EntityId, out_events: &mut Vec<Event>) -> Result<Entity, WorldError> {
        let entity = self.detach_from_registry(id, out_events)?;
        if entity.kind().is_agent() {
            self.rebuild_map_fields();
        }
        Ok(entity)
    }

    fn detach_from_registry(
        &mut self,
        id: EntityId,
        out_events: &mut Vec<Event>,
    ) -> Result<Entity, WorldError> {
        let entity = self.registry.remove(id)?;
        if self.player == Some(id) {
            self.player = None;
        }
        debug!("removed {:?} {id:?}", entity.kind());
        out_events.push(Event::EntityRemoved {
            entity: id,
            kind: entity.kind(),
        });
        Ok(entity)
    }

    /// Removes every entity flagged as garbage and returns how many went.
    pub fn sweep_garbage(&mut self, out_events: &mut Vec<Event>) -> Result<usize, WorldError> {
        let garbage: Vec<EntityId> = self
            .registry
            .entities()
            .filter(|(_, entity)| entity.is_garbage)
            .map(|(id, _)| id)
            .collect();

        let mut agent_removed = false;
        for id in &garbage {
            let entity = self.detach_from_registry(*id, out_events)?;
            agent_removed |= entity.kind().is_agent();
        }
        if agent_removed {
            self.rebuild_map_fields();
        }
        Ok(garbage.len())
    }

    /// Runs a closure against one entity while granting it mutable world access.
    ///
    /// The entity is detached for the duration, so the closure sees the rest
    /// of the world without it. Returns `Ok(None)` for stale handles.
    pub fn with_entity<R, F>(&mut self, id: EntityId, update: F) -> Result<Option<R>, WorldError>
    where
        F: FnOnce(&mut Entity, &mut World) -> R,
    {
        let Some(mut entity) = self.registry.detach(id) else {
            return Ok(None);
        };
        let result = update(&mut entity, self);
        self.registry.reattach(id, entity)?;
        Ok(Some(result))
    }

    /// Splits the world into the pieces collision resolution mutates.
    pub fn collision_parts(&mut self) -> (&mut Grid, &mut EntityRegistry, &SimulationConfig) {
        (&mut self.grid, &mut self.registry, &self.config)
    }

    /// Casts a ray against the solid tiles of the grid.
    #[must_use]
    pub fn raycast_vs_tiles(&self, ray: &Ray) -> RaycastHit {
        raycast::raycast_vs_tiles(&self.grid, ray)
    }

    /// Builds a distance field seeded at the provided tile.
    #[must_use]
    pub fn populate_distance_field(&self, seed: TileCoords, policy: BlockingPolicy) -> DistanceField {
        let mut field = DistanceField::new(self.grid.width(), self.grid.height());
        self.populate_distance_field_into(&mut field, seed, policy);
        field
    }

    /// Recomputes an existing distance field in place.
    pub fn populate_distance_field_into(
        &self,
        field: &mut DistanceField,
        seed: TileCoords,
        policy: BlockingPolicy,
    ) {
        let turrets = self.turret_tiles();
        field.populate(&self.grid, seed, policy, |tile| turrets.contains(&tile));
    }

    /// Plans a waypoint path from `start` to `goal`.
    ///
    /// The path avoids water and turrets, lists tile centres from the goal
    /// back toward the start, and is empty when the goal cannot be reached.
    #[must_use]
    pub fn generate_path_to_goal(&self, start: TileCoords, goal: TileCoords) -> Vec<Vec2> {
        let field = self.populate_distance_field(start, BlockingPolicy::STRICT);
        path::descend(&self.grid, &field, start, goal)
    }

    /// Reports whether the tile blocks movement. Out-of-bounds tiles are solid.
    #[must_use]
    pub fn is_tile_solid(&self, coords: TileCoords) -> bool {
        self.grid.is_solid(coords)
    }

    /// Reports whether the tile is water.
    #[must_use]
    pub fn is_tile_water(&self, coords: TileCoords) -> bool {
        self.grid.is_water(coords)
    }

    /// Reports whether the tile belongs to the outermost ring.
    #[must_use]
    pub fn is_tile_border(&self, coords: TileCoords) -> bool {
        self.grid.is_border(coords)
    }

    /// Reports whether the tile lies in a nest.
    #[must_use]
    pub fn is_tile_in_nest(&self, coords: TileCoords) -> bool {
        self.grid.is_in_nest(coords)
    }

    /// Random open land tile outside the nests, as a tile centre.
    pub fn valid_spawn_position(&mut self) -> Option<Vec2> {
        self.sample_tile(|grid, coords| {
            !grid.is_solid(coords) && !grid.is_in_nest(coords) && !grid.is_water(coords)
        })
    }

    /// Random open interior land tile reachable in the provided field.
    pub fn valid_patrol_position(&mut self, field: &DistanceField) -> Option<Vec2> {
        self.sample_tile(|grid, coords| {
            !grid.is_solid(coords)
                && !grid.is_border(coords)
                && !grid.is_water(coords)
                && field.is_reachable(coords)
        })
    }

    fn sample_tile<F>(&mut self, accept: F) -> Option<Vec2>
    where
        F: Fn(&Grid, TileCoords) -> bool,
    {
        let (width, height) = (self.grid.width(), self.grid.height());
        if width <= 0 || height <= 0 {
            return None;
        }
        let attempts = self.grid.tile_count() * SAMPLING_ATTEMPTS_PER_TILE;
        for _ in 0..attempts {
            let coords = TileCoords::new(self.rng.gen_range(0..width), self.rng.gen_range(0..height));
            if accept(&self.grid, coords) {
                return Some(coords.center());
            }
        }

        let candidates: Vec<TileCoords> = (0..self.grid.tile_count())
            .filter_map(|index| self.grid.coords_of(index))
            .filter(|coords| accept(&self.grid, *coords))
            .collect();
        if candidates.is_empty() {
            warn!("no tile satisfies the position query");
            return None;
        }
        debug!("position query fell back to a scan of {} candidates", candidates.len());
        let choice = self.rng.gen_range(0..candidates.len());
        Some(candidates[choice].center())
    }

    /// Uniform random number in `[low, high)`, or `low` for an empty range.
    pub fn random_range(&mut self, low: f32, high: f32) -> f32 {
        if low < high {
            self.rng.gen_range(low..high)
        } else {
            low
        }
    }

    /// Advances every explosion and drops finished ones.
    pub fn age_explosions(&mut self, dt: f32) {
        for explosion in &mut self.explosions {
            explosion.age += dt;
        }
        self.explosions.retain(|explosion| !explosion.is_finished());
    }

    fn turret_tiles(&self) -> Vec<TileCoords> {
        self.registry
            .of_kind(EntityKind::Scorpio)
            .filter_map(|id| self.registry.get(id))
            .map(|turret| TileCoords::new(turret.position.x as i32, turret.position.y as i32))
            .collect()
    }

    fn rebuild_map_fields(&mut self) {
        let turrets = self.turret_tiles();
        for (field, policy) in self.map_fields.iter_mut().zip(MAP_FIELD_POLICIES) {
            field.populate(&self.grid, MAP_FIELD_SEED, policy, |tile| turrets.contains(&tile));
        }
        debug!("rebuilt map distance fields around {} turrets", turrets.len());
    }
}

/// Applies a command to the world, emitting the resulting events.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SpawnEntity {
            kind,
            faction,
            position,
            orientation,
        } => {
            let _ = world.spawn(kind, faction, position, orientation, out_events);
        }
        Command::PlaySound { cue } => out_events.push(Event::SoundPlayed { cue }),
        Command::SpawnExplosion {
            position,
            size,
            duration,
        } => {
            world.explosions.push(Explosion {
                position,
                size,
                duration,
                age: 0.0,
            });
            out_events.push(Event::ExplosionSpawned {
                position,
                size,
                duration,
            });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec2;
    use libra_core::{EntityId, EntityKind, SimulationConfig, TileCoords};

    use super::{BlockingPolicy, DistanceField, Entity, EntityRegistry, Explosion, Grid, World};

    /// Name of the map the world was generated from.
    #[must_use]
    pub fn map_name(world: &World) -> &str {
        &world.map_name
    }

    /// Provides read-only access to the tile grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Provides read-only access to the entity registry.
    #[must_use]
    pub fn registry(world: &World) -> &EntityRegistry {
        &world.registry
    }

    /// Tuning the world was built with.
    #[must_use]
    pub fn config(world: &World) -> &SimulationConfig {
        &world.config
    }

    /// Resolves an entity handle.
    #[must_use]
    pub fn entity(world: &World, id: EntityId) -> Option<&Entity> {
        world.registry.get(id)
    }

    /// Handle of the player tank, if one is registered.
    #[must_use]
    pub fn player_id(world: &World) -> Option<EntityId> {
        world.player
    }

    /// The player tank, if one is registered and not currently detached.
    #[must_use]
    pub fn player(world: &World) -> Option<&Entity> {
        world.player.and_then(|id| world.registry.get(id))
    }

    /// Cached map-level field for one of the three named policies.
    ///
    /// Returns `None` for any other policy.
    #[must_use]
    pub fn map_field(world: &World, policy: BlockingPolicy) -> Option<&DistanceField> {
        super::MAP_FIELD_POLICIES
            .iter()
            .position(|candidate| *candidate == policy)
            .map(|slot| &world.map_fields[slot])
    }

    /// Explosions currently playing.
    #[must_use]
    pub fn explosions(world: &World) -> &[Explosion] {
        &world.explosions
    }

    /// Centre of the start tile.
    #[must_use]
    pub fn start_position(world: &World) -> Vec2 {
        world.layout.start_position
    }

    /// Centre of the end tile.
    #[must_use]
    pub fn end_position(world: &World) -> Vec2 {
        world.layout.end_position
    }

    /// Reports whether a living player tank stands on the end tile.
    #[must_use]
    pub fn player_reached_goal(world: &World) -> bool {
        player(world).map_or(false, |tank| {
            !tank.is_dead
                && TileCoords::containing(tank.position) == TileCoords::containing(world.layout.end_position)
        })
    }

    /// Number of registered entities of each kind, indexed by [`EntityKind::index`].
    #[must_use]
    pub fn population(world: &World) -> [usize; 8] {
        let mut counts = [0; 8];
        for kind in EntityKind::ALL {
            counts[kind.index()] = world.registry.of_kind(kind).count();
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use libra_core::SoundCue;

    use super::*;

    fn world() -> World {
        let definitions = Arc::new(
            TileDefinitionTable::from_toml_str(
                "[[tile]]\nname = \"Grass\"\n[[tile]]\nname = \"Rock\"\nsolid = true\n",
            )
            .expect("tiles parse"),
        );
        let grass = definitions.id("Grass").expect("grass");
        World::from_grid(
            Grid::filled(12, 12, grass, definitions),
            SimulationConfig::default(),
            5,
        )
    }

    #[test]
    fn apply_spawns_entities_and_forwards_cues() {
        let mut world = world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnEntity {
                kind: EntityKind::Leo,
                faction: Faction::Evil,
                position: Vec2::new(4.5, 4.5),
                orientation: 90.0,
            },
            &mut events,
        );
        apply(&mut world, Command::PlaySound { cue: SoundCue::Hit }, &mut events);

        assert_eq!(query::population(&world)[EntityKind::Leo.index()], 1);
        assert!(matches!(events[0], Event::EntitySpawned { kind: EntityKind::Leo, .. }));
        assert_eq!(events[1], Event::SoundPlayed { cue: SoundCue::Hit });
    }

    #[test]
    fn explosions_age_out() {
        let mut world = world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnExplosion {
                position: Vec2::new(3.0, 3.0),
                size: 0.5,
                duration: 0.2,
            },
            &mut events,
        );
        world.age_explosions(0.1);
        assert_eq!(query::explosions(&world).len(), 1);
        world.age_explosions(0.15);
        assert!(query::explosions(&world).is_empty());
    }

    #[test]
    fn turrets_reshape_map_fields_until_removed() {
        let mut world = world();
        let mut events = Vec::new();
        let turret = world.spawn(
            EntityKind::Scorpio,
            Faction::Evil,
            Vec2::new(2.5, 1.5),
            0.0,
            &mut events,
        );
        let strict = query::map_field(&world, BlockingPolicy::STRICT).expect("cached");
        assert_eq!(strict.value(TileCoords::new(2, 1)), Some(DistanceField::UNREACHABLE));
        let land = query::map_field(&world, BlockingPolicy::LAND_ONLY).expect("cached");
        assert_eq!(land.value(TileCoords::new(2, 1)), Some(1.0));

        let _ = world.remove(turret, &mut events).expect("turret registered");
        let strict = query::map_field(&world, BlockingPolicy::STRICT).expect("cached");
        assert_eq!(strict.value(TileCoords::new(2, 1)), Some(1.0));
    }

    #[test]
    fn sweep_removes_only_garbage() {
        let mut world = world();
        let mut events = Vec::new();
        let doomed = world.spawn(EntityKind::Bullet, Faction::Evil, Vec2::new(5.5, 5.5), 0.0, &mut events);
        let kept = world.spawn(EntityKind::Leo, Faction::Evil, Vec2::new(6.5, 6.5), 0.0, &mut events);
        world
            .collision_parts()
            .1
            .get_mut(doomed)
            .expect("registered")
            .is_garbage = true;

        assert_eq!(world.sweep_garbage(&mut events).expect("sweep"), 1);
        assert!(query::entity(&world, doomed).is_none());
        assert!(query::entity(&world, kept).is_some());
    }

    #[test]
    fn with_entity_hides_the_entity_from_itself() {
        let mut world = world();
        let mut events = Vec::new();
        let leo = world.spawn(EntityKind::Leo, Faction::Evil, Vec2::new(6.5, 6.5), 0.0, &mut events);
        let seen = world
            .with_entity(leo, |entity, world| {
                entity.position.x += 1.0;
                query::entity(world, leo).is_some()
            })
            .expect("reattached");
        assert_eq!(seen, Some(false));
        assert_eq!(query::entity(&world, leo).map(|e| e.position.x), Some(7.5));
    }

    #[test]
    fn player_respawns_in_place() {
        let mut world = world();
        let mut events = Vec::new();
        let first = world.spawn_player(&mut events);
        world
            .collision_parts()
            .1
            .get_mut(first)
            .expect("player")
            .is_dead = true;
        let second = world.spawn_player(&mut events);
        assert_eq!(first, second);
        let player = query::player(&world).expect("player");
        assert!(!player.is_dead);
        assert_eq!(player.position, Vec2::new(1.5, 1.5));
        assert_eq!(player.orientation, 45.0);
    }

    #[test]
    fn patrol_positions_respect_reachability() {
        let mut world = world();
        let field = world.populate_distance_field(TileCoords::new(5, 5), BlockingPolicy::STRICT);
        for _ in 0..32 {
            let position = world.valid_patrol_position(&field).expect("open tile");
            let coords = TileCoords::containing(position);
            assert!(!world.is_tile_border(coords));
            assert!(field.is_reachable(coords));
        }
        let unreachable = DistanceField::new(12, 12);
        assert!(world.valid_patrol_position(&unreachable).is_none());
    }
}

use std::sync::Arc;

use glam::Vec2;
use libra_core::{EntityId, EntityKind, Event, Faction, SimulationConfig, SoundCue, TileCoords, TileDefinitionTable};
use libra_system_collision::CollisionResolver;
use libra_world::{query, Grid, World};

const TILES: &str = r#"
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
"#;

fn world_with(config: SimulationConfig, paint: &[((i32, i32), &str)]) -> World {
    let definitions = Arc::new(TileDefinitionTable::from_toml_str(TILES).expect("tiles parse"));
    let grass = definitions.id("Grass").expect("grass");
    let mut grid = Grid::filled(20, 20, grass, Arc::clone(&definitions));
    for ((x, y), name) in paint {
        let id = definitions.id(name).expect("known tile");
        assert!(grid.set_definition(TileCoords::new(*x, *y), id));
    }
    World::from_grid(grid, config, 1)
}

fn spawn(world: &mut World, kind: EntityKind, faction: Faction, position: Vec2, orientation: f32) -> EntityId {
    let mut events = Vec::new();
    world.spawn(kind, faction, position, orientation, &mut events)
}

fn entity(world: &World, id: EntityId) -> &libra_world::Entity {
    query::entity(world, id).expect("entity registered")
}

#[test]
fn agents_are_pushed_out_of_walls() {
    let mut world = world_with(SimulationConfig::default(), &[((10, 5), "Brick")]);
    let leo = spawn(&mut world, EntityKind::Leo, Faction::Evil, Vec2::new(9.8, 5.5), 0.0);

    CollisionResolver::default().push_out_of_terrain(&mut world);

    assert!((entity(&world, leo).position.x - 9.6).abs() < 1e-4);
}

#[test]
fn only_swimmers_enter_water() {
    let mut world = world_with(SimulationConfig::default(), &[((10, 5), "Water")]);
    let leo = spawn(&mut world, EntityKind::Leo, Faction::Evil, Vec2::new(9.8, 5.5), 0.0);
    let bolt = spawn(&mut world, EntityKind::Bolt, Faction::Good, Vec2::new(9.95, 5.5), 0.0);
    world.collision_parts().1.get_mut(leo).expect("leo").can_swim = false;

    CollisionResolver::default().push_out_of_terrain(&mut world);
    assert!((entity(&world, leo).position.x - 9.6).abs() < 1e-4);
    assert_eq!(entity(&world, bolt).position.x, 9.95);

    world.collision_parts().1.get_mut(leo).expect("leo").position.x = 9.8;
    world.collision_parts().1.get_mut(leo).expect("leo").can_swim = true;
    CollisionResolver::default().push_out_of_terrain(&mut world);
    assert_eq!(entity(&world, leo).position.x, 9.8);
}

#[test]
fn player_can_ignore_walls() {
    let config = SimulationConfig {
        player_ignores_walls: true,
        ..SimulationConfig::default()
    };
    let mut world = world_with(config, &[((2, 1), "Brick")]);
    let mut events = Vec::new();
    let player = world.spawn_player(&mut events);
    world.collision_parts().1.get_mut(player).expect("player").position = Vec2::new(1.8, 1.5);

    CollisionResolver::default().push_out_of_terrain(&mut world);

    assert_eq!(entity(&world, player).position, Vec2::new(1.8, 1.5));
}

#[test]
fn mutually_pushable_agents_split_the_overlap() {
    let mut world = world_with(SimulationConfig::default(), &[]);
    let a = spawn(&mut world, EntityKind::Leo, Faction::Evil, Vec2::new(5.5, 5.5), 0.0);
    let b = spawn(&mut world, EntityKind::Aries, Faction::Evil, Vec2::new(6.0, 5.5), 0.0);

    CollisionResolver::default().resolve_agent_collisions(&mut world);

    let (a, b) = (entity(&world, a).position, entity(&world, b).position);
    assert!(a.distance(b) >= 0.8 - 1e-4);
    assert!((a.x - 5.35).abs() < 1e-4);
    assert!((b.x - 6.15).abs() < 1e-4);
}

#[test]
fn turrets_hold_their_ground() {
    let mut world = world_with(SimulationConfig::default(), &[]);
    let turret = spawn(&mut world, EntityKind::Scorpio, Faction::Evil, Vec2::new(5.5, 5.5), 0.0);
    let leo = spawn(&mut world, EntityKind::Leo, Faction::Evil, Vec2::new(6.0, 5.5), 0.0);

    CollisionResolver::default().resolve_agent_collisions(&mut world);

    assert_eq!(entity(&world, turret).position, Vec2::new(5.5, 5.5));
    assert!((entity(&world, leo).position.x - 6.3).abs() < 1e-4);
}

#[test]
fn bullets_destroy_weak_tiles_and_ricochet() {
    let mut world = world_with(SimulationConfig::default(), &[((10, 5), "Brick")]);
    let bolt = spawn(&mut world, EntityKind::Bolt, Faction::Good, Vec2::new(9.95, 5.5), 0.0);
    let mut events = Vec::new();

    CollisionResolver::default().resolve_bullets_vs_tiles(&mut world, &mut events);

    let rubble = query::grid(&world).definitions().id("Rubble").expect("rubble");
    assert!(!world.is_tile_solid(TileCoords::new(10, 5)));
    assert_eq!(
        events,
        vec![Event::TileDestroyed {
            tile: TileCoords::new(10, 5),
            replacement: rubble,
        }]
    );
    let bolt = entity(&world, bolt);
    assert_eq!(bolt.health, 2);
    assert!(bolt.velocity.x < 0.0);
    assert!((bolt.orientation.abs() - 180.0).abs() < 1e-3);
}

#[test]
fn flames_bounce_without_damaging_tiles() {
    let mut world = world_with(SimulationConfig::default(), &[((10, 5), "Brick")]);
    let flame = spawn(&mut world, EntityKind::Fire, Faction::Good, Vec2::new(9.95, 5.5), 0.0);
    let mut events = Vec::new();

    CollisionResolver::default().resolve_bullets_vs_tiles(&mut world, &mut events);

    assert!(world.is_tile_solid(TileCoords::new(10, 5)));
    assert!(events.is_empty());
    assert_eq!(entity(&world, flame).health, 0);
}

#[test]
fn border_and_nest_tiles_never_break() {
    let mut world = world_with(SimulationConfig::default(), &[((0, 10), "Brick"), ((3, 3), "Brick")]);
    let _ = spawn(&mut world, EntityKind::Bolt, Faction::Good, Vec2::new(1.05, 10.5), 180.0);
    let _ = spawn(&mut world, EntityKind::Bolt, Faction::Good, Vec2::new(2.95, 3.5), 0.0);
    let mut events = Vec::new();

    CollisionResolver::default().resolve_bullets_vs_tiles(&mut world, &mut events);

    assert!(world.is_tile_solid(TileCoords::new(0, 10)));
    assert!(world.is_tile_solid(TileCoords::new(3, 3)));
    assert!(events
        .iter()
        .all(|event| matches!(event, Event::TileDamaged { health: 0, .. })));
    assert_eq!(events.len(), 2);
}

#[test]
fn good_bullet_damages_evil_agent() {
    let mut world = world_with(SimulationConfig::default(), &[]);
    let leo = spawn(&mut world, EntityKind::Leo, Faction::Evil, Vec2::new(5.5, 5.5), 0.0);
    let bolt = spawn(&mut world, EntityKind::Bolt, Faction::Good, Vec2::new(5.6, 5.5), 180.0);
    let starting_health = entity(&world, leo).health;
    let mut events = Vec::new();

    CollisionResolver::default().resolve_bullets_vs_entities(&mut world, &mut events);

    let bolt = entity(&world, bolt);
    assert_eq!(bolt.health, 0);
    assert!(bolt.is_dead);
    assert!(bolt.is_garbage);
    assert_eq!(entity(&world, leo).health, starting_health - 1);
    assert_eq!(events, vec![Event::SoundPlayed { cue: SoundCue::Hit }]);
}

#[test]
fn friendly_fire_is_ignored() {
    let mut world = world_with(SimulationConfig::default(), &[]);
    let leo = spawn(&mut world, EntityKind::Leo, Faction::Evil, Vec2::new(5.5, 5.5), 0.0);
    let bullet = spawn(&mut world, EntityKind::Bullet, Faction::Evil, Vec2::new(5.6, 5.5), 0.0);
    let mut events = Vec::new();

    CollisionResolver::default().resolve_bullets_vs_entities(&mut world, &mut events);

    assert!(events.is_empty());
    assert!(!entity(&world, bullet).is_garbage);
    assert_eq!(entity(&world, leo).health, entity(&world, leo).max_health);
}

#[test]
fn aries_shield_deflects_frontal_hits() {
    let mut world = world_with(SimulationConfig::default(), &[]);
    let aries = spawn(&mut world, EntityKind::Aries, Faction::Evil, Vec2::new(5.5, 5.5), 0.0);
    let bolt = spawn(&mut world, EntityKind::Bolt, Faction::Good, Vec2::new(5.8, 5.5), 180.0);
    let mut events = Vec::new();

    CollisionResolver::default().resolve_bullets_vs_entities(&mut world, &mut events);

    assert!(events.is_empty());
    assert_eq!(entity(&world, aries).health, entity(&world, aries).max_health);
    let deflected = entity(&world, bolt);
    assert_eq!(deflected.health, 2);
    assert!(deflected.velocity.x > 0.0);
    assert!(!deflected.is_garbage);

    // Still overlapping the hull, but flying away from it.
    world.collision_parts().1.get_mut(bolt).expect("bolt").position = Vec2::new(5.85, 5.5);
    CollisionResolver::default().resolve_bullets_vs_entities(&mut world, &mut events);

    assert!(events.is_empty());
    assert_eq!(entity(&world, aries).health, entity(&world, aries).max_health);
    let outbound = entity(&world, bolt);
    assert_eq!(outbound.health, 2);
    assert!(outbound.velocity.x > 0.0);
    assert!(!outbound.is_garbage);
}

#[test]
fn aries_is_exposed_from_behind() {
    let mut world = world_with(SimulationConfig::default(), &[]);
    let aries = spawn(&mut world, EntityKind::Aries, Faction::Evil, Vec2::new(5.5, 5.5), 0.0);
    let bolt = spawn(&mut world, EntityKind::Bolt, Faction::Good, Vec2::new(5.2, 5.5), 0.0);
    let mut events = Vec::new();

    CollisionResolver::default().resolve_bullets_vs_entities(&mut world, &mut events);

    assert!(entity(&world, bolt).is_garbage);
    assert_eq!(entity(&world, aries).health, entity(&world, aries).max_health - 1);
    assert_eq!(events, vec![Event::SoundPlayed { cue: SoundCue::Hit }]);
}

#[test]
fn invulnerable_player_absorbs_bullets() {
    let config = SimulationConfig {
        player_invulnerable: true,
        ..SimulationConfig::default()
    };
    let mut world = world_with(config, &[]);
    let mut events = Vec::new();
    let player = world.spawn_player(&mut events);
    let bullet = spawn(&mut world, EntityKind::Bullet, Faction::Evil, Vec2::new(1.6, 1.5), 180.0);
    events.clear();

    CollisionResolver::default().resolve_bullets_vs_entities(&mut world, &mut events);

    assert!(entity(&world, bullet).is_garbage);
    assert_eq!(entity(&world, player).health, entity(&world, player).max_health);
    assert!(events.is_empty());
}

#[test]
fn dead_player_is_not_a_target() {
    let mut world = world_with(SimulationConfig::default(), &[]);
    let mut events = Vec::new();
    let player = world.spawn_player(&mut events);
    world.collision_parts().1.get_mut(player).expect("player").is_dead = true;
    let bullet = spawn(&mut world, EntityKind::Bullet, Faction::Evil, Vec2::new(1.6, 1.5), 180.0);
    events.clear();

    CollisionResolver::default().resolve_bullets_vs_entities(&mut world, &mut events);

    assert!(!entity(&world, bullet).is_garbage);
    assert!(events.is_empty());
}

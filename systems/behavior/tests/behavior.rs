use std::sync::Arc;

use glam::Vec2;
use libra_core::{Command, EntityId, EntityKind, Faction, SimulationConfig, SoundCue, TileCoords, TileDefinitionTable};
use libra_system_behavior::{line_of_sight, Behavior, ControlInput};
use libra_world::{query, BehaviorState, Grid, World};

fn open_world() -> World {
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
        3,
    )
}

fn walled_world() -> World {
    let definitions = Arc::new(
        TileDefinitionTable::from_toml_str(
            "[[tile]]\nname = \"Grass\"\n[[tile]]\nname = \"Rock\"\nsolid = true\n",
        )
        .expect("tiles parse"),
    );
    let grass = definitions.id("Grass").expect("grass");
    let rock = definitions.id("Rock").expect("rock");
    let mut grid = Grid::filled(12, 12, grass, definitions);
    for y in 0..12 {
        assert!(grid.set_definition(TileCoords::new(7, y), rock));
    }
    World::from_grid(grid, SimulationConfig::default(), 3)
}

fn spawn(world: &mut World, kind: EntityKind, faction: Faction, position: Vec2, orientation: f32) -> EntityId {
    let mut events = Vec::new();
    world.spawn(kind, faction, position, orientation, &mut events)
}

fn run(world: &mut World, input: ControlInput, dt: f32) -> Vec<Command> {
    let mut commands = Vec::new();
    Behavior::default()
        .handle(world, &input, dt, &mut commands)
        .expect("behaviour pass succeeds");
    commands
}

fn spawned_kinds(commands: &[Command]) -> Vec<(EntityKind, Faction)> {
    commands
        .iter()
        .filter_map(|command| match command {
            Command::SpawnEntity { kind, faction, .. } => Some((*kind, *faction)),
            _ => None,
        })
        .collect()
}

fn sounds(commands: &[Command]) -> Vec<SoundCue> {
    commands
        .iter()
        .filter_map(|command| match command {
            Command::PlaySound { cue } => Some(*cue),
            _ => None,
        })
        .collect()
}

#[test]
fn projectiles_fly_along_their_heading() {
    let mut world = open_world();
    let bolt = spawn(&mut world, EntityKind::Bolt, Faction::Good, Vec2::new(5.5, 5.5), 0.0);

    let _ = run(&mut world, ControlInput::default(), 0.1);

    let position = query::entity(&world, bolt).expect("bolt").position;
    assert!((position - Vec2::new(5.8, 5.5)).length() < 1e-4);
}

#[test]
fn flames_burn_out() {
    let mut world = open_world();
    let flame = spawn(&mut world, EntityKind::Fire, Faction::Good, Vec2::new(5.5, 5.5), 0.0);

    let _ = run(&mut world, ControlInput::default(), 0.3);
    assert!(!query::entity(&world, flame).expect("flame").is_garbage);
    let _ = run(&mut world, ControlInput::default(), 0.3);
    let flame = query::entity(&world, flame).expect("flame");
    assert!(flame.is_dead);
    assert!(flame.is_garbage);
}

#[test]
fn player_fires_bolts_from_the_turret() {
    let mut world = open_world();
    let mut events = Vec::new();
    let _ = world.spawn_player(&mut events);
    let input = ControlInput {
        fire_bolt: true,
        ..ControlInput::default()
    };

    let commands = run(&mut world, input, 0.2);

    assert_eq!(spawned_kinds(&commands), vec![(EntityKind::Bolt, Faction::Good)]);
    assert_eq!(sounds(&commands), vec![SoundCue::Fire]);
    let Some(Command::SpawnEntity { orientation, .. }) = commands.first() else {
        panic!("expected a spawn command first");
    };
    assert_eq!(*orientation, 45.0);
}

#[test]
fn player_drives_toward_the_stick_heading() {
    let mut world = open_world();
    let mut events = Vec::new();
    let player = world.spawn_player(&mut events);
    let input = ControlInput {
        move_direction: Some(45.0),
        ..ControlInput::default()
    };

    let _ = run(&mut world, input, 0.5);

    let tank = query::entity(&world, player).expect("player");
    let expected = Vec2::new(1.5, 1.5) + Vec2::splat(0.5 * std::f32::consts::FRAC_1_SQRT_2);
    assert!((tank.position - expected).length() < 1e-4);
}

#[test]
fn dead_players_stay_put() {
    let mut world = open_world();
    let mut events = Vec::new();
    let player = world.spawn_player(&mut events);
    world.collision_parts().1.get_mut(player).expect("player").is_dead = true;
    let input = ControlInput {
        move_direction: Some(0.0),
        fire_bolt: true,
        ..ControlInput::default()
    };

    let commands = run(&mut world, input, 0.5);

    assert!(commands.is_empty());
    assert_eq!(query::entity(&world, player).expect("player").position, Vec2::new(1.5, 1.5));
}

#[test]
fn turret_acquires_and_fires_at_visible_player() {
    let mut world = open_world();
    let mut events = Vec::new();
    let player = world.spawn_player(&mut events);
    world.collision_parts().1.get_mut(player).expect("player").position = Vec2::new(8.5, 5.5);
    let turret = spawn(&mut world, EntityKind::Scorpio, Faction::Evil, Vec2::new(5.5, 5.5), 0.0);

    let commands = run(&mut world, ControlInput::default(), 0.5);

    assert_eq!(spawned_kinds(&commands), vec![(EntityKind::Bolt, Faction::Evil)]);
    assert_eq!(sounds(&commands), vec![SoundCue::FindPlayer, SoundCue::Fire]);
    let BehaviorState::Turret(state) = &query::entity(&world, turret).expect("turret").behavior else {
        panic!("turret state expected");
    };
    assert!(state.player_in_sight);
}

#[test]
fn turret_sweeps_when_player_is_hidden() {
    let mut world = walled_world();
    let mut events = Vec::new();
    let player = world.spawn_player(&mut events);
    world.collision_parts().1.get_mut(player).expect("player").position = Vec2::new(9.5, 5.5);
    let turret = spawn(&mut world, EntityKind::Scorpio, Faction::Evil, Vec2::new(4.5, 5.5), 0.0);

    let commands = run(&mut world, ControlInput::default(), 0.1);

    assert!(commands.is_empty());
    let orientation = query::entity(&world, turret).expect("turret").orientation;
    assert!((orientation - 357.0).abs() < 1e-3);
}

#[test]
fn walls_block_line_of_sight() {
    let world = walled_world();
    let blocked = line_of_sight(&world, Vec2::new(4.5, 5.5), Vec2::new(9.5, 5.5), 0.4, 10.0);
    assert!(!blocked.visible);
    assert!((blocked.end.x - 7.0).abs() < 1e-4);

    let clear = line_of_sight(&world, Vec2::new(1.5, 5.5), Vec2::new(5.5, 5.5), 0.4, 10.0);
    assert!(clear.visible);
    assert!((clear.end.x - 5.1).abs() < 1e-4);

    let too_far = line_of_sight(&world, Vec2::new(1.5, 1.5), Vec2::new(1.5, 11.5), 0.4, 5.0);
    assert!(!too_far.visible);
}

#[test]
fn leo_picks_a_reachable_patrol_target() {
    let mut world = open_world();
    let leo = spawn(&mut world, EntityKind::Leo, Faction::Evil, Vec2::new(5.5, 5.5), 0.0);

    let _ = run(&mut world, ControlInput::default(), 0.1);

    let entity = query::entity(&world, leo).expect("leo");
    let BehaviorState::Patrol(state) = &entity.behavior else {
        panic!("patrol state expected");
    };
    let target = state.target.expect("target chosen");
    let target_tile = TileCoords::containing(target);
    assert!(state.heat_map.is_reachable(target_tile));
    assert!(!world.is_tile_border(target_tile));
}

#[test]
fn leo_shoots_an_aligned_visible_player() {
    let mut world = open_world();
    let mut events = Vec::new();
    let player = world.spawn_player(&mut events);
    world.collision_parts().1.get_mut(player).expect("player").position = Vec2::new(6.5, 5.5);
    let leo = spawn(&mut world, EntityKind::Leo, Faction::Evil, Vec2::new(3.5, 5.5), 0.0);

    let commands = run(&mut world, ControlInput::default(), 1.0);

    assert_eq!(spawned_kinds(&commands), vec![(EntityKind::Bullet, Faction::Evil)]);
    let entity = query::entity(&world, leo).expect("leo");
    let BehaviorState::Patrol(state) = &entity.behavior else {
        panic!("patrol state expected");
    };
    assert_eq!(state.target, Some(Vec2::new(6.5, 5.5)));
    assert!(entity.position.x > 3.5);
}

#[test]
fn aries_never_fires() {
    let mut world = open_world();
    let mut events = Vec::new();
    let player = world.spawn_player(&mut events);
    world.collision_parts().1.get_mut(player).expect("player").position = Vec2::new(6.5, 5.5);
    let _ = spawn(&mut world, EntityKind::Aries, Faction::Evil, Vec2::new(3.5, 5.5), 0.0);

    let commands = run(&mut world, ControlInput::default(), 1.0);

    assert!(spawned_kinds(&commands).is_empty());
}

#[test]
fn leo_announces_the_player_once_per_sighting() {
    let mut world = open_world();
    let mut events = Vec::new();
    let player = world.spawn_player(&mut events);
    world.collision_parts().1.get_mut(player).expect("player").position = Vec2::new(6.5, 5.5);
    let leo = spawn(&mut world, EntityKind::Leo, Faction::Evil, Vec2::new(3.5, 5.5), 0.0);
    let mut behavior = Behavior::default();
    let mut step = |world: &mut World| {
        let mut commands = Vec::new();
        behavior
            .handle(world, &ControlInput::default(), 0.5, &mut commands)
            .expect("behaviour pass succeeds");
        commands
    };

    let first = step(&mut world);
    assert!(sounds(&first).contains(&SoundCue::FindPlayer));
    let BehaviorState::Patrol(state) = &query::entity(&world, leo).expect("leo").behavior else {
        panic!("patrol state expected");
    };
    assert!(state.player_in_sight);

    let second = step(&mut world);
    assert!(!sounds(&second).contains(&SoundCue::FindPlayer));
}

//! Leo and Aries tanks: patrol reachable ground, chase the player on sight.

use glam::Vec2;
use libra_core::{
    geometry::{
        degrees_of, direction_from_degrees, shortest_angular_displacement, turn_toward,
        wrap_degrees,
    },
    Command, EntityKind, Faction, SoundCue, TileCoords,
};
use libra_world::{query, BehaviorState, BlockingPolicy, Entity, World};
use log::debug;

use crate::sight::line_of_sight;

/// Largest heading error at which the tank still drives forward, in degrees.
const DRIVE_CONE: f32 = 45.0;
/// Largest aim error that still fires, in degrees.
const FIRE_CONE: f32 = 5.0;
/// Seconds between shots.
const FIRE_INTERVAL: f32 = 1.0;
/// Within this distance the tank faces the player instead of its waypoint.
const FACE_PLAYER_DISTANCE: f32 = 2.0;
/// Distance from the hull centre to the muzzle.
const MUZZLE_OFFSET: f32 = 0.3;
/// Minimum seconds between sighting cues.
const SIGHTING_INTERVAL: f32 = 0.5;

pub(crate) fn update(entity: &mut Entity, world: &mut World, dt: f32, out: &mut Vec<Command>) {
    let config = query::config(world);
    let (range, player_radius) = (config.enemy_view_range, config.entity_base_radius);
    let (move_speed, turn_speed) = (config.enemy_move_speed, config.enemy_turn_speed);
    let player = query::player(world)
        .filter(|player| !player.is_dead)
        .map(|player| player.position)
        .filter(|target| line_of_sight(world, entity.position, *target, player_radius, range).visible);

    let position = entity.position;
    let radius = entity.physical_radius;
    let tile = TileCoords::containing(position);
    let can_fire = entity.kind() == EntityKind::Leo;
    let BehaviorState::Patrol(state) = &mut entity.behavior else {
        return;
    };
    state.fire_cooldown += dt;
    state.sighting_timer += dt;
    if player.is_some() && !state.player_in_sight && state.sighting_timer >= SIGHTING_INTERVAL {
        state.sighting_timer = 0.0;
        debug!("patrol at {position} spotted the player");
        out.push(Command::PlaySound {
            cue: SoundCue::FindPlayer,
        });
    }
    state.player_in_sight = player.is_some();

    let needs_target = state.path.is_empty()
        || state
            .target
            .map_or(true, |target| target.distance(position) < radius);
    if needs_target {
        world.populate_distance_field_into(&mut state.heat_map, tile, BlockingPolicy::STRICT);
        state.target = world.valid_patrol_position(&state.heat_map);
        state.path = plan(world, tile, state.target);
    }
    if let Some(target) = player {
        state.target = Some(TileCoords::containing(target).center());
        state.path = plan(world, tile, state.target);
    }

    while state.path.last().map_or(false, |next| next.distance(position) < radius) {
        let _ = state.path.pop();
    }
    let waypoint = state.path.last().copied();

    let goal_heading = match (player, waypoint) {
        (Some(target), _) if target.distance(position) < FACE_PLAYER_DISTANCE => {
            Some(degrees_of(target - position))
        }
        (_, Some(next)) => Some(degrees_of(next - position)),
        (Some(target), None) => Some(degrees_of(target - position)),
        (None, None) => None,
    };
    if let Some(goal) = goal_heading {
        entity.orientation = wrap_degrees(turn_toward(entity.orientation, goal, turn_speed * dt));
    }

    entity.velocity = match waypoint {
        Some(next)
            if shortest_angular_displacement(entity.orientation, degrees_of(next - position)).abs()
                <= DRIVE_CONE =>
        {
            direction_from_degrees(entity.orientation) * move_speed
        }
        _ => Vec2::ZERO,
    };
    entity.position += entity.velocity * dt;

    let Some(target) = player else {
        return;
    };
    let aim_error = shortest_angular_displacement(entity.orientation, degrees_of(target - position)).abs();
    if can_fire && state.fire_cooldown >= FIRE_INTERVAL && aim_error <= FIRE_CONE {
        state.fire_cooldown = 0.0;
        out.push(Command::SpawnEntity {
            kind: EntityKind::Bullet,
            faction: Faction::Evil,
            position: position + direction_from_degrees(entity.orientation) * MUZZLE_OFFSET,
            orientation: entity.orientation,
        });
        out.push(Command::PlaySound { cue: SoundCue::Fire });
    }
}

fn plan(world: &World, from: TileCoords, target: Option<Vec2>) -> Vec<Vec2> {
    match target {
        Some(target) => world.generate_path_to_goal(from, TileCoords::containing(target)),
        None => Vec::new(),
    }
}

//! Scorpio turret: sweeps until it sees the player, then tracks and fires.

use libra_core::{
    geometry::{degrees_of, direction_from_degrees, shortest_angular_displacement, turn_toward, wrap_degrees, Ray},
    Command, EntityKind, Faction, SoundCue,
};
use libra_world::{query, BehaviorState, Entity, World};
use log::debug;

use crate::sight::line_of_sight;

/// Tracking rate in degrees per second.
const TRACK_SPEED: f32 = 60.0;
/// Idle sweep rate in degrees per second.
const SWEEP_SPEED: f32 = -30.0;
/// Seconds between shots.
const FIRE_INTERVAL: f32 = 0.3;
/// Largest aim error that still fires, in degrees.
const FIRE_CONE: f32 = 5.0;
/// Minimum seconds between sighting cues.
const SIGHTING_INTERVAL: f32 = 0.5;
/// Distance from the turret centre to the muzzle.
const MUZZLE_OFFSET: f32 = 0.5;

pub(crate) fn update(entity: &mut Entity, world: &mut World, dt: f32, out: &mut Vec<Command>) {
    let config = query::config(world);
    let (range, player_radius) = (config.enemy_view_range, config.entity_base_radius);
    let sight = query::player(world)
        .filter(|player| !player.is_dead)
        .map(|player| {
            (
                player.position,
                line_of_sight(world, entity.position, player.position, player_radius, range),
            )
        });

    let position = entity.position;
    let BehaviorState::Turret(state) = &mut entity.behavior else {
        return;
    };
    state.fire_timer += dt;
    state.sighting_timer += dt;

    match sight {
        Some((target, line)) if line.visible => {
            if !state.player_in_sight && state.sighting_timer >= SIGHTING_INTERVAL {
                state.sighting_timer = 0.0;
                debug!("turret at {position} acquired the player");
                out.push(Command::PlaySound {
                    cue: SoundCue::FindPlayer,
                });
            }
            state.player_in_sight = true;
            state.laser_end = line.end;

            let goal = degrees_of(target - position);
            entity.orientation = wrap_degrees(turn_toward(entity.orientation, goal, TRACK_SPEED * dt));
            let aim_error = shortest_angular_displacement(entity.orientation, goal).abs();
            if state.fire_timer >= FIRE_INTERVAL && aim_error <= FIRE_CONE {
                state.fire_timer = 0.0;
                out.push(Command::SpawnEntity {
                    kind: EntityKind::Bolt,
                    faction: Faction::Evil,
                    position: position + direction_from_degrees(entity.orientation) * MUZZLE_OFFSET,
                    orientation: entity.orientation,
                });
                out.push(Command::PlaySound { cue: SoundCue::Fire });
            }
        }
        _ => {
            state.player_in_sight = false;
            entity.orientation = wrap_degrees(entity.orientation + SWEEP_SPEED * dt);
            let ray = Ray::new(position, direction_from_degrees(entity.orientation), range);
            state.laser_end = world.raycast_vs_tiles(&ray).position;
        }
    }
}

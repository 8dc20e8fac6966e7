//! Player tank driving and weapons.

use glam::Vec2;
use libra_core::{
    geometry::{direction_from_degrees, turn_toward, wrap_degrees},
    Command, EntityKind, Faction, SoundCue,
};
use libra_world::{query, BehaviorState, Entity, World};

use crate::ControlInput;

/// Seconds between bolts.
const BOLT_COOLDOWN: f32 = 0.1;
/// Seconds between flames.
const FLAME_COOLDOWN: f32 = 0.005;
/// Half-angle of the flame spray in degrees.
const FLAME_SPREAD: f32 = 30.0;
/// Distance from the hull centre to the muzzle.
const MUZZLE_OFFSET: f32 = 0.5;

pub(crate) fn update(
    entity: &mut Entity,
    world: &mut World,
    input: &ControlInput,
    dt: f32,
    out: &mut Vec<Command>,
) {
    if entity.is_dead {
        entity.velocity = Vec2::ZERO;
        return;
    }
    let config = query::config(world);
    let (move_speed, turn_speed) = (config.player_move_speed, config.player_turn_speed);

    match input.move_direction {
        Some(heading) => {
            entity.orientation = wrap_degrees(turn_toward(entity.orientation, heading, turn_speed * dt));
            entity.velocity = entity.forward() * move_speed;
        }
        None => entity.velocity = Vec2::ZERO,
    }
    entity.position += entity.velocity * dt;

    let position = entity.position;
    let BehaviorState::Player(state) = &mut entity.behavior else {
        return;
    };
    if let Some(aim) = input.aim_direction {
        state.turret_orientation = wrap_degrees(turn_toward(state.turret_orientation, aim, turn_speed * dt));
    }
    state.bolt_cooldown += dt;
    state.flame_cooldown += dt;

    let muzzle = position + direction_from_degrees(state.turret_orientation) * MUZZLE_OFFSET;
    if input.fire_bolt && state.bolt_cooldown >= BOLT_COOLDOWN {
        state.bolt_cooldown = 0.0;
        out.push(Command::SpawnEntity {
            kind: EntityKind::Bolt,
            faction: Faction::Good,
            position: muzzle,
            orientation: state.turret_orientation,
        });
        out.push(Command::PlaySound { cue: SoundCue::Fire });
    }
    if input.fire_flame && state.flame_cooldown >= FLAME_COOLDOWN {
        state.flame_cooldown = 0.0;
        let spread = world.random_range(-FLAME_SPREAD, FLAME_SPREAD);
        out.push(Command::SpawnEntity {
            kind: EntityKind::Fire,
            faction: Faction::Good,
            position: muzzle,
            orientation: wrap_degrees(state.turret_orientation + spread),
        });
    }
}

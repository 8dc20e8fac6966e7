//! Projectile flight.

use libra_world::{query, BehaviorState, Entity, World};

/// Advances a projectile along its heading, or its reflected velocity once
/// it has bounced. Projectiles with a lifetime expire in place.
pub(crate) fn update(entity: &mut Entity, world: &World, dt: f32) {
    let speed = query::config(world).bullet_speed;
    let forward = entity.forward();
    let BehaviorState::Projectile(state) = &mut entity.behavior else {
        return;
    };

    state.age += dt;
    if state.lifetime.map_or(false, |lifetime| state.age >= lifetime) {
        entity.is_dead = true;
        entity.is_garbage = true;
        return;
    }
    if !state.has_bounced {
        entity.velocity = forward * speed;
    }
    entity.position += entity.velocity * dt;
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-kind entity behaviours.
//!
//! Every entity kind maps onto one behaviour function. Behaviours move their
//! entity, consult the world's navigation and visibility helpers, and request
//! deferred mutations (projectile spawns, sound cues) as [`Command`] values
//! that the simulation applies once every entity has been updated.

use libra_core::{Command, EntityId, EntityKind};
use libra_world::{query, Entity, World, WorldError};

mod patrol;
mod player;
mod projectile;
mod sight;
mod turret;

pub use sight::{line_of_sight, SightLine};

/// Controller state sampled by an adapter before the frame runs.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ControlInput {
    /// Desired hull heading in degrees, `None` while the stick is idle.
    pub move_direction: Option<f32>,
    /// Desired turret heading in degrees, `None` to hold the current aim.
    pub aim_direction: Option<f32>,
    /// Fire a bolt when the cooldown allows.
    pub fire_bolt: bool,
    /// Spray flames when the cooldown allows.
    pub fire_flame: bool,
}

/// System that runs every entity's behaviour once per frame.
#[derive(Debug, Default)]
pub struct Behavior {
    scratch: Vec<EntityId>,
}

impl Behavior {
    /// Updates every registered entity, collecting the commands they request.
    ///
    /// Entities are visited in registry order. Each one is detached from the
    /// registry while it runs, so it observes every other entity but not
    /// itself.
    pub fn handle(
        &mut self,
        world: &mut World,
        input: &ControlInput,
        dt: f32,
        out: &mut Vec<Command>,
    ) -> Result<(), WorldError> {
        self.scratch.clear();
        self.scratch.extend(query::registry(world).all());

        for id in &self.scratch {
            let _ = world.with_entity(*id, |entity, world| update_entity(entity, world, input, dt, out))?;
        }
        Ok(())
    }
}

/// Runs the behaviour of a single entity.
pub fn update_entity(
    entity: &mut Entity,
    world: &mut World,
    input: &ControlInput,
    dt: f32,
    out: &mut Vec<Command>,
) {
    match entity.kind() {
        EntityKind::PlayerTank => player::update(entity, world, input, dt, out),
        EntityKind::Scorpio => turret::update(entity, world, dt, out),
        EntityKind::Leo | EntityKind::Aries => patrol::update(entity, world, dt, out),
        EntityKind::Bolt | EntityKind::Bullet | EntityKind::Shell | EntityKind::Fire => {
            projectile::update(entity, world, dt);
        }
    }
}

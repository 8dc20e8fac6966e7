#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Collision and combat resolution.
//!
//! [`CollisionResolver`] runs four passes in a fixed order every frame:
//! agents are pushed out of terrain, overlapping agents are separated,
//! projectiles ricochet off and damage tiles, and projectiles damage hostile
//! agents. Each pass mutates the world directly and reports noteworthy
//! outcomes as [`Event`] values.

use glam::Vec2;
use libra_core::{
    geometry::{
        degrees_of, discs_overlap, push_disc_out_of_aabb, push_disc_out_of_disc,
        push_discs_out_of_each_other, raycast_vs_disc, reflect, shortest_angular_displacement, Ray,
    },
    EntityId, EntityKind, Event, Faction, SoundCue, TileCoords,
};
use libra_world::{raycast_vs_tiles, BehaviorState, Entity, TileStrike, World};
use log::debug;

/// Length of the probe a projectile casts ahead of itself against tiles.
const TILE_PROBE_LENGTH: f32 = 0.1;
/// Distance past the impact point used to pick the struck tile.
const TILE_PROBE_OVERSHOOT: f32 = 0.1;
/// Length of the probe a projectile casts against a shield.
const SHIELD_PROBE_LENGTH: f32 = 0.001;
/// Half-angle of the arc a shield covers, in degrees.
const SHIELD_HALF_ARC: f32 = 45.0;
/// Amount by which a shielded hull is smaller for unshielded hits.
const SHIELD_HULL_INSET: f32 = 0.1;

/// Runs the per-frame collision passes.
#[derive(Debug, Default)]
pub struct CollisionResolver {
    entities: Vec<EntityId>,
    agents: Vec<EntityId>,
    bullets: Vec<EntityId>,
}

impl CollisionResolver {
    /// Runs every pass in order.
    pub fn resolve(&mut self, world: &mut World, out_events: &mut Vec<Event>) {
        self.push_out_of_terrain(world);
        self.resolve_agent_collisions(world);
        self.resolve_bullets_vs_tiles(world, out_events);
        self.resolve_bullets_vs_entities(world, out_events);
    }

    /// Pushes non-projectile entities out of solid tiles and, unless they can
    /// swim, out of water tiles.
    ///
    /// Only the 3×3 neighbourhood of each entity is examined, and a tile that
    /// contains the entity centre is skipped.
    pub fn push_out_of_terrain(&mut self, world: &mut World) {
        let (grid, registry, config) = world.collision_parts();
        self.entities.clear();
        self.entities.extend(registry.all());

        for id in &self.entities {
            let Some(entity) = registry.get_mut(*id) else {
                continue;
            };
            if entity.kind().is_bullet() || !entity.is_pushed_by_walls {
                continue;
            }
            if entity.kind() == EntityKind::PlayerTank && config.player_ignores_walls {
                continue;
            }

            let center_tile = TileCoords::containing(entity.position);
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let tile = center_tile.offset(dx, dy);
                    let bounds = grid.tile_bounds(tile);
                    if bounds.contains(entity.position) {
                        continue;
                    }
                    let blocked = grid.is_solid(tile) || (grid.is_water(tile) && !entity.can_swim);
                    if blocked {
                        push_disc_out_of_aabb(&mut entity.position, entity.physical_radius, &bounds);
                    }
                }
            }
        }
    }

    /// Separates every ordered pair of distinct overlapping agents according
    /// to their push flags.
    pub fn resolve_agent_collisions(&mut self, world: &mut World) {
        let (_, registry, _) = world.collision_parts();
        self.agents.clear();
        self.agents.extend(registry.agents());

        for &a in &self.agents {
            for &b in &self.agents {
                if a == b {
                    continue;
                }
                let Some((first, second)) = registry.pair_mut(a, b) else {
                    continue;
                };
                separate(first, second);
            }
        }
    }

    /// Ricochets projectiles off solid tiles, damaging the tiles they strike.
    pub fn resolve_bullets_vs_tiles(&mut self, world: &mut World, out_events: &mut Vec<Event>) {
        let (grid, registry, _) = world.collision_parts();
        self.bullets.clear();
        self.bullets.extend(registry.bullets());

        for id in &self.bullets {
            let Some(bullet) = registry.get_mut(*id) else {
                continue;
            };
            let forward = bullet.forward();
            let ray = Ray::new(bullet.position, forward, TILE_PROBE_LENGTH);
            let hit = raycast_vs_tiles(grid, &ray);
            if !hit.did_impact {
                continue;
            }

            if bullet.kind() != EntityKind::Fire {
                let tile = TileCoords::containing(hit.position + forward * TILE_PROBE_OVERSHOOT);
                match grid.strike(tile) {
                    TileStrike::Unaffected => {}
                    TileStrike::Damaged { health } => {
                        out_events.push(Event::TileDamaged { tile, health });
                    }
                    TileStrike::Destroyed { replacement } => {
                        debug!("tile {tile:?} destroyed");
                        out_events.push(Event::TileDestroyed { tile, replacement });
                    }
                }
            }

            bounce(bullet, hit.normal);
            bullet.health -= 1;
        }
    }

    /// Applies projectile hits to agents of the opposing faction.
    pub fn resolve_bullets_vs_entities(&mut self, world: &mut World, out_events: &mut Vec<Event>) {
        let (_, registry, config) = world.collision_parts();
        let player_invulnerable = config.player_invulnerable;

        for faction in [Faction::Good, Faction::Evil] {
            let Some(hostile) = faction.hostile() else {
                continue;
            };
            self.bullets.clear();
            self.bullets.extend(registry.bullets_of(faction));
            self.agents.clear();
            self.agents.extend(registry.agents_of(hostile));

            for &bullet_id in &self.bullets {
                for &target_id in &self.agents {
                    let Some((bullet, target)) = registry.pair_mut(bullet_id, target_id) else {
                        continue;
                    };
                    if !bullet.is_alive() || !target.is_hit_by_bullets {
                        continue;
                    }
                    if target.kind() == EntityKind::PlayerTank && target.is_dead {
                        continue;
                    }

                    let mut hull_radius = target.physical_radius;
                    if target.kind() == EntityKind::Aries {
                        match shield_contact(bullet, target) {
                            ShieldContact::Deflected { normal } => {
                                bounce(bullet, normal);
                                bullet.health -= 1;
                                continue;
                            }
                            ShieldContact::Receding => continue,
                            ShieldContact::Exposed => hull_radius -= SHIELD_HULL_INSET,
                        }
                    }
                    if !discs_overlap(bullet.position, bullet.physical_radius, target.position, hull_radius) {
                        continue;
                    }

                    bullet.health = 0;
                    bullet.is_dead = true;
                    bullet.is_garbage = true;
                    if target.kind() == EntityKind::PlayerTank && player_invulnerable {
                        continue;
                    }
                    target.health -= 1;
                    out_events.push(Event::SoundPlayed { cue: SoundCue::Hit });
                }
            }
        }
    }
}

fn separate(a: &mut Entity, b: &mut Entity) {
    let a_pushes_b = a.does_push_entities && b.is_pushed_by_entities;
    let b_pushes_a = b.does_push_entities && a.is_pushed_by_entities;
    match (a_pushes_b, b_pushes_a) {
        (true, true) => push_discs_out_of_each_other(
            &mut a.position,
            a.physical_radius,
            &mut b.position,
            b.physical_radius,
        ),
        (true, false) => push_disc_out_of_disc(&mut b.position, b.physical_radius, a.position, a.physical_radius),
        (false, true) => push_disc_out_of_disc(&mut a.position, a.physical_radius, b.position, b.physical_radius),
        (false, false) => {}
    }
}

/// Reflects a projectile's velocity and points it along the new velocity.
fn bounce(bullet: &mut Entity, normal: Vec2) {
    bullet.velocity = reflect(bullet.velocity, normal);
    if bullet.velocity != Vec2::ZERO {
        bullet.orientation = degrees_of(bullet.velocity);
    }
    if let BehaviorState::Projectile(state) = &mut bullet.behavior {
        state.has_bounced = true;
    }
}

/// How a projectile meets a shielded hull.
enum ShieldContact {
    /// The projectile strikes the shield head-on and bounces off.
    Deflected { normal: Vec2 },
    /// The projectile is inside the shield arc but already flying away.
    Receding,
    /// The shield does not cover the projectile.
    Exposed,
}

fn shield_contact(bullet: &Entity, shielded: &Entity) -> ShieldContact {
    let forward = bullet.forward();
    let probe = Ray::new(bullet.position, forward, SHIELD_PROBE_LENGTH);
    let hit = raycast_vs_disc(&probe, shielded.position, shielded.physical_radius);
    if !hit.did_impact {
        return ShieldContact::Exposed;
    }
    let bearing = degrees_of(hit.position - shielded.position);
    if shortest_angular_displacement(shielded.orientation, bearing).abs() > SHIELD_HALF_ARC {
        return ShieldContact::Exposed;
    }
    if forward.dot(shielded.position - bullet.position) > 0.0 {
        ShieldContact::Deflected { normal: hit.normal }
    } else {
        ShieldContact::Receding
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame orchestration for the Libra simulation.
//!
//! [`Simulation::step`] advances the world by one frame, walking the
//! [`StepPhase`] sequence: behaviours run and their commands are applied,
//! the collision passes resolve terrain, agents, and projectiles, entities out
//! of health are flagged, and garbage is swept from the registry.

use libra_core::{Command, EntityId, EntityKind, Event, SoundCue};
use libra_system_behavior::{Behavior, ControlInput};
use libra_system_collision::CollisionResolver;
use libra_world::{apply, query, World, WorldError};
use log::debug;

/// Diameter of the explosion left behind by a destroyed agent.
const AGENT_EXPLOSION_SIZE: f32 = 1.5;
/// Lifetime of the explosion left behind by a destroyed agent.
const AGENT_EXPLOSION_DURATION: f32 = 1.0;
/// Diameter of the puff left behind by a spent projectile.
const BULLET_EXPLOSION_SIZE: f32 = 0.5;
/// Lifetime of the puff left behind by a spent projectile.
const BULLET_EXPLOSION_DURATION: f32 = 0.2;

/// Stages of a single frame, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StepPhase {
    /// Runs every behaviour and applies the commands they request.
    UpdateBehavior,
    /// Pushes agents out of solid and water tiles.
    PushOutOfTerrain,
    /// Separates overlapping agents.
    ResolveAgentCollisions,
    /// Ricochets projectiles off tiles.
    ResolveBulletsVsTiles,
    /// Applies projectile hits to agents.
    ResolveBulletsVsEntities,
    /// Flags entities whose health ran out.
    ApplyHealthAndFlagGarbage,
    /// Removes flagged entities from the registry.
    SweepGarbage,
}

impl StepPhase {
    /// Every phase in the order a frame runs them.
    pub const ORDER: [StepPhase; 7] = [
        StepPhase::UpdateBehavior,
        StepPhase::PushOutOfTerrain,
        StepPhase::ResolveAgentCollisions,
        StepPhase::ResolveBulletsVsTiles,
        StepPhase::ResolveBulletsVsEntities,
        StepPhase::ApplyHealthAndFlagGarbage,
        StepPhase::SweepGarbage,
    ];

    /// Phase that follows this one within the frame.
    #[must_use]
    pub const fn next(self) -> Option<StepPhase> {
        match self {
            Self::UpdateBehavior => Some(Self::PushOutOfTerrain),
            Self::PushOutOfTerrain => Some(Self::ResolveAgentCollisions),
            Self::ResolveAgentCollisions => Some(Self::ResolveBulletsVsTiles),
            Self::ResolveBulletsVsTiles => Some(Self::ResolveBulletsVsEntities),
            Self::ResolveBulletsVsEntities => Some(Self::ApplyHealthAndFlagGarbage),
            Self::ApplyHealthAndFlagGarbage => Some(Self::SweepGarbage),
            Self::SweepGarbage => None,
        }
    }
}

/// Drives the per-frame systems against a world.
#[derive(Debug, Default)]
pub struct Simulation {
    behavior: Behavior,
    collision: CollisionResolver,
    commands: Vec<Command>,
    casualties: Vec<EntityId>,
    paused: bool,
    frame: u64,
}

impl Simulation {
    /// Creates an unpaused simulation at frame zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports whether frames are currently skipped.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pauses or resumes the simulation.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Number of frames that have run to completion.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Advances the world by one frame of `dt` seconds.
    ///
    /// A paused simulation leaves the world untouched.
    pub fn step(
        &mut self,
        world: &mut World,
        input: &ControlInput,
        dt: f32,
        out_events: &mut Vec<Event>,
    ) -> Result<(), WorldError> {
        if self.paused {
            return Ok(());
        }
        let mut phase = Some(StepPhase::UpdateBehavior);
        while let Some(current) = phase {
            self.run_phase(current, world, input, dt, out_events)?;
            phase = current.next();
        }
        self.frame += 1;
        Ok(())
    }

    /// Runs a single phase of the frame.
    pub fn run_phase(
        &mut self,
        phase: StepPhase,
        world: &mut World,
        input: &ControlInput,
        dt: f32,
        out_events: &mut Vec<Event>,
    ) -> Result<(), WorldError> {
        match phase {
            StepPhase::UpdateBehavior => {
                world.age_explosions(dt);
                self.commands.clear();
                self.behavior.handle(world, input, dt, &mut self.commands)?;
                for command in self.commands.drain(..) {
                    apply(world, command, out_events);
                }
            }
            StepPhase::PushOutOfTerrain => self.collision.push_out_of_terrain(world),
            StepPhase::ResolveAgentCollisions => self.collision.resolve_agent_collisions(world),
            StepPhase::ResolveBulletsVsTiles => {
                self.collision.resolve_bullets_vs_tiles(world, out_events);
            }
            StepPhase::ResolveBulletsVsEntities => {
                self.collision.resolve_bullets_vs_entities(world, out_events);
            }
            StepPhase::ApplyHealthAndFlagGarbage => self.apply_health(world, out_events),
            StepPhase::SweepGarbage => {
                let swept = world.sweep_garbage(out_events)?;
                if swept > 0 {
                    debug!("frame {}: swept {swept} entities", self.frame);
                }
            }
        }
        Ok(())
    }

    fn apply_health(&mut self, world: &mut World, out_events: &mut Vec<Event>) {
        self.casualties.clear();
        self.casualties.extend(
            query::registry(world)
                .entities()
                .filter(|(_, entity)| entity.health <= 0)
                .map(|(id, _)| id),
        );

        for &id in &self.casualties {
            let (_, registry, _) = world.collision_parts();
            let Some(entity) = registry.get_mut(id) else {
                continue;
            };
            let kind = entity.kind();
            let position = entity.position;
            let newly_destroyed = kind.is_agent() && !entity.is_dead;
            entity.is_dead = true;
            if kind != EntityKind::PlayerTank {
                entity.is_garbage = true;
            }

            if newly_destroyed {
                debug!("{kind:?} {id:?} destroyed at {position}");
                apply(world, Command::PlaySound { cue: SoundCue::Dead }, out_events);
                apply(
                    world,
                    Command::SpawnExplosion {
                        position,
                        size: AGENT_EXPLOSION_SIZE,
                        duration: AGENT_EXPLOSION_DURATION,
                    },
                    out_events,
                );
                out_events.push(Event::AgentDestroyed { entity: id, kind });
            } else if kind.is_bullet() {
                apply(
                    world,
                    Command::SpawnExplosion {
                        position,
                        size: BULLET_EXPLOSION_SIZE,
                        duration: BULLET_EXPLOSION_DURATION,
                    },
                    out_events,
                );
            }
        }
    }
}

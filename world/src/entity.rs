//! Entity records and the per-kind state they carry.

use glam::Vec2;
use libra_core::{geometry::direction_from_degrees, EntityKind, Faction, SimulationConfig};

use crate::navigation::DistanceField;

/// Physical radius shared by every projectile.
const PROJECTILE_PHYSICAL_RADIUS: f32 = 0.1;
/// Cosmetic radius shared by every projectile.
const PROJECTILE_COSMETIC_RADIUS: f32 = 0.12;
/// Seconds a player flame survives.
const GOOD_FIRE_LIFETIME: f32 = 0.5;
/// Seconds an enemy flame survives.
const EVIL_FIRE_LIFETIME: f32 = 1.0;
/// Initial turret heading of the player tank.
const PLAYER_TURRET_ORIENTATION: f32 = 45.0;

/// Shared record for every simulated entity.
///
/// Identity (`kind`, `faction`) is fixed at construction; everything else is
/// mutated by behaviours and collision passes.
#[derive(Clone, Debug)]
pub struct Entity {
    kind: EntityKind,
    faction: Faction,
    /// World-space centre.
    pub position: Vec2,
    /// Heading in degrees.
    pub orientation: f32,
    /// World units per second.
    pub velocity: Vec2,
    /// Radius used for collisions.
    pub physical_radius: f32,
    /// Radius used for drawing.
    pub cosmetic_radius: f32,
    /// Remaining hit points.
    pub health: i32,
    /// Hit points at spawn.
    pub max_health: i32,
    /// Pushes other agents out of its way.
    pub does_push_entities: bool,
    /// Gets pushed by other agents.
    pub is_pushed_by_entities: bool,
    /// Gets pushed out of solid tiles.
    pub is_pushed_by_walls: bool,
    /// May be damaged by projectiles.
    pub is_hit_by_bullets: bool,
    /// May enter water tiles.
    pub can_swim: bool,
    /// Ran out of health.
    pub is_dead: bool,
    /// Scheduled for removal at the next sweep.
    pub is_garbage: bool,
    /// Kind-specific state.
    pub behavior: BehaviorState,
}

/// Kind-specific state, one variant per behaviour family.
#[derive(Clone, Debug)]
pub enum BehaviorState {
    /// Player tank controls.
    Player(PlayerState),
    /// Stationary turret.
    Turret(TurretState),
    /// Patrolling tank with its own heat map.
    Patrol(PatrolState),
    /// Projectile in flight.
    Projectile(ProjectileState),
}

/// State of the player tank.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerState {
    /// Turret heading in degrees.
    pub turret_orientation: f32,
    /// Seconds since the last bolt.
    pub bolt_cooldown: f32,
    /// Seconds since the last flame.
    pub flame_cooldown: f32,
}

/// State of a Scorpio turret.
#[derive(Clone, Debug, PartialEq)]
pub struct TurretState {
    /// Seconds since the last shot.
    pub fire_timer: f32,
    /// Seconds since the last sighting cue.
    pub sighting_timer: f32,
    /// Whether the player was visible this frame.
    pub player_in_sight: bool,
    /// End of the sight line drawn as a laser.
    pub laser_end: Vec2,
}

/// State of a patrolling tank.
#[derive(Clone, Debug, PartialEq)]
pub struct PatrolState {
    /// Current destination.
    pub target: Option<Vec2>,
    /// Remaining waypoints, next waypoint last.
    pub path: Vec<Vec2>,
    /// Seconds since the last shot.
    pub fire_cooldown: f32,
    /// Seconds since the last sighting cue.
    pub sighting_timer: f32,
    /// Whether the player was visible this frame.
    pub player_in_sight: bool,
    /// Reachability map used to choose patrol targets.
    pub heat_map: DistanceField,
}

/// State of a projectile.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectileState {
    /// Seconds since launch.
    pub age: f32,
    /// Seconds before the projectile expires on its own.
    pub lifetime: Option<f32>,
    /// Whether the projectile has ricocheted.
    pub has_bounced: bool,
}

impl Entity {
    /// Constructs an entity with the defaults of its kind.
    ///
    /// `grid_size` sizes the heat map owned by patrolling tanks.
    #[must_use]
    pub fn spawn(
        kind: EntityKind,
        faction: Faction,
        position: Vec2,
        orientation: f32,
        config: &SimulationConfig,
        grid_size: (i32, i32),
    ) -> Self {
        let mut entity = Self {
            kind,
            faction,
            position,
            orientation,
            velocity: Vec2::ZERO,
            physical_radius: config.entity_base_radius,
            cosmetic_radius: config.entity_turret_radius,
            health: 10,
            max_health: 10,
            does_push_entities: true,
            is_pushed_by_entities: true,
            is_pushed_by_walls: true,
            is_hit_by_bullets: true,
            can_swim: false,
            is_dead: false,
            is_garbage: false,
            behavior: BehaviorState::Projectile(ProjectileState {
                age: 0.0,
                lifetime: None,
                has_bounced: false,
            }),
        };

        match kind {
            EntityKind::PlayerTank => {
                entity.health = config.player_health;
                entity.behavior = BehaviorState::Player(PlayerState {
                    turret_orientation: PLAYER_TURRET_ORIENTATION,
                    bolt_cooldown: 0.0,
                    flame_cooldown: 0.0,
                });
            }
            EntityKind::Scorpio => {
                entity.health = config.scorpio_health;
                entity.is_pushed_by_entities = false;
                entity.behavior = BehaviorState::Turret(TurretState {
                    fire_timer: 0.0,
                    sighting_timer: 0.0,
                    player_in_sight: false,
                    laser_end: position,
                });
            }
            EntityKind::Leo | EntityKind::Aries => {
                entity.health = if kind == EntityKind::Leo {
                    config.leo_health
                } else {
                    config.aries_health
                };
                entity.behavior = BehaviorState::Patrol(PatrolState {
                    target: None,
                    path: Vec::new(),
                    fire_cooldown: 0.0,
                    sighting_timer: 0.0,
                    player_in_sight: false,
                    heat_map: DistanceField::new(grid_size.0, grid_size.1),
                });
            }
            EntityKind::Bolt | EntityKind::Bullet | EntityKind::Shell | EntityKind::Fire => {
                entity.health = match (kind, faction) {
                    (EntityKind::Bolt, Faction::Good) => 3,
                    (EntityKind::Bolt, _) => 2,
                    _ => 1,
                };
                entity.physical_radius = PROJECTILE_PHYSICAL_RADIUS;
                entity.cosmetic_radius = PROJECTILE_COSMETIC_RADIUS;
                entity.does_push_entities = false;
                entity.is_pushed_by_entities = false;
                entity.is_pushed_by_walls = false;
                entity.is_hit_by_bullets = false;
                entity.velocity = direction_from_degrees(orientation) * config.bullet_speed;
                let lifetime = match (kind, faction) {
                    (EntityKind::Fire, Faction::Good) => Some(GOOD_FIRE_LIFETIME),
                    (EntityKind::Fire, _) => Some(EVIL_FIRE_LIFETIME),
                    _ => None,
                };
                entity.behavior = BehaviorState::Projectile(ProjectileState {
                    age: 0.0,
                    lifetime,
                    has_bounced: false,
                });
            }
        }
        entity.max_health = entity.health;
        entity
    }

    /// Kind of the entity.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Allegiance of the entity.
    #[must_use]
    pub const fn faction(&self) -> Faction {
        self.faction
    }

    /// Unit vector along the entity heading.
    #[must_use]
    pub fn forward(&self) -> Vec2 {
        direction_from_degrees(self.orientation)
    }

    /// Heat map owned by patrolling tanks.
    #[must_use]
    pub fn heat_map(&self) -> Option<&DistanceField> {
        match &self.behavior {
            BehaviorState::Patrol(state) => Some(&state.heat_map),
            _ => None,
        }
    }

    /// Reports whether the entity is alive and not scheduled for removal.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.is_dead && !self.is_garbage
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Libra tank simulation.
//!
//! This crate defines the vocabulary that connects the authoritative world,
//! the per-frame systems, and the adapters. Systems inspect the world and
//! respond with [`Command`] values describing deferred mutations such as
//! spawning projectiles or playing sound cues. The world executes those
//! commands via its `apply` entry point and broadcasts [`Event`] values that
//! adapters forward to audio, effects, and logging collaborators.

use glam::Vec2;
use serde::{Deserialize, Serialize};

mod config;
mod definitions;
pub mod geometry;

pub use config::{ConfigError, SimulationConfig};
pub use definitions::{
    DefinitionError, EnemyCounts, MapDefinition, MapDefinitionTable, TileDefId, TileDefinition,
    TileDefinitionTable, Tint, WormSpec,
};

/// Integer tile coordinates. Negative and out-of-bounds values are representable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoords {
    x: i32,
    y: i32,
}

impl TileCoords {
    /// Creates a new tile coordinate pair.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column of the tile.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the tile.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the coordinate displaced by the provided step.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// Tile containing the provided world-space position.
    ///
    /// One tile spans one world unit, so this is the floor of each component.
    #[must_use]
    pub fn containing(position: Vec2) -> Self {
        Self {
            x: position.x.floor() as i32,
            y: position.y.floor() as i32,
        }
    }

    /// World-space centre of the tile.
    #[must_use]
    pub fn center(self) -> Vec2 {
        Vec2::new(self.x as f32 + 0.5, self.y as f32 + 0.5)
    }

    /// Computes the Manhattan distance between two tiles.
    #[must_use]
    pub fn manhattan_distance(self, other: TileCoords) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Closed set of entity kinds that inhabit a map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    /// Player-controlled tank.
    PlayerTank,
    /// Stationary turret that sweeps for the player.
    Scorpio,
    /// Patrolling tank that chases and shoots the player.
    Leo,
    /// Patrolling tank carrying a forward shield.
    Aries,
    /// Fast bouncing projectile.
    Bolt,
    /// Standard projectile fired by Leo tanks.
    Bullet,
    /// Heavy projectile.
    Shell,
    /// Short-lived flame projectile that never damages terrain.
    Fire,
}

impl EntityKind {
    /// Every entity kind in declaration order.
    pub const ALL: [EntityKind; 8] = [
        EntityKind::PlayerTank,
        EntityKind::Scorpio,
        EntityKind::Leo,
        EntityKind::Aries,
        EntityKind::Bolt,
        EntityKind::Bullet,
        EntityKind::Shell,
        EntityKind::Fire,
    ];

    /// Dense index of the kind, suitable for per-kind tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::PlayerTank => 0,
            Self::Scorpio => 1,
            Self::Leo => 2,
            Self::Aries => 3,
            Self::Bolt => 4,
            Self::Bullet => 5,
            Self::Shell => 6,
            Self::Fire => 7,
        }
    }

    /// Reports whether the kind is a projectile.
    #[must_use]
    pub const fn is_bullet(self) -> bool {
        matches!(self, Self::Bolt | Self::Bullet | Self::Shell | Self::Fire)
    }

    /// Reports whether the kind is a combatant.
    #[must_use]
    pub const fn is_agent(self) -> bool {
        !self.is_bullet()
    }
}

/// Allegiance of an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Faction {
    /// The player and the player's projectiles.
    Good,
    /// Entities that belong to nobody.
    Neutral,
    /// Enemies and their projectiles.
    Evil,
}

impl Faction {
    /// Every faction in declaration order.
    pub const ALL: [Faction; 3] = [Faction::Good, Faction::Neutral, Faction::Evil];

    /// Dense index of the faction, suitable for per-faction tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Good => 0,
            Self::Neutral => 1,
            Self::Evil => 2,
        }
    }

    /// Faction whose agents this faction's projectiles damage, if any.
    #[must_use]
    pub const fn hostile(self) -> Option<Faction> {
        match self {
            Self::Good => Some(Self::Evil),
            Self::Evil => Some(Self::Good),
            Self::Neutral => None,
        }
    }
}

/// Generation-tagged handle to an entity owned by the registry.
///
/// A handle whose slot has since been reused carries a stale generation and
/// resolves to nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    /// Creates a handle from its raw parts.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Arena slot referenced by the handle.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot at the time the handle was issued.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

/// Sound cues raised by the simulation for an audio collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    /// A weapon discharged.
    Fire,
    /// A projectile damaged an agent.
    Hit,
    /// An agent was destroyed.
    Dead,
    /// A turret acquired the player.
    FindPlayer,
}

/// Commands that express deferred world mutations requested by systems.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Requests that a new entity be constructed and registered.
    SpawnEntity {
        /// Kind of entity to construct.
        kind: EntityKind,
        /// Allegiance assigned to the entity.
        faction: Faction,
        /// World-space position of the new entity.
        position: Vec2,
        /// Heading in degrees.
        orientation: f32,
    },
    /// Requests that a sound cue be played.
    PlaySound {
        /// Cue to play.
        cue: SoundCue,
    },
    /// Requests a cosmetic explosion.
    SpawnExplosion {
        /// World-space centre of the explosion.
        position: Vec2,
        /// Diameter of the effect in world units.
        size: f32,
        /// Lifetime of the effect in seconds.
        duration: f32,
    },
}

/// Events broadcast by the world while the simulation advances.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Confirms that an entity was registered.
    EntitySpawned {
        /// Handle assigned to the entity.
        entity: EntityId,
        /// Kind of the entity.
        kind: EntityKind,
        /// Allegiance of the entity.
        faction: Faction,
    },
    /// Confirms that an entity was removed from every index.
    EntityRemoved {
        /// Handle that is no longer valid.
        entity: EntityId,
        /// Kind of the removed entity.
        kind: EntityKind,
    },
    /// Announces that an agent ran out of health.
    AgentDestroyed {
        /// Handle of the destroyed agent.
        entity: EntityId,
        /// Kind of the destroyed agent.
        kind: EntityKind,
    },
    /// A sound cue should be played.
    SoundPlayed {
        /// Cue to play.
        cue: SoundCue,
    },
    /// A cosmetic explosion started.
    ExplosionSpawned {
        /// World-space centre of the explosion.
        position: Vec2,
        /// Diameter of the effect in world units.
        size: f32,
        /// Lifetime of the effect in seconds.
        duration: f32,
    },
    /// A tile lost health to a projectile.
    TileDamaged {
        /// Tile that was struck.
        tile: TileCoords,
        /// Remaining health of the tile.
        health: i32,
    },
    /// A tile was replaced by its destroyed variant.
    TileDestroyed {
        /// Tile that changed.
        tile: TileCoords,
        /// Definition the tile now references.
        replacement: TileDefId,
    },
}

//! Tunable simulation parameters loaded once at startup.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Gameplay tuning threaded explicitly through the simulation.
///
/// Every field has a default, so a partial TOML document only overrides the
/// keys it names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Player tank speed in world units per second.
    pub player_move_speed: f32,
    /// Player hull and turret turn rate in degrees per second.
    pub player_turn_speed: f32,
    /// Patrolling enemy speed in world units per second.
    pub enemy_move_speed: f32,
    /// Patrolling enemy turn rate in degrees per second.
    pub enemy_turn_speed: f32,
    /// Maximum distance at which enemies can see the player.
    pub enemy_view_range: f32,
    /// Projectile speed in world units per second.
    pub bullet_speed: f32,
    /// Physical radius of tanks.
    pub entity_base_radius: f32,
    /// Physical radius of turrets.
    pub entity_turret_radius: f32,
    /// Sprite size of turret barrels.
    pub entity_turret_size: f32,
    /// Starting health of the player tank.
    pub player_health: i32,
    /// Starting health of Scorpio turrets.
    pub scorpio_health: i32,
    /// Starting health of Leo tanks.
    pub leo_health: i32,
    /// Starting health of Aries tanks.
    pub aries_health: i32,
    /// When set, projectiles never reduce the player's health.
    pub player_invulnerable: bool,
    /// When set, the player tank is not pushed out of walls and water.
    pub player_ignores_walls: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            player_move_speed: 1.0,
            player_turn_speed: 180.0,
            enemy_move_speed: 0.5,
            enemy_turn_speed: 120.0,
            enemy_view_range: 10.0,
            bullet_speed: 3.0,
            entity_base_radius: 0.4,
            entity_turret_radius: 0.6,
            entity_turret_size: 1.4,
            player_health: 10,
            scorpio_health: 5,
            leo_health: 3,
            aries_health: 8,
            player_invulnerable: false,
            player_ignores_walls: false,
        }
    }
}

impl SimulationConfig {
    /// Parses a configuration document, filling absent keys with defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let radii = [
            ("entity_base_radius", self.entity_base_radius),
            ("entity_turret_radius", self.entity_turret_radius),
        ];
        for (key, value) in radii {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidValue { key, value });
            }
        }
        Ok(())
    }
}

/// Failures raised while loading a [`SimulationConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid TOML or has mistyped keys.
    #[error("failed to parse simulation config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A numeric key holds a value the simulation cannot use.
    #[error("config key `{key}` must be a positive finite number (received {value})")]
    InvalidValue {
        /// Offending key.
        key: &'static str,
        /// Value supplied for the key.
        value: f32,
    },
}

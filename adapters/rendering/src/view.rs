//! Translation of world snapshots into frames.

use glam::Vec2;
use libra_core::{Faction, TileCoords};
use libra_world::{query, BehaviorState, DistanceField, Entity, World};

use crate::{Color, Frame, SpriteSheet, TextureKey, UvRect};

const TERRAIN_SHEET: SpriteSheet = SpriteSheet {
    columns: 16,
    rows: 16,
};
/// Row 0 holds one hull per kind in kind order, row 1 the turret tops.
const ENTITY_SHEET: SpriteSheet = SpriteSheet {
    columns: 8,
    rows: 2,
};
const TURRET_ROW: u32 = 1;

const HEALTH_BAR_WIDTH: f32 = 0.8;
const HEALTH_BAR_HEIGHT: f32 = 0.08;
const HEALTH_BAR_GAP: f32 = 0.1;
const LASER_THICKNESS: f32 = 0.03;
const DEBUG_LINE_THICKNESS: f32 = 0.02;
const RING_SEGMENTS: u32 = 16;

const DEAD_TINT: Color = Color::new(0.35, 0.35, 0.35, 1.0);
const EVIL_TINT: Color = Color::new(1.0, 0.85, 0.85, 1.0);
const HEALTH_BACK: Color = Color::new(0.6, 0.0, 0.0, 0.8);
const HEALTH_FRONT: Color = Color::new(0.1, 0.9, 0.1, 0.9);
const LASER_IDLE: Color = Color::new(1.0, 0.0, 0.0, 0.25);
const LASER_LOCKED: Color = Color::new(1.0, 0.0, 0.0, 0.8);
const PHYSICAL_RING: Color = Color::new(1.0, 1.0, 1.0, 0.9);
const COSMETIC_RING: Color = Color::new(1.0, 1.0, 0.0, 0.6);
const FORWARD_AXIS: Color = Color::new(1.0, 0.2, 0.2, 1.0);
const SIDE_AXIS: Color = Color::new(0.2, 1.0, 0.2, 1.0);
const VELOCITY: Color = Color::new(0.3, 0.5, 1.0, 1.0);
const PATROL_ROUTE: Color = Color::new(1.0, 0.6, 0.0, 0.7);
const HEAT_NEAR: Color = Color::new(1.0, 0.15, 0.0, 0.6);
const HEAT_FAR: Color = Color::new(0.0, 0.2, 1.0, 0.6);
const REACHABLE: Color = Color::new(0.0, 0.8, 0.2, 0.4);
const UNREACHABLE: Color = Color::new(0.8, 0.0, 0.0, 0.4);

/// How [`render_heat_map`] colours a distance field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HeatMapMode {
    /// Blends from hot at the seed to cold at the farthest reachable tile.
    Gradient,
    /// Marks tiles as reachable or unreachable.
    Reachability,
}

/// Draws terrain, entities, health bars, turret lasers, and explosions.
#[must_use]
pub fn render(world: &World) -> Frame {
    let mut frame = Frame::new();
    draw_terrain(world, &mut frame);

    let registry = query::registry(world);
    for (_, entity) in registry.entities() {
        draw_entity(entity, &mut frame);
    }
    for (_, entity) in registry.entities() {
        draw_overlays(entity, &mut frame);
    }

    for explosion in query::explosions(world) {
        let fade = 1.0 - explosion.progress();
        frame.batch(TextureKey::Effects).push_quad(
            explosion.position,
            Vec2::splat(explosion.size * 0.5),
            0.0,
            UvRect::FULL,
            Color::WHITE.with_alpha(fade),
        );
    }
    frame
}

/// Draws collision rings, heading axes, velocities, and patrol routes.
#[must_use]
pub fn debug_render(world: &World) -> Frame {
    let mut frame = Frame::new();
    let batch = frame.batch(TextureKey::Solid);
    for (_, entity) in query::registry(world).entities() {
        let position = entity.position;
        batch.push_ring(
            position,
            entity.physical_radius,
            RING_SEGMENTS,
            DEBUG_LINE_THICKNESS,
            PHYSICAL_RING,
        );
        batch.push_ring(
            position,
            entity.cosmetic_radius,
            RING_SEGMENTS,
            DEBUG_LINE_THICKNESS,
            COSMETIC_RING,
        );

        let forward = entity.forward() * entity.cosmetic_radius;
        batch.push_line(position, position + forward, DEBUG_LINE_THICKNESS, FORWARD_AXIS);
        batch.push_line(position, position + forward.perp(), DEBUG_LINE_THICKNESS, SIDE_AXIS);
        batch.push_line(
            position,
            position + entity.velocity,
            DEBUG_LINE_THICKNESS,
            VELOCITY,
        );

        if let BehaviorState::Patrol(state) = &entity.behavior {
            let mut from = position;
            for waypoint in state.path.iter().rev() {
                batch.push_line(from, *waypoint, DEBUG_LINE_THICKNESS, PATROL_ROUTE);
                from = *waypoint;
            }
            if let Some(target) = state.target {
                batch.push_ring(target, 0.15, 8, DEBUG_LINE_THICKNESS, PATROL_ROUTE);
            }
        }
    }
    frame
}

/// Draws a distance field as one translucent quad per tile.
#[must_use]
pub fn render_heat_map(field: &DistanceField, mode: HeatMapMode) -> Frame {
    let mut frame = Frame::new();
    let batch = frame.batch(TextureKey::Solid);
    let farthest = field.max_reachable().max(1.0);

    for y in 0..field.height() {
        for x in 0..field.width() {
            let coords = TileCoords::new(x, y);
            let reachable = field.is_reachable(coords);
            let color = match mode {
                HeatMapMode::Reachability if reachable => REACHABLE,
                HeatMapMode::Reachability => UNREACHABLE,
                HeatMapMode::Gradient if reachable => {
                    let value = field.value(coords).unwrap_or(farthest);
                    HEAT_NEAR.lerp(HEAT_FAR, value / farthest)
                }
                HeatMapMode::Gradient => continue,
            };
            batch.push_quad(coords.center(), Vec2::splat(0.5), 0.0, UvRect::FULL, color);
        }
    }
    frame
}

fn draw_terrain(world: &World, frame: &mut Frame) {
    let grid = query::grid(world);
    let batch = frame.batch(TextureKey::Terrain);
    for (index, tile) in grid.tiles().iter().enumerate() {
        let (Some(coords), Some(definition)) =
            (grid.coords_of(index), grid.definitions().get(tile.definition()))
        else {
            continue;
        };
        let [column, row] = definition.sprite_coords;
        batch.push_quad(
            coords.center(),
            Vec2::splat(0.5),
            0.0,
            TERRAIN_SHEET.uv(column, row),
            Color::from(definition.tint),
        );
    }
}

fn draw_entity(entity: &Entity, frame: &mut Frame) {
    let tint = if entity.is_dead {
        DEAD_TINT
    } else if entity.faction() == Faction::Evil {
        EVIL_TINT
    } else {
        Color::WHITE
    };
    let sprite = entity.kind().index() as u32;
    let half_extents = Vec2::splat(entity.cosmetic_radius);
    let batch = frame.batch(TextureKey::Entities);
    batch.push_quad(
        entity.position,
        half_extents,
        entity.orientation,
        ENTITY_SHEET.uv(sprite, 0),
        tint,
    );

    let turret_orientation = match &entity.behavior {
        BehaviorState::Player(state) => Some(state.turret_orientation),
        BehaviorState::Turret(_) => Some(entity.orientation),
        _ => None,
    };
    if let Some(orientation) = turret_orientation {
        batch.push_quad(
            entity.position,
            half_extents,
            orientation,
            ENTITY_SHEET.uv(sprite, TURRET_ROW),
            tint,
        );
    }
}

fn draw_overlays(entity: &Entity, frame: &mut Frame) {
    if let BehaviorState::Turret(state) = &entity.behavior {
        let color = if state.player_in_sight {
            LASER_LOCKED
        } else {
            LASER_IDLE
        };
        frame
            .batch(TextureKey::Solid)
            .push_line(entity.position, state.laser_end, LASER_THICKNESS, color);
    }

    if !entity.kind().is_agent() || entity.is_dead || entity.health >= entity.max_health {
        return;
    }
    let fraction = (entity.health as f32 / entity.max_health.max(1) as f32).clamp(0.0, 1.0);
    let center = entity.position - Vec2::new(0.0, entity.cosmetic_radius + HEALTH_BAR_GAP);
    let half = Vec2::new(HEALTH_BAR_WIDTH, HEALTH_BAR_HEIGHT) * 0.5;
    let batch = frame.batch(TextureKey::Solid);
    batch.push_quad(center, half, 0.0, UvRect::FULL, HEALTH_BACK);
    let filled = Vec2::new(half.x * fraction, half.y);
    batch.push_quad(
        center - Vec2::new(half.x - filled.x, 0.0),
        filled,
        0.0,
        UvRect::FULL,
        HEALTH_FRONT,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use libra_core::{EntityKind, SimulationConfig, TileDefinitionTable};
    use libra_world::{BlockingPolicy, Grid};
    use std::sync::Arc;

    fn world() -> World {
        let definitions = Arc::new(
            TileDefinitionTable::from_toml_str(
                r#"
                [[tile]]
                name = "Grass"
                sprite = [2, 1]
                tint = [255, 255, 255, 255]

                [[tile]]
                name = "Steel"
                sprite = [3, 0]
                solid = true
                "#,
            )
            .expect("tiles parse"),
        );
        let grass = definitions.id("Grass").expect("grass");
        World::from_grid(
            Grid::filled(10, 10, grass, definitions),
            SimulationConfig::default(),
            0,
        )
    }

    #[test]
    fn every_tile_gets_one_terrain_quad() {
        let frame = render(&world());

        assert_eq!(frame.quads_with(TextureKey::Terrain), 100);
        let first = &frame.batches()[0];
        assert_eq!(first.texture, TextureKey::Terrain);
        assert_eq!(first.vertices[0].uv, TERRAIN_SHEET.uv(2, 1).min);
    }

    #[test]
    fn player_draws_hull_and_turret() {
        let mut world = world();
        let mut events = Vec::new();
        let _ = world.spawn_player(&mut events);

        let frame = render(&world);

        assert_eq!(frame.quads_with(TextureKey::Entities), 2);
        assert_eq!(frame.quads_with(TextureKey::Solid), 0);
    }

    #[test]
    fn wounded_agents_show_health_bars() {
        let mut world = world();
        let mut events = Vec::new();
        let leo = world.spawn(EntityKind::Leo, Faction::Evil, Vec2::new(4.5, 4.5), 0.0, &mut events);
        world.collision_parts().1.get_mut(leo).expect("leo").health -= 1;

        let frame = render(&world);

        assert_eq!(frame.quads_with(TextureKey::Entities), 1);
        assert_eq!(frame.quads_with(TextureKey::Solid), 2);
    }

    #[test]
    fn turrets_draw_their_laser() {
        let mut world = world();
        let mut events = Vec::new();
        let scorpio = world.spawn(EntityKind::Scorpio, Faction::Evil, Vec2::new(4.5, 4.5), 0.0, &mut events);
        if let Some(turret) = world.collision_parts().1.get_mut(scorpio) {
            if let BehaviorState::Turret(state) = &mut turret.behavior {
                state.laser_end = Vec2::new(8.5, 4.5);
            }
        }

        let frame = render(&world);

        assert_eq!(frame.quads_with(TextureKey::Entities), 2);
        assert_eq!(frame.quads_with(TextureKey::Solid), 1);
    }

    #[test]
    fn debug_render_rings_every_entity() {
        let mut world = world();
        let mut events = Vec::new();
        let _ = world.spawn(EntityKind::Bolt, Faction::Good, Vec2::new(4.5, 4.5), 0.0, &mut events);

        let frame = debug_render(&world);

        // Two rings, two axes, one velocity line.
        let expected = 2 * RING_SEGMENTS as usize + 3;
        assert_eq!(frame.quads_with(TextureKey::Solid), expected);
    }

    #[test]
    fn heat_map_modes_cover_expected_tiles() {
        let world = world();
        let field = world.populate_distance_field(TileCoords::new(0, 0), BlockingPolicy::STRICT);

        let reachability = render_heat_map(&field, HeatMapMode::Reachability);
        assert_eq!(reachability.quads_with(TextureKey::Solid), 100);

        let gradient = render_heat_map(&field, HeatMapMode::Gradient);
        assert_eq!(gradient.quads_with(TextureKey::Solid), 100);
        let seed = gradient.batches()[0].vertices[0].color;
        assert_eq!(seed, HEAT_NEAR);
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Rendering contracts for Libra adapters.
//!
//! The simulation never draws anything itself. [`render`] and its debug
//! companions translate a world snapshot into a [`Frame`] made of
//! [`DrawBatch`] lists, one texture per batch, that a [`RenderingBackend`]
//! hands to the GPU or inspects headlessly.

use anyhow::Result as AnyResult;
use glam::Vec2;
use libra_core::Tint;
use std::{error::Error, fmt};

mod view;

pub use view::{debug_render, render, render_heat_map, HeatMapMode};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Opaque white, the identity tint.
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);

    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns the same color with a different alpha.
    #[must_use]
    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self { alpha, ..self }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }

    /// Linear blend between two colors.
    #[must_use]
    pub fn lerp(self, other: Color, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);
        let mix = |a: f32, b: f32| a + (b - a) * amount;
        Self {
            red: mix(self.red, other.red),
            green: mix(self.green, other.green),
            blue: mix(self.blue, other.blue),
            alpha: mix(self.alpha, other.alpha),
        }
    }
}

impl From<Tint> for Color {
    fn from(tint: Tint) -> Self {
        Self::from_rgb_u8(tint.red, tint.green, tint.blue).with_alpha(tint.alpha as f32 / 255.0)
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Textures a batch can sample from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureKey {
    /// Terrain sprite sheet indexed by tile sprite coordinates.
    Terrain,
    /// Entity sprite sheet with one hull per kind plus turret tops.
    Entities,
    /// Explosion sprite.
    Effects,
    /// No texture; vertices carry flat colors.
    Solid,
}

/// Single vertex of a textured triangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    /// Position in world units.
    pub position: Vec2,
    /// Normalised texture coordinate.
    pub uv: Vec2,
    /// Color multiplied into the sampled texel.
    pub color: Color,
}

/// Axis-aligned region of a texture in normalised coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UvRect {
    /// Top-left corner.
    pub min: Vec2,
    /// Bottom-right corner.
    pub max: Vec2,
}

impl UvRect {
    /// Region covering the whole texture.
    pub const FULL: UvRect = UvRect {
        min: Vec2::ZERO,
        max: Vec2::ONE,
    };
}

/// Grid layout of equally sized sprites within a texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpriteSheet {
    columns: u32,
    rows: u32,
}

impl SpriteSheet {
    /// Creates a sheet with the provided number of sprite columns and rows.
    pub fn new(columns: u32, rows: u32) -> Result<Self, RenderingError> {
        if columns == 0 || rows == 0 {
            return Err(RenderingError::InvalidSheetDimensions { columns, rows });
        }
        Ok(Self { columns, rows })
    }

    /// Number of sprite columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of sprite rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Texture region of the sprite at the provided column and row.
    ///
    /// Coordinates outside the sheet wrap around.
    #[must_use]
    pub fn uv(&self, column: u32, row: u32) -> UvRect {
        let size = Vec2::new(1.0 / self.columns as f32, 1.0 / self.rows as f32);
        let min = Vec2::new((column % self.columns) as f32, (row % self.rows) as f32) * size;
        UvRect { min, max: min + size }
    }
}

/// Triangles that share one texture.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawBatch {
    /// Texture sampled by every vertex of the batch.
    pub texture: TextureKey,
    /// Triangle list, three vertices per triangle.
    pub vertices: Vec<Vertex>,
}

impl DrawBatch {
    /// Creates an empty batch.
    #[must_use]
    pub const fn new(texture: TextureKey) -> Self {
        Self {
            texture,
            vertices: Vec::new(),
        }
    }

    /// Number of quads, assuming the batch was filled through its helpers.
    #[must_use]
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 6
    }

    /// Appends a rectangle centred on `center`, rotated by `rotation` degrees.
    pub fn push_quad(
        &mut self,
        center: Vec2,
        half_extents: Vec2,
        rotation: f32,
        uv: UvRect,
        color: Color,
    ) {
        let turn = Vec2::from_angle(rotation.to_radians());
        let corner = |x: f32, y: f32| center + turn.rotate(Vec2::new(x, y) * half_extents);
        let vertex = |position: Vec2, uv: Vec2| Vertex {
            position,
            uv,
            color,
        };

        let top_left = vertex(corner(-1.0, -1.0), uv.min);
        let top_right = vertex(corner(1.0, -1.0), Vec2::new(uv.max.x, uv.min.y));
        let bottom_right = vertex(corner(1.0, 1.0), uv.max);
        let bottom_left = vertex(corner(-1.0, 1.0), Vec2::new(uv.min.x, uv.max.y));
        self.vertices.extend([
            top_left,
            top_right,
            bottom_right,
            top_left,
            bottom_right,
            bottom_left,
        ]);
    }

    /// Appends a segment of the provided thickness.
    pub fn push_line(&mut self, from: Vec2, to: Vec2, thickness: f32, color: Color) {
        let span = to - from;
        let length = span.length();
        if length <= f32::EPSILON {
            return;
        }
        let rotation = span.y.atan2(span.x).to_degrees();
        self.push_quad(
            (from + to) * 0.5,
            Vec2::new(length * 0.5, thickness * 0.5),
            rotation,
            UvRect::FULL,
            color,
        );
    }

    /// Appends a circle outline approximated by `segments` line segments.
    pub fn push_ring(&mut self, center: Vec2, radius: f32, segments: u32, thickness: f32, color: Color) {
        let segments = segments.max(3);
        let step = std::f32::consts::TAU / segments as f32;
        for segment in 0..segments {
            let from = center + Vec2::from_angle(step * segment as f32) * radius;
            let to = center + Vec2::from_angle(step * (segment + 1) as f32) * radius;
            self.push_line(from, to, thickness, color);
        }
    }
}

/// Ordered batches that make up one rendered frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    batches: Vec<DrawBatch>,
}

impl Frame {
    /// Creates an empty frame.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Batch that the next primitive with `texture` should be written to.
    ///
    /// Consecutive primitives sharing a texture land in the same batch; a
    /// texture change starts a new one so draw order is preserved.
    pub fn batch(&mut self, texture: TextureKey) -> &mut DrawBatch {
        let reuse = self
            .batches
            .last()
            .is_some_and(|batch| batch.texture == texture);
        if !reuse {
            self.batches.push(DrawBatch::new(texture));
        }
        let last = self.batches.len() - 1;
        &mut self.batches[last]
    }

    /// Batches in draw order.
    #[must_use]
    pub fn batches(&self) -> &[DrawBatch] {
        &self.batches
    }

    /// Total number of vertices across every batch.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.batches.iter().map(|batch| batch.vertices.len()).sum()
    }

    /// Number of quads drawn with the provided texture.
    #[must_use]
    pub fn quads_with(&self, texture: TextureKey) -> usize {
        self.batches
            .iter()
            .filter(|batch| batch.texture == texture)
            .map(DrawBatch::quad_count)
            .sum()
    }

    /// Reports whether nothing was drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batches.iter().all(|batch| batch.vertices.is_empty())
    }

    /// Appends every batch of `other` after this frame's batches.
    pub fn append(&mut self, other: Frame) {
        self.batches.extend(other.batches);
    }
}

/// Rendering backend capable of presenting Libra frames.
pub trait RenderingBackend {
    /// Presents one frame.
    fn present(&mut self, frame: &Frame) -> AnyResult<()>;

    /// Called once after the last frame was presented.
    fn finish(&mut self) -> AnyResult<()> {
        Ok(())
    }
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq, Eq)]
pub enum RenderingError {
    /// Sprite sheets need at least one column and one row.
    InvalidSheetDimensions {
        /// Provided column count.
        columns: u32,
        /// Provided row count.
        rows: u32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSheetDimensions { columns, rows } => {
                write!(
                    f,
                    "sprite sheet must have positive dimensions (received {columns}x{rows})"
                )
            }
        }
    }
}

impl Error for RenderingError {}

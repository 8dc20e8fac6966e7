//! Planar geometry shared by the raycaster, the collision passes and the
//! entity behaviours.
//!
//! Angles are expressed in degrees, measured counter-clockwise from the +x
//! axis. Discs are described by a centre and radius; the only other collision
//! shape is the axis-aligned box.

use glam::Vec2;

/// Axis-aligned rectangle in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb2 {
    min: Vec2,
    max: Vec2,
}

impl Aabb2 {
    /// Creates a box from its minimum and maximum corners.
    #[must_use]
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Lower-left corner.
    #[must_use]
    pub const fn min(&self) -> Vec2 {
        self.min
    }

    /// Upper-right corner.
    #[must_use]
    pub const fn max(&self) -> Vec2 {
        self.max
    }

    /// Reports whether the point lies inside the box, edges included.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Point of the box closest to the provided point.
    #[must_use]
    pub fn nearest_point(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min, self.max)
    }
}

/// Ray segment with a unit direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    /// Start of the ray.
    pub origin: Vec2,
    /// Unit direction of travel.
    pub direction: Vec2,
    /// Furthest distance tested along the direction.
    pub max_length: f32,
}

impl Ray {
    /// Creates a ray, normalising the direction.
    ///
    /// A zero direction stays zero; such a ray only ever tests its origin.
    #[must_use]
    pub fn new(origin: Vec2, direction: Vec2, max_length: f32) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
            max_length,
        }
    }

    /// Point at the provided distance along the ray.
    #[must_use]
    pub fn point_at(&self, distance: f32) -> Vec2 {
        self.origin + self.direction * distance
    }
}

/// Outcome of a raycast.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RaycastHit {
    /// Whether the ray struck something within its length.
    pub did_impact: bool,
    /// Distance travelled before the impact, or the ray length on a miss.
    pub distance: f32,
    /// Impact point, or the ray end on a miss.
    pub position: Vec2,
    /// Surface normal at the impact, zero on a miss or a start-inside hit.
    pub normal: Vec2,
}

impl RaycastHit {
    /// Result reported when the ray reaches its full length unobstructed.
    #[must_use]
    pub fn miss(ray: &Ray) -> Self {
        Self {
            did_impact: false,
            distance: ray.max_length,
            position: ray.point_at(ray.max_length),
            normal: Vec2::ZERO,
        }
    }

    /// Impact at the provided distance along the ray.
    #[must_use]
    pub fn impact(ray: &Ray, distance: f32, normal: Vec2) -> Self {
        Self {
            did_impact: true,
            distance,
            position: ray.point_at(distance),
            normal,
        }
    }
}

/// Casts a ray against a disc.
///
/// A ray starting inside the disc impacts at distance zero with a normal
/// pointing from the disc centre toward the origin.
#[must_use]
pub fn raycast_vs_disc(ray: &Ray, center: Vec2, radius: f32) -> RaycastHit {
    let to_center = center - ray.origin;
    if to_center.length_squared() < radius * radius {
        let normal = (ray.origin - center).try_normalize().unwrap_or(-ray.direction);
        return RaycastHit::impact(ray, 0.0, normal);
    }

    let along = to_center.dot(ray.direction);
    let across = to_center.dot(ray.direction.perp());
    if across.abs() >= radius || along < -radius || along > ray.max_length + radius {
        return RaycastHit::miss(ray);
    }

    let half_chord = (radius * radius - across * across).sqrt();
    let distance = along - half_chord;
    if distance < 0.0 || distance > ray.max_length {
        return RaycastHit::miss(ray);
    }

    let position = ray.point_at(distance);
    RaycastHit {
        did_impact: true,
        distance,
        position,
        normal: (position - center).normalize_or_zero(),
    }
}

/// Reports whether two discs overlap.
#[must_use]
pub fn discs_overlap(a: Vec2, radius_a: f32, b: Vec2, radius_b: f32) -> bool {
    let reach = radius_a + radius_b;
    a.distance_squared(b) < reach * reach
}

/// Moves a disc so that it no longer covers the point.
pub fn push_disc_out_of_point(center: &mut Vec2, radius: f32, point: Vec2) {
    let offset = *center - point;
    let distance = offset.length();
    if distance >= radius {
        return;
    }
    let direction = offset.try_normalize().unwrap_or(Vec2::X);
    *center += direction * (radius - distance);
}

/// Moves a disc out of a box through the nearest edge point.
///
/// A disc whose centre lies inside the box is left untouched.
pub fn push_disc_out_of_aabb(center: &mut Vec2, radius: f32, bounds: &Aabb2) {
    let nearest = bounds.nearest_point(*center);
    if nearest == *center {
        return;
    }
    push_disc_out_of_point(center, radius, nearest);
}

/// Moves a mobile disc fully out of a fixed disc.
pub fn push_disc_out_of_disc(
    mobile: &mut Vec2,
    mobile_radius: f32,
    fixed: Vec2,
    fixed_radius: f32,
) {
    let offset = *mobile - fixed;
    let distance = offset.length();
    let overlap = mobile_radius + fixed_radius - distance;
    if overlap <= 0.0 {
        return;
    }
    let direction = offset.try_normalize().unwrap_or(Vec2::X);
    *mobile += direction * overlap;
}

/// Separates two overlapping discs.
///
/// Each disc moves by the share of the overlap proportional to the other
/// disc's radius, so equal discs split the separation evenly.
pub fn push_discs_out_of_each_other(a: &mut Vec2, radius_a: f32, b: &mut Vec2, radius_b: f32) {
    let offset = *a - *b;
    let distance = offset.length();
    let reach = radius_a + radius_b;
    let overlap = reach - distance;
    if overlap <= 0.0 || reach <= 0.0 {
        return;
    }
    let direction = offset.try_normalize().unwrap_or(Vec2::X);
    *a += direction * (overlap * radius_b / reach);
    *b -= direction * (overlap * radius_a / reach);
}

/// Reflects a velocity about a surface normal.
#[must_use]
pub fn reflect(velocity: Vec2, normal: Vec2) -> Vec2 {
    let normal = normal.normalize_or_zero();
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Unit vector pointing along the provided heading.
#[must_use]
pub fn direction_from_degrees(degrees: f32) -> Vec2 {
    let radians = degrees.to_radians();
    Vec2::new(radians.cos(), radians.sin())
}

/// Heading of a vector in degrees within `(-180, 180]`.
#[must_use]
pub fn degrees_of(vector: Vec2) -> f32 {
    vector.y.atan2(vector.x).to_degrees()
}

/// Wraps a heading into `[0, 360)`.
#[must_use]
pub fn wrap_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Signed rotation in `[-180, 180]` that turns `from` onto `to`.
#[must_use]
pub fn shortest_angular_displacement(from: f32, to: f32) -> f32 {
    let mut displacement = (to - from).rem_euclid(360.0);
    if displacement > 180.0 {
        displacement -= 360.0;
    }
    displacement
}

/// Rotates `current` toward `goal` by at most `max_delta` degrees.
#[must_use]
pub fn turn_toward(current: f32, goal: f32, max_delta: f32) -> f32 {
    let displacement = shortest_angular_displacement(current, goal);
    if displacement.abs() <= max_delta {
        return goal;
    }
    current + max_delta.copysign(displacement)
}

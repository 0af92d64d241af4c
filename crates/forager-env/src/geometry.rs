//! Geometry utilities for the sensor fan
//!
//! Pure, side-effect-free math: angle normalization, ray endpoints and
//! ray-vs-bounding-region intersection. Runtime edge cases (degenerate
//! rays, nothing in range) yield sentinel values, never errors.

use serde::{Deserialize, Serialize};

/// 2D point or vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Vec2 {
    /// The origin
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new vector
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean length
    #[must_use]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance to another point
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (other - self).length()
    }

    /// Dot product
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl std::ops::Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

/// Wrap an angle in degrees into `[0, 360)`.
///
/// Negative inputs wrap correctly (`-10 -> 350`); adding any multiple of
/// 360 is an identity.
#[must_use]
pub fn normalize_angle_deg(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid rounds up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Endpoint of a ray cast from `origin` along `heading_deg` for `length`
#[must_use]
pub fn ray_endpoint(origin: Vec2, heading_deg: f64, length: f64) -> Vec2 {
    let theta = heading_deg.to_radians();
    origin + Vec2::new(theta.cos(), theta.sin()) * length
}

/// Directed line segment from an origin along an absolute angle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start of the segment
    pub origin: Vec2,
    /// Absolute angle in degrees
    pub angle_deg: f64,
    /// Segment length (the vision radius for sensor rays)
    pub length: f64,
}

impl Ray {
    /// Create a new ray
    #[must_use]
    pub fn new(origin: Vec2, angle_deg: f64, length: f64) -> Self {
        Self {
            origin,
            angle_deg,
            length,
        }
    }

    /// Endpoint of the segment
    #[must_use]
    pub fn endpoint(&self) -> Vec2 {
        ray_endpoint(self.origin, self.angle_deg, self.length)
    }

    fn direction(&self) -> Vec2 {
        let theta = self.angle_deg.to_radians();
        Vec2::new(theta.cos(), theta.sin())
    }
}

/// Bounding region of a detectable object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Footprint {
    /// Circular bound
    Circle {
        /// Circle radius
        radius: f64,
    },
    /// Axis-aligned rectangular bound
    Rect {
        /// Half extent along x
        half_w: f64,
        /// Half extent along y
        half_h: f64,
    },
}

impl Footprint {
    /// Radius of the smallest circle enclosing the footprint
    #[must_use]
    pub fn bounding_radius(&self) -> f64 {
        match *self {
            Self::Circle { radius } => radius,
            Self::Rect { half_w, half_h } => half_w.hypot(half_h),
        }
    }
}

/// An object the sensor fan can detect: a center position plus a bounding
/// region. The core never owns or mutates these.
pub trait Detectable {
    /// Center position
    fn center(&self) -> Vec2;

    /// Bounding region around the center
    fn footprint(&self) -> Footprint;
}

/// Whether the segment intersects the footprint centered at `center`.
/// Tangency counts as intersecting.
#[must_use]
pub fn intersects(ray: &Ray, center: Vec2, footprint: Footprint) -> bool {
    match footprint {
        Footprint::Circle { radius } => segment_hits_circle(ray, center, radius),
        Footprint::Rect { half_w, half_h } => segment_hits_rect(ray, center, half_w, half_h),
    }
}

fn segment_hits_circle(ray: &Ray, center: Vec2, radius: f64) -> bool {
    let direction = ray.direction();
    let to_center = center - ray.origin;
    let t = to_center.dot(direction).clamp(0.0, ray.length);
    let closest = ray.origin + direction * t;
    closest.distance(center) <= radius
}

fn segment_hits_rect(ray: &Ray, center: Vec2, half_w: f64, half_h: f64) -> bool {
    let direction = ray.direction();
    let mut t_min: f64 = 0.0;
    let mut t_max: f64 = ray.length;

    for (origin, dir, lo, hi) in [
        (ray.origin.x, direction.x, center.x - half_w, center.x + half_w),
        (ray.origin.y, direction.y, center.y - half_h, center.y + half_h),
    ] {
        if dir.abs() < f64::EPSILON {
            if origin < lo || origin > hi {
                return false;
            }
        } else {
            let t1 = (lo - origin) / dir;
            let t2 = (hi - origin) / dir;
            t_min = t_min.max(t1.min(t2));
            t_max = t_max.min(t1.max(t2));
            if t_min > t_max {
                return false;
            }
        }
    }

    true
}

/// Distance from the ray origin to the nearest intersecting candidate.
///
/// Over all candidates whose footprint intersects the segment, the minimum
/// of `distance(origin, center) - bounding_radius`, clamped into
/// `[0, ray.length]`. When nothing intersects, or the ray is degenerate
/// with non-positive length, the sentinel `ray.length` is returned:
/// "nothing sensed", not a failure.
#[must_use]
pub fn nearest_intersection_distance<T: Detectable>(ray: &Ray, candidates: &[T]) -> f64 {
    if ray.length <= 0.0 {
        return ray.length.max(0.0);
    }

    let mut nearest = ray.length;
    for candidate in candidates {
        let center = candidate.center();
        let footprint = candidate.footprint();
        if intersects(ray, center, footprint) {
            let distance = (ray.origin.distance(center) - footprint.bounding_radius())
                .clamp(0.0, ray.length);
            nearest = nearest.min(distance);
        }
    }

    nearest
}

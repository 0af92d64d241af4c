//! Sensor fan: evenly spaced distance readings around the agent heading

use serde::{Deserialize, Serialize};

use crate::body::Pose;
use crate::geometry::{nearest_intersection_distance, Detectable, Ray};

/// Sensor fan configuration.
///
/// Validated at construction; invalid values are rejected, never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Number of rays in the fan
    pub vision_line_count: usize,
    /// Total fan angle in degrees, centered on the agent heading
    pub vision_angle_deg: f64,
    /// Maximum sensing distance per ray
    pub vision_radius: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            vision_line_count: 9,
            vision_angle_deg: 90.0,
            vision_radius: 75.0,
        }
    }
}

impl SensorConfig {
    /// Create a validated sensor configuration
    ///
    /// # Errors
    /// Returns [`forager_core::Error::InvalidConfig`] when the line count
    /// is below 2, the angle is outside `(0, 360]` or the radius is not
    /// positive.
    pub fn new(
        vision_line_count: usize,
        vision_angle_deg: f64,
        vision_radius: f64,
    ) -> forager_core::Result<Self> {
        let config = Self {
            vision_line_count,
            vision_angle_deg,
            vision_radius,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// See [`SensorConfig::new`].
    pub fn validate(&self) -> forager_core::Result<()> {
        if self.vision_line_count < 2 {
            return Err(forager_core::Error::InvalidConfig(format!(
                "vision_line_count must be at least 2, got {}",
                self.vision_line_count
            )));
        }
        if !(self.vision_angle_deg > 0.0 && self.vision_angle_deg <= 360.0) {
            return Err(forager_core::Error::InvalidConfig(format!(
                "vision_angle_deg must be in (0, 360], got {}",
                self.vision_angle_deg
            )));
        }
        if !(self.vision_radius > 0.0 && self.vision_radius.is_finite()) {
            return Err(forager_core::Error::InvalidConfig(format!(
                "vision_radius must be positive, got {}",
                self.vision_radius
            )));
        }
        Ok(())
    }

    /// Width of the flattened sensor-state vector: one distance per ray
    /// plus the direction of the nearest reading
    #[must_use]
    pub fn state_dim(&self) -> usize {
        self.vision_line_count + 1
    }
}

/// One distance reading along a single sensor ray.
///
/// `distance` saturates at the vision radius when nothing intersects the
/// ray; `direction_deg` is the pre-normalized absolute ray angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Distance to the nearest detected surface, in `[0, vision_radius]`
    pub distance: f64,
    /// Absolute ray angle in degrees
    pub direction_deg: f64,
}

/// Scan the fan for a pose over a candidate set.
///
/// Rays are evenly spaced across the vision angle centered on the pose
/// heading: ray `i` points at `heading - angle/2 + i * angle / (count - 1)`.
/// The output is ordered by ray index and deterministic: identical pose and
/// candidates produce identical readings.
#[must_use]
pub fn scan<T: Detectable>(
    pose: &Pose,
    candidates: &[T],
    config: &SensorConfig,
) -> Vec<SensorReading> {
    let start = pose.heading_deg() - config.vision_angle_deg / 2.0;
    let step = config.vision_angle_deg / (config.vision_line_count - 1) as f64;

    (0..config.vision_line_count)
        .map(|i| {
            let direction_deg = start + i as f64 * step;
            let ray = Ray::new(pose.position(), direction_deg, config.vision_radius);
            SensorReading {
                distance: nearest_intersection_distance(&ray, candidates),
                direction_deg,
            }
        })
        .collect()
}

/// Flatten readings into the fixed-width state vector fed to the value
/// function: every distance in ray order, then the direction of the
/// nearest reading (ties resolve to the last minimum).
#[must_use]
pub fn state_vector(readings: &[SensorReading]) -> Vec<f64> {
    let mut state: Vec<f64> = readings.iter().map(|r| r.distance).collect();
    let nearest_direction = readings
        .iter()
        .min_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map_or(0.0, |r| r.direction_deg);
    state.push(nearest_direction);
    state
}

//! Agent kinematic model
//!
//! The body is a plain data component: it owns the pose and applies
//! discrete actions to it. Rendering adapters read the pose each frame;
//! nothing here touches a scene graph.

use serde::{Deserialize, Serialize};

use crate::geometry::{normalize_angle_deg, Detectable, Vec2};
use crate::sensor::{scan, state_vector, SensorConfig, SensorReading};

/// Number of discrete actions in either encoding
pub const ACTION_COUNT: usize = 4;

/// Position and heading of the agent.
///
/// The heading is kept in `[0, 360)` at all times: every mutation wraps,
/// never clamps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    position: Vec2,
    heading_deg: f64,
}

impl Pose {
    /// Create a pose; the heading is normalized into `[0, 360)`
    #[must_use]
    pub fn new(position: Vec2, heading_deg: f64) -> Self {
        Self {
            position,
            heading_deg: normalize_angle_deg(heading_deg),
        }
    }

    /// Current position
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Current heading in degrees, always in `[0, 360)`
    #[must_use]
    pub fn heading_deg(&self) -> f64 {
        self.heading_deg
    }

    /// Set the heading, wrapping into `[0, 360)`
    pub fn set_heading_deg(&mut self, heading_deg: f64) {
        self.heading_deg = normalize_angle_deg(heading_deg);
    }

    /// Rotate by a delta, wrapping into `[0, 360)`
    pub fn turn_by(&mut self, delta_deg: f64) {
        self.set_heading_deg(self.heading_deg + delta_deg);
    }

    /// Translate along the current heading
    pub fn advance(&mut self, distance: f64) {
        let theta = self.heading_deg.to_radians();
        self.position = self.position + Vec2::new(theta.cos(), theta.sin()) * distance;
    }
}

/// How the four discrete actions map onto the pose.
///
/// The prototypes disagreed on the action space; both variants survive as
/// configuration rather than separate systems.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActionEncoding {
    /// Turn relative to the current heading, then advance:
    /// 0 = turn left, 1 = turn right, 2 = straight, 3 = reverse
    Steering {
        /// Heading delta per turn action, in degrees
        turn_step_deg: f64,
    },
    /// Snap the heading to a screen direction, then advance:
    /// 0 = left, 1 = right, 2 = up, 3 = down (y grows downward)
    Cardinal,
}

impl Default for ActionEncoding {
    fn default() -> Self {
        Self::Steering { turn_step_deg: 15.0 }
    }
}

/// Kinematic configuration of the agent body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    /// Distance covered per action
    pub speed: f64,
    /// Discrete action encoding
    pub encoding: ActionEncoding,
    /// Sensor fan configuration
    pub sensors: SensorConfig,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            speed: 2.0,
            encoding: ActionEncoding::default(),
            sensors: SensorConfig::default(),
        }
    }
}

impl BodyConfig {
    /// Validate the configuration
    ///
    /// # Errors
    /// Returns [`forager_core::Error::InvalidConfig`] for a non-positive
    /// speed or turn step, or an invalid sensor configuration.
    pub fn validate(&self) -> forager_core::Result<()> {
        if !(self.speed > 0.0 && self.speed.is_finite()) {
            return Err(forager_core::Error::InvalidConfig(format!(
                "speed must be positive, got {}",
                self.speed
            )));
        }
        if let ActionEncoding::Steering { turn_step_deg } = self.encoding {
            if !(turn_step_deg > 0.0 && turn_step_deg.is_finite()) {
                return Err(forager_core::Error::InvalidConfig(format!(
                    "turn_step_deg must be positive, got {turn_step_deg}"
                )));
            }
        }
        self.sensors.validate()
    }
}

/// The agent body: pose, speed and the latest sensor snapshot
#[derive(Debug, Clone)]
pub struct Body {
    config: BodyConfig,
    pose: Pose,
    last_scan: Vec<SensorReading>,
}

impl Body {
    /// Create a body at a spawn pose
    ///
    /// # Errors
    /// Returns [`forager_core::Error::InvalidConfig`] for an invalid
    /// configuration.
    pub fn new(config: BodyConfig, position: Vec2, heading_deg: f64) -> forager_core::Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            pose: Pose::new(position, heading_deg),
            last_scan: Vec::new(),
        })
    }

    /// Current pose
    #[must_use]
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Body configuration
    #[must_use]
    pub fn config(&self) -> &BodyConfig {
        &self.config
    }

    /// Move the body to a new pose, discarding the sensor snapshot
    pub fn place(&mut self, position: Vec2, heading_deg: f64) {
        self.pose = Pose::new(position, heading_deg);
        self.last_scan.clear();
    }

    /// Apply a discrete action to the pose.
    ///
    /// # Errors
    /// Returns [`forager_core::Error::InvalidAction`] for an index outside
    /// the four-action space; well-formed actions cannot fail.
    pub fn apply_action(&mut self, action: forager_core::DiscreteAction) -> forager_core::Result<()> {
        if action.0 >= ACTION_COUNT {
            return Err(forager_core::Error::InvalidAction(format!(
                "action index {} outside 0..{ACTION_COUNT}",
                action.0
            )));
        }

        match self.config.encoding {
            ActionEncoding::Steering { turn_step_deg } => match action.0 {
                0 => {
                    self.pose.turn_by(-turn_step_deg);
                    self.pose.advance(self.config.speed);
                }
                1 => {
                    self.pose.turn_by(turn_step_deg);
                    self.pose.advance(self.config.speed);
                }
                2 => self.pose.advance(self.config.speed),
                _ => self.pose.advance(-self.config.speed),
            },
            ActionEncoding::Cardinal => {
                let heading = match action.0 {
                    0 => 180.0,
                    1 => 0.0,
                    2 => 270.0,
                    _ => 90.0,
                };
                self.pose.set_heading_deg(heading);
                self.pose.advance(self.config.speed);
            }
        }

        Ok(())
    }

    /// Refresh the sensor snapshot against a candidate set
    pub fn scan<T: Detectable>(&mut self, candidates: &[T]) -> &[SensorReading] {
        self.last_scan = scan(&self.pose, candidates, &self.config.sensors);
        &self.last_scan
    }

    /// Latest sensor readings, empty until the first scan
    #[must_use]
    pub fn readings(&self) -> &[SensorReading] {
        &self.last_scan
    }

    /// Flattened sensor-state vector from the latest scan
    #[must_use]
    pub fn state_vector(&self) -> Vec<f64> {
        state_vector(&self.last_scan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use forager_core::DiscreteAction;

    fn steering_body(turn_step_deg: f64) -> Body {
        let config = BodyConfig {
            speed: 2.0,
            encoding: ActionEncoding::Steering { turn_step_deg },
            sensors: SensorConfig::default(),
        };
        Body::new(config, Vec2::ZERO, 0.0).unwrap()
    }

    #[test]
    fn heading_wraps_after_turns() {
        let mut body = steering_body(20.0);
        body.place(Vec2::ZERO, 350.0);
        body.apply_action(DiscreteAction(1)).unwrap();
        assert_relative_eq!(body.pose().heading_deg(), 10.0);

        body.place(Vec2::ZERO, 10.0);
        body.apply_action(DiscreteAction(0)).unwrap();
        assert_relative_eq!(body.pose().heading_deg(), 350.0);
    }

    #[test]
    fn straight_action_advances_along_heading() {
        let mut body = steering_body(15.0);
        body.apply_action(DiscreteAction(2)).unwrap();
        let pose = body.pose();
        assert_relative_eq!(pose.position().x, 2.0);
        assert_relative_eq!(pose.position().y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn reverse_action_backs_up() {
        let mut body = steering_body(15.0);
        body.apply_action(DiscreteAction(3)).unwrap();
        assert_relative_eq!(body.pose().position().x, -2.0);
        assert_relative_eq!(body.pose().heading_deg(), 0.0);
    }

    #[test]
    fn cardinal_encoding_snaps_heading() {
        let config = BodyConfig {
            speed: 2.0,
            encoding: ActionEncoding::Cardinal,
            sensors: SensorConfig::default(),
        };
        let mut body = Body::new(config, Vec2::ZERO, 45.0).unwrap();

        body.apply_action(DiscreteAction(3)).unwrap();
        assert_relative_eq!(body.pose().heading_deg(), 90.0);
        assert_relative_eq!(body.pose().position().y, 2.0);

        body.apply_action(DiscreteAction(0)).unwrap();
        assert_relative_eq!(body.pose().heading_deg(), 180.0);
    }

    #[test]
    fn out_of_range_action_is_rejected() {
        let mut body = steering_body(15.0);
        assert!(body.apply_action(DiscreteAction(4)).is_err());
    }

    #[test]
    fn invalid_config_fails_fast() {
        let config = BodyConfig {
            speed: 0.0,
            ..BodyConfig::default()
        };
        assert!(Body::new(config, Vec2::ZERO, 0.0).is_err());

        let config = BodyConfig {
            encoding: ActionEncoding::Steering { turn_step_deg: -5.0 },
            ..BodyConfig::default()
        };
        assert!(Body::new(config, Vec2::ZERO, 0.0).is_err());
    }
}

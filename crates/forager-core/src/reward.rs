//! Reward signals and the three-way reward policy

use serde::{Deserialize, Serialize};

/// Reward signal from the environment
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Reward(pub f64);

impl Reward {
    /// Create a new reward
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    /// Get the reward value
    #[must_use]
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl From<f64> for Reward {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<Reward> for f64 {
    fn from(reward: Reward) -> Self {
        reward.0
    }
}

impl std::ops::Add for Reward {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self(self.0 + other.0)
    }
}

impl std::ops::Mul<f64> for Reward {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self(self.0 * scalar)
    }
}

/// Three-way reward policy mapping the agent's situation to a scalar.
///
/// The goal and obstacle conditions are boolean predicates supplied by the
/// embedding environment; this type only fixes the payout contract. Reaching
/// the goal takes precedence over a simultaneous collision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardPolicy {
    /// Reward when the goal condition holds
    pub goal: f64,
    /// Reward when the obstacle condition holds (and the goal does not)
    pub collision: f64,
    /// Per-step cost when neither condition holds
    pub step: f64,
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self {
            goal: 10.0,
            collision: -10.0,
            step: -1.0,
        }
    }
}

impl RewardPolicy {
    /// Map the two situation predicates to a reward
    #[must_use]
    pub fn evaluate(&self, goal_reached: bool, collided: bool) -> Reward {
        if goal_reached {
            Reward(self.goal)
        } else if collided {
            Reward(self.collision)
        } else {
            Reward(self.step)
        }
    }
}

//! Transitions stored for experience replay

use serde::{Deserialize, Serialize};

use crate::{DiscreteAction, Reward};

/// Single state/action/reward/next-state transition.
///
/// Created once per tick by the training loop and immutable afterwards; the
/// replay buffer owns it until eviction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Sensor-state vector before the action
    pub state: Vec<f64>,
    /// Action taken
    pub action: DiscreteAction,
    /// Reward received
    pub reward: Reward,
    /// Sensor-state vector after the action
    pub next_state: Vec<f64>,
    /// Whether the episode ended with this transition
    pub done: bool,
}

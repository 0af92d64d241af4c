//! Learning machinery for the forager agent
//!
//! This crate provides:
//! - a bounded experience replay buffer
//! - an MLP action-value network with a hand-written SGD fit
//! - exploration-rate schedules
//! - the DQN-style trainer driving one step per tick

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod buffer;
pub mod qnet;
pub mod schedule;
pub mod trainer;

// Re-export the learning components
pub use buffer::ReplayBuffer;
pub use qnet::{Activation, QNetwork, QNetworkConfig};
pub use schedule::{ConstantSchedule, ExponentialSchedule, LinearSchedule, Schedule};
pub use trainer::{StepReport, Trainer, TrainerConfig, TrainerMetrics};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{QNetwork, QNetworkConfig, ReplayBuffer, Trainer, TrainerConfig};
    pub use forager_core::prelude::*;
}

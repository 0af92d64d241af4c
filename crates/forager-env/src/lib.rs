//! 2D raycast-sensing arena environment for the forager agent
//!
//! This crate provides the domain side of the system:
//! - geometry utilities for the sensor rays
//! - the sensor fan producing distance readings
//! - the agent kinematic body
//! - the foraging arena environment of collectible targets

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod body;
pub mod env;
pub mod geometry;
pub mod sensor;

// Re-export the domain types
pub use body::{ActionEncoding, Body, BodyConfig, Pose, ACTION_COUNT};
pub use env::{ForageEnv, ForageEnvConfig, Target};
pub use geometry::{
    intersects, nearest_intersection_distance, normalize_angle_deg, ray_endpoint, Detectable,
    Footprint, Ray, Vec2,
};
pub use sensor::{scan, state_vector, SensorConfig, SensorReading};

// Re-export core types
pub use forager_core::{
    Action, ActionSpace, DiscreteAction, Environment, Observation, ObservationSpace, Reward,
    RewardPolicy, Step,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Body, BodyConfig, ForageEnv, ForageEnvConfig, Pose, SensorConfig, Target, Vec2,
    };
    pub use forager_core::prelude::*;
}

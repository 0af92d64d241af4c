//! Foraging arena: collectible target points sensed by the raycast fan
//!
//! The environment owns the agent body and a set of targets scattered over
//! a rectangular arena. Reaching a target collects it and scores; leaving
//! the arena is the collision condition and ends the episode.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use forager_core::{
    ActionSpace, BoxObservationSpace, DiscreteAction, DiscreteSpace, Environment, ObservationSpace,
    Reward, RewardPolicy, Step, StepInfo, VectorObservation,
};

use crate::body::{Body, BodyConfig, Pose, ACTION_COUNT};
use crate::geometry::{Detectable, Footprint, Vec2};
use crate::sensor::SensorReading;

/// A collectible target point.
///
/// Targets are external entities: the core reads their center and bounding
/// region and removes them on collection, nothing more.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Center position
    pub center: Vec2,
    /// Bounding region
    pub footprint: Footprint,
}

impl Detectable for Target {
    fn center(&self) -> Vec2 {
        self.center
    }

    fn footprint(&self) -> Footprint {
        self.footprint
    }
}

/// Arena configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForageEnvConfig {
    /// Arena width
    pub width: f64,
    /// Arena height
    pub height: f64,
    /// Number of targets spawned per episode
    pub target_count: usize,
    /// Bounding radius of each target
    pub target_radius: f64,
    /// Distance at which a target counts as reached
    pub goal_tolerance: f64,
    /// Step limit per episode; `None` runs unbounded
    pub max_steps: Option<usize>,
    /// Seed for target placement; `None` draws from entropy
    pub seed: Option<u64>,
    /// Agent body configuration
    pub body: BodyConfig,
    /// Reward payouts
    pub rewards: RewardPolicy,
}

impl Default for ForageEnvConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            target_count: 10,
            target_radius: 12.5,
            goal_tolerance: 37.5,
            max_steps: Some(1000),
            seed: None,
            body: BodyConfig::default(),
            rewards: RewardPolicy::default(),
        }
    }
}

impl ForageEnvConfig {
    /// Validate the configuration
    ///
    /// # Errors
    /// Returns [`forager_core::Error::InvalidConfig`] for non-positive
    /// dimensions, radii or tolerance, a zero target count, or an invalid
    /// body configuration.
    pub fn validate(&self) -> forager_core::Result<()> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(forager_core::Error::InvalidConfig(format!(
                "arena dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.target_count == 0 {
            return Err(forager_core::Error::InvalidConfig(
                "target_count must be at least 1".to_string(),
            ));
        }
        if !(self.target_radius > 0.0) {
            return Err(forager_core::Error::InvalidConfig(format!(
                "target_radius must be positive, got {}",
                self.target_radius
            )));
        }
        if !(self.goal_tolerance > 0.0) {
            return Err(forager_core::Error::InvalidConfig(format!(
                "goal_tolerance must be positive, got {}",
                self.goal_tolerance
            )));
        }
        self.body.validate()
    }
}

/// The foraging arena environment
pub struct ForageEnv {
    config: ForageEnvConfig,
    body: Body,
    targets: Vec<Target>,
    rng: StdRng,
    score: usize,
    steps: usize,
}

impl ForageEnv {
    /// Create an arena from a validated configuration
    ///
    /// # Errors
    /// Returns [`forager_core::Error::InvalidConfig`] when the
    /// configuration is rejected.
    pub fn new(config: ForageEnvConfig) -> forager_core::Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let spawn = Vec2::new(config.width / 2.0, config.height / 2.0);
        let body = Body::new(config.body, spawn, 0.0)?;

        let mut env = Self {
            config,
            body,
            targets: Vec::new(),
            rng,
            score: 0,
            steps: 0,
        };
        env.respawn();
        Ok(env)
    }

    fn respawn(&mut self) {
        let spawn = Vec2::new(self.config.width / 2.0, self.config.height / 2.0);
        self.body.place(spawn, 0.0);

        self.targets.clear();
        for _ in 0..self.config.target_count {
            let center = Vec2::new(
                self.rng.gen_range(0.0..self.config.width),
                self.rng.gen_range(0.0..self.config.height),
            );
            self.targets.push(Target {
                center,
                footprint: Footprint::Circle {
                    radius: self.config.target_radius,
                },
            });
        }

        self.score = 0;
        self.steps = 0;
        self.body.scan(&self.targets);
    }

    fn out_of_bounds(&self) -> bool {
        let position = self.body.pose().position();
        position.x < 0.0
            || position.x > self.config.width
            || position.y < 0.0
            || position.y > self.config.height
    }

    fn reached_target(&self) -> Option<usize> {
        let position = self.body.pose().position();
        self.targets
            .iter()
            .position(|t| t.center.distance(position) <= self.config.goal_tolerance)
    }

    fn observation(&self) -> VectorObservation {
        VectorObservation::new(self.body.state_vector())
    }

    /// Apply an action without training: the manual-control half of the
    /// renderer interface. Rescans but computes no reward.
    ///
    /// # Errors
    /// Returns [`forager_core::Error::InvalidAction`] for an index outside
    /// the action space.
    pub fn take_action(&mut self, action: DiscreteAction) -> forager_core::Result<()> {
        self.body.apply_action(action)?;
        self.body.scan(&self.targets);
        Ok(())
    }

    /// Reward for the current situation, per the three-way policy
    #[must_use]
    pub fn calculate_reward(&self) -> Reward {
        self.config
            .rewards
            .evaluate(self.reached_target().is_some(), self.out_of_bounds())
    }

    /// Current agent pose, for the rendering adapter
    #[must_use]
    pub fn pose(&self) -> Pose {
        self.body.pose()
    }

    /// Latest sensor readings, ordered by ray index (the debug overlay)
    #[must_use]
    pub fn sensor_readings(&self) -> &[SensorReading] {
        self.body.readings()
    }

    /// Targets still uncollected
    #[must_use]
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Targets collected this episode
    #[must_use]
    pub fn score(&self) -> usize {
        self.score
    }

    /// Environment configuration
    #[must_use]
    pub fn config(&self) -> &ForageEnvConfig {
        &self.config
    }
}

#[async_trait]
impl Environment for ForageEnv {
    type Observation = VectorObservation;
    type Action = DiscreteAction;

    fn observation_space(&self) -> Box<dyn ObservationSpace<Observation = Self::Observation>> {
        let sensors = &self.body.config().sensors;
        let mut low = vec![0.0; sensors.vision_line_count];
        let mut high = vec![sensors.vision_radius; sensors.vision_line_count];
        // Nearest-direction slot carries a pre-normalized absolute angle
        low.push(-360.0);
        high.push(720.0);

        Box::new(
            BoxObservationSpace::new(low, high)
                .expect("bounds built with matching lengths"),
        )
    }

    fn action_space(&self) -> Box<dyn ActionSpace<Action = Self::Action>> {
        Box::new(DiscreteSpace::new(ACTION_COUNT))
    }

    async fn reset(&mut self) -> forager_core::Result<(Self::Observation, StepInfo)> {
        self.respawn();
        debug!(
            targets = self.targets.len(),
            width = self.config.width,
            height = self.config.height,
            "arena reset"
        );
        Ok((self.observation(), StepInfo::default()))
    }

    async fn step(&mut self, action: Self::Action) -> forager_core::Result<Step<Self::Observation>> {
        self.body.apply_action(action)?;
        self.steps += 1;

        let collided = self.out_of_bounds();
        let reached = self.reached_target();
        let reward = self.config.rewards.evaluate(reached.is_some(), collided);

        if let Some(index) = reached {
            let collected = self.targets.swap_remove(index);
            self.score += 1;
            trace!(
                x = collected.center.x,
                y = collected.center.y,
                score = self.score,
                "target collected"
            );
        }

        self.body.scan(&self.targets);

        let done = collided || self.targets.is_empty();
        let truncated = !done && self.config.max_steps.map_or(false, |m| self.steps >= m);

        let mut info = StepInfo::default();
        info.fields
            .insert("score".to_string(), serde_json::json!(self.score));

        Ok(Step {
            observation: self.observation(),
            reward,
            done,
            truncated,
            info,
        })
    }
}

//! DQN-style training loop
//!
//! One `step()` per tick: read sensors, pick an action epsilon-greedily,
//! apply it, store the transition, then fit the value function toward
//! bootstrapped targets sampled from the replay buffer. The caller drives
//! one step at a time; a step runs to completion before the next begins.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use forager_core::{
    greedy_action, ActionValueFunction, DiscreteAction, Environment, Error, Observation, Result,
    Reward, Transition,
};

use crate::buffer::ReplayBuffer;
use crate::schedule::{ConstantSchedule, Schedule};

/// Training loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Exploration rate for epsilon-greedy selection
    pub epsilon: f64,
    /// Discount factor for bootstrapped targets
    pub gamma: f64,
    /// Transitions per fit
    pub batch_size: usize,
    /// Replay buffer capacity
    pub replay_capacity: usize,
    /// Seed for exploration and sampling; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.1,
            gamma: 0.99,
            batch_size: 32,
            replay_capacity: 10_000,
            seed: None,
        }
    }
}

impl TrainerConfig {
    /// Validate the configuration
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] when epsilon or gamma leave
    /// `[0, 1]`, or a size parameter is zero.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(Error::InvalidConfig(format!(
                "epsilon must be in [0, 1], got {}",
                self.epsilon
            )));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(Error::InvalidConfig(format!(
                "gamma must be in [0, 1], got {}",
                self.gamma
            )));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be at least 1".to_string()));
        }
        if self.replay_capacity == 0 {
            return Err(Error::InvalidConfig(
                "replay_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Aggregate training metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainerMetrics {
    /// Total steps taken
    pub total_steps: usize,
    /// Completed episodes
    pub episodes: usize,
    /// Cumulative reward over all steps
    pub total_reward: f64,
    /// Loss of the most recent fit
    pub last_loss: Option<f64>,
}

/// Outcome of one training step
#[derive(Debug, Clone)]
pub struct StepReport {
    /// Action taken
    pub action: DiscreteAction,
    /// Reward received
    pub reward: Reward,
    /// Fit loss; `None` when the buffer held fewer than a batch
    pub loss: Option<f64>,
    /// Whether the episode ended (terminally or truncated)
    pub done: bool,
}

/// DQN-style trainer coupling an environment to an action-value function
pub struct Trainer<E, Q> {
    env: E,
    qnet: Q,
    buffer: ReplayBuffer,
    config: TrainerConfig,
    epsilon: Box<dyn Schedule>,
    rng: StdRng,
    /// Flattened observation carried between steps; `None` forces a reset
    current: Option<Vec<f64>>,
    metrics: TrainerMetrics,
}

impl<E, Q> Trainer<E, Q>
where
    E: Environment<Action = DiscreteAction>,
    Q: ActionValueFunction,
{
    /// Create a trainer from a validated configuration
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] when the configuration is rejected.
    pub fn new(env: E, qnet: Q, config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        let buffer = ReplayBuffer::new(config.replay_capacity)?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let epsilon: Box<dyn Schedule> = Box::new(ConstantSchedule {
            value: config.epsilon,
        });

        Ok(Self {
            env,
            qnet,
            buffer,
            config,
            epsilon,
            rng,
            current: None,
            metrics: TrainerMetrics::default(),
        })
    }

    /// Replace the constant epsilon with a decay schedule
    #[must_use]
    pub fn with_epsilon_schedule(mut self, schedule: impl Schedule + 'static) -> Self {
        self.epsilon = Box::new(schedule);
        self
    }

    /// Training metrics so far
    #[must_use]
    pub fn metrics(&self) -> &TrainerMetrics {
        &self.metrics
    }

    /// Transitions currently held in the replay buffer
    #[must_use]
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// The driven environment
    #[must_use]
    pub fn env(&self) -> &E {
        &self.env
    }

    /// The learned value function
    #[must_use]
    pub fn qnet(&self) -> &Q {
        &self.qnet
    }

    /// Tear down into the environment and value function
    #[must_use]
    pub fn into_parts(self) -> (E, Q) {
        (self.env, self.qnet)
    }

    async fn select_action(&mut self, state: &Array1<f64>) -> Result<usize> {
        let epsilon = self.epsilon.value(self.metrics.total_steps);
        let explore = self.rng.gen::<f64>() < epsilon;

        if explore {
            Ok(self.rng.gen_range(0..self.qnet.num_actions()))
        } else {
            let values = self.qnet.predict(&state.view()).await?;
            Ok(greedy_action(&values))
        }
    }

    /// Perform one training step.
    ///
    /// Resets the environment on first use and after a terminal step.
    /// When the buffer holds fewer than `batch_size` transitions the fit
    /// is skipped and the report carries no loss.
    ///
    /// # Errors
    /// Propagates environment errors and fatal numeric faults from the
    /// value function; neither is retried here.
    pub async fn step(&mut self) -> Result<StepReport> {
        let state = match self.current.take() {
            Some(state) => state,
            None => {
                let (observation, _info) = self.env.reset().await?;
                observation.to_vec()
            }
        };

        let state_vec = Array1::from(state.clone());
        let action = self.select_action(&state_vec).await?;
        let step = self.env.step(DiscreteAction(action)).await?;

        let next_state = step.observation.to_vec();
        let terminal = step.done || step.truncated;
        self.buffer.push(Transition {
            state,
            action: DiscreteAction(action),
            reward: step.reward,
            next_state: next_state.clone(),
            done: terminal,
        });

        let loss = self.fit_batch().await?;

        self.metrics.total_steps += 1;
        self.metrics.total_reward += step.reward.0;
        if loss.is_some() {
            self.metrics.last_loss = loss;
        }
        if terminal {
            self.metrics.episodes += 1;
            self.current = None;
        } else {
            self.current = Some(next_state);
        }

        trace!(
            action,
            reward = step.reward.0,
            loss,
            done = terminal,
            "training step"
        );

        Ok(StepReport {
            action: DiscreteAction(action),
            reward: step.reward,
            loss,
            done: terminal,
        })
    }

    /// Build bootstrapped targets for a sampled batch and fit the value
    /// function toward them. Only the taken action's slot moves: every
    /// other slot keeps the network's own current prediction.
    async fn fit_batch(&mut self) -> Result<Option<f64>> {
        let num_actions = self.qnet.num_actions();
        let Some(batch) = self.buffer.sample(self.config.batch_size, &mut self.rng) else {
            return Ok(None);
        };

        let state_dim = batch[0].state.len();
        let mut states = Array2::zeros((batch.len(), state_dim));
        let mut targets = Array2::zeros((batch.len(), num_actions));

        for (i, transition) in batch.iter().enumerate() {
            let state = Array1::from(transition.state.clone());
            let mut target = self.qnet.predict(&state.view()).await?;

            let value = if transition.done {
                transition.reward.0
            } else {
                let next_state = Array1::from(transition.next_state.clone());
                let next_values = self.qnet.predict(&next_state.view()).await?;
                let max_next = next_values
                    .iter()
                    .copied()
                    .fold(f64::NEG_INFINITY, f64::max);
                transition.reward.0 + self.config.gamma * max_next
            };

            if transition.action.0 >= num_actions {
                return Err(Error::InvalidAction(format!(
                    "stored action {} outside 0..{num_actions}",
                    transition.action.0
                )));
            }
            target[transition.action.0] = value;

            states.row_mut(i).assign(&state);
            targets.row_mut(i).assign(&target);
        }

        let loss = self.qnet.fit(&states, &targets).await?;
        Ok(Some(loss))
    }

    /// Run `steps` training steps and return the metrics
    ///
    /// # Errors
    /// Propagates the first error from [`Trainer::step`].
    pub async fn train(&mut self, steps: usize) -> Result<TrainerMetrics> {
        for _ in 0..steps {
            self.step().await?;
        }
        debug!(
            steps = self.metrics.total_steps,
            episodes = self.metrics.episodes,
            total_reward = self.metrics.total_reward,
            "training run finished"
        );
        Ok(self.metrics.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qnet::{Activation, QNetwork, QNetworkConfig};
    use async_trait::async_trait;
    use forager_core::{
        ActionSpace, BoxObservationSpace, DiscreteSpace, ObservationSpace, StepInfo,
        VectorObservation,
    };
    use ndarray::ArrayView1;

    /// Environment that hands out a fixed observation and records actions
    struct FixedEnv {
        actions: Vec<usize>,
    }

    #[async_trait]
    impl Environment for FixedEnv {
        type Observation = VectorObservation;
        type Action = DiscreteAction;

        fn observation_space(&self) -> Box<dyn ObservationSpace<Observation = Self::Observation>> {
            Box::new(BoxObservationSpace::new(vec![0.0; 3], vec![1.0; 3]).unwrap())
        }

        fn action_space(&self) -> Box<dyn ActionSpace<Action = Self::Action>> {
            Box::new(DiscreteSpace::new(4))
        }

        async fn reset(&mut self) -> Result<(Self::Observation, StepInfo)> {
            Ok((
                VectorObservation::new(vec![0.2, 0.4, 0.6]),
                StepInfo::default(),
            ))
        }

        async fn step(&mut self, action: Self::Action) -> Result<forager_core::Step<Self::Observation>> {
            self.actions.push(action.0);
            Ok(forager_core::Step {
                observation: VectorObservation::new(vec![0.2, 0.4, 0.6]),
                reward: Reward(-1.0),
                done: false,
                truncated: false,
                info: StepInfo::default(),
            })
        }
    }

    /// Value function with preset outputs and a no-op fit
    struct FixedValues(Vec<f64>);

    #[async_trait]
    impl ActionValueFunction for FixedValues {
        fn num_actions(&self) -> usize {
            self.0.len()
        }

        async fn predict(&self, _state: &ArrayView1<f64>) -> Result<Array1<f64>> {
            Ok(Array1::from(self.0.clone()))
        }

        async fn fit(&mut self, _states: &Array2<f64>, _targets: &Array2<f64>) -> Result<f64> {
            Ok(0.0)
        }
    }

    /// Value function that always faults
    struct Faulty;

    #[async_trait]
    impl ActionValueFunction for Faulty {
        fn num_actions(&self) -> usize {
            4
        }

        async fn predict(&self, _state: &ArrayView1<f64>) -> Result<Array1<f64>> {
            Err(Error::NumericFault("poisoned model".to_string()))
        }

        async fn fit(&mut self, _states: &Array2<f64>, _targets: &Array2<f64>) -> Result<f64> {
            Err(Error::NumericFault("poisoned model".to_string()))
        }
    }

    fn greedy_config() -> TrainerConfig {
        TrainerConfig {
            epsilon: 0.0,
            batch_size: 4,
            seed: Some(9),
            ..TrainerConfig::default()
        }
    }

    #[test]
    fn config_validation_rejects_bad_values() {
        for config in [
            TrainerConfig {
                epsilon: 1.5,
                ..TrainerConfig::default()
            },
            TrainerConfig {
                gamma: -0.1,
                ..TrainerConfig::default()
            },
            TrainerConfig {
                batch_size: 0,
                ..TrainerConfig::default()
            },
            TrainerConfig {
                replay_capacity: 0,
                ..TrainerConfig::default()
            },
        ] {
            assert!(config.validate().is_err());
        }
    }

    #[tokio::test]
    async fn greedy_selection_takes_the_first_maximum() {
        let env = FixedEnv { actions: vec![] };
        let qnet = FixedValues(vec![0.1, 0.9, 0.9, 0.2]);
        let mut trainer = Trainer::new(env, qnet, greedy_config()).unwrap();

        for _ in 0..10 {
            let report = trainer.step().await.unwrap();
            assert_eq!(report.action, DiscreteAction(1));
        }
        assert!(trainer.env().actions.iter().all(|&a| a == 1));
    }

    #[tokio::test]
    async fn fit_is_skipped_until_a_full_batch_exists() {
        let env = FixedEnv { actions: vec![] };
        let qnet = FixedValues(vec![0.0; 4]);
        let mut trainer = Trainer::new(env, qnet, greedy_config()).unwrap();

        for expected in [None, None, None, Some(0.0)] {
            let report = trainer.step().await.unwrap();
            assert_eq!(report.loss, expected);
        }
        assert_eq!(trainer.buffer_len(), 4);
    }

    #[tokio::test]
    async fn numeric_faults_are_fatal() {
        let env = FixedEnv { actions: vec![] };
        let mut trainer = Trainer::new(env, Faulty, greedy_config()).unwrap();
        let result = trainer.step().await;
        assert!(matches!(result, Err(Error::NumericFault(_))));
    }

    #[tokio::test]
    async fn end_to_end_training_in_the_arena() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("forager_agent=debug")
            .try_init();

        let env_config = forager_env::ForageEnvConfig {
            width: 200.0,
            height: 200.0,
            target_count: 5,
            seed: Some(17),
            ..forager_env::ForageEnvConfig::default()
        };
        let env = forager_env::ForageEnv::new(env_config).unwrap();

        let qnet = QNetwork::new(QNetworkConfig {
            input_dim: env.config().body.sensors.state_dim(),
            hidden_dims: vec![16],
            num_actions: forager_env::ACTION_COUNT,
            activation: Activation::Relu,
            learning_rate: 1e-3,
            seed: Some(23),
        })
        .unwrap();

        let config = TrainerConfig {
            batch_size: 8,
            seed: Some(31),
            ..TrainerConfig::default()
        };
        let mut trainer = Trainer::new(env, qnet, config).unwrap();

        let metrics = trainer.train(50).await.unwrap();
        assert_eq!(metrics.total_steps, 50);
        assert!(trainer.buffer_len() <= 50);
        assert!(
            metrics.last_loss.is_some(),
            "fits should run once the buffer fills a batch"
        );
        assert!(metrics.last_loss.unwrap().is_finite());
    }
}

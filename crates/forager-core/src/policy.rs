//! Policy abstractions for action selection

use async_trait::async_trait;

use crate::{Action, ActionSpace, Observation};

/// Core policy trait for selecting actions
#[async_trait]
pub trait Policy: Send + Sync {
    /// Observation type
    type Observation: Observation;
    /// Action type
    type Action: Action;

    /// Select an action given an observation
    async fn act(&self, observation: &Self::Observation) -> crate::Result<Self::Action>;
}

/// Epsilon-greedy policy wrapper.
///
/// With probability `epsilon` a uniformly random action is sampled from the
/// action space; otherwise the base policy decides. Action selection never
/// mutates the base policy.
pub struct EpsilonGreedy<P, A> {
    /// Base policy
    pub policy: P,
    /// Exploration rate
    epsilon: f64,
    /// Action space for random sampling
    pub action_space: A,
}

impl<P, A> EpsilonGreedy<P, A> {
    /// Create a new epsilon-greedy policy
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidConfig`] unless `epsilon` lies in
    /// `[0, 1]`.
    pub fn new(policy: P, epsilon: f64, action_space: A) -> crate::Result<Self> {
        if !(0.0..=1.0).contains(&epsilon) {
            return Err(crate::Error::InvalidConfig(format!(
                "epsilon must be in [0, 1], got {epsilon}"
            )));
        }
        Ok(Self {
            policy,
            epsilon,
            action_space,
        })
    }

    /// Get the exploration rate
    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Set the exploration rate, clamped into `[0, 1]`
    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon.clamp(0.0, 1.0);
    }
}

#[async_trait]
impl<P, A> Policy for EpsilonGreedy<P, A>
where
    P: Policy,
    A: ActionSpace<Action = P::Action> + Send + Sync,
{
    type Observation = P::Observation;
    type Action = P::Action;

    async fn act(&self, observation: &Self::Observation) -> crate::Result<Self::Action> {
        use rand::Rng;
        let explore = rand::thread_rng().gen::<f64>() < self.epsilon;

        if explore {
            Ok(self.action_space.sample())
        } else {
            self.policy.act(observation).await
        }
    }
}

/// Random policy that always selects uniformly random actions
pub struct RandomPolicy<A> {
    /// Action space
    pub action_space: A,
}

impl<A> RandomPolicy<A> {
    /// Create a new random policy
    pub fn new(action_space: A) -> Self {
        Self { action_space }
    }
}

#[async_trait]
impl<A> Policy for RandomPolicy<A>
where
    A: ActionSpace + Send + Sync,
{
    type Observation = crate::VectorObservation;
    type Action = A::Action;

    async fn act(&self, _observation: &Self::Observation) -> crate::Result<Self::Action> {
        Ok(self.action_space.sample())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DiscreteAction, DiscreteSpace, VectorObservation};

    struct Always(usize);

    #[async_trait]
    impl Policy for Always {
        type Observation = VectorObservation;
        type Action = DiscreteAction;

        async fn act(&self, _obs: &Self::Observation) -> crate::Result<Self::Action> {
            Ok(DiscreteAction(self.0))
        }
    }

    #[test]
    fn epsilon_zero_always_exploits() {
        let policy = EpsilonGreedy::new(Always(2), 0.0, DiscreteSpace::new(4)).unwrap();
        let obs = VectorObservation::new(vec![0.0]);
        for _ in 0..50 {
            let action = tokio_test::block_on(policy.act(&obs)).unwrap();
            assert_eq!(action, DiscreteAction(2));
        }
    }

    #[test]
    fn epsilon_one_stays_in_space() {
        let policy = EpsilonGreedy::new(Always(2), 1.0, DiscreteSpace::new(4)).unwrap();
        let obs = VectorObservation::new(vec![0.0]);
        for _ in 0..50 {
            let action = tokio_test::block_on(policy.act(&obs)).unwrap();
            assert!(action.0 < 4);
        }
    }

    #[test]
    fn epsilon_out_of_range_is_rejected() {
        assert!(EpsilonGreedy::new(Always(0), 1.5, DiscreteSpace::new(4)).is_err());
        assert!(EpsilonGreedy::new(Always(0), -0.1, DiscreteSpace::new(4)).is_err());
    }
}

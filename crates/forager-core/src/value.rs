//! Action-value function seam used by the training loop

use async_trait::async_trait;
use ndarray::{Array1, Array2, ArrayView1};

/// Action-value function Q(s, ·): maps a state vector to one value per
/// discrete action.
///
/// The training loop depends only on the two operations below; the internal
/// representation is unconstrained (linear model, feed-forward network,
/// lookup table). `predict` is read-only: parameters are mutated by `fit`
/// alone.
#[async_trait]
pub trait ActionValueFunction: Send + Sync {
    /// Fixed width of the value vector (= number of discrete actions)
    fn num_actions(&self) -> usize;

    /// Predict the per-action value vector for a state.
    ///
    /// Two calls with the same state and no intervening `fit` yield
    /// identical output.
    ///
    /// # Errors
    /// Returns [`crate::Error::NumericFault`] if the model produces a
    /// non-finite value, and [`crate::Error::DimensionMismatch`] for a
    /// state of the wrong width.
    async fn predict(&self, state: &ArrayView1<f64>) -> crate::Result<Array1<f64>>;

    /// Fit the function toward per-action target vectors for a batch of
    /// states, returning the achieved loss.
    ///
    /// # Errors
    /// Returns [`crate::Error::DimensionMismatch`] on malformed batch
    /// shapes and [`crate::Error::NumericFault`] if the update produces a
    /// non-finite loss.
    async fn fit(&mut self, states: &Array2<f64>, targets: &Array2<f64>) -> crate::Result<f64>;
}

/// Index of the maximum value, ties broken toward the lowest index.
///
/// This is the deterministic exploit half of epsilon-greedy selection.
#[must_use]
pub fn greedy_action(values: &Array1<f64>) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (i, &v) in values.iter().enumerate() {
        if v > best_value {
            best = i;
            best_value = v;
        }
    }
    best
}

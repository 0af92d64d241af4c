//! MLP action-value network over ndarray
//!
//! A small feed-forward network mapping sensor-state vectors to one value
//! per action. Inference is read-only; `fit` runs plain SGD on the mean
//! squared error with a hand-written backward pass. Non-finite numbers
//! anywhere are surfaced as fatal faults, never repaired.

use async_trait::async_trait;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::path::Path;

use forager_core::{ActionValueFunction, Error, Result};

/// Activation applied between hidden layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    /// Rectified linear unit
    Relu,
    /// Hyperbolic tangent
    Tanh,
}

/// Q-network configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QNetworkConfig {
    /// Input dimension (the sensor-state width)
    pub input_dim: usize,
    /// Hidden layer sizes
    pub hidden_dims: Vec<usize>,
    /// Output dimension (the number of discrete actions)
    pub num_actions: usize,
    /// Hidden-layer activation
    pub activation: Activation,
    /// SGD learning rate
    pub learning_rate: f64,
    /// Seed for weight initialization; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for QNetworkConfig {
    fn default() -> Self {
        Self {
            input_dim: 10,
            hidden_dims: vec![64, 64],
            num_actions: 4,
            activation: Activation::Relu,
            learning_rate: 1e-3,
            seed: None,
        }
    }
}

impl QNetworkConfig {
    /// Validate the configuration
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] for zero-sized layers or a
    /// non-positive learning rate.
    pub fn validate(&self) -> Result<()> {
        if self.input_dim == 0 {
            return Err(Error::InvalidConfig("input_dim must be at least 1".to_string()));
        }
        if self.num_actions == 0 {
            return Err(Error::InvalidConfig("num_actions must be at least 1".to_string()));
        }
        if self.hidden_dims.iter().any(|&d| d == 0) {
            return Err(Error::InvalidConfig(
                "hidden layer sizes must be at least 1".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

/// MLP action-value function
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QNetwork {
    config: QNetworkConfig,
    /// Weights per layer, input-major: `(fan_in, fan_out)`
    weights: Vec<Array2<f64>>,
    /// Biases per layer
    biases: Vec<Array1<f64>>,
}

impl QNetwork {
    /// Create a network with He-style normal initialization
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] when the configuration is rejected.
    pub fn new(config: QNetworkConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut dims = Vec::with_capacity(config.hidden_dims.len() + 2);
        dims.push(config.input_dim);
        dims.extend_from_slice(&config.hidden_dims);
        dims.push(config.num_actions);

        let mut weights = Vec::with_capacity(dims.len() - 1);
        let mut biases = Vec::with_capacity(dims.len() - 1);
        for pair in dims.windows(2) {
            let (fan_in, fan_out) = (pair[0], pair[1]);
            let scale = (2.0 / fan_in as f64).sqrt();
            let normal = Normal::new(0.0, scale)
                .map_err(|e| Error::InvalidConfig(e.to_string()))?;
            weights.push(Array2::from_shape_fn((fan_in, fan_out), |_| {
                normal.sample(&mut rng)
            }));
            biases.push(Array1::zeros(fan_out));
        }

        Ok(Self {
            config,
            weights,
            biases,
        })
    }

    /// Network configuration
    #[must_use]
    pub fn config(&self) -> &QNetworkConfig {
        &self.config
    }

    fn activate(&self, z: &Array1<f64>) -> Array1<f64> {
        match self.config.activation {
            Activation::Relu => z.mapv(|v| v.max(0.0)),
            Activation::Tanh => z.mapv(f64::tanh),
        }
    }

    fn activate_grad(&self, z: &Array1<f64>) -> Array1<f64> {
        match self.config.activation {
            Activation::Relu => z.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }),
            Activation::Tanh => z.mapv(|v| 1.0 - v.tanh().powi(2)),
        }
    }

    /// Forward pass caching pre-activations and activations for backprop.
    /// `activations[0]` is the input; the last activation is the linear
    /// output layer.
    fn forward_cached(&self, input: &ArrayView1<f64>) -> (Vec<Array1<f64>>, Vec<Array1<f64>>) {
        let layers = self.weights.len();
        let mut pre_activations = Vec::with_capacity(layers);
        let mut activations = Vec::with_capacity(layers + 1);
        activations.push(input.to_owned());

        for (i, (w, b)) in self.weights.iter().zip(&self.biases).enumerate() {
            let z = activations[i].dot(w) + b;
            let a = if i + 1 == layers { z.clone() } else { self.activate(&z) };
            pre_activations.push(z);
            activations.push(a);
        }

        (pre_activations, activations)
    }

    fn check_input(&self, state: &ArrayView1<f64>) -> Result<()> {
        if state.len() != self.config.input_dim {
            return Err(Error::DimensionMismatch {
                expected: self.config.input_dim,
                actual: state.len(),
            });
        }
        Ok(())
    }

    /// Save the network (configuration and weights) as JSON
    ///
    /// # Errors
    /// Returns serialization or IO errors.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(self)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Load a network previously written by [`QNetwork::save`]
    ///
    /// # Errors
    /// Returns serialization or IO errors, or [`Error::InvalidConfig`] if
    /// the stored configuration is invalid.
    pub async fn load(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        let network: Self = serde_json::from_str(&json)?;
        network.config.validate()?;
        Ok(network)
    }
}

#[async_trait]
impl ActionValueFunction for QNetwork {
    fn num_actions(&self) -> usize {
        self.config.num_actions
    }

    async fn predict(&self, state: &ArrayView1<f64>) -> Result<Array1<f64>> {
        self.check_input(state)?;
        let (_, activations) = self.forward_cached(state);
        let output = activations
            .last()
            .cloned()
            .unwrap_or_else(|| Array1::zeros(self.config.num_actions));

        if output.iter().any(|v| !v.is_finite()) {
            return Err(Error::NumericFault(
                "non-finite value in Q-network prediction".to_string(),
            ));
        }
        Ok(output)
    }

    async fn fit(&mut self, states: &Array2<f64>, targets: &Array2<f64>) -> Result<f64> {
        let batch = states.nrows();
        if batch == 0 {
            return Err(Error::InvalidConfig("cannot fit an empty batch".to_string()));
        }
        if targets.nrows() != batch {
            return Err(Error::DimensionMismatch {
                expected: batch,
                actual: targets.nrows(),
            });
        }
        if states.ncols() != self.config.input_dim {
            return Err(Error::DimensionMismatch {
                expected: self.config.input_dim,
                actual: states.ncols(),
            });
        }
        if targets.ncols() != self.config.num_actions {
            return Err(Error::DimensionMismatch {
                expected: self.config.num_actions,
                actual: targets.ncols(),
            });
        }

        let layers = self.weights.len();
        let mut grad_weights: Vec<Array2<f64>> = self
            .weights
            .iter()
            .map(|w| Array2::zeros(w.raw_dim()))
            .collect();
        let mut grad_biases: Vec<Array1<f64>> = self
            .biases
            .iter()
            .map(|b| Array1::zeros(b.raw_dim()))
            .collect();

        let mut loss_sum = 0.0;
        for (state, target) in states.axis_iter(Axis(0)).zip(targets.axis_iter(Axis(0))) {
            let (pre_activations, activations) = self.forward_cached(&state);
            let output = &activations[layers];

            // MSE gradient w.r.t. the linear output
            let mut delta = output - &target.to_owned();
            loss_sum += delta.mapv(|d| d * d).sum();

            for layer in (0..layers).rev() {
                let input = activations[layer].view().insert_axis(Axis(1));
                let delta_row = delta.view().insert_axis(Axis(0));
                grad_weights[layer] += &input.dot(&delta_row);
                grad_biases[layer] += &delta;

                if layer > 0 {
                    let back = self.weights[layer].dot(&delta);
                    delta = back * self.activate_grad(&pre_activations[layer - 1]);
                }
            }
        }

        let scale = self.config.learning_rate / batch as f64;
        for (w, g) in self.weights.iter_mut().zip(&grad_weights) {
            *w -= &(g * scale);
        }
        for (b, g) in self.biases.iter_mut().zip(&grad_biases) {
            *b -= &(g * scale);
        }

        let loss = loss_sum / (batch * self.config.num_actions) as f64;
        if !loss.is_finite() {
            return Err(Error::NumericFault(format!(
                "non-finite loss from Q-network fit: {loss}"
            )));
        }
        Ok(loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::arr1;

    fn small_config() -> QNetworkConfig {
        QNetworkConfig {
            input_dim: 3,
            hidden_dims: vec![8],
            num_actions: 2,
            activation: Activation::Tanh,
            learning_rate: 0.05,
            seed: Some(42),
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let bad = QNetworkConfig {
            input_dim: 0,
            ..small_config()
        };
        assert!(QNetwork::new(bad).is_err());

        let bad = QNetworkConfig {
            learning_rate: 0.0,
            ..small_config()
        };
        assert!(QNetwork::new(bad).is_err());
    }

    #[test]
    fn predict_is_idempotent_without_a_fit() {
        let network = QNetwork::new(small_config()).unwrap();
        let state = arr1(&[0.3, -0.2, 0.9]);
        let first = tokio_test::block_on(network.predict(&state.view())).unwrap();
        let second = tokio_test::block_on(network.predict(&state.view())).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn same_seed_builds_the_same_network() {
        let a = QNetwork::new(small_config()).unwrap();
        let b = QNetwork::new(small_config()).unwrap();
        let state = arr1(&[0.1, 0.2, 0.3]);
        let out_a = tokio_test::block_on(a.predict(&state.view())).unwrap();
        let out_b = tokio_test::block_on(b.predict(&state.view())).unwrap();
        assert_eq!(out_a, out_b);
    }

    #[test]
    fn predict_rejects_wrong_width() {
        let network = QNetwork::new(small_config()).unwrap();
        let state = arr1(&[0.1, 0.2]);
        assert!(tokio_test::block_on(network.predict(&state.view())).is_err());
    }

    #[tokio::test]
    async fn fit_pulls_the_taken_action_toward_its_target() {
        let mut network = QNetwork::new(small_config()).unwrap();
        let state = arr1(&[0.5, -0.3, 0.1]);

        let before = network.predict(&state.view()).await.unwrap();
        let mut target = before.clone();
        target[0] += 1.0;

        let states = state.clone().insert_axis(Axis(0));
        let targets = target.clone().insert_axis(Axis(0));

        let mut last_loss = f64::INFINITY;
        for _ in 0..200 {
            last_loss = network.fit(&states, &targets).await.unwrap();
        }

        let after = network.predict(&state.view()).await.unwrap();
        assert!(
            (after[0] - target[0]).abs() < (before[0] - target[0]).abs(),
            "fit should reduce the taken action's error"
        );
        assert!(last_loss < 0.5);
    }

    #[tokio::test]
    async fn fit_rejects_mismatched_shapes() {
        let mut network = QNetwork::new(small_config()).unwrap();
        let states = Array2::zeros((2, 3));
        let targets = Array2::zeros((3, 2));
        assert!(network.fit(&states, &targets).await.is_err());

        let targets = Array2::zeros((2, 5));
        assert!(network.fit(&states, &targets).await.is_err());
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let network = QNetwork::new(small_config()).unwrap();
        let path = std::env::temp_dir().join("forager-qnet-roundtrip.json");

        network.save(&path).await.unwrap();
        let restored = QNetwork::load(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.ok();

        let state = arr1(&[0.4, 0.4, -0.8]);
        let original = network.predict(&state.view()).await.unwrap();
        let reloaded = restored.predict(&state.view()).await.unwrap();
        for (a, b) in original.iter().zip(reloaded.iter()) {
            assert_relative_eq!(*a, *b);
        }
    }
}

//! Experience replay buffer

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::VecDeque;

use forager_core::Transition;

/// Bounded store of past transitions with uniform random sampling.
///
/// Capacity is fixed at construction. Pushing at capacity evicts the
/// oldest transition first. The buffer has exactly one writer, the
/// training loop, and needs no locking.
#[derive(Debug, Clone)]
pub struct ReplayBuffer {
    buffer: VecDeque<Transition>,
    capacity: usize,
}

impl ReplayBuffer {
    /// Create a new replay buffer
    ///
    /// # Errors
    /// Returns [`forager_core::Error::InvalidConfig`] for a zero capacity.
    pub fn new(capacity: usize) -> forager_core::Result<Self> {
        if capacity == 0 {
            return Err(forager_core::Error::InvalidConfig(
                "replay capacity must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Add a transition, evicting the oldest if at capacity
    pub fn push(&mut self, transition: Transition) {
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(transition);
    }

    /// Sample `batch_size` distinct transitions uniformly at random.
    ///
    /// Returns `None` when fewer than `batch_size` transitions are stored;
    /// the caller skips its fit for that tick.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        batch_size: usize,
        rng: &mut R,
    ) -> Option<Vec<&Transition>> {
        if self.buffer.len() < batch_size {
            return None;
        }

        let indices: Vec<usize> = (0..self.buffer.len()).collect();
        let chosen = indices.choose_multiple(rng, batch_size);
        Some(chosen.map(|&i| &self.buffer[i]).collect())
    }

    /// Current number of stored transitions
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Configured capacity
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Explicit reset: drop every stored transition
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forager_core::{DiscreteAction, Reward};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn transition(tag: f64) -> Transition {
        Transition {
            state: vec![tag],
            action: DiscreteAction(0),
            reward: Reward(tag),
            next_state: vec![tag + 1.0],
            done: false,
        }
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(ReplayBuffer::new(0).is_err());
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut buffer = ReplayBuffer::new(5).unwrap();
        for i in 0..20 {
            buffer.push(transition(i as f64));
            assert!(buffer.len() <= 5);
        }
        assert_eq!(buffer.len(), 5);
    }

    #[test]
    fn oldest_transitions_are_evicted_first() {
        let mut buffer = ReplayBuffer::new(3).unwrap();
        for i in 0..5 {
            buffer.push(transition(i as f64));
        }
        let mut rng = StdRng::seed_from_u64(0);
        let sample = buffer.sample(3, &mut rng).unwrap();
        let mut tags: Vec<f64> = sample.iter().map(|t| t.reward.0).collect();
        tags.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(tags, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn sample_requires_a_full_batch() {
        let mut buffer = ReplayBuffer::new(10).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        buffer.push(transition(0.0));
        assert!(buffer.sample(2, &mut rng).is_none());
        buffer.push(transition(1.0));
        assert_eq!(buffer.sample(2, &mut rng).unwrap().len(), 2);
    }

    #[test]
    fn clear_resets_the_store() {
        let mut buffer = ReplayBuffer::new(4).unwrap();
        buffer.push(transition(0.0));
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 4);
    }
}

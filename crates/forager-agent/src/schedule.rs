//! Exploration-rate schedules

/// Trait for schedules (e.g., for epsilon decay)
pub trait Schedule: Send + Sync {
    /// Get value at step t
    fn value(&self, t: usize) -> f64;
}

/// Constant schedule
#[derive(Debug, Clone)]
pub struct ConstantSchedule {
    /// Constant value
    pub value: f64,
}

impl Schedule for ConstantSchedule {
    fn value(&self, _t: usize) -> f64 {
        self.value
    }
}

/// Linear schedule that decays from start to end over steps
#[derive(Debug, Clone)]
pub struct LinearSchedule {
    /// Starting value
    pub start: f64,
    /// Ending value
    pub end: f64,
    /// Number of steps for decay
    pub steps: usize,
}

impl LinearSchedule {
    /// Create a new linear schedule
    #[must_use]
    pub fn new(start: f64, end: f64, steps: usize) -> Self {
        Self { start, end, steps }
    }
}

impl Schedule for LinearSchedule {
    fn value(&self, t: usize) -> f64 {
        if t >= self.steps {
            self.end
        } else {
            let progress = t as f64 / self.steps as f64;
            self.start + (self.end - self.start) * progress
        }
    }
}

/// Exponential decay schedule with a floor
#[derive(Debug, Clone)]
pub struct ExponentialSchedule {
    /// Starting value
    pub start: f64,
    /// Minimum value
    pub min_value: f64,
    /// Decay rate per step
    pub decay_rate: f64,
}

impl ExponentialSchedule {
    /// Create a new exponential schedule
    #[must_use]
    pub fn new(start: f64, min_value: f64, decay_rate: f64) -> Self {
        Self {
            start,
            min_value,
            decay_rate,
        }
    }
}

impl Schedule for ExponentialSchedule {
    fn value(&self, t: usize) -> f64 {
        let value = self.start * self.decay_rate.powf(t as f64);
        value.max(self.min_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn linear_schedule_hits_both_endpoints() {
        let schedule = LinearSchedule::new(1.0, 0.1, 100);
        assert_relative_eq!(schedule.value(0), 1.0);
        assert_relative_eq!(schedule.value(100), 0.1);
        assert_relative_eq!(schedule.value(1000), 0.1);
        assert!(schedule.value(50) < 1.0 && schedule.value(50) > 0.1);
    }

    #[test]
    fn exponential_schedule_respects_the_floor() {
        let schedule = ExponentialSchedule::new(1.0, 0.05, 0.9);
        assert_relative_eq!(schedule.value(0), 1.0);
        assert!(schedule.value(10) < 0.5);
        assert_relative_eq!(schedule.value(10_000), 0.05);
    }

    #[test]
    fn constant_schedule_never_moves() {
        let schedule = ConstantSchedule { value: 0.1 };
        assert_relative_eq!(schedule.value(0), schedule.value(1_000_000));
    }
}

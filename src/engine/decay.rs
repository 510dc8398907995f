/// Continuous-time exponentially weighted rate.
///
/// Past contributions lose `decay_factor` of their weight per unit of time, in
/// both the event sum and the elapsed-time base, so `value()` is events per
/// unit time regardless of how irregularly `update` is called.
#[derive(Debug, Clone)]
pub struct DecayEstimator {
    last_update: f64,
    numerator: f64,
    denominator: f64,
    decay_factor: f64,
}

impl DecayEstimator {
    /// Starts an empty estimate at `start`.
    #[must_use]
    pub const fn new(decay_factor: f64, start: f64) -> Self {
        Self {
            last_update: start,
            numerator: 0.0,
            denominator: 0.0,
            decay_factor,
        }
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "the estimator is defined over real-valued time"
    )]
    pub fn update(&mut self, value: f64, timestamp: f64) {
        if timestamp <= self.last_update {
            self.numerator += value;
            self.last_update = timestamp;
            return;
        }
        let delta = timestamp - self.last_update;
        let factor = self.decay_factor.powf(delta);
        self.numerator = self.numerator * factor + value;
        self.denominator = self.denominator * factor + delta;
        self.last_update = timestamp;
    }

    /// Current estimate; 0 until time has advanced past the first sample.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "the estimator is defined over real-valued time"
    )]
    pub fn value(&self) -> f64 {
        if self.denominator > 0.0 {
            self.numerator / self.denominator
        } else {
            0.0
        }
    }

    #[must_use]
    pub const fn last_update(&self) -> f64 {
        self.last_update
    }
}

#[cfg(test)]
#[expect(clippy::float_arithmetic, reason = "tests drive synthetic timelines")]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 0.02;

    fn feed(rate: f64, seconds: u32, decay: f64) -> DecayEstimator {
        let mut estimator = DecayEstimator::new(decay, 0.0);
        let events = f64::from(seconds) * rate;
        let mut n = 1.0;
        while n <= events {
            estimator.update(1.0, n / rate);
            n += 1.0;
        }
        estimator
    }

    #[test]
    fn converges_to_unit_rate() -> Result<(), String> {
        let estimator = feed(1.0, 600, 0.9);
        let value = estimator.value();
        if (value - 1.0).abs() > TOLERANCE {
            return Err(format!("Expected ~1.0, got {}", value));
        }
        Ok(())
    }

    #[test]
    fn converges_to_configured_rate() -> Result<(), String> {
        let estimator = feed(250.0, 120, 0.9);
        let value = estimator.value();
        if (value / 250.0 - 1.0).abs() > TOLERANCE {
            return Err(format!("Expected ~250, got {}", value));
        }
        Ok(())
    }

    #[test]
    fn coincident_update_does_not_divide_by_zero() -> Result<(), String> {
        let mut estimator = DecayEstimator::new(0.9, 10.0);
        estimator.update(1.0, 10.0);
        let value = estimator.value();
        if !value.is_finite() {
            return Err(format!("Expected finite value, got {}", value));
        }
        Ok(())
    }

    #[test]
    fn coincident_updates_accumulate_without_decay() -> Result<(), String> {
        let mut estimator = DecayEstimator::new(0.5, 0.0);
        estimator.update(1.0, 1.0);
        estimator.update(1.0, 1.0);
        estimator.update(1.0, 1.0);
        let value = estimator.value();
        if (value - 3.0).abs() > 1e-9 {
            return Err(format!("Expected 3 events over 1s, got {}", value));
        }
        Ok(())
    }

    #[test]
    fn sparse_update_reads_as_instantaneous_rate() -> Result<(), String> {
        let mut estimator = DecayEstimator::new(0.9, 0.0);
        estimator.update(1.0, 4.0);
        let value = estimator.value();
        if (value - 0.25).abs() > 1e-9 {
            return Err(format!("Expected 0.25, got {}", value));
        }
        Ok(())
    }
}

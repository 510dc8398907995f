use std::time::{Duration, Instant};

use rand::Rng;
use rand::distributions::Open01;

use crate::args::WaitMode;

/// Spaces admissions to a target rate. A rate of zero admits immediately.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Option<Duration>,
    wait_mode: WaitMode,
    next_send: Instant,
}

impl RateLimiter {
    #[must_use]
    pub fn new(rate: f64, wait_mode: WaitMode, start: Instant) -> Self {
        Self {
            interval: interval_for(rate),
            wait_mode,
            next_send: start,
        }
    }

    #[must_use]
    pub const fn interval(&self) -> Option<Duration> {
        self.interval
    }

    #[must_use]
    pub const fn next_send(&self) -> Instant {
        self.next_send
    }

    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        self.interval.is_none() || now >= self.next_send
    }

    /// Time left until the next admission is due; zero when already due.
    #[must_use]
    pub fn until_due(&self, now: Instant) -> Duration {
        match self.interval {
            Some(_) => self.next_send.saturating_duration_since(now),
            None => Duration::ZERO,
        }
    }

    /// Books one admission and moves the next send time by one gap.
    pub fn on_admit<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if let Some(interval) = self.interval {
            let gap = gap(self.wait_mode, interval, rng);
            self.next_send = self.next_send.checked_add(gap).unwrap_or(self.next_send);
        }
    }
}

/// Gap before the next admission for the given mean interval.
///
/// Poisson gaps are `interval * -ln(1 - U)` with `U` drawn from the open
/// interval (0, 1), which keeps the logarithm finite.
pub(crate) fn gap<R: Rng + ?Sized>(mode: WaitMode, interval: Duration, rng: &mut R) -> Duration {
    match mode {
        WaitMode::Regular => interval,
        WaitMode::Poisson => {
            let uniform: f64 = rng.sample(Open01);
            Duration::try_from_secs_f64(exponential_secs(interval.as_secs_f64(), uniform))
                .unwrap_or(interval)
        }
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "inverse transform sampling of the exponential distribution"
)]
fn exponential_secs(mean: f64, uniform: f64) -> f64 {
    -(1.0 - uniform).ln() * mean
}

fn interval_for(rate: f64) -> Option<Duration> {
    if !rate.is_finite() || rate <= 0.0 {
        return None;
    }
    #[expect(clippy::float_arithmetic, reason = "rate to interval conversion")]
    let secs = 1.0 / rate;
    Duration::try_from_secs_f64(secs).ok()
}

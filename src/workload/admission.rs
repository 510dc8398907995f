use std::time::{Duration, Instant};

use rand::rngs::StdRng;

use super::corpus::QueryId;
use super::rate::RateLimiter;
use super::scheduler::QueryScheduler;

/// Most new connections started in one driver iteration.
pub const BURST_CAP: usize = 3;

/// Decides whether the next query may start now, and which one.
#[derive(Debug)]
pub struct AdmissionController {
    scheduler: QueryScheduler,
    limiter: RateLimiter,
    rng: StdRng,
    max_parallel: usize,
    max_queries: Option<u64>,
    sent: u64,
    exhausted: bool,
}

impl AdmissionController {
    #[must_use]
    pub const fn new(
        scheduler: QueryScheduler,
        limiter: RateLimiter,
        rng: StdRng,
        max_parallel: usize,
        max_queries: Option<u64>,
    ) -> Self {
        Self {
            scheduler,
            limiter,
            rng,
            max_parallel,
            max_queries,
            sent: 0,
            exhausted: false,
        }
    }

    /// Returns the query to start now if capacity is left, the rate limiter
    /// is due and no stop was requested. Marks the controller exhausted as
    /// soon as the schedule or the query cap runs out.
    pub fn try_admit(&mut self, now: Instant, open: usize, stopping: bool) -> Option<QueryId> {
        if stopping || self.exhausted || open >= self.max_parallel || !self.limiter.is_due(now) {
            return None;
        }
        let Some(id) = self.scheduler.next_query(&mut self.rng) else {
            self.exhausted = true;
            return None;
        };
        self.sent = self.sent.saturating_add(1);
        self.limiter.on_admit(&mut self.rng);
        if self.scheduler.is_spent() || self.max_queries.is_some_and(|cap| self.sent >= cap) {
            self.exhausted = true;
        }
        Some(id)
    }

    /// How long the driver may block before admission could succeed again.
    /// `None` when admission waits on a completion (or never resumes).
    #[must_use]
    pub fn admission_delay(&self, now: Instant, open: usize) -> Option<Duration> {
        if self.exhausted || open >= self.max_parallel {
            return None;
        }
        Some(self.limiter.until_due(now))
    }

    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    #[must_use]
    pub const fn sent(&self) -> u64 {
        self.sent
    }

    #[must_use]
    pub const fn max_parallel(&self) -> usize {
        self.max_parallel
    }
}

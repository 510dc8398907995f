use std::time::Duration;

use super::histogram::{LatencyHistogram, Percentiles};
use super::querylog::{Millis, QueryTimings};
use crate::error::SinkError;

/// Running counters and latency histograms of one benchmark run.
#[derive(Debug)]
pub struct RunStats {
    pub sent: u64,
    pub completed: u64,
    pub failed: u64,
    pub non_success: u64,
    pub peak_open: usize,
    connect: LatencyHistogram,
    first_byte: LatencyHistogram,
    last_byte: LatencyHistogram,
}

impl RunStats {
    /// # Errors
    ///
    /// Returns an error when a histogram cannot be created.
    pub fn new() -> Result<Self, SinkError> {
        Ok(Self {
            sent: 0,
            completed: 0,
            failed: 0,
            non_success: 0,
            peak_open: 0,
            connect: LatencyHistogram::new()?,
            first_byte: LatencyHistogram::new()?,
            last_byte: LatencyHistogram::new()?,
        })
    }

    pub fn observe_open(&mut self, open: usize) {
        self.peak_open = self.peak_open.max(open);
    }

    /// Counts a finished query and records its latencies.
    ///
    /// # Errors
    ///
    /// Returns an error when a latency cannot be recorded.
    pub fn record_completion(
        &mut self,
        timings: &QueryTimings,
        success: bool,
    ) -> Result<(), SinkError> {
        self.completed = self.completed.saturating_add(1);
        if !success {
            self.non_success = self.non_success.saturating_add(1);
        }
        self.connect.record(timings.connect)?;
        self.first_byte.record(timings.first_byte)?;
        self.last_byte.record(timings.last_byte)
    }

    pub fn record_failure(&mut self) {
        self.failed = self.failed.saturating_add(1);
    }

    #[must_use]
    pub fn into_summary(self, elapsed: Duration, rate: f64) -> RunSummary {
        RunSummary {
            sent: self.sent,
            completed: self.completed,
            failed: self.failed,
            non_success: self.non_success,
            peak_open: self.peak_open,
            elapsed,
            rate,
            connect: self.connect.percentiles(),
            first_byte: self.first_byte.percentiles(),
            last_byte: self.last_byte.percentiles(),
        }
    }
}

/// End-of-run report returned by the driver.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub sent: u64,
    pub completed: u64,
    /// Queries abandoned on a connect, write or read error.
    pub failed: u64,
    /// Completed queries with a non-2xx or unparsable status.
    pub non_success: u64,
    pub peak_open: usize,
    pub elapsed: Duration,
    /// Decayed completion rate at the end of the run.
    pub rate: f64,
    pub connect: Percentiles,
    pub first_byte: Percentiles,
    pub last_byte: Percentiles,
}

impl RunSummary {
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        lines.push(format!(
            "queries: sent {} completed {} failed {} non-2xx {}",
            self.sent, self.completed, self.failed, self.non_success
        ));
        lines.push(format!(
            "elapsed: {:.3}s peak open: {} q/s: {:.1}",
            self.elapsed.as_secs_f64(),
            self.peak_open,
            self.rate
        ));
        for (label, p) in [
            ("TC", &self.connect),
            ("T1", &self.first_byte),
            ("TF", &self.last_byte),
        ] {
            lines.push(format!(
                "{} ms: p50 {} p90 {} p99 {}",
                label,
                Millis(p.p50),
                Millis(p.p90),
                Millis(p.p99)
            ));
        }
        lines
    }
}

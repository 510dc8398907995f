//! Per-query logs, latency histograms and the run summary.
mod histogram;
mod querylog;
mod summary;

pub use histogram::{LatencyHistogram, Percentiles};
pub use querylog::{Millis, QueryRecord, QueryTimings, RunLogs};
pub use summary::{RunStats, RunSummary};

//! Terminal-facing output: the live progress line and the end-of-run report.
mod progress;

pub use progress::{PROGRESS_INTERVAL, ProgressLine, ProgressState};

use tracing::info;

use crate::metrics::RunSummary;

pub fn print_summary(summary: &RunSummary) {
    for line in summary.lines() {
        info!("{}", line);
    }
}

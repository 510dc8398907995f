pub(crate) const DEFAULT_QUERY_LOG: &str = "cxbench-queries.log";
pub(crate) const DEFAULT_ERROR_LOG: &str = "cxbench-errors.log";
/// Weight left on a completion after one second in the q/s estimate.
pub(crate) const DEFAULT_DECAY_FACTOR: f64 = 0.9;

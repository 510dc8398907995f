use thiserror::Error;

/// Failure of a single query. Logged and counted; the run continues.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("connect failed: {source}")]
    Connect {
        #[source]
        source: std::io::Error,
    },
    #[error("write failed: {source}")]
    Write {
        #[source]
        source: std::io::Error,
    },
    #[error("short write: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },
    #[error("read failed: {source}")]
    Read {
        #[source]
        source: std::io::Error,
    },
    #[error("request of {len} bytes exceeds the {limit} byte request buffer")]
    RequestTooLarge { len: usize, limit: usize },
}

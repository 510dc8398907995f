use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to open log '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write query log: {source}")]
    WriteQueryLog {
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write error log: {source}")]
    WriteErrorLog {
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to render progress line: {source}")]
    Progress {
        #[source]
        source: std::io::Error,
    },
    #[error("Latency histogram error: {message}")]
    Histogram { message: String },
}

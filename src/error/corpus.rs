use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Failed to read queries from '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read queries from stdin: {source}")]
    ReadStdin {
        #[source]
        source: std::io::Error,
    },
    #[error("Query list was empty.")]
    Empty,
}

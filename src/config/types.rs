use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::args::{BackendKind, WaitMode, parse_duration_arg};
use crate::error::ValidationError;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub target: Option<String>,
    #[serde(alias = "concurrency")]
    pub parallel: Option<usize>,
    pub rate: Option<f64>,
    pub wait_mode: Option<WaitMode>,
    #[serde(alias = "loop")]
    pub loop_mode: Option<bool>,
    pub random: Option<bool>,
    pub prefix: Option<String>,
    pub header: Option<String>,
    pub post: Option<bool>,
    pub output: Option<PathBuf>,
    pub errors: Option<PathBuf>,
    pub max_queries: Option<u64>,
    pub queries: Option<PathBuf>,
    pub backend: Option<BackendKind>,
    pub decay_factor: Option<f64>,
    pub seed: Option<u64>,
    pub probe_timeout: Option<DurationValue>,
}

/// Either bare seconds or a string with a unit (`"500ms"`, `"2s"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    /// Converts the config value into a non-zero duration.
    ///
    /// # Errors
    ///
    /// Returns an error when the duration is zero or cannot be parsed.
    pub fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(0) => Err(ValidationError::DurationZero),
            DurationValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            DurationValue::Text(text) => parse_duration_arg(text),
        }
    }
}

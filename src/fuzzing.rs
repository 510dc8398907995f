//! Entry points for the cargo-fuzz targets in `fuzz/`.
use std::time::Duration;

use clap::{CommandFactory, FromArgMatches};

use crate::args::{BenchArgs, TargetSpec, parse_duration_arg, parse_header_line, parse_target};
use crate::config::apply_config;
use crate::config::types::ConfigFile;
use crate::error::{AppError, AppResult, ConfigError};

/// Parses a `host:port` target.
///
/// # Errors
///
/// Returns an error when the target is malformed.
pub fn parse_target_input(input: &str) -> AppResult<TargetSpec> {
    parse_target(input).map_err(AppError::from)
}

/// Parses an extra header line.
///
/// # Errors
///
/// Returns an error when the header is malformed or spans lines.
pub fn parse_header_input(input: &str) -> AppResult<String> {
    parse_header_line(input).map_err(AppError::from)
}

/// Parses a duration argument (e.g. `10s`, `500ms`).
///
/// # Errors
///
/// Returns an error when the duration is invalid.
pub fn parse_duration_arg_input(input: &str) -> AppResult<Duration> {
    parse_duration_arg(input).map_err(AppError::from)
}

/// Parses TOML config and applies it to default arguments.
///
/// # Errors
///
/// Returns an error when parsing or validation fails.
pub fn apply_config_from_toml(input: &str) -> AppResult<BenchArgs> {
    let config: ConfigFile = toml::from_str(input).map_err(|err| {
        AppError::config(ConfigError::ParseToml {
            path: "<fuzz>".into(),
            source: err,
        })
    })?;
    let matches = BenchArgs::command().try_get_matches_from(["cxbench"])?;
    let mut args = BenchArgs::from_arg_matches(&matches)?;
    apply_config(&mut args, &matches, &config)?;
    Ok(args)
}

//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
mod parsers;
mod types;

#[cfg(test)]
mod tests;

pub use cli::BenchArgs;
pub use types::{BackendKind, PositiveU64, PositiveUsize, TargetSpec, WaitMode};

pub(crate) use defaults::{DEFAULT_ERROR_LOG, DEFAULT_QUERY_LOG};
pub(crate) use parsers::{
    parse_decay_factor, parse_duration_arg, parse_header_line, parse_prefix, parse_rate,
    parse_target,
};

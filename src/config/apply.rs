use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{
    BenchArgs, PositiveU64, PositiveUsize, parse_decay_factor, parse_header_line, parse_prefix,
    parse_rate, parse_target,
};
use crate::error::{AppError, AppResult, ConfigError, ValidationError};

use super::types::ConfigFile;

/// Applies config file values to every argument the command line left at
/// its default.
///
/// # Errors
///
/// Returns an error when a config value fails the same validation as its
/// command-line counterpart.
pub fn apply_config(
    args: &mut BenchArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_cli(matches, "target")
        && let Some(target) = config.target.as_deref()
    {
        args.target = Some(parse_target(target).map_err(|err| invalid("target", err))?);
    }

    if !is_cli(matches, "parallel")
        && let Some(parallel) = config.parallel
    {
        args.parallel = ensure_positive_usize(parallel, "parallel")?;
    }

    if !is_cli(matches, "rate")
        && let Some(rate) = config.rate
    {
        args.rate = parse_rate(&rate.to_string()).map_err(|err| invalid("rate", err))?;
    }

    if !is_cli(matches, "wait_mode")
        && let Some(wait_mode) = config.wait_mode
    {
        args.wait_mode = wait_mode;
    }

    if !is_cli(matches, "loop_mode")
        && let Some(loop_mode) = config.loop_mode
    {
        args.loop_mode = loop_mode;
    }

    if !is_cli(matches, "random")
        && let Some(random) = config.random
    {
        args.random = random;
    }

    if !is_cli(matches, "prefix")
        && let Some(prefix) = config.prefix.as_deref()
    {
        args.prefix = parse_prefix(prefix).map_err(|err| invalid("prefix", err))?;
    }

    if !is_cli(matches, "header")
        && let Some(header) = config.header.as_deref()
    {
        args.header = Some(parse_header_line(header).map_err(|err| invalid("header", err))?);
    }

    if !is_cli(matches, "post")
        && let Some(post) = config.post
    {
        args.post = post;
    }

    if !is_cli(matches, "output")
        && let Some(output) = config.output.clone()
    {
        args.output = output;
    }

    if !is_cli(matches, "errors")
        && let Some(errors) = config.errors.clone()
    {
        args.errors = errors;
    }

    if !is_cli(matches, "max_queries")
        && let Some(max_queries) = config.max_queries
    {
        args.max_queries = Some(ensure_positive_u64(max_queries, "max_queries")?);
    }

    if !is_cli(matches, "queries")
        && let Some(queries) = config.queries.clone()
    {
        args.queries = Some(queries);
    }

    if !is_cli(matches, "backend")
        && let Some(backend) = config.backend
    {
        args.backend = backend;
    }

    if !is_cli(matches, "decay_factor")
        && let Some(factor) = config.decay_factor
    {
        args.decay_factor =
            parse_decay_factor(&factor.to_string()).map_err(|err| invalid("decay_factor", err))?;
    }

    if !is_cli(matches, "seed")
        && let Some(seed) = config.seed
    {
        args.seed = Some(seed);
    }

    if !is_cli(matches, "probe_timeout")
        && let Some(timeout) = config.probe_timeout.as_ref()
    {
        args.probe_timeout = timeout
            .to_duration()
            .map_err(|err| invalid("probe_timeout", err))?;
    }

    Ok(())
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(ValueSource::CommandLine)
}

const fn invalid(field: &'static str, source: ValidationError) -> AppError {
    AppError::Config(ConfigError::InvalidField { field, source })
}

fn ensure_positive_u64(value: u64, field: &str) -> AppResult<PositiveU64> {
    PositiveU64::try_from(value).map_err(|err| {
        AppError::config(ConfigError::FieldMustBePositive {
            field: field.to_owned(),
            source: err,
        })
    })
}

fn ensure_positive_usize(value: usize, field: &str) -> AppResult<PositiveUsize> {
    PositiveUsize::try_from(value).map_err(|err| {
        AppError::config(ConfigError::FieldMustBePositive {
            field: field.to_owned(),
            source: err,
        })
    })
}

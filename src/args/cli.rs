use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

use super::defaults::{DEFAULT_DECAY_FACTOR, DEFAULT_ERROR_LOG, DEFAULT_QUERY_LOG};
use super::parsers::{
    parse_decay_factor, parse_duration_arg, parse_header_line, parse_positive_u64,
    parse_positive_usize, parse_prefix, parse_rate, parse_target,
};
use super::types::{BackendKind, PositiveU64, PositiveUsize, TargetSpec, WaitMode};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Single-threaded HTTP load generator: many non-blocking connections over poll/epoll/kqueue, Poisson or regular arrivals, per-query latency logs.",
    after_help = "The query corpus is read from stdin (or --queries), one request path per line."
)]
pub struct BenchArgs {
    /// Target as host:port (IPv6 as [addr]:port)
    #[arg(value_parser = parse_target)]
    pub target: Option<TargetSpec>,

    /// Maximum number of simultaneously open connections
    #[arg(
        long = "parallel",
        short = 'p',
        visible_alias = "concurrency",
        default_value = "1",
        value_parser = parse_positive_usize
    )]
    pub parallel: PositiveUsize,

    /// Target rate in queries per second (0 = unbounded)
    #[arg(long = "rate", short = 'r', default_value = "0", value_parser = parse_rate)]
    pub rate: f64,

    /// Inter-arrival distribution used with --rate
    #[arg(long = "wait-mode", value_enum, default_value_t = WaitMode::Poisson, ignore_case = true)]
    pub wait_mode: WaitMode,

    /// Cycle through the corpus until stopped
    #[arg(long = "loop", short = 'l')]
    pub loop_mode: bool,

    /// Randomize query order (shuffle once, or draw with replacement in loop mode)
    #[arg(long = "random", short = 'R', visible_alias = "randomize")]
    pub random: bool,

    /// Prefix prepended to every query path (the request path for --post)
    #[arg(long = "prefix", default_value = "", value_parser = parse_prefix)]
    pub prefix: String,

    /// One extra request header line, e.g. 'Authorization: Bearer x'
    #[arg(long = "header", short = 'H', value_parser = parse_header_line)]
    pub header: Option<String>,

    /// Send each query as a POST body instead of a GET path
    #[arg(long = "post")]
    pub post: bool,

    /// Query log path (appended)
    #[arg(long = "output", short = 'o', default_value = DEFAULT_QUERY_LOG)]
    pub output: PathBuf,

    /// Error log path (appended)
    #[arg(long = "errors", short = 'e', default_value = DEFAULT_ERROR_LOG)]
    pub errors: PathBuf,

    /// Stop admitting after this many queries
    #[arg(long = "max-queries", short = 'n', value_parser = parse_positive_u64)]
    pub max_queries: Option<PositiveU64>,

    /// Read the corpus from this file instead of stdin
    #[arg(long = "queries", short = 'q')]
    pub queries: Option<PathBuf>,

    /// Readiness backend
    #[arg(long = "backend", value_enum, default_value_t = BackendKind::Auto, ignore_case = true)]
    pub backend: BackendKind,

    /// Per-second decay factor of the q/s estimate, in (0, 1)
    #[arg(long = "decay-factor", default_value_t = DEFAULT_DECAY_FACTOR, value_parser = parse_decay_factor)]
    pub decay_factor: f64,

    /// Seed for random ordering and Poisson gaps
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Per-address connect timeout while probing the target (supports ms/s/m/h)
    #[arg(long = "probe-timeout", default_value = "5s", value_parser = parse_duration_arg)]
    pub probe_timeout: Duration,

    /// Increase log verbosity (-d debug, -dd trace)
    #[arg(long = "debug", short = 'd', action = ArgAction::Count)]
    pub debug: u8,

    /// Disable the progress line
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    /// Disable ANSI colours in log output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Path to a TOML or JSON config file
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}

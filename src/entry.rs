use std::time::Instant;

use clap::{ArgMatches, CommandFactory, FromArgMatches};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, error, info};

use crate::app::{ProgressLine, print_summary};
use crate::args::{BenchArgs, PositiveU64, TargetSpec};
use crate::config::{apply_config, load_config};
use crate::engine::{EngineConfig, RequestMethod, RequestTemplate, resolve_target, run_benchmark};
use crate::error::{AppError, AppResult, ValidationError};
use crate::metrics::RunLogs;
use crate::shutdown::StopFlag;
use crate::shutdown_handlers::spawn_signal_watcher;
use crate::workload::{
    AdmissionController, QueryCorpus, QueryScheduler, RateLimiter, ScheduleMode,
};

/// Binary entry point: parse, configure, run, report.
///
/// # Errors
///
/// Returns the first fatal error; it has already been logged.
pub fn run() -> AppResult<()> {
    let matches = BenchArgs::command().get_matches();
    let mut args = BenchArgs::from_arg_matches(&matches)?;
    crate::logger::init_logging(args.debug, args.no_color);

    run_with_args(&mut args, &matches).inspect_err(|err| error!("{}", err))
}

fn run_with_args(args: &mut BenchArgs, matches: &ArgMatches) -> AppResult<()> {
    if let Some(config) = load_config(args.config.as_deref())? {
        apply_config(args, matches, &config)?;
    }
    let target_spec = require_target(args)?;
    debug!("Settings: {:?}", args);

    let corpus = QueryCorpus::load(args.queries.as_deref())?;
    info!("Loaded {} queries", corpus.len());

    let target = resolve_target(&target_spec, args.probe_timeout)?;
    let method = if args.post {
        RequestMethod::Post
    } else {
        RequestMethod::Get
    };
    let engine_config = EngineConfig {
        target: target.addr,
        template: RequestTemplate::new(
            method,
            args.prefix.clone(),
            target.host,
            args.header.clone(),
        ),
        backend: args.backend,
        decay_factor: args.decay_factor,
    };

    let admission = build_admission(args, corpus.len());
    let mut logs = RunLogs::open(&args.output, &args.errors)?;
    let stop = StopFlag::new();
    let _signals = spawn_signal_watcher(&stop)?;
    let progress = if args.no_progress {
        None
    } else {
        ProgressLine::for_stderr(args.no_color)
    };

    let summary = run_benchmark(
        &engine_config,
        &corpus,
        admission,
        &mut logs,
        progress,
        &stop,
    )?;
    print_summary(&summary);
    Ok(())
}

fn require_target(args: &BenchArgs) -> AppResult<TargetSpec> {
    args.target
        .clone()
        .ok_or_else(|| AppError::validation(ValidationError::MissingTarget))
}

fn build_admission(args: &BenchArgs, corpus_len: usize) -> AdmissionController {
    let mut rng = args
        .seed
        .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    let mode = ScheduleMode::from_flags(args.loop_mode, args.random);
    debug!("Schedule {:?} over {} queries", mode, corpus_len);
    let scheduler = QueryScheduler::new(mode, corpus_len, &mut rng);
    let limiter = RateLimiter::new(args.rate, args.wait_mode, Instant::now());
    AdmissionController::new(
        scheduler,
        limiter,
        rng,
        args.parallel.get(),
        args.max_queries.map(PositiveU64::get),
    )
}

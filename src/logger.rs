use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Installs the global subscriber on stderr.
///
/// `CXBENCH_LOG` wins over `RUST_LOG`; without either, `verbosity` picks the
/// level (0 info, 1 debug, 2+ trace).
pub fn init_logging(verbosity: u8, no_color: bool) {
    let filter = std::env::var("CXBENCH_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .map_or_else(
            |_| EnvFilter::new(level_for(verbosity)),
            |value| EnvFilter::try_new(value).unwrap_or_else(|_| EnvFilter::new("info")),
        );

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set global default subscriber: {}", err);
    }
}

const fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

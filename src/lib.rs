//! Core library for the `cxbench` CLI.
//!
//! A single-threaded HTTP load generator: one non-blocking TCP connection
//! per query, multiplexed over poll, epoll or kqueue, admitted under a
//! parallel limit and a Poisson or regular arrival rate. The binary is a
//! thin wrapper around [`entry::run`]; the engine pieces are public so they
//! can be tested and fuzzed directly.
pub mod app;
pub mod args;
pub mod config;
pub mod engine;
pub mod entry;
pub mod error;
pub mod logger;
pub mod metrics;
pub mod shutdown;
pub mod shutdown_handlers;
pub mod workload;

#[cfg(feature = "fuzzing")]
pub mod fuzzing;

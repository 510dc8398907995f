use std::collections::TryReserveError;
use std::fmt;
use std::os::fd::RawFd;

use thiserror::Error;

/// Multiplexer operation that failed, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuxOp {
    Create,
    RegisterWrite,
    UpgradeRead,
    Deregister,
    Wait,
}

impl fmt::Display for MuxOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MuxOp::Create => "create",
            MuxOp::RegisterWrite => "register for write",
            MuxOp::UpgradeRead => "upgrade to read",
            MuxOp::Deregister => "deregister",
            MuxOp::Wait => "wait",
        };
        f.write_str(name)
    }
}

/// Errors that end the run. Nothing here is retried.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to create socket: {source}")]
    CreateSocket {
        #[source]
        source: std::io::Error,
    },
    #[error("{backend} multiplexer failed to {op} (fd {fd}): {source}")]
    Multiplexer {
        backend: &'static str,
        op: MuxOp,
        fd: RawFd,
        #[source]
        source: std::io::Error,
    },
    #[error("{backend} has no registration for slot {slot} (fd {fd}).")]
    UnknownRegistration {
        backend: &'static str,
        slot: usize,
        fd: RawFd,
    },
    #[error("Connection table full: {live} live connections, capacity {capacity}.")]
    TableFull { live: usize, capacity: usize },
    #[error("Failed to grow response buffer by {requested} bytes: {source}")]
    BufferAlloc {
        requested: usize,
        #[source]
        source: TryReserveError,
    },
    #[error("Multiplexer backend '{backend}' is not available on this platform.")]
    BackendUnavailable { backend: &'static str },
}

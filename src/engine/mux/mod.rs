//! Readiness multiplexing over poll(2), epoll(7) and kqueue(2).
//!
//! All backends implement [`Multiplexer`]. A connection is registered for
//! write readiness (the non-blocking connect finishing), upgraded to read
//! readiness once its request is sent, and deregistered right before its
//! socket is closed. The poll backend keeps its own dense interest array and
//! removes entries explicitly; epoll and kqueue let the kernel drop the
//! descriptor when it is closed, so their `deregister` only adjusts the
//! pending count.
use std::io;
use std::os::fd::RawFd;
use std::time::Duration;

use tracing::debug;

use crate::args::BackendKind;
use crate::error::{EngineError, MuxOp};

#[cfg(any(target_os = "linux", target_os = "android"))]
mod epoll;
#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "openbsd"
))]
mod kqueue;
mod poll;


#[cfg(any(target_os = "linux", target_os = "android"))]
pub use epoll::EpollMultiplexer;
#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "openbsd"
))]
pub use kqueue::KqueueMultiplexer;
pub use poll::PollMultiplexer;

/// Stable identifier of a connection in the driver's table.
pub type Slot = usize;

pub trait Multiplexer {
    /// Backend name for logs and errors.
    fn name(&self) -> &'static str;

    /// Starts watching `fd` for write readiness on behalf of `slot`.
    ///
    /// # Errors
    ///
    /// Returns an error when the kernel rejects the registration.
    fn register_for_write(&mut self, fd: RawFd, slot: Slot) -> Result<(), EngineError>;

    /// Switches `fd` from write to read readiness.
    ///
    /// # Errors
    ///
    /// Returns an error when the kernel rejects the change or `slot` is not
    /// registered.
    fn upgrade_to_read(&mut self, fd: RawFd, slot: Slot) -> Result<(), EngineError>;

    /// Stops tracking `slot`. Must be called before `fd` is closed.
    ///
    /// # Errors
    ///
    /// Returns an error when `slot` is not registered.
    fn deregister(&mut self, fd: RawFd, slot: Slot) -> Result<(), EngineError>;

    /// Blocks until at least one registered descriptor is ready or `timeout`
    /// elapses, then appends the ready slots to `ready`.
    ///
    /// With nothing registered this is a plain sleep. A signal interrupting
    /// the wait yields no slots.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying wait call fails for any reason
    /// other than a signal.
    fn wait(&mut self, timeout: Duration, ready: &mut Vec<Slot>) -> Result<(), EngineError>;

    /// Number of registered descriptors.
    fn pending_count(&self) -> usize;
}

/// Creates the backend for `kind`, resolving `Auto` by platform.
///
/// # Errors
///
/// Returns [`EngineError::BackendUnavailable`] when `kind` is not supported
/// here, or the creation error of the backend.
pub fn build_multiplexer(
    kind: BackendKind,
    capacity: usize,
) -> Result<Box<dyn Multiplexer>, EngineError> {
    let mux: Box<dyn Multiplexer> = match kind.resolve() {
        BackendKind::Poll => Box::new(PollMultiplexer::with_capacity(capacity)),
        BackendKind::Epoll => build_epoll(capacity)?,
        BackendKind::Kqueue => build_kqueue(capacity)?,
        BackendKind::Auto => Box::new(PollMultiplexer::with_capacity(capacity)),
    };
    debug!("Using {} multiplexer for up to {} descriptors", mux.name(), capacity);
    Ok(mux)
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn build_epoll(capacity: usize) -> Result<Box<dyn Multiplexer>, EngineError> {
    Ok(Box::new(EpollMultiplexer::new(capacity)?))
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn build_epoll(_capacity: usize) -> Result<Box<dyn Multiplexer>, EngineError> {
    Err(EngineError::BackendUnavailable { backend: "epoll" })
}

#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "openbsd"
))]
fn build_kqueue(capacity: usize) -> Result<Box<dyn Multiplexer>, EngineError> {
    Ok(Box::new(KqueueMultiplexer::new(capacity)?))
}

#[cfg(not(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "openbsd"
)))]
fn build_kqueue(_capacity: usize) -> Result<Box<dyn Multiplexer>, EngineError> {
    Err(EngineError::BackendUnavailable { backend: "kqueue" })
}

/// Milliseconds for poll/epoll, rounded up so a sub-millisecond deadline
/// does not turn into a busy loop.
fn timeout_millis(timeout: Duration) -> libc::c_int {
    let millis = timeout.as_millis();
    let rounded = if timeout.subsec_nanos().checked_rem(1_000_000) == Some(0) {
        millis
    } else {
        millis.saturating_add(1)
    };
    libc::c_int::try_from(rounded).unwrap_or(libc::c_int::MAX)
}

fn idle_wait(backend: &'static str, timeout: Duration) {
    debug!("{}: nothing registered, sleeping {:?}", backend, timeout);
    std::thread::sleep(timeout);
}

/// Converts a failed syscall into either "interrupted" (`Ok(false)`) or a
/// fatal error.
fn interrupted_or_fatal(
    backend: &'static str,
    op: MuxOp,
    fd: RawFd,
) -> Result<bool, EngineError> {
    let err = io::Error::last_os_error();
    if err.kind() == io::ErrorKind::Interrupted {
        debug!("{} wait was interrupted by a signal", backend);
        return Ok(false);
    }
    Err(EngineError::Multiplexer {
        backend,
        op,
        fd,
        source: err,
    })
}

fn os_error(backend: &'static str, op: MuxOp, fd: RawFd) -> EngineError {
    EngineError::Multiplexer {
        backend,
        op,
        fd,
        source: io::Error::last_os_error(),
    }
}

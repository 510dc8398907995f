use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::time::Duration;

use tracing::debug;

use super::{Multiplexer, Slot, idle_wait, interrupted_or_fatal, os_error};
use crate::error::{EngineError, MuxOp};

const NAME: &str = "kqueue";

/// kqueue backend. Write interest is one-shot, read interest persists until
/// the socket is closed, which also drops both filters from the queue.
pub struct KqueueMultiplexer {
    queue: OwnedFd,
    events: Vec<libc::kevent>,
    pending: usize,
}

impl KqueueMultiplexer {
    /// Creates the kernel queue.
    ///
    /// # Errors
    ///
    /// Returns an error when `kqueue()` fails.
    pub fn new(capacity: usize) -> Result<Self, EngineError> {
        // SAFETY: kqueue has no memory preconditions.
        let fd = unsafe { libc::kqueue() };
        if fd < 0 {
            return Err(os_error(NAME, MuxOp::Create, fd));
        }
        // SAFETY: `fd` was just returned by kqueue and is owned by nobody else.
        let queue = unsafe { OwnedFd::from_raw_fd(fd) };
        Ok(Self {
            queue,
            events: Vec::with_capacity(capacity),
            pending: 0,
        })
    }

    fn submit(&self, fd: RawFd, filter: i16, flags: u16, slot: Slot) -> bool {
        let mut change = empty_event();
        change.ident = usize::try_from(fd).unwrap_or(usize::MAX);
        change.filter = filter;
        change.flags = flags;
        change.udata = slot as *mut libc::c_void;
        // SAFETY: one initialized change entry, no event list, no timeout; the
        // queue descriptor is open.
        let rc = unsafe {
            libc::kevent(
                self.queue.as_raw_fd(),
                &raw const change,
                1,
                std::ptr::null_mut(),
                0,
                std::ptr::null(),
            )
        };
        rc >= 0
    }
}

fn empty_event() -> libc::kevent {
    // SAFETY: kevent is a plain C struct for which all-zero bytes is valid.
    unsafe { std::mem::zeroed() }
}

fn timespec(timeout: Duration) -> libc::timespec {
    libc::timespec {
        tv_sec: libc::time_t::try_from(timeout.as_secs()).unwrap_or(libc::time_t::MAX),
        tv_nsec: libc::c_long::try_from(timeout.subsec_nanos()).unwrap_or(0),
    }
}

impl Multiplexer for KqueueMultiplexer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn register_for_write(&mut self, fd: RawFd, slot: Slot) -> Result<(), EngineError> {
        if !self.submit(fd, libc::EVFILT_WRITE, libc::EV_ADD | libc::EV_ONESHOT, slot) {
            return Err(os_error(NAME, MuxOp::RegisterWrite, fd));
        }
        self.pending = self.pending.saturating_add(1);
        Ok(())
    }

    fn upgrade_to_read(&mut self, fd: RawFd, slot: Slot) -> Result<(), EngineError> {
        if !self.submit(fd, libc::EVFILT_READ, libc::EV_ADD, slot) {
            return Err(os_error(NAME, MuxOp::UpgradeRead, fd));
        }
        Ok(())
    }

    fn deregister(&mut self, fd: RawFd, slot: Slot) -> Result<(), EngineError> {
        if self.pending == 0 {
            return Err(EngineError::UnknownRegistration {
                backend: NAME,
                slot,
                fd,
            });
        }
        self.pending = self.pending.saturating_sub(1);
        Ok(())
    }

    fn wait(&mut self, timeout: Duration, ready: &mut Vec<Slot>) -> Result<(), EngineError> {
        if self.pending == 0 {
            idle_wait(NAME, timeout);
            return Ok(());
        }
        debug!("polling for {} fds", self.pending);
        self.events.resize(self.pending, empty_event());
        let max_events = libc::c_int::try_from(self.events.len()).unwrap_or(libc::c_int::MAX);
        let deadline = timespec(timeout);
        // SAFETY: no change list; `events` holds `max_events` initialized
        // entries the kernel may overwrite; `deadline` outlives the call.
        let rc = unsafe {
            libc::kevent(
                self.queue.as_raw_fd(),
                std::ptr::null(),
                0,
                self.events.as_mut_ptr(),
                max_events,
                &raw const deadline,
            )
        };
        if rc < 0 {
            interrupted_or_fatal(NAME, MuxOp::Wait, self.queue.as_raw_fd())?;
            return Ok(());
        }
        let count = usize::try_from(rc).unwrap_or(0);
        debug!("{} fds ready for something", count);
        for event in self.events.iter().take(count) {
            ready.push(event.udata as Slot);
        }
        Ok(())
    }

    fn pending_count(&self) -> usize {
        self.pending
    }
}

use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::time::Duration;

use tracing::debug;

use super::{Multiplexer, Slot, idle_wait, interrupted_or_fatal, os_error, timeout_millis};
use crate::error::{EngineError, MuxOp};

const NAME: &str = "epoll";

/// Level-triggered epoll backend. The kernel owns the interest set; closing a
/// socket removes it, so `deregister` only tracks the count.
pub struct EpollMultiplexer {
    epoll: OwnedFd,
    events: Vec<libc::epoll_event>,
    pending: usize,
}

impl EpollMultiplexer {
    /// Creates the epoll instance.
    ///
    /// # Errors
    ///
    /// Returns an error when `epoll_create1` fails.
    pub fn new(capacity: usize) -> Result<Self, EngineError> {
        // SAFETY: epoll_create1 has no memory preconditions.
        let fd = unsafe { libc::epoll_create1(libc::EPOLL_CLOEXEC) };
        if fd < 0 {
            return Err(os_error(NAME, MuxOp::Create, fd));
        }
        // SAFETY: `fd` was just returned by epoll_create1 and is owned by nobody else.
        let epoll = unsafe { OwnedFd::from_raw_fd(fd) };
        Ok(Self {
            epoll,
            events: Vec::with_capacity(capacity),
            pending: 0,
        })
    }

    fn control(&self, op: libc::c_int, fd: RawFd, interest: libc::c_int, slot: Slot) -> bool {
        let mut event = libc::epoll_event {
            events: u32::try_from(interest).unwrap_or(0),
            u64: u64::try_from(slot).unwrap_or(u64::MAX),
        };
        // SAFETY: `event` lives for the duration of the call and both
        // descriptors are open.
        let rc = unsafe { libc::epoll_ctl(self.epoll.as_raw_fd(), op, fd, &raw mut event) };
        rc == 0
    }
}

impl Multiplexer for EpollMultiplexer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn register_for_write(&mut self, fd: RawFd, slot: Slot) -> Result<(), EngineError> {
        if !self.control(libc::EPOLL_CTL_ADD, fd, libc::EPOLLOUT, slot) {
            return Err(os_error(NAME, MuxOp::RegisterWrite, fd));
        }
        self.pending = self.pending.saturating_add(1);
        Ok(())
    }

    fn upgrade_to_read(&mut self, fd: RawFd, slot: Slot) -> Result<(), EngineError> {
        if !self.control(libc::EPOLL_CTL_MOD, fd, libc::EPOLLIN, slot) {
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
        self.events
            .resize(self.pending, libc::epoll_event { events: 0, u64: 0 });
        let max_events = libc::c_int::try_from(self.events.len()).unwrap_or(libc::c_int::MAX);
        // SAFETY: `events` holds `max_events` initialized entries that the
        // kernel may overwrite; the epoll descriptor is open.
        let rc = unsafe {
            libc::epoll_wait(
                self.epoll.as_raw_fd(),
                self.events.as_mut_ptr(),
                max_events,
                timeout_millis(timeout),
            )
        };
        if rc < 0 {
            interrupted_or_fatal(NAME, MuxOp::Wait, self.epoll.as_raw_fd())?;
            return Ok(());
        }
        let count = usize::try_from(rc).unwrap_or(0);
        debug!("{} fds ready for something", count);
        for event in self.events.iter().take(count) {
            let data = event.u64;
            if let Ok(slot) = Slot::try_from(data) {
                ready.push(slot);
            }
        }
        Ok(())
    }

    fn pending_count(&self) -> usize {
        self.pending
    }
}

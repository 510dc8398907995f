use std::os::fd::RawFd;
use std::time::Duration;

use tracing::{debug, trace};

use super::{Multiplexer, Slot, idle_wait, interrupted_or_fatal, timeout_millis};
use crate::error::{EngineError, MuxOp};

const NAME: &str = "poll";

/// Portable backend: a dense `pollfd` array handed to poll(2) on each wait.
///
/// `slots[i]` owns `fds[i]`; `positions[slot]` points back into both arrays
/// so removal can swap the last entry into the hole in O(1).
#[derive(Default)]
pub struct PollMultiplexer {
    fds: Vec<libc::pollfd>,
    slots: Vec<Slot>,
    positions: Vec<Option<usize>>,
}

impl PollMultiplexer {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fds: Vec::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            positions: Vec::with_capacity(capacity),
        }
    }

    fn position(&self, slot: Slot, fd: RawFd) -> Result<usize, EngineError> {
        self.positions
            .get(slot)
            .copied()
            .flatten()
            .ok_or(EngineError::UnknownRegistration {
                backend: NAME,
                slot,
                fd,
            })
    }
}

impl Multiplexer for PollMultiplexer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn register_for_write(&mut self, fd: RawFd, slot: Slot) -> Result<(), EngineError> {
        if self.positions.len() <= slot {
            self.positions.resize(slot.saturating_add(1), None);
        }
        let position = self.fds.len();
        self.fds.push(libc::pollfd {
            fd,
            events: libc::POLLOUT,
            revents: 0,
        });
        self.slots.push(slot);
        if let Some(entry) = self.positions.get_mut(slot) {
            *entry = Some(position);
        }
        Ok(())
    }

    fn upgrade_to_read(&mut self, fd: RawFd, slot: Slot) -> Result<(), EngineError> {
        let position = self.position(slot, fd)?;
        let entry = self
            .fds
            .get_mut(position)
            .ok_or(EngineError::UnknownRegistration {
                backend: NAME,
                slot,
                fd,
            })?;
        entry.events = libc::POLLIN;
        entry.revents = 0;
        Ok(())
    }

    fn deregister(&mut self, fd: RawFd, slot: Slot) -> Result<(), EngineError> {
        let position = self.position(slot, fd)?;
        if let Some(entry) = self.positions.get_mut(slot) {
            *entry = None;
        }
        self.fds.swap_remove(position);
        self.slots.swap_remove(position);
        if let Some(moved) = self.slots.get(position).copied()
            && let Some(entry) = self.positions.get_mut(moved)
        {
            *entry = Some(position);
        }
        Ok(())
    }

    fn wait(&mut self, timeout: Duration, ready: &mut Vec<Slot>) -> Result<(), EngineError> {
        if self.fds.is_empty() {
            idle_wait(NAME, timeout);
            return Ok(());
        }
        debug!("polling for {} fds", self.fds.len());
        let nfds = libc::nfds_t::try_from(self.fds.len()).unwrap_or(libc::nfds_t::MAX);
        // SAFETY: `fds` is a live, initialized buffer of `nfds` pollfd entries
        // and is not touched elsewhere while poll runs.
        let rc = unsafe { libc::poll(self.fds.as_mut_ptr(), nfds, timeout_millis(timeout)) };
        if rc < 0 {
            interrupted_or_fatal(NAME, MuxOp::Wait, -1)?;
            return Ok(());
        }
        let mut remaining = usize::try_from(rc).unwrap_or(0);
        debug!("{} fds ready for something", remaining);
        for (entry, slot) in self.fds.iter().zip(self.slots.iter()) {
            if remaining == 0 {
                break;
            }
            if entry.revents != 0 {
                trace!("fd {} revents {:#x}", entry.fd, entry.revents);
                ready.push(*slot);
                remaining = remaining.saturating_sub(1);
            }
        }
        Ok(())
    }

    fn pending_count(&self) -> usize {
        self.fds.len()
    }
}

#[cfg(test)]
impl PollMultiplexer {
    pub(super) fn position_of(&self, slot: Slot) -> Option<usize> {
        self.positions.get(slot).copied().flatten()
    }

    pub(super) fn interest_of(&self, slot: Slot) -> Option<libc::c_short> {
        let position = self.position_of(slot)?;
        self.fds.get(position).map(|entry| entry.events)
    }
}

//! One query's exchange: non-blocking connect, single request write, read
//! until the server closes.
use std::io::{self, Read};
use std::net::SocketAddr;
use std::os::fd::{AsRawFd, RawFd};
use std::time::Instant;

use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tracing::trace;

use super::buffer::DynamicBuffer;
use super::request::RequestTemplate;
use super::response::{ResponseStatus, parse_status};
use crate::error::{ConnectionError, EngineError};
use crate::metrics::QueryTimings;
use crate::workload::QueryId;

const READ_CHUNK: usize = 16 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    WaitingResult,
    Closed,
}

/// Result of handling read readiness.
#[derive(Debug)]
pub enum ReadProgress {
    /// No more data right now; wait for the next readiness event.
    Pending,
    /// The server closed the connection; the response is complete.
    Finished,
    Failed(ConnectionError),
}

#[derive(Debug)]
pub struct Connection {
    socket: Socket,
    status: ConnectionStatus,
    query: QueryId,
    connect_time: Instant,
    connected_time: Option<Instant>,
    first_result_time: Option<Instant>,
    finished_result_time: Option<Instant>,
    response: DynamicBuffer,
}

/// Creates a non-blocking TCP socket for `target`.
///
/// # Errors
///
/// Returns [`EngineError::CreateSocket`] when the socket cannot be created
/// or switched to non-blocking mode.
pub fn new_socket(target: &SocketAddr) -> Result<Socket, EngineError> {
    let socket = Socket::new(Domain::for_address(*target), Type::STREAM, Some(Protocol::TCP))
        .map_err(|err| EngineError::CreateSocket { source: err })?;
    socket
        .set_nonblocking(true)
        .map_err(|err| EngineError::CreateSocket { source: err })?;
    Ok(socket)
}

impl Connection {
    /// Starts a non-blocking connect. "In progress" is the normal outcome;
    /// any other error fails the query.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Connect`] when the connect is refused
    /// immediately.
    pub fn connect(
        socket: Socket,
        target: &SockAddr,
        query: QueryId,
        now: Instant,
    ) -> Result<Self, ConnectionError> {
        match socket.connect(target) {
            Ok(()) => {}
            Err(err) if connect_in_progress(&err) => {}
            Err(err) => return Err(ConnectionError::Connect { source: err }),
        }
        Ok(Self {
            socket,
            status: ConnectionStatus::Connecting,
            query,
            connect_time: now,
            connected_time: None,
            first_result_time: None,
            finished_result_time: None,
            response: DynamicBuffer::new(),
        })
    }

    #[must_use]
    pub fn fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }

    #[must_use]
    pub const fn status(&self) -> ConnectionStatus {
        self.status
    }

    #[must_use]
    pub const fn query(&self) -> QueryId {
        self.query
    }

    #[must_use]
    pub fn response(&self) -> &[u8] {
        self.response.as_slice()
    }

    /// Write readiness after connect: checks the connect result, renders the
    /// request into `scratch` and sends it with exactly one write.
    ///
    /// # Errors
    ///
    /// Returns the per-query failure: a deferred connect error, a request too
    /// large to render, a write error (including would-block) or a short
    /// write. Partial writes are never continued.
    pub fn on_connected(
        &mut self,
        now: Instant,
        template: &RequestTemplate,
        query: &[u8],
        scratch: &mut Vec<u8>,
    ) -> Result<(), ConnectionError> {
        match self.socket.take_error() {
            Ok(None) => {}
            Ok(Some(err)) | Err(err) => return Err(ConnectionError::Connect { source: err }),
        }
        self.connected_time = Some(now);
        self.status = ConnectionStatus::Connected;

        template.render(query, scratch)?;
        let written = self
            .socket
            .send(scratch.as_slice())
            .map_err(|err| ConnectionError::Write { source: err })?;
        if written != scratch.len() {
            return Err(ConnectionError::ShortWrite {
                written,
                expected: scratch.len(),
            });
        }
        trace!("fd {}: sent {} request bytes", self.fd(), written);
        self.status = ConnectionStatus::WaitingResult;
        Ok(())
    }

    /// Read readiness: drains every byte available now into the response
    /// buffer.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::BufferAlloc`] when the response buffer cannot
    /// grow. Socket errors are reported through [`ReadProgress::Failed`].
    pub fn on_readable(&mut self, now: Instant) -> Result<ReadProgress, EngineError> {
        if self.first_result_time.is_none() {
            self.first_result_time = Some(now);
        }
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.socket.read(&mut chunk) {
                Ok(0) => {
                    self.finished_result_time = Some(Instant::now());
                    self.response.shrink();
                    return Ok(ReadProgress::Finished);
                }
                Ok(read) => {
                    let bytes = chunk.get(..read).unwrap_or_default();
                    self.response.store(bytes)?;
                    trace!("fd {}: read {} bytes", self.fd(), read);
                }
                Err(err)
                    if matches!(
                        err.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                    ) =>
                {
                    return Ok(ReadProgress::Pending);
                }
                Err(err) => {
                    return Ok(ReadProgress::Failed(ConnectionError::Read { source: err }));
                }
            }
        }
    }

    /// When the server closed the connection, once it has.
    #[must_use]
    pub const fn finished_at(&self) -> Option<Instant> {
        self.finished_result_time
    }

    /// Status line of the complete response.
    #[must_use]
    pub fn status_line(&self) -> ResponseStatus {
        ResponseStatus::from(parse_status(self.response.as_slice()))
    }

    /// Latencies from the connect start. Phases not reached yet count as
    /// ending at the finish time.
    #[must_use]
    pub fn timings(&self) -> QueryTimings {
        let finished = self.finished_result_time.unwrap_or(self.connect_time);
        let since_connect = |at: Option<Instant>| {
            at.unwrap_or(finished)
                .saturating_duration_since(self.connect_time)
        };
        QueryTimings {
            connect: since_connect(self.connected_time),
            first_byte: since_connect(self.first_result_time),
            last_byte: since_connect(self.finished_result_time),
        }
    }

    /// Releases the response buffer and closes the socket.
    pub fn close(mut self) {
        self.response.reset();
        self.status = ConnectionStatus::Closed;
        trace!("fd {}: closed", self.fd());
    }
}

fn connect_in_progress(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EINPROGRESS) || err.kind() == io::ErrorKind::WouldBlock
}

//! The benchmark loop: admit, wait, dispatch, report, drain.
use std::io::Write;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use chrono::Utc;
use slab::Slab;
use socket2::SockAddr;
use tracing::{debug, info, trace, warn};

use super::connection::{Connection, ConnectionStatus, ReadProgress, new_socket};
use super::decay::DecayEstimator;
use super::mux::{Multiplexer, Slot, build_multiplexer};
use super::request::RequestTemplate;
use super::response::ResponseStatus;
use crate::app::{PROGRESS_INTERVAL, ProgressLine, ProgressState};
use crate::args::BackendKind;
use crate::error::{AppResult, ConnectionError, EngineError};
use crate::metrics::{QueryRecord, RunLogs, RunStats, RunSummary};
use crate::shutdown::StopFlag;
use crate::workload::{AdmissionController, BURST_CAP, QueryCorpus, QueryId};

/// Connection table slots kept beyond the parallel limit.
pub const TABLE_HEADROOM: usize = 16;

/// Validated, immutable settings of one run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub target: SocketAddr,
    pub template: RequestTemplate,
    pub backend: BackendKind,
    pub decay_factor: f64,
}

/// What a readiness event asks the driver to do with a connection.
enum Step {
    Idle,
    Upgrade,
    Finish,
    Abandon(ConnectionError),
}

pub struct BenchmarkDriver<'run, W: Write> {
    config: &'run EngineConfig,
    corpus: &'run QueryCorpus,
    admission: AdmissionController,
    logs: &'run mut RunLogs<W>,
    progress: Option<ProgressLine>,
    stop: StopFlag,
    mux: Box<dyn Multiplexer>,
    table: Slab<Connection>,
    capacity: usize,
    target: SockAddr,
    estimator: DecayEstimator,
    stats: RunStats,
    start: Instant,
    scratch: Vec<u8>,
    ready: Vec<Slot>,
    stop_logged: bool,
}

/// Runs a whole benchmark and returns its summary.
///
/// # Errors
///
/// Returns an error on any fatal condition: multiplexer or socket creation,
/// registration failures, a full connection table, allocation failure, or a
/// log write failure. Individual query failures are counted, not returned.
pub fn run_benchmark<W: Write>(
    config: &EngineConfig,
    corpus: &QueryCorpus,
    admission: AdmissionController,
    logs: &mut RunLogs<W>,
    progress: Option<ProgressLine>,
    stop: &StopFlag,
) -> AppResult<RunSummary> {
    BenchmarkDriver::new(config, corpus, admission, logs, progress, stop)?.run()
}

impl<'run, W: Write> BenchmarkDriver<'run, W> {
    /// Sets up the multiplexer and a connection table sized to the parallel
    /// limit plus [`TABLE_HEADROOM`].
    ///
    /// # Errors
    ///
    /// Returns an error when the multiplexer or the histograms cannot be
    /// created.
    pub fn new(
        config: &'run EngineConfig,
        corpus: &'run QueryCorpus,
        admission: AdmissionController,
        logs: &'run mut RunLogs<W>,
        progress: Option<ProgressLine>,
        stop: &StopFlag,
    ) -> AppResult<Self> {
        let capacity = admission.max_parallel().saturating_add(TABLE_HEADROOM);
        let mux = build_multiplexer(config.backend, capacity)?;
        info!("Using {} backend against {}", mux.name(), config.target);
        Ok(Self {
            config,
            corpus,
            admission,
            logs,
            progress,
            stop: stop.clone(),
            mux,
            table: Slab::with_capacity(capacity),
            capacity,
            target: SockAddr::from(config.target),
            estimator: DecayEstimator::new(config.decay_factor, 0.0),
            stats: RunStats::new()?,
            start: Instant::now(),
            scratch: Vec::new(),
            ready: Vec::with_capacity(capacity),
            stop_logged: false,
        })
    }

    /// # Errors
    ///
    /// See [`run_benchmark`].
    pub fn run(mut self) -> AppResult<RunSummary> {
        loop {
            let stopping = self.stop.is_stop_requested();
            if stopping && !self.stop_logged {
                info!(
                    "Stopping: no new queries, {} still pending",
                    self.table.len()
                );
                self.stop_logged = true;
            }

            let now = Instant::now();
            for _ in 0..BURST_CAP {
                let Some(query) = self.admission.try_admit(now, self.table.len(), stopping) else {
                    break;
                };
                self.start_query(query, now)?;
            }

            if (stopping || self.admission.is_exhausted()) && self.table.is_empty() {
                break;
            }

            self.report_progress(stopping);

            let timeout = self.wait_timeout(Instant::now(), stopping);
            self.ready.clear();
            self.mux.wait(timeout, &mut self.ready)?;
            if !self.ready.is_empty() {
                debug!("{} of {} fds ready", self.ready.len(), self.mux.pending_count());
            }
            let ready = std::mem::take(&mut self.ready);
            for slot in &ready {
                self.dispatch(*slot)?;
            }
            self.ready = ready;
        }
        self.finish()
    }

    fn start_query(&mut self, query: QueryId, now: Instant) -> AppResult<()> {
        if self.table.len() >= self.capacity {
            return Err(EngineError::TableFull {
                live: self.table.len(),
                capacity: self.capacity,
            }
            .into());
        }
        let socket = new_socket(&self.config.target)?;
        let conn = match Connection::connect(socket, &self.target, query, now) {
            Ok(conn) => conn,
            Err(err) => {
                warn!("Query {} failed: {}", query, err);
                self.stats.record_failure();
                return Ok(());
            }
        };
        let fd = conn.fd();
        let slot = self.table.insert(conn);
        self.mux.register_for_write(fd, slot)?;
        self.stats.observe_open(self.table.len());
        trace!("Query {} started on fd {} (slot {})", query, fd, slot);
        Ok(())
    }

    fn dispatch(&mut self, slot: Slot) -> AppResult<()> {
        let Some(conn) = self.table.get_mut(slot) else {
            debug!("Readiness for free slot {}", slot);
            return Ok(());
        };
        let step = match conn.status() {
            ConnectionStatus::Connecting => {
                let query = self.corpus.get(conn.query()).unwrap_or_default();
                match conn.on_connected(
                    Instant::now(),
                    &self.config.template,
                    query,
                    &mut self.scratch,
                ) {
                    Ok(()) => Step::Upgrade,
                    Err(err) => Step::Abandon(err),
                }
            }
            ConnectionStatus::WaitingResult => match conn.on_readable(Instant::now())? {
                ReadProgress::Pending => Step::Idle,
                ReadProgress::Finished => Step::Finish,
                ReadProgress::Failed(err) => Step::Abandon(err),
            },
            ConnectionStatus::Connected | ConnectionStatus::Closed => Step::Idle,
        };
        let fd = conn.fd();

        match step {
            Step::Idle => Ok(()),
            Step::Upgrade => Ok(self.mux.upgrade_to_read(fd, slot)?),
            Step::Finish => self.complete(slot),
            Step::Abandon(err) => self.abandon(slot, &err),
        }
    }

    fn abandon(&mut self, slot: Slot, err: &ConnectionError) -> AppResult<()> {
        let Some(conn) = self.table.try_remove(slot) else {
            return Ok(());
        };
        warn!(
            "Query {} ({}) failed: {}",
            conn.query(),
            String::from_utf8_lossy(self.corpus.get(conn.query()).unwrap_or_default()),
            err
        );
        self.mux.deregister(conn.fd(), slot)?;
        conn.close();
        self.stats.record_failure();
        Ok(())
    }

    fn complete(&mut self, slot: Slot) -> AppResult<()> {
        let Some(conn) = self.table.try_remove(slot) else {
            return Ok(());
        };
        self.mux.deregister(conn.fd(), slot)?;

        let status = conn.status_line();
        if let ResponseStatus::Malformed(malformed) = &status {
            warn!("Malformed status line: {}", malformed);
        }
        let timings = conn.timings();
        let record = QueryRecord {
            finished_at: Utc::now(),
            status: &status,
            response: conn.response(),
            timings,
            query: self.corpus.get(conn.query()).unwrap_or_default(),
        };
        self.logs.record(&record)?;
        let finished_at = self.run_seconds(conn.finished_at().unwrap_or_else(Instant::now));
        self.estimator.update(1.0, finished_at);
        self.stats.record_completion(&timings, status.is_success())?;
        conn.close();
        Ok(())
    }

    fn wait_timeout(&self, now: Instant, stopping: bool) -> Duration {
        if stopping {
            return PROGRESS_INTERVAL;
        }
        self.admission
            .admission_delay(now, self.table.len())
            .map_or(PROGRESS_INTERVAL, |delay| delay.min(PROGRESS_INTERVAL))
    }

    fn report_progress(&mut self, stopping: bool) {
        let state = if stopping {
            ProgressState::Stopping {
                pending: self.table.len(),
            }
        } else {
            ProgressState::Running {
                sent: self.admission.sent(),
                rate: self.estimator.value(),
            }
        };
        if let Some(progress) = self.progress.as_mut()
            && let Err(err) = progress.tick(Instant::now(), state)
        {
            warn!("Disabling progress line: {}", err);
            self.progress = None;
        }
    }

    fn run_seconds(&self, now: Instant) -> f64 {
        now.saturating_duration_since(self.start).as_secs_f64()
    }

    fn finish(mut self) -> AppResult<RunSummary> {
        if let Some(progress) = self.progress.as_mut()
            && let Err(err) = progress.finish()
        {
            warn!("Failed to finish progress line: {}", err);
        }
        self.logs.flush()?;
        self.stats.sent = self.admission.sent();
        let elapsed = self.start.elapsed();
        Ok(self.stats.into_summary(elapsed, self.estimator.value()))
    }
}

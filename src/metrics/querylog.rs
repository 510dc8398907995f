//! Append-only query and error logs.
//!
//! Query log, one line per finished query:
//! `<unix secs>.<micros> RES=<code> LEN=<bytes> TC=<ms> T1=<ms> TF=<ms> Q="<query>"`
//!
//! Error log, only for non-2xx or unparsable responses: a header line with
//! timestamp, status and query, then the raw response, then a newline.
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::engine::ResponseStatus;
use crate::error::SinkError;

/// Connect, first byte and last byte latencies, all from the connect start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryTimings {
    pub connect: Duration,
    pub first_byte: Duration,
    pub last_byte: Duration,
}

/// One finished query, borrowed from the connection that produced it.
#[derive(Debug)]
pub struct QueryRecord<'conn> {
    pub finished_at: DateTime<Utc>,
    pub status: &'conn ResponseStatus,
    pub response: &'conn [u8],
    pub timings: QueryTimings,
    pub query: &'conn [u8],
}

/// Milliseconds with microsecond precision, `12.345`.
#[derive(Debug, Clone, Copy)]
pub struct Millis(pub Duration);

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let micros = self.0.subsec_micros().checked_rem(1000).unwrap_or(0);
        write!(f, "{}.{:03}", self.0.as_millis(), micros)
    }
}

struct Timestamp(DateTime<Utc>);

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:06}",
            self.0.timestamp(),
            self.0.timestamp_subsec_micros()
        )
    }
}

pub struct RunLogs<W: Write> {
    queries: W,
    errors: W,
}

impl RunLogs<BufWriter<File>> {
    /// Opens both logs for appending, creating them when missing.
    ///
    /// # Errors
    ///
    /// Returns an error when either file cannot be opened.
    pub fn open(query_log: &Path, error_log: &Path) -> Result<Self, SinkError> {
        Ok(Self::new(
            BufWriter::new(open_append(query_log)?),
            BufWriter::new(open_append(error_log)?),
        ))
    }
}

impl<W: Write> RunLogs<W> {
    pub const fn new(queries: W, errors: W) -> Self {
        Self { queries, errors }
    }

    /// Writes the query log line and, for failed responses, the error entry.
    ///
    /// # Errors
    ///
    /// Returns an error when a log write fails.
    pub fn record(&mut self, record: &QueryRecord<'_>) -> Result<(), SinkError> {
        let timestamp = Timestamp(record.finished_at);
        let code = record.status.log_code();
        write!(
            self.queries,
            "{} RES={} LEN={} TC={} T1={} TF={} Q=\"",
            timestamp,
            code,
            record.response.len(),
            Millis(record.timings.connect),
            Millis(record.timings.first_byte),
            Millis(record.timings.last_byte),
        )
        .and_then(|()| self.queries.write_all(record.query))
        .and_then(|()| self.queries.write_all(b"\"\n"))
        .map_err(|err| SinkError::WriteQueryLog { source: err })?;

        if !record.status.is_success() {
            self.write_error_entry(&timestamp, code, record)
                .map_err(|err| SinkError::WriteErrorLog { source: err })?;
        }
        Ok(())
    }

    fn write_error_entry(
        &mut self,
        timestamp: &Timestamp,
        code: i32,
        record: &QueryRecord<'_>,
    ) -> std::io::Result<()> {
        write!(self.errors, "{} RES={} Q=\"", timestamp, code)?;
        self.errors.write_all(record.query)?;
        self.errors.write_all(b"\"\n")?;
        self.errors.write_all(record.response)?;
        self.errors.write_all(b"\n")
    }

    /// # Errors
    ///
    /// Returns an error when buffered output cannot be written out.
    pub fn flush(&mut self) -> Result<(), SinkError> {
        self.queries
            .flush()
            .map_err(|err| SinkError::WriteQueryLog { source: err })?;
        self.errors
            .flush()
            .map_err(|err| SinkError::WriteErrorLog { source: err })
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> (W, W) {
        (self.queries, self.errors)
    }
}

fn open_append(path: &Path) -> Result<File, SinkError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| SinkError::Open {
            path: path.to_path_buf(),
            source: err,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::parse_status;
    use chrono::TimeZone;

    fn record_into(
        logs: &mut RunLogs<Vec<u8>>,
        response: &[u8],
        query: &[u8],
    ) -> Result<(), String> {
        let status = ResponseStatus::from(parse_status(response));
        let finished_at = Utc
            .timestamp_opt(1_700_000_000, 5_000)
            .single()
            .ok_or("invalid timestamp")?;
        let record = QueryRecord {
            finished_at,
            status: &status,
            response,
            timings: QueryTimings {
                connect: Duration::from_micros(250),
                first_byte: Duration::from_micros(1_500),
                last_byte: Duration::from_micros(12_345),
            },
            query,
        };
        logs.record(&record).map_err(|err| err.to_string())
    }

    #[test]
    fn success_writes_only_the_query_line() -> Result<(), String> {
        let mut logs = RunLogs::new(Vec::new(), Vec::new());
        record_into(&mut logs, b"HTTP/1.1 200 OK\r\n\r\n", b"/a")?;
        let (queries, errors) = logs.into_inner();
        let line = String::from_utf8(queries).map_err(|err| err.to_string())?;
        let expected =
            "1700000000.000005 RES=200 LEN=19 TC=0.250 T1=1.500 TF=12.345 Q=\"/a\"\n";
        if line != expected {
            return Err(format!("Unexpected query line: {:?}", line));
        }
        if !errors.is_empty() {
            return Err("Success must not touch the error log".to_owned());
        }
        Ok(())
    }

    #[test]
    fn malformed_response_goes_to_both_logs() -> Result<(), String> {
        let mut logs = RunLogs::new(Vec::new(), Vec::new());
        record_into(&mut logs, b"GARBAGE\r\n", b"/bad")?;
        let (queries, errors) = logs.into_inner();
        let line = String::from_utf8(queries).map_err(|err| err.to_string())?;
        if !line.contains("RES=-1 LEN=9 ") || !line.ends_with("Q=\"/bad\"\n") {
            return Err(format!("Unexpected query line: {:?}", line));
        }
        let entry = String::from_utf8(errors).map_err(|err| err.to_string())?;
        if entry != "1700000000.000005 RES=-1 Q=\"/bad\"\nGARBAGE\r\n\n" {
            return Err(format!("Unexpected error entry: {:?}", entry));
        }
        Ok(())
    }

    #[test]
    fn non_2xx_is_logged_as_error() -> Result<(), String> {
        let mut logs = RunLogs::new(Vec::new(), Vec::new());
        record_into(&mut logs, b"HTTP/1.0 404 Not Found\r\n\r\nnope", b"/missing")?;
        let (_, errors) = logs.into_inner();
        let entry = String::from_utf8(errors).map_err(|err| err.to_string())?;
        if !entry.starts_with("1700000000.000005 RES=404 Q=\"/missing\"\nHTTP/1.0 404") {
            return Err(format!("Unexpected error entry: {:?}", entry));
        }
        Ok(())
    }

    #[test]
    fn query_field_keeps_raw_bytes() -> Result<(), String> {
        let mut logs = RunLogs::new(Vec::new(), Vec::new());
        record_into(&mut logs, b"HTTP/1.1 500 Oops\r\n\r\n", b"caf\xe9")?;
        let (queries, errors) = logs.into_inner();
        if !queries.ends_with(b"Q=\"caf\xe9\"\n") {
            return Err(format!("Unexpected query line: {:?}", queries));
        }
        if !errors.starts_with(b"1700000000.000005 RES=500 Q=\"caf\xe9\"\n") {
            return Err(format!("Unexpected error entry: {:?}", errors));
        }
        Ok(())
    }

    #[test]
    fn logs_append_to_existing_files() -> Result<(), String> {
        let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
        let query_path = dir.path().join("q.log");
        let error_path = dir.path().join("e.log");
        std::fs::write(&query_path, "previous\n").map_err(|err| err.to_string())?;
        let mut logs = RunLogs::open(&query_path, &error_path).map_err(|err| err.to_string())?;
        logs.flush().map_err(|err| err.to_string())?;
        drop(logs);
        let content = std::fs::read_to_string(&query_path).map_err(|err| err.to_string())?;
        if content != "previous\n" || !error_path.exists() {
            return Err("Expected append mode without truncation".to_owned());
        }
        Ok(())
    }

    #[test]
    fn millis_keep_microsecond_precision() -> Result<(), String> {
        let rendered = Millis(Duration::from_nanos(3_004_999)).to_string();
        if rendered != "3.004" {
            return Err(format!("Unexpected rendering: {}", rendered));
        }
        Ok(())
    }
}

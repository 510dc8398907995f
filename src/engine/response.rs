//! Status-line extraction for raw HTTP/1.x responses.
use std::fmt;

/// Status code written to the query log when the status line is unusable.
pub const STATUS_PARSE_ERROR: i32 = -1;

/// Longest diagnostic snippet kept from a malformed response.
pub const SNIPPET_LIMIT: usize = 100;

const PREFIXES: [&[u8]; 2] = [b"HTTP/1.1 ", b"HTTP/1.0 "];
const CODE_DIGITS: usize = 3;

/// Status line that did not parse, with the first line of the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedStatus {
    pub snippet: String,
}

impl fmt::Display for MalformedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed status line: {:?}", self.snippet)
    }
}

/// Outcome of [`parse_status`] as recorded in the logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseStatus {
    Code(u16),
    Malformed(MalformedStatus),
}

impl ResponseStatus {
    #[must_use]
    pub fn log_code(&self) -> i32 {
        match self {
            ResponseStatus::Code(code) => i32::from(*code),
            ResponseStatus::Malformed(_) => STATUS_PARSE_ERROR,
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, ResponseStatus::Code(200..=299))
    }
}

impl From<Result<u16, MalformedStatus>> for ResponseStatus {
    fn from(value: Result<u16, MalformedStatus>) -> Self {
        match value {
            Ok(code) => ResponseStatus::Code(code),
            Err(malformed) => ResponseStatus::Malformed(malformed),
        }
    }
}

/// Reads the three-digit status code following `HTTP/1.1 ` or `HTTP/1.0 `.
///
/// # Errors
///
/// Returns [`MalformedStatus`] when the prefix is wrong, the code is not
/// exactly three digits, or it falls outside 100..=999.
pub fn parse_status(buf: &[u8]) -> Result<u16, MalformedStatus> {
    let rest = PREFIXES
        .iter()
        .find_map(|prefix| buf.strip_prefix(*prefix))
        .ok_or_else(|| malformed(buf))?;

    let digits = rest.get(..CODE_DIGITS).ok_or_else(|| malformed(buf))?;
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(malformed(buf));
    }
    if rest.get(CODE_DIGITS).is_some_and(u8::is_ascii_digit) {
        return Err(malformed(buf));
    }

    let code = digits.iter().fold(0u16, |acc, digit| {
        acc.saturating_mul(10)
            .saturating_add(u16::from(digit.saturating_sub(b'0')))
    });
    if !(100..=999).contains(&code) {
        return Err(malformed(buf));
    }
    Ok(code)
}

fn malformed(buf: &[u8]) -> MalformedStatus {
    MalformedStatus {
        snippet: first_line_snippet(buf),
    }
}

/// First line of `buf`, cut at [`SNIPPET_LIMIT`] bytes.
#[must_use]
pub fn first_line_snippet(buf: &[u8]) -> String {
    let line_end = buf
        .iter()
        .position(|byte| *byte == b'\r' || *byte == b'\n')
        .unwrap_or(buf.len());
    let end = line_end.min(SNIPPET_LIMIT);
    let line = buf.get(..end).unwrap_or_default();
    String::from_utf8_lossy(line).into_owned()
}

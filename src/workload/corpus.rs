use std::io::Read;
use std::ops::Range;
use std::path::Path;

use crate::error::CorpusError;

/// Index of a query line in the corpus.
pub type QueryId = usize;

/// Immutable list of request paths: one blob plus the byte range of every
/// line inside it. Lines never contain `\n`, and a trailing `\r` is dropped.
/// Bytes are kept as read; queries need not be UTF-8.
#[derive(Debug)]
pub struct QueryCorpus {
    blob: Vec<u8>,
    lines: Vec<Range<usize>>,
}

impl QueryCorpus {
    /// Reads the whole corpus from `path`, or from stdin when `None`.
    ///
    /// # Errors
    ///
    /// Returns an error when the source cannot be read or holds no lines.
    pub fn load(path: Option<&Path>) -> Result<Self, CorpusError> {
        let bytes = match path {
            Some(path) => std::fs::read(path).map_err(|err| CorpusError::ReadFile {
                path: path.to_path_buf(),
                source: err,
            })?,
            None => {
                let mut bytes = Vec::new();
                std::io::stdin()
                    .lock()
                    .read_to_end(&mut bytes)
                    .map_err(|err| CorpusError::ReadStdin { source: err })?;
                bytes
            }
        };
        Self::from_bytes(bytes)
    }

    /// Splits raw corpus bytes into lines.
    ///
    /// # Errors
    ///
    /// Returns [`CorpusError::Empty`] when no line remains.
    pub fn from_bytes(blob: Vec<u8>) -> Result<Self, CorpusError> {
        let lines = split_lines(&blob);
        if lines.is_empty() {
            return Err(CorpusError::Empty);
        }
        Ok(Self { blob, lines })
    }

    #[must_use]
    pub fn get(&self, id: QueryId) -> Option<&[u8]> {
        self.lines
            .get(id)
            .and_then(|range| self.blob.get(range.clone()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.lines
            .iter()
            .filter_map(|range| self.blob.get(range.clone()))
    }
}

/// Line ranges of `text`. The segment after the final `\n` only counts when
/// it is non-empty.
pub(crate) fn split_lines(text: &[u8]) -> Vec<Range<usize>> {
    let mut lines = Vec::new();
    let mut start = 0usize;
    for (pos, byte) in text.iter().copied().enumerate() {
        if byte == b'\n' {
            lines.push(trim_cr(text, start..pos));
            start = pos.saturating_add(1);
        }
    }
    if start < text.len() {
        lines.push(trim_cr(text, start..text.len()));
    }
    lines
}

fn trim_cr(text: &[u8], range: Range<usize>) -> Range<usize> {
    let ends_with_cr = text
        .get(range.clone())
        .is_some_and(|line| line.ends_with(b"\r"));
    if ends_with_cr {
        range.start..range.end.saturating_sub(1)
    } else {
        range
    }
}

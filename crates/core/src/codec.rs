//! Line-oriented reader used by the catalog decoders.
//!
//! Every persisted field occupies exactly one line. The reader strips the
//! line terminator (`\n` or `\r\n`) and tracks the line number so decode
//! failures can point at the offending line.

use std::{io::BufRead, str::FromStr};

use crate::error::{LibraryError, Result};

/// Buffered line source with position tracking.
#[derive(Debug)]
pub struct LineReader<R> {
    inner: R,
    line: usize,
}

impl<R: BufRead> LineReader<R> {
    /// Wrap a buffered reader positioned at the start of a record.
    pub fn new(inner: R) -> Self {
        Self { inner, line: 0 }
    }

    /// Number of lines consumed so far.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Read the next line, or `None` once the stream is exhausted.
    ///
    /// A line that is not valid UTF-8 is a format error at that line.
    pub fn next_optional(&mut self) -> Result<Option<String>> {
        let mut buf = Vec::new();
        if self.inner.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        self.line += 1;
        if buf.ends_with(b"\n") {
            buf.pop();
            if buf.ends_with(b"\r") {
                buf.pop();
            }
        }
        String::from_utf8(buf)
            .map(Some)
            .map_err(|_| self.format_error("line is not valid UTF-8"))
    }

    /// Read the next line, treating end of stream as a format error.
    pub fn next_line(&mut self, field: &str) -> Result<String> {
        match self.next_optional()? {
            Some(value) => Ok(value),
            None => Err(LibraryError::Format {
                line: self.line + 1,
                message: format!("unexpected end of data, expected {field}"),
            }),
        }
    }

    /// Read the next line and parse it, reporting the raw text on failure.
    pub fn next_parsed<T: FromStr>(&mut self, field: &str) -> Result<T> {
        let raw = self.next_line(field)?;
        raw.parse::<T>()
            .map_err(|_| self.format_error(format!("invalid {field} '{raw}'")))
    }

    /// Build a format error pointing at the most recently read line.
    pub fn format_error(&self, message: impl Into<String>) -> LibraryError {
        LibraryError::Format {
            line: self.line,
            message: message.into(),
        }
    }
}

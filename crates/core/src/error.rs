//! Error type shared by the catalog model and its line codec.

use thiserror::Error;

/// Failures raised while constructing, mutating, or decoding a catalog.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Copyright year outside `1900..=current year` at construction time.
    #[error("Invalid Copyright Year: {year} (expected 1900 to {max})")]
    InvalidCopyrightYear {
        /// Rejected year.
        year: i32,
        /// Latest year accepted when the check ran.
        max: i32,
    },

    /// Video runtime that is zero, negative, or too large to represent.
    #[error(
        "Invalid runtime for video '{title}': {minutes}{}",
        if .minutes.is_positive() { " (out of range)" } else { "" }
    )]
    InvalidRuntime {
        /// Title of the offending video.
        title: String,
        /// Runtime in whole minutes.
        minutes: i64,
    },

    /// Malformed or truncated catalog data.
    #[error("malformed catalog data at line {line}: {message}")]
    Format {
        /// 1-based line number where decoding failed.
        line: usize,
        /// Description of what was expected.
        message: String,
    },

    /// Publication index rejected by the catalog bounds check.
    #[error("Invalid Publication: index {index} (catalog holds {len})")]
    IndexOutOfRange {
        /// Requested index.
        index: i64,
        /// Number of publications at the time of the call.
        len: usize,
    },

    /// Positional lookup that found no entry.
    #[error("no {kind} at index {index}")]
    NoSuchEntry {
        /// Which list was searched (`"publication"` or `"patron"`).
        kind: &'static str,
        /// Requested index.
        index: i64,
    },

    /// Underlying stream failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LibraryError {
    /// True when a positional lookup found nothing, whether the index failed
    /// the bounds check or passed it and missed (`index == len`).
    pub fn is_lookup_failure(&self) -> bool {
        matches!(self, Self::IndexOutOfRange { .. } | Self::NoSuchEntry { .. })
    }
}

/// Convenience alias used across the core crate.
pub type Result<T> = std::result::Result<T, LibraryError>;

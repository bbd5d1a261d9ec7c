use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

use bstr::ByteSlice;
use thiserror::Error;

const NEWLINE: u8 = 10;

pub type Result<T> = std::result::Result<T, BrcError>;

#[derive(Debug, Error)]
pub enum BrcError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed record at line {line} (byte {offset}): {kind}")]
    Format {
        offset: usize,
        line: usize,
        kind: FormatErrorKind,
    },

    #[error("internal error: {0}")]
    Internal(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to start worker pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl BrcError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Builds a format error from a record error, resolving the line number
    /// against the full input. Only used on the error path.
    pub fn format(input: &[u8], error: RecordError) -> Self {
        let offset = error.offset.min(input.len());
        let line = input[..offset].find_iter(&[NEWLINE]).count() + 1;
        Self::Format { offset: error.offset, line, kind: error.kind }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatErrorKind {
    MissingDelimiter,
    EmptyKey,
    EmptyValue,
    InvalidNumber,
    TooManyFractionDigits,
    NumberOutOfRange,
    NoRecordSeparator,
}

impl Display for FormatErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            Self::MissingDelimiter => "missing field delimiter",
            Self::EmptyKey => "empty key",
            Self::EmptyValue => "empty value",
            Self::InvalidNumber => "value is not a decimal number",
            Self::TooManyFractionDigits => "value has more fractional digits than configured",
            Self::NumberOutOfRange => "value does not fit in 64 bits",
            Self::NoRecordSeparator => "no record separator in input",
        };
        f.write_str(message)
    }
}

/// A malformed record, located by its absolute byte offset in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordError {
    pub offset: usize,
    pub kind: FormatErrorKind,
}

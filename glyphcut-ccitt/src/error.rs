//! Error types for CCITT encoding and decoding.

use core::fmt;

/// An error that occurred while decoding a CCITT bit stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The bit stream ended in the middle of a code word or row.
    UnexpectedEof,
    /// A bit sequence that is not a valid code word.
    InvalidCode,
    /// A run length or changing element overflowed.
    Overflow,
    /// A decoded row did not have the expected number of pixels.
    LineLengthMismatch,
}

/// An error that occurred while encoding rows into a Group 4 bit stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// A row holds fewer bytes than the configured number of columns requires.
    RowTooShort {
        /// The number of bytes a row needs.
        expected: usize,
        /// The number of bytes that were passed.
        actual: usize,
    },
    /// More rows were written than the image has.
    TooManyRows,
    /// The encoder was finished before all rows were written.
    IncompleteImage {
        /// The number of rows written so far.
        written: u32,
        /// The number of rows the image has.
        rows: u32,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => write!(f, "unexpected end of data"),
            Self::InvalidCode => write!(f, "invalid code word"),
            Self::Overflow => write!(f, "run length overflow"),
            Self::LineLengthMismatch => write!(f, "decoded line has wrong length"),
        }
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RowTooShort { expected, actual } => {
                write!(f, "row has {actual} bytes, expected at least {expected}")
            }
            Self::TooManyRows => write!(f, "more rows written than the image has"),
            Self::IncompleteImage { written, rows } => {
                write!(f, "only {written} of {rows} rows were written")
            }
        }
    }
}

impl core::error::Error for DecodeError {}
impl core::error::Error for EncodeError {}

/// Result type for CCITT decoding operations.
pub type Result<T> = core::result::Result<T, DecodeError>;

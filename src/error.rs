//! Error reporting for validators and converters.
//!
//! Every fallible operation has two flavours: a terse one that collapses
//! failure into `false`/`0`, and a `_with_errors` one that returns a
//! [`TranscodeResult`]: the pair `(error, count)`.
//!
//! | Outcome | `error` | `count` |
//! |---------|---------|---------|
//! | validator succeeded | [`ErrorKind::Success`] | input units validated |
//! | converter succeeded | [`ErrorKind::Success`] | output units written |
//! | failure | any other kind | zero-based input index of the error |
//!
//! On failure everything before `count` in the input is valid and, for
//! converters, has already been written to the output buffer.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The specific kind of encoding error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ErrorKind {
    /// No error.
    Success,

    /// A multi-byte UTF-8 sequence is missing continuation bytes, either
    /// because the input ended or because a non-continuation byte followed.
    TooShort,

    /// A continuation byte appeared without a leading byte.
    TooLong,

    /// A code point was encoded with more bytes than necessary.
    /// For example, `C0 80` for U+0000.
    Overlong,

    /// The decoded value is above U+10FFFF, a UTF-8 leader is `F5..FF`,
    /// or the ASCII validator met a byte at or above 0x80.
    TooLarge,

    /// A surrogate code point (U+D800-U+DFFF) was encoded in UTF-8 or UTF-32,
    /// or a UTF-16 surrogate is unpaired.
    Surrogate,

    /// A leading unit has an impossible bit pattern. The built-in kernels
    /// report `F5..FF` leaders as [`TooLarge`](Self::TooLarge) instead.
    HeaderBits,

    /// Failure that does not fit any other kind (e.g. an unsupported kernel).
    Other,
}

impl ErrorKind {
    /// Returns `true` for [`ErrorKind::Success`].
    #[inline]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::TooShort => write!(f, "truncated multi-byte sequence"),
            Self::TooLong => write!(f, "continuation byte without a leading byte"),
            Self::Overlong => write!(f, "overlong encoding"),
            Self::TooLarge => write!(f, "code point above U+10FFFF"),
            Self::Surrogate => write!(f, "surrogate code point"),
            Self::HeaderBits => write!(f, "invalid leading byte"),
            Self::Other => write!(f, "operation not supported"),
        }
    }
}

/// Outcome of a `_with_errors` operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TranscodeResult {
    /// What went wrong, or [`ErrorKind::Success`].
    pub error: ErrorKind,
    /// Units processed on success, input position of the error on failure.
    pub count: usize,
}

impl TranscodeResult {
    /// A successful result covering `count` units.
    #[inline]
    pub const fn ok(count: usize) -> Self {
        Self {
            error: ErrorKind::Success,
            count,
        }
    }

    /// A failed result pointing at input index `position`.
    #[inline]
    pub const fn err(error: ErrorKind, position: usize) -> Self {
        Self {
            error,
            count: position,
        }
    }

    #[inline]
    pub const fn is_ok(&self) -> bool {
        self.error.is_ok()
    }

    #[inline]
    pub const fn is_err(&self) -> bool {
        !self.error.is_ok()
    }

    /// Shift a result computed over `input[offset..]` so that positions and
    /// counts refer to the whole buffer.
    ///
    /// `written` is the number of output units produced before `offset`; it
    /// is added to successful counts only.
    #[inline]
    pub(crate) const fn rebase(self, offset: usize, written: usize) -> Self {
        if self.error.is_ok() {
            Self::ok(self.count + written)
        } else {
            Self::err(self.error, self.count + offset)
        }
    }

    /// Convert into a standard `Result`.
    ///
    /// ```
    /// use turbo_unicode::{ErrorKind, TranscodeResult};
    ///
    /// assert_eq!(TranscodeResult::ok(3).into_result(), Ok(3));
    ///
    /// let err = TranscodeResult::err(ErrorKind::Overlong, 0).into_result().unwrap_err();
    /// assert_eq!(err.kind, ErrorKind::Overlong);
    /// assert_eq!(err.position, 0);
    /// ```
    #[inline]
    pub fn into_result(self) -> Result<usize, TranscodeError> {
        if self.error.is_ok() {
            Ok(self.count)
        } else {
            Err(TranscodeError {
                kind: self.error,
                position: self.count,
            })
        }
    }
}

impl From<TranscodeResult> for Result<usize, TranscodeError> {
    fn from(result: TranscodeResult) -> Self {
        result.into_result()
    }
}

/// A validation or conversion failure with its input position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TranscodeError {
    /// The kind of error.
    pub kind: ErrorKind,
    /// Zero-based index of the offending unit in the input.
    pub position: usize,
}

impl fmt::Display for TranscodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at input unit {}", self.kind, self.position)
    }
}

impl core::error::Error for TranscodeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_is_ok() {
        assert!(ErrorKind::Success.is_ok());
        assert!(!ErrorKind::TooShort.is_ok());
        assert!(TranscodeResult::ok(0).is_ok());
        assert!(TranscodeResult::err(ErrorKind::Other, 0).is_err());
    }

    #[test]
    fn rebase_moves_positions_and_counts() {
        let ok = TranscodeResult::ok(5).rebase(100, 40);
        assert_eq!(ok, TranscodeResult::ok(45));

        let err = TranscodeResult::err(ErrorKind::Surrogate, 3).rebase(100, 40);
        assert_eq!(err, TranscodeResult::err(ErrorKind::Surrogate, 103));
    }

    #[test]
    fn display() {
        let err = TranscodeError {
            kind: ErrorKind::TooLarge,
            position: 7,
        };
        assert_eq!(err.to_string(), "code point above U+10FFFF at input unit 7");
        assert_eq!(ErrorKind::HeaderBits.to_string(), "invalid leading byte");
    }

    #[test]
    fn into_std_result() {
        let r: Result<usize, TranscodeError> = TranscodeResult::ok(9).into();
        assert_eq!(r, Ok(9));
    }
}

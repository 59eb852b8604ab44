//! Error types shared by the readers and the record decoders.

use std::fmt;
use std::io;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error type for reading and decoding `/proc` files.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An OS call (open, read, readlink, sysconf, ...) failed.
    #[error("{call} failed: {source}")]
    SystemCall {
        call: &'static str,
        #[source]
        source: io::Error,
    },
    /// A field could not be converted to a number.
    #[error(transparent)]
    Format(#[from] FormatError),
    /// An expected marker or field never showed up in the file.
    #[error("{0} is not supported by this kernel (marker not found)")]
    NotSupported(&'static str),
}

impl Error {
    pub(crate) fn system_call(call: &'static str, source: io::Error) -> Self {
        Error::SystemCall { call, source }
    }

    /// Captures `errno` of the last failed call.
    pub(crate) fn last_os_error(call: &'static str) -> Self {
        Self::system_call(call, io::Error::last_os_error())
    }

    /// Returns the OS error code for [`Error::SystemCall`] errors.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Error::SystemCall { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }
}

/// Why a numeric field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatErrorKind {
    Empty,
    InvalidDigit,
    Overflow,
    /// Fixed-width fields such as addresses with the wrong number of digits.
    InvalidLength,
}

impl fmt::Display for FormatErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FormatErrorKind::Empty => "empty input",
            FormatErrorKind::InvalidDigit => "invalid digit",
            FormatErrorKind::Overflow => "out of range",
            FormatErrorKind::InvalidLength => "unexpected length",
        };
        f.write_str(text)
    }
}

/// A malformed numeric field.
///
/// Keeps the offending text and the requested type so that a kernel format
/// change shows up with enough context to diagnose it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{text}` is not a valid {type_name} value: {kind}")]
pub struct FormatError {
    pub text: String,
    pub type_name: &'static str,
    pub kind: FormatErrorKind,
}

impl FormatError {
    pub fn new(source: &[u8], type_name: &'static str, kind: FormatErrorKind) -> Self {
        Self {
            text: String::from_utf8_lossy(source).into_owned(),
            type_name,
            kind,
        }
    }
}

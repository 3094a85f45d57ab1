//! Store error types
//!
//! Every fallible store operation returns an [`FfsdbError`]. Callers that only
//! need to branch on the category of failure can use [`FfsdbError::kind`].

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of store failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Backing file could not be created or opened
    Open,
    /// Caller supplied a record of the wrong length
    RecordLengthMismatch,
    /// Record index does not address an existing record
    RecordOutOfRange,
    /// Repositioning the read cursor failed
    Seek,
    /// File ends in the middle of a record
    TornRecord,
    /// Invalid store configuration
    InvalidConfig,
    /// Any other I/O fault
    Io,
}

impl ErrorKind {
    /// Check if the caller can fix the input and retry
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ErrorKind::RecordLengthMismatch | ErrorKind::RecordOutOfRange | ErrorKind::InvalidConfig
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ErrorKind::Open => "open error",
            ErrorKind::RecordLengthMismatch => "record length mismatch",
            ErrorKind::RecordOutOfRange => "record out of range",
            ErrorKind::Seek => "seek error",
            ErrorKind::TornRecord => "torn record",
            ErrorKind::InvalidConfig => "invalid config",
            ErrorKind::Io => "I/O error",
        })
    }
}

/// Main error type for the FFSDB engine
#[derive(Error, Debug)]
pub enum FfsdbError {
    #[error("cannot open store at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("record length was {actual}, expected {expected}")]
    RecordLengthMismatch { actual: usize, expected: usize },

    #[error("record {index} out of range (store holds {len} records)")]
    RecordOutOfRange { index: u64, len: u64 },

    #[error("cannot seek to record {index}: {source}")]
    Seek {
        index: u64,
        #[source]
        source: io::Error,
    },

    #[error("torn record at offset {offset}: read {read} of {expected} bytes")]
    TornRecord {
        offset: u64,
        read: usize,
        expected: usize,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FfsdbError {
    /// Get the classification for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            FfsdbError::Open { .. } => ErrorKind::Open,
            FfsdbError::RecordLengthMismatch { .. } => ErrorKind::RecordLengthMismatch,
            FfsdbError::RecordOutOfRange { .. } => ErrorKind::RecordOutOfRange,
            FfsdbError::Seek { .. } => ErrorKind::Seek,
            FfsdbError::TornRecord { .. } => ErrorKind::TornRecord,
            FfsdbError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            FfsdbError::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn seek_overflow(index: u64) -> Self {
        FfsdbError::Seek {
            index,
            source: io::Error::new(io::ErrorKind::InvalidInput, "record offset overflows u64"),
        }
    }
}

/// Result type for store operations
pub type FfsdbResult<T> = Result<T, FfsdbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let err = FfsdbError::RecordLengthMismatch { actual: 3, expected: 2 };
        assert_eq!(err.kind(), ErrorKind::RecordLengthMismatch);

        let err = FfsdbError::from(io::Error::new(io::ErrorKind::Other, "boom"));
        assert_eq!(err.kind(), ErrorKind::Io);

        assert_eq!(FfsdbError::seek_overflow(u64::MAX).kind(), ErrorKind::Seek);
    }

    #[test]
    fn test_recoverable_check() {
        assert!(ErrorKind::RecordLengthMismatch.is_recoverable());
        assert!(ErrorKind::RecordOutOfRange.is_recoverable());
        assert!(!ErrorKind::Io.is_recoverable());
        assert!(!ErrorKind::TornRecord.is_recoverable());
    }

    #[test]
    fn test_mismatch_message() {
        let err = FfsdbError::RecordLengthMismatch { actual: 3, expected: 256 };
        assert_eq!(err.to_string(), "record length was 3, expected 256");
    }
}

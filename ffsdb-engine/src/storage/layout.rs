//! Record layout arithmetic
//!
//! Records are laid out back to back from offset 0, so record `i` starts at
//! `i * stride`. There is no header and no per-record framing.

use crate::error::{FfsdbError, FfsdbResult};
use crate::storage::codec::Precision;

/// Fixed geometry of every record in a store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    /// Fields per record
    record_len: usize,
    /// Field encoding
    precision: Precision,
    /// Bytes per record
    stride: usize,
}

impl RecordLayout {
    /// Create a layout, rejecting empty or unaddressable records
    pub fn new(record_len: usize, precision: Precision) -> FfsdbResult<Self> {
        if record_len == 0 {
            return Err(FfsdbError::InvalidConfig(
                "record length must be at least 1".to_string(),
            ));
        }
        let stride = record_len
            .checked_mul(precision.field_width())
            .ok_or_else(|| {
                FfsdbError::InvalidConfig(format!("record length {} is too large", record_len))
            })?;

        Ok(RecordLayout {
            record_len,
            precision,
            stride,
        })
    }

    pub fn record_len(&self) -> usize {
        self.record_len
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Bytes per record
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Byte offset of record `index`, or `None` if it does not fit in a u64
    pub fn offset(&self, index: u64) -> Option<u64> {
        index.checked_mul(self.stride as u64)
    }

    /// Like [`offset`](Self::offset) but reported as a seek failure
    pub fn seek_offset(&self, index: u64) -> FfsdbResult<u64> {
        self.offset(index).ok_or_else(|| FfsdbError::seek_overflow(index))
    }

    /// Whole records in a file of `file_len` bytes
    pub fn record_count(&self, file_len: u64) -> u64 {
        file_len / self.stride as u64
    }

    /// Bytes past the last whole record
    pub fn trailing_bytes(&self, file_len: u64) -> u64 {
        file_len % self.stride as u64
    }
}

//! Record encoding
//!
//! A record is encoded as consecutive big-endian IEEE-754 fields. Values are
//! always `f64` in memory; single precision narrows on encode and widens on
//! decode. Encoding is a raw bit-pattern transform, so double precision
//! round-trips every value bit for bit, NaN payloads included.

use byteorder::{BigEndian, ByteOrder};

/// Field encoding width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Precision {
    /// 8-byte IEEE-754 double
    #[default]
    Double,
    /// 4-byte IEEE-754 single
    Single,
}

impl Precision {
    pub fn from_single(single: bool) -> Self {
        if single {
            Precision::Single
        } else {
            Precision::Double
        }
    }

    /// Bytes per encoded field
    pub const fn field_width(self) -> usize {
        match self {
            Precision::Double => 8,
            Precision::Single => 4,
        }
    }

    pub fn is_single(self) -> bool {
        self == Precision::Single
    }
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Precision::Double => write!(f, "f64 (8 bytes)"),
            Precision::Single => write!(f, "f32 (4 bytes)"),
        }
    }
}

/// Encode `values` into `out`, one field per value.
///
/// `out` is expected to hold exactly `values.len() * precision.field_width()`
/// bytes. Only as many fields as both sides cover are written; any bytes of
/// `out` past the last value keep their previous contents.
pub fn encode_record(values: &[f64], precision: Precision, out: &mut [u8]) {
    match precision {
        Precision::Double => {
            for (field, value) in out.chunks_exact_mut(8).zip(values) {
                BigEndian::write_f64(field, *value);
            }
        }
        Precision::Single => {
            for (field, value) in out.chunks_exact_mut(4).zip(values) {
                BigEndian::write_f32(field, *value as f32);
            }
        }
    }
}

/// Decode every whole field in `bytes` into a freshly allocated vector.
pub fn decode_record(bytes: &[u8], precision: Precision) -> Vec<f64> {
    match precision {
        Precision::Double => bytes.chunks_exact(8).map(BigEndian::read_f64).collect(),
        Precision::Single => bytes
            .chunks_exact(4)
            .map(|field| f64::from(BigEndian::read_f32(field)))
            .collect(),
    }
}

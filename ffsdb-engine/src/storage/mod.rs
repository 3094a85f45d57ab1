//! Storage layer for the FFSDB file format
//!
//! An FFSDB file is a flat sequence of fixed-size records with no header:
//! - Codec: big-endian IEEE-754 field encoding
//! - Layout: stride and offset arithmetic

pub mod codec;
pub mod layout;

pub use codec::{decode_record, encode_record, Precision};
pub use layout::RecordLayout;

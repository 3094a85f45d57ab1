//! FFSDB Engine - fixed-record float vector file store
//!
//! This crate persists a sequence of equal-length `f64` vectors to a flat
//! file of big-endian IEEE-754 fields, and supports appending, sequential
//! scans, random-access reads by record index and in-place updates.

pub mod config;
pub mod error;
pub mod storage;
pub mod store;

pub use config::{StoreConfig, StoreOptions};
pub use error::{ErrorKind, FfsdbError, FfsdbResult};
pub use storage::{decode_record, encode_record, Precision, RecordLayout};
pub use store::{FixedRecordStore, Records, StoreStats};

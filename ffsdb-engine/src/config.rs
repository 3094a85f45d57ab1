//! Store configuration
//!
//! A store is configured once at open time. The on-disk format is not
//! self-describing, so the same record length and precision must be used by
//! every writer and reader of a file.
//!
//! Configuration can be built in code with [`StoreOptions`] or loaded from a
//! TOML file with a `[store]` table:
//!
//! ```toml
//! [store]
//! path = "vectors.ffsdb"
//! record_len = 256
//! truncate_existing = false
//! single_precision = false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FfsdbError, FfsdbResult};
use crate::storage::codec::Precision;
use crate::store::FixedRecordStore;

/// Serializable store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backing file location
    pub path: PathBuf,
    /// Fields per record
    pub record_len: usize,
    /// Remove any existing file before opening
    #[serde(default)]
    pub truncate_existing: bool,
    /// Encode fields as 4-byte floats instead of 8-byte doubles
    #[serde(default)]
    pub single_precision: bool,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    store: StoreConfig,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>, record_len: usize) -> Self {
        StoreConfig {
            path: path.into(),
            record_len,
            truncate_existing: false,
            single_precision: false,
        }
    }

    /// Parse the `[store]` table of a TOML document
    pub fn from_toml_str(text: &str) -> FfsdbResult<Self> {
        let file: ConfigFile =
            toml::from_str(text).map_err(|e| FfsdbError::InvalidConfig(e.to_string()))?;
        Ok(file.store)
    }

    /// Load a TOML config file
    pub fn load(path: &Path) -> FfsdbResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn options(&self) -> StoreOptions {
        StoreOptions::new(self.record_len)
            .truncate(self.truncate_existing)
            .single_precision(self.single_precision)
    }

    /// Open the store this config describes
    pub fn open(&self) -> FfsdbResult<FixedRecordStore> {
        self.options().open(&self.path)
    }
}

/// Builder for opening a store, in the manner of `std::fs::OpenOptions`
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    pub(crate) record_len: usize,
    pub(crate) truncate: bool,
    pub(crate) precision: Precision,
}

impl StoreOptions {
    pub fn new(record_len: usize) -> Self {
        StoreOptions {
            record_len,
            truncate: false,
            precision: Precision::Double,
        }
    }

    /// Remove an existing file before opening
    pub fn truncate(mut self, truncate: bool) -> Self {
        self.truncate = truncate;
        self
    }

    pub fn single_precision(mut self, single: bool) -> Self {
        self.precision = Precision::from_single(single);
        self
    }

    pub fn precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    pub fn open(&self, path: impl AsRef<Path>) -> FfsdbResult<FixedRecordStore> {
        FixedRecordStore::open_with(path.as_ref(), *self)
    }
}

//! Fixed-record store
//!
//! A [`FixedRecordStore`] owns three handles on the same file:
//! - a buffered reader whose position is the sequential read cursor
//! - a buffered append-mode writer for new records
//! - a positioned writer for in-place updates
//!
//! The read cursor is moved only by reads, [`seek`](FixedRecordStore::seek),
//! [`rewind`](FixedRecordStore::rewind) and
//! [`read_id`](FixedRecordStore::read_id). A `read_id` leaves the cursor just
//! past the record it read, so a following `read_next` continues from
//! `index + 1`. Appends and updates never move it.
//!
//! Appends are buffered. Every read path flushes pending appends first, so a
//! reader always observes what was appended earlier in the same session.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::config::StoreOptions;
use crate::error::{FfsdbError, FfsdbResult};
use crate::storage::codec::{decode_record, encode_record, Precision};
use crate::storage::layout::RecordLayout;

/// Operation counters for a single open store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub appended: u64,
    pub read: u64,
    pub updated: u64,
    pub flushes: u64,
}

/// A flat file of equal-length `f64` records
pub struct FixedRecordStore {
    path: PathBuf,
    layout: RecordLayout,
    /// Sequential read cursor, buffer capacity is one stride
    reader: BufReader<File>,
    /// Append-mode handle
    writer: BufWriter<File>,
    /// Positioned-write handle for updates
    updater: File,
    /// One stride of encode/read scratch space
    scratch: Vec<u8>,
    /// Whole records, including buffered appends
    len: u64,
    /// Bytes of a partial record at the end of the file when it was opened
    torn_tail: u64,
    dirty: bool,
    stats: StoreStats,
}

impl FixedRecordStore {
    /// Open or create a store at `path`
    pub fn open(
        path: impl AsRef<Path>,
        record_len: usize,
        truncate_existing: bool,
        single_precision: bool,
    ) -> FfsdbResult<Self> {
        StoreOptions::new(record_len)
            .truncate(truncate_existing)
            .single_precision(single_precision)
            .open(path)
    }

    pub(crate) fn open_with(path: &Path, options: StoreOptions) -> FfsdbResult<Self> {
        let layout = RecordLayout::new(options.record_len, options.precision)?;
        let open_err = |source: io::Error| FfsdbError::Open {
            path: path.to_path_buf(),
            source,
        };

        if options.truncate {
            match fs::remove_file(path) {
                Ok(()) => debug!("Removed existing store file {:?}", path),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(open_err(e)),
            }
        }

        let append_file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)
            .map_err(open_err)?;
        let read_file = OpenOptions::new().read(true).open(path).map_err(open_err)?;
        let update_file = OpenOptions::new().write(true).open(path).map_err(open_err)?;

        let file_len = append_file.metadata().map_err(open_err)?.len();
        let trailing = layout.trailing_bytes(file_len);
        if trailing != 0 {
            warn!(
                "Store {:?} ends with a partial record ({} of {} bytes), opening read-only",
                path,
                trailing,
                layout.stride()
            );
        }
        let len = layout.record_count(file_len);

        debug!(
            "Opened store {:?}: record_len={}, precision={}, records={}",
            path,
            layout.record_len(),
            layout.precision(),
            len
        );

        Ok(FixedRecordStore {
            path: path.to_path_buf(),
            layout,
            reader: BufReader::with_capacity(layout.stride(), read_file),
            writer: BufWriter::new(append_file),
            updater: update_file,
            scratch: vec![0u8; layout.stride()],
            len,
            torn_tail: trailing,
            dirty: false,
            stats: StoreStats::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> RecordLayout {
        self.layout
    }

    /// Fields per record
    pub fn record_len(&self) -> usize {
        self.layout.record_len()
    }

    pub fn precision(&self) -> Precision {
        self.layout.precision()
    }

    /// Bytes per record
    pub fn stride(&self) -> usize {
        self.layout.stride()
    }

    /// Number of whole records, including appends not yet flushed
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn stats(&self) -> StoreStats {
        self.stats
    }

    /// Check if appends are buffered but not yet written to the file
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Check if the file ended in a partial record when it was opened.
    ///
    /// Such a store can still be read, but refuses every write: an append
    /// would land after the partial bytes, off the record grid.
    pub fn has_torn_tail(&self) -> bool {
        self.torn_tail != 0
    }

    fn check_writable(&self) -> FfsdbResult<()> {
        if self.torn_tail != 0 {
            return Err(FfsdbError::TornRecord {
                offset: self.len * self.layout.stride() as u64,
                read: self.torn_tail as usize,
                expected: self.layout.stride(),
            });
        }
        Ok(())
    }

    fn check_len(&self, values: &[f64]) -> FfsdbResult<()> {
        if values.len() != self.layout.record_len() {
            return Err(FfsdbError::RecordLengthMismatch {
                actual: values.len(),
                expected: self.layout.record_len(),
            });
        }
        Ok(())
    }

    /// Append a record at the end of the file
    pub fn add(&mut self, values: &[f64]) -> FfsdbResult<()> {
        self.check_len(values)?;
        self.add_unchecked(values)
    }

    /// Append without validating `values.len()`.
    ///
    /// Extra values are ignored; if `values` is short, the remaining fields
    /// hold whatever the scratch buffer held from the previous encode.
    pub fn add_unchecked(&mut self, values: &[f64]) -> FfsdbResult<()> {
        self.check_writable()?;
        self.dirty = true;
        encode_record(values, self.layout.precision(), &mut self.scratch);
        self.writer.write_all(&self.scratch)?;
        self.len += 1;
        self.stats.appended += 1;
        Ok(())
    }

    /// Overwrite record `index` in place
    pub fn update(&mut self, index: u64, values: &[f64]) -> FfsdbResult<()> {
        self.check_len(values)?;
        self.update_unchecked(index, values)
    }

    /// Overwrite without validating `values.len()`, see [`add_unchecked`](Self::add_unchecked)
    pub fn update_unchecked(&mut self, index: u64, values: &[f64]) -> FfsdbResult<()> {
        self.check_writable()?;
        if index >= self.len {
            return Err(FfsdbError::RecordOutOfRange {
                index,
                len: self.len,
            });
        }
        // The target may still be sitting in the append buffer.
        self.flush_pending()?;

        let offset = self.layout.seek_offset(index)?;
        encode_record(values, self.layout.precision(), &mut self.scratch);
        self.updater.seek(SeekFrom::Start(offset))?;
        self.updater.write_all(&self.scratch)?;
        self.stats.updated += 1;
        trace!("Updated record {} at offset {}", index, offset);
        Ok(())
    }

    /// Read the record under the cursor and advance past it.
    ///
    /// Returns `Ok(None)` at a clean end of file. A file ending in the middle
    /// of a record yields [`FfsdbError::TornRecord`].
    pub fn read_next(&mut self) -> FfsdbResult<Option<Vec<f64>>> {
        self.flush_pending()?;
        self.read_record()
    }

    /// Iterate over the records from the cursor to the end of the file
    pub fn records(&mut self) -> Records<'_> {
        Records {
            store: self,
            done: false,
        }
    }

    /// Read record `index`, leaving the cursor at `index + 1`
    pub fn read_id(&mut self, index: u64) -> FfsdbResult<Vec<f64>> {
        self.flush_pending()?;
        self.seek(index)?;
        self.read_record()?.ok_or(FfsdbError::RecordOutOfRange {
            index,
            len: self.len,
        })
    }

    /// Move the read cursor to record `index`.
    ///
    /// Pending appends are not flushed. Seeking past the end is allowed; the
    /// next read reports end of file.
    pub fn seek(&mut self, index: u64) -> FfsdbResult<()> {
        let offset = self.layout.seek_offset(index)?;
        self.reader
            .seek(SeekFrom::Start(offset))
            .map_err(|source| FfsdbError::Seek { index, source })?;
        Ok(())
    }

    /// Flush pending appends and move the read cursor to the first record
    pub fn rewind(&mut self) -> FfsdbResult<()> {
        self.flush_pending()?;
        self.seek(0)
    }

    /// Write buffered appends through to the file
    pub fn flush(&mut self) -> FfsdbResult<()> {
        self.writer.flush()?;
        self.dirty = false;
        self.stats.flushes += 1;
        trace!("Flushed store {:?}", self.path);
        Ok(())
    }

    /// Flush and sync all handles to stable storage
    pub fn sync(&mut self) -> FfsdbResult<()> {
        self.flush()?;
        self.writer.get_ref().sync_all()?;
        self.updater.sync_all()?;
        Ok(())
    }

    /// Flush pending appends and release the file handles
    pub fn close(mut self) -> FfsdbResult<()> {
        self.flush_pending()?;
        debug!("Closed store {:?} ({} records)", self.path, self.len);
        Ok(())
    }

    fn flush_pending(&mut self) -> FfsdbResult<()> {
        if self.dirty {
            self.flush()?;
        }
        Ok(())
    }

    /// Read one stride into the scratch buffer and decode it
    fn read_record(&mut self) -> FfsdbResult<Option<Vec<f64>>> {
        let stride = self.layout.stride();
        let mut filled = 0;
        while filled < stride {
            match self.reader.read(&mut self.scratch[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if filled == 0 {
            return Ok(None);
        }
        if filled < stride {
            let end = self.reader.stream_position()?;
            return Err(FfsdbError::TornRecord {
                offset: end - filled as u64,
                read: filled,
                expected: stride,
            });
        }

        self.stats.read += 1;
        Ok(Some(decode_record(&self.scratch, self.layout.precision())))
    }
}

impl Drop for FixedRecordStore {
    fn drop(&mut self) {
        if self.dirty {
            if let Err(e) = self.flush() {
                warn!("Failed to flush store {:?} on drop: {}", self.path, e);
            }
        }
    }
}

impl std::fmt::Debug for FixedRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedRecordStore")
            .field("path", &self.path)
            .field("layout", &self.layout)
            .field("len", &self.len)
            .field("dirty", &self.dirty)
            .finish()
    }
}

/// Sequential iterator returned by [`FixedRecordStore::records`]
///
/// Stops after the first error.
pub struct Records<'a> {
    store: &'a mut FixedRecordStore,
    done: bool,
}

impl Iterator for Records<'_> {
    type Item = FfsdbResult<Vec<f64>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.store.read_next() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for Records<'_> {}

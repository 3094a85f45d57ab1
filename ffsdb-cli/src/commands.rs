//! Subcommand implementations
//!
//! Every command writes its report to the supplied writer so it can be
//! exercised without a terminal.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tracing::info;

use ffsdb_engine::{FixedRecordStore, StoreConfig, StoreOptions};

/// Record length used by `bench` when none is given
const BENCH_RECORD_LEN: usize = 256;

/// Options selecting the store to operate on
#[derive(Args, Debug, Default, Clone)]
pub struct StoreArgs {
    /// TOML config file with a [store] table
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Store file (overrides the config file)
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    /// Fields per record (overrides the config file)
    #[arg(short, long, global = true)]
    pub record_len: Option<usize>,

    /// Use 4-byte single precision fields
    #[arg(long, global = true)]
    pub single: bool,
}

impl StoreArgs {
    /// Merge command line flags over the config file.
    ///
    /// `truncate_existing` from the config file is never honored here: the
    /// tool must not wipe a store just by inspecting it.
    pub fn resolve(&self) -> Result<StoreConfig> {
        let file_config = match &self.config {
            Some(path) => Some(
                StoreConfig::load(path)
                    .with_context(|| format!("loading config {}", path.display()))?,
            ),
            None => None,
        };

        let path = self
            .file
            .clone()
            .or_else(|| file_config.as_ref().map(|c| c.path.clone()))
            .context("no store file given (use --file or --config)")?;
        let record_len = self
            .record_len
            .or_else(|| file_config.as_ref().map(|c| c.record_len))
            .context("no record length given (use --record-len or --config)")?;
        let single_precision =
            self.single || file_config.as_ref().map_or(false, |c| c.single_precision);

        Ok(StoreConfig {
            path,
            record_len,
            truncate_existing: false,
            single_precision,
        })
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show store geometry and record count
    Info,

    /// Print records sequentially
    Dump {
        /// First record index
        #[arg(long, default_value_t = 0)]
        start: u64,

        /// Maximum number of records to print
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print a single record
    Get {
        index: u64,
    },

    /// Append a record
    Append {
        #[arg(required = true, num_args = 1.., allow_negative_numbers = true)]
        values: Vec<f64>,
    },

    /// Overwrite a record in place
    Update {
        index: u64,

        #[arg(required = true, num_args = 1.., allow_negative_numbers = true)]
        values: Vec<f64>,
    },

    /// Append and rescan zero-filled records, reporting timings.
    ///
    /// The target file is truncated first.
    Bench {
        /// Scratch file to benchmark against
        path: PathBuf,

        /// Number of records to write
        #[arg(long, default_value_t = 100_000)]
        records: u64,
    },
}

pub fn run(command: Command, store_args: &StoreArgs, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Info => with_store(store_args, |store| info(store, out)),
        Command::Dump { start, limit } => {
            with_store(store_args, |store| dump(store, start, limit, out))
        }
        Command::Get { index } => with_store(store_args, |store| {
            let record = store.read_id(index)?;
            writeln!(out, "{}: {:?}", index, record)?;
            Ok(())
        }),
        Command::Append { values } => with_store(store_args, |store| {
            store.add(&values)?;
            writeln!(out, "appended record {}", store.len() - 1)?;
            Ok(())
        }),
        Command::Update { index, values } => with_store(store_args, |store| {
            store.update(index, &values)?;
            writeln!(out, "updated record {}", index)?;
            Ok(())
        }),
        Command::Bench { path, records } => {
            let options = StoreOptions::new(store_args.record_len.unwrap_or(BENCH_RECORD_LEN))
                .truncate(true)
                .single_precision(store_args.single);
            bench(options, &path, records, out)
        }
    }
}

/// Open the selected store, run `f` against it and close it
fn with_store<F>(store_args: &StoreArgs, f: F) -> Result<()>
where
    F: FnOnce(&mut FixedRecordStore) -> Result<()>,
{
    let config = store_args.resolve()?;
    let mut store = config
        .open()
        .with_context(|| format!("opening store {}", config.path.display()))?;
    f(&mut store)?;
    store.close()?;
    Ok(())
}

fn info(store: &FixedRecordStore, out: &mut impl Write) -> Result<()> {
    writeln!(out, "path:       {}", store.path().display())?;
    writeln!(out, "record_len: {}", store.record_len())?;
    writeln!(out, "precision:  {}", store.precision())?;
    writeln!(out, "stride:     {} bytes", store.stride())?;
    writeln!(out, "records:    {}", store.len())?;
    Ok(())
}

fn dump(
    store: &mut FixedRecordStore,
    start: u64,
    limit: Option<usize>,
    out: &mut impl Write,
) -> Result<()> {
    store.seek(start)?;
    let mut index = start;
    for record in store.records().take(limit.unwrap_or(usize::MAX)) {
        let record = record.with_context(|| format!("reading record {}", index))?;
        writeln!(out, "{}: {:?}", index, record)?;
        index += 1;
    }
    Ok(())
}

fn bench(options: StoreOptions, path: &Path, records: u64, out: &mut impl Write) -> Result<()> {
    let mut store = options
        .open(path)
        .with_context(|| format!("opening bench store {}", path.display()))?;
    info!("Benchmarking {} records of {} fields", records, store.record_len());

    let record = vec![0.0; store.record_len()];
    let start = Instant::now();
    for _ in 0..records {
        store.add(&record)?;
    }
    store.flush()?;
    writeln!(out, "added {} in {:?}", records, start.elapsed())?;

    store.rewind()?;
    let start = Instant::now();
    let mut read = 0u64;
    while store.read_next()?.is_some() {
        read += 1;
    }
    writeln!(out, "read {} in {:?}", read, start.elapsed())?;

    store.close()?;
    Ok(())
}

//! `Store` (§4.3, Component C) - opens a directory-backed RocksDB database,
//! registers the fixed column-family enumeration, and applies the engine
//! tuning called out in §4.3.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{
    BlockBasedOptions, Cache, ColumnFamilyDescriptor, DBCompressionType, Options,
    OptimisticTransactionOptions, SliceTransform, WriteOptions,
};

use jobstate_core::error::{Result, StoreError};
use jobstate_core::metrics::MetricsSink;
use jobstate_core::notifier::Notifier;
use jobstate_core::JobStateCore;

use crate::column_family::{CfKind, Db, RocksColumnFamily};

const DEFAULT_MEMORY_BUDGET_BYTES: usize = 512 * 1024 * 1024;
const CF_PREFIX_LEN: usize = 2;
const TARGET_SST_SIZE: u64 = 8 * 1024 * 1024;
const BASE_LEVEL_SIZE: u64 = 32 * 1024 * 1024;
const LEVEL_MULTIPLIER: i32 = 10;
const NUM_LEVELS: i32 = 4;
const MAX_WRITE_BUFFERS: i32 = 10;

fn db_options() -> Options {
    let mut opts = Options::default();
    opts.create_if_missing(true);
    opts.create_missing_column_families(true);
    opts.set_max_manifest_file_size(256 * 1024 * 1024);
    opts.set_paranoid_checks(true);
    opts.set_bytes_per_sync(1024 * 1024);
    opts
}

/// Tuning shared by every registered column family (§4.3): per-level
/// compaction with dynamic level sizing, four levels, top two uncompressed
/// and the rest LZ4, bloom filters sized for prefix scans, ~8 MiB SSTs with
/// a 32 MiB base level and a 10x level multiplier.
fn cf_options(block_cache: &Cache, write_buffer_bytes: usize) -> Options {
    let mut opts = Options::default();

    opts.set_prefix_extractor(SliceTransform::create_fixed_prefix(CF_PREFIX_LEN));
    opts.set_memtable_prefix_bloom_ratio(0.2);

    opts.set_level_compaction_dynamic_level_bytes(true);
    opts.set_num_levels(NUM_LEVELS);
    opts.set_compression_per_level(&[
        DBCompressionType::None,
        DBCompressionType::None,
        DBCompressionType::Lz4,
        DBCompressionType::Lz4,
    ]);
    opts.set_target_file_size_base(TARGET_SST_SIZE);
    opts.set_max_bytes_for_level_base(BASE_LEVEL_SIZE);
    opts.set_max_bytes_for_level_multiplier(LEVEL_MULTIPLIER as f64);

    opts.set_write_buffer_size(write_buffer_bytes);
    opts.set_max_write_buffer_number(MAX_WRITE_BUFFERS);
    opts.set_min_write_buffer_number_to_merge(2);

    let mut block_opts = BlockBasedOptions::default();
    block_opts.set_bloom_filter(10.0, false);
    block_opts.set_block_cache(block_cache);
    opts.set_block_based_table_factory(&block_opts);

    opts
}

pub struct Store {
    db: Arc<Db>,
    notifier: Arc<Notifier>,
    metrics: Arc<dyn MetricsSink>,
}

impl Store {
    /// Opens (creating if absent) a partition directory with the five fixed
    /// column families. `memory_budget_bytes` drives the block cache (about
    /// a third of the budget) and the remaining write-buffer allowance,
    /// split across up to ten concurrent write buffers per column family.
    pub fn open(
        dir: impl AsRef<Path>,
        memory_budget_bytes: Option<usize>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Result<Self> {
        let budget = memory_budget_bytes.unwrap_or(DEFAULT_MEMORY_BUDGET_BYTES);
        let cache_bytes = budget / 3;
        let write_buffer_bytes = ((budget - cache_bytes) / MAX_WRITE_BUFFERS as usize).max(4 * 1024 * 1024);

        let block_cache = Cache::new_lru_cache(cache_bytes);
        let cf_opts = cf_options(&block_cache, write_buffer_bytes);

        let descriptors: Vec<ColumnFamilyDescriptor> = CfKind::ALL
            .iter()
            .map(|kind| ColumnFamilyDescriptor::new(kind.name(), cf_opts.clone()))
            .collect();

        let db = Db::open_cf_descriptors(&db_options(), dir.as_ref(), descriptors)
            .map_err(|e| StoreError::StoreOpenError(format!("failed to open rocksdb: {e}")))?;

        Ok(Self {
            db: Arc::new(db),
            notifier: Arc::new(Notifier::new()),
            metrics,
        })
    }

    pub fn notifier(&self) -> &Arc<Notifier> {
        &self.notifier
    }

    /// Runs `f` against a `JobStateCore` bound to a fresh RocksDB
    /// transaction, committing on success and rolling back (implicitly, by
    /// dropping the transaction) if `f` returns an error.
    pub fn with_transaction<R>(
        &self,
        f: impl FnOnce(&JobStateCore<RocksColumnFamily<'_>>) -> Result<R>,
    ) -> Result<R> {
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(false);
        let txn_opts = OptimisticTransactionOptions::new();
        let txn = self.db.transaction_opt(&write_opts, &txn_opts);

        let handles: Vec<Arc<rocksdb::BoundColumnFamily<'_>>> = CfKind::ALL
            .iter()
            .map(|kind| {
                self.db.cf_handle(kind.name()).ok_or_else(|| {
                    StoreError::StoreOpenError(format!("missing column family {}", kind.name()))
                })
            })
            .collect::<Result<_>>()?;

        let jobs = RocksColumnFamily::new(&txn, handles[0].clone(), CfKind::Jobs);
        let states = RocksColumnFamily::new(&txn, handles[1].clone(), CfKind::States);
        let activatable = RocksColumnFamily::new(&txn, handles[2].clone(), CfKind::Activatable);
        let deadlines = RocksColumnFamily::new(&txn, handles[3].clone(), CfKind::Deadlines);
        let backoff = RocksColumnFamily::new(&txn, handles[4].clone(), CfKind::Backoff);

        let core = JobStateCore::new(
            jobs,
            states,
            activatable,
            deadlines,
            backoff,
            self.notifier.clone(),
            self.metrics.clone(),
        );

        let result = f(&core)?;

        txn.commit()
            .map_err(|e| StoreError::EngineError(format!("commit failed: {e}")))?;

        Ok(result)
    }

    /// Flushes every column family and drops the underlying handle. Safe to
    /// call more than once.
    pub fn close(&self) -> Result<()> {
        for kind in CfKind::ALL {
            if let Some(cf) = self.db.cf_handle(kind.name()) {
                self.db
                    .flush_cf(&cf)
                    .map_err(|e| StoreError::EngineError(format!("flush failed: {e}")))?;
            }
        }
        Ok(())
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "store close failed during drop");
        }
    }
}

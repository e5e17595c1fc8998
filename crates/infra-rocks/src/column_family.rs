//! `RocksColumnFamily` - implements `jobstate_core::port::ColumnFamily` over a
//! `rocksdb::Transaction` bound to one of the five registered column
//! families.
//!
//! Every key this type writes or reads is prefixed with a fixed 2-byte
//! discriminator (the owning column family's ordinal, §4.3) before it
//! touches the engine, and stripped again before a scan hands a key to a
//! visitor. This keeps every column family's keys the same shape at the
//! prefix-extractor level, so one `Options` template (§4.3 tuning) applies
//! uniformly regardless of whether the logical key underneath is an 8-byte
//! job key or a variable-length job type.

use std::sync::Arc;

use rocksdb::{BoundColumnFamily, Direction, IteratorMode, MultiThreaded, OptimisticTransactionDB};

use jobstate_core::error::{Result, StoreError};
use jobstate_core::port::{ColumnFamily, ScanVisitor};

pub(crate) type Db = OptimisticTransactionDB<MultiThreaded>;
pub(crate) type Txn<'a> = rocksdb::Transaction<'a, Db>;

/// One of the five logical keyspaces `JobStateCore` operates over. The
/// discriminant is the 2-byte prefix attached to every physical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum CfKind {
    Jobs = 0,
    States = 1,
    Activatable = 2,
    Deadlines = 3,
    Backoff = 4,
}

impl CfKind {
    pub const ALL: [CfKind; 5] = [
        CfKind::Jobs,
        CfKind::States,
        CfKind::Activatable,
        CfKind::Deadlines,
        CfKind::Backoff,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CfKind::Jobs => "jobs",
            CfKind::States => "states",
            CfKind::Activatable => "activatable",
            CfKind::Deadlines => "deadlines",
            CfKind::Backoff => "backoff",
        }
    }

    fn prefix(self) -> [u8; 2] {
        (self as u16).to_be_bytes()
    }
}

pub struct RocksColumnFamily<'a> {
    txn: &'a Txn<'a>,
    cf: Arc<BoundColumnFamily<'a>>,
    prefix: [u8; 2],
}

impl<'a> RocksColumnFamily<'a> {
    pub fn new(txn: &'a Txn<'a>, cf: Arc<BoundColumnFamily<'a>>, kind: CfKind) -> Self {
        Self {
            txn,
            cf,
            prefix: kind.prefix(),
        }
    }

    fn full_key(&self, key: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(2 + key.len());
        out.extend_from_slice(&self.prefix);
        out.extend_from_slice(key);
        out
    }

    fn scan(&self, extra_prefix: &[u8], visitor: &mut ScanVisitor<'_>) -> Result<()> {
        let combined = self.full_key(extra_prefix);
        let iter = self
            .txn
            .iterator_cf(&self.cf, IteratorMode::From(&combined, Direction::Forward));

        for item in iter {
            let (key, value) =
                item.map_err(|e| StoreError::EngineError(format!("scan failed: {e}")))?;
            if !key.starts_with(&combined) {
                break;
            }
            let logical_key = &key[self.prefix.len()..];
            if !visitor(logical_key, &value)? {
                break;
            }
        }
        Ok(())
    }
}

impl<'a> ColumnFamily for RocksColumnFamily<'a> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.txn
            .get_cf(&self.cf, self.full_key(key))
            .map_err(|e| StoreError::EngineError(format!("get failed: {e}")))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.txn
            .put_cf(&self.cf, self.full_key(key), value)
            .map_err(|e| StoreError::EngineError(format!("put failed: {e}")))
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.txn
            .delete_cf(&self.cf, self.full_key(key))
            .map_err(|e| StoreError::EngineError(format!("delete failed: {e}")))
    }

    fn scan_prefix(&self, prefix: &[u8], visitor: &mut ScanVisitor<'_>) -> Result<()> {
        self.scan(prefix, visitor)
    }

    fn scan_all(&self, visitor: &mut ScanVisitor<'_>) -> Result<()> {
        self.scan(&[], visitor)
    }
}

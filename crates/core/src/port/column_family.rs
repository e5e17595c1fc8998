//! `ColumnFamily` - a typed view over one logical keyspace of the KV engine
//! (§4.2, Component B). This is the seam between the engine-agnostic
//! `JobStateCore` and a concrete transactional storage engine: an
//! `infra-rocks::RocksColumnFamily` is the only implementation today, but
//! nothing in `core` names RocksDB.
//!
//! Every method takes `&self` rather than `&mut self`. This mirrors the
//! concrete engine's own transaction API (a RocksDB `Transaction` provides
//! get/put/delete through shared references, relying on interior mutability
//! on the C++ side) and is what makes the iteration-with-deletion contract
//! below implementable without fighting the borrow checker: a scan's visitor
//! closure can hold the same `&ColumnFamily` the scan was called on and
//! issue deletes against the key it is currently looking at.

use crate::error::Result;

/// A closure invoked once per `(key, value)` pair during a scan. Returns
/// `true` to continue, `false` to stop early.
pub type ScanVisitor<'a> = dyn FnMut(&[u8], &[u8]) -> Result<bool> + 'a;

pub trait ColumnFamily {
    /// Point lookup.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Upsert.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Idempotent - no error if the key is absent.
    fn delete(&self, key: &[u8]) -> Result<()>;

    fn exists(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Enumerates every `(k, v)` whose key starts with `prefix`, in key
    /// order. Stops when `visitor` returns `false` or the prefix is
    /// exhausted.
    ///
    /// Deletes issued from `visitor` (against `self`, the same column
    /// family) are part of the enclosing transaction and must not corrupt
    /// the in-flight iteration: the implementation captures the next key
    /// before yielding the current one, or iterates over a transaction
    /// snapshot independent of the write path.
    fn scan_prefix(&self, prefix: &[u8], visitor: &mut ScanVisitor<'_>) -> Result<()>;

    /// Enumerates every `(k, v)` in key order, no prefix filter. Callers
    /// typically extract ordering semantics from the key itself (e.g. a
    /// deadline-ordered scan over `JOB_DEADLINES`).
    fn scan_all(&self, visitor: &mut ScanVisitor<'_>) -> Result<()>;
}

//! RocksDB adapter for the job state store (Components B and C).
//!
//! `jobstate-core` stays free of any storage-engine dependency (ADR-001);
//! this crate is the only place that names RocksDB.
//!
//! `rocksdb::Error` is wrapped into `StoreError::EngineError` by hand at each
//! call site rather than via `From` - neither type is local to this crate,
//! so Rust's orphan rules rule out an `impl From<rocksdb::Error> for
//! StoreError` here.

mod column_family;
mod store;

pub use column_family::{CfKind, RocksColumnFamily};
pub use store::Store;

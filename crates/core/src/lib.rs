// Job State Store - Domain Logic & Ports
// NO storage-engine dependency here (ADR-001: Hexagonal Architecture) - the
// RocksDB adapter lives in jobstate-infra-rocks and depends on this crate,
// never the other way around.

pub mod domain;
pub mod error;
pub mod job_state_core;
pub mod keycodec;
pub mod metrics;
pub mod notifier;
pub mod port;

pub use error::{Result, StoreError};
pub use job_state_core::JobStateCore;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

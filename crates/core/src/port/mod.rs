// Port Layer - interfaces the engine-agnostic core depends on, implemented
// by an infra crate (or, for TimeProvider, trivially in-process).

pub mod column_family;
pub mod time_provider;

pub use column_family::{ColumnFamily, ScanVisitor};
pub use time_provider::{FixedTimeProvider, SystemTimeProvider, TimeProvider};

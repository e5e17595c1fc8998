// Domain Layer - pure types for the job state store, no storage dependency.

pub mod codec;
pub mod job;

pub use job::{JobKey, JobRecord, JobState, JobType};

// Job Domain Model (§3)

use serde::{Deserialize, Serialize};

/// Globally unique (within a partition) job identifier, assigned elsewhere.
pub type JobKey = u64;

/// A job's type, a non-empty byte string - typically a short, human-readable
/// tag such as `b"payment"` (≤255 bytes in practice, never enforced here).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobType(Vec<u8>);

impl JobType {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl From<&str> for JobType {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

/// Lifecycle state of a job. `NOT_FOUND` from §3 has no variant here - queries
/// return `Option<JobState>` and `None` means absent, the idiomatic Rust
/// equivalent of that pseudo-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Activatable,
    Activated,
    Failed,
    ErrorThrown,
}

impl JobState {
    /// Single-byte wire representation stored as the `JOB_STATES` value.
    pub fn to_byte(self) -> u8 {
        match self {
            JobState::Activatable => 0,
            JobState::Activated => 1,
            JobState::Failed => 2,
            JobState::ErrorThrown => 3,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(JobState::Activatable),
            1 => Some(JobState::Activated),
            2 => Some(JobState::Failed),
            3 => Some(JobState::ErrorThrown),
            _ => None,
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobState::Activatable => "ACTIVATABLE",
            JobState::Activated => "ACTIVATED",
            JobState::Failed => "FAILED",
            JobState::ErrorThrown => "ERROR_THROWN",
        };
        write!(f, "{s}")
    }
}

/// The primary job record (§3, §6 "JobRecord contract").
///
/// `variables` is carried on the in-memory value handed to `JobStateCore`
/// operations, but is never the value actually persisted: every mutator
/// projects through [`JobRecord::without_variables`] before writing to the
/// `JOBS` column family (invariant 6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_type: JobType,
    pub retries: i32,
    pub retry_backoff: u64,
    pub recurring_time: u64,
    pub deadline: u64,
    pub variables: Vec<u8>,
    /// Opaque body fields this store does not interpret (headers, custom
    /// data, worker-assigned metadata, ...).
    pub body: Vec<u8>,
}

impl JobRecord {
    pub fn type_buffer(&self) -> &[u8] {
        self.job_type.as_bytes()
    }

    pub fn deadline(&self) -> u64 {
        self.deadline
    }

    pub fn retries(&self) -> i32 {
        self.retries
    }

    pub fn retry_backoff(&self) -> u64 {
        self.retry_backoff
    }

    pub fn recurring_time(&self) -> u64 {
        self.recurring_time
    }

    pub fn set_retries(&mut self, retries: i32) {
        self.retries = retries;
    }

    /// Projection used for every persisted write: every field is carried
    /// over except `variables`, which is always stripped (invariant 6).
    pub fn without_variables(&self) -> JobRecord {
        JobRecord {
            job_type: self.job_type.clone(),
            retries: self.retries,
            retry_backoff: self.retry_backoff,
            recurring_time: self.recurring_time,
            deadline: self.deadline,
            variables: Vec::new(),
            body: self.body.clone(),
        }
    }

    /// Populates every field of `self` from `other` except `variables`,
    /// matching the `setRecordWithoutVariables` accessor of §6.
    pub fn set_record_without_variables(&mut self, other: &JobRecord) {
        self.job_type = other.job_type.clone();
        self.retries = other.retries;
        self.retry_backoff = other.retry_backoff;
        self.recurring_time = other.recurring_time;
        self.deadline = other.deadline;
        self.body = other.body.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn without_variables_strips_variables_only() {
        let rec = JobRecord {
            job_type: JobType::from("payment"),
            retries: 3,
            retry_backoff: 500,
            recurring_time: 2000,
            deadline: 1000,
            variables: vec![1, 2, 3],
            body: vec![9, 9],
        };
        let stripped = rec.without_variables();
        assert!(stripped.variables.is_empty());
        assert_eq!(stripped.retries, 3);
        assert_eq!(stripped.body, vec![9, 9]);
        assert_eq!(stripped.job_type, rec.job_type);
    }

    #[test]
    fn state_byte_round_trips() {
        for state in [
            JobState::Activatable,
            JobState::Activated,
            JobState::Failed,
            JobState::ErrorThrown,
        ] {
            assert_eq!(JobState::from_byte(state.to_byte()), Some(state));
        }
        assert_eq!(JobState::from_byte(99), None);
    }
}

//! `JobStateCore` (§4.4, Component E) - the transactional job state machine.
//!
//! Owns five column families (records, states, activatable, deadlines,
//! backoff) and keeps them mutually consistent according to §3's invariants.
//! Generic over a single [`ColumnFamily`] implementation: all five handles
//! are the same concrete type (different instances bound to different
//! physical keyspaces), which is what lets this module stay free of any
//! storage-engine dependency while still being a perfectly ordinary struct
//! rather than a dynamic-dispatch soup.
//!
//! Every public method here is meant to run inside a single transaction
//! supplied by the caller (§4.4 precondition) - the five `CF` handles are
//! expected to already be bound to that transaction when `JobStateCore` is
//! constructed.

use std::sync::Arc;

use crate::domain::{codec, JobKey, JobRecord, JobState, JobType};
use crate::error::{Result, StoreError};
use crate::keycodec::{decode_timestamp_key, decode_type_key, encode_timestamp_key, encode_type_key, encode_u64};
use crate::metrics::MetricsSink;
use crate::notifier::Notifier;
use crate::port::ColumnFamily;

pub struct JobStateCore<CF: ColumnFamily> {
    jobs: CF,
    states: CF,
    activatable: CF,
    deadlines: CF,
    backoff: CF,
    notifier: Arc<Notifier>,
    metrics: Arc<dyn MetricsSink>,
}

impl<CF: ColumnFamily> JobStateCore<CF> {
    pub fn new(
        jobs: CF,
        states: CF,
        activatable: CF,
        deadlines: CF,
        backoff: CF,
        notifier: Arc<Notifier>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            jobs,
            states,
            activatable,
            deadlines,
            backoff,
            notifier,
            metrics,
        }
    }

    // ---- debug-mode transition assertions (§4.4 footnote, §9 "Open Questions") ----
    //
    // "Illegal transitions ... are not defensively rejected by the store ...
    // implementers should add debug-mode assertions on the transitions
    // listed." Compiled out entirely in release builds.
    #[cfg(debug_assertions)]
    fn assert_precondition(&self, key: JobKey, allowed: &[Option<JobState>], op: &str) -> Result<()> {
        let current = self.get_state(key)?;
        debug_assert!(
            allowed.contains(&current),
            "illegal transition: {op} on job {key} in state {current:?}, expected one of {allowed:?}"
        );
        Ok(())
    }

    #[cfg(not(debug_assertions))]
    fn assert_precondition(&self, _key: JobKey, _allowed: &[Option<JobState>], _op: &str) -> Result<()> {
        Ok(())
    }

    fn require_type(rec: &JobRecord) -> Result<()> {
        if rec.job_type.is_empty() {
            return Err(StoreError::InvalidArgument("job type must not be empty".into()));
        }
        Ok(())
    }

    fn require_deadline(rec: &JobRecord) -> Result<()> {
        if rec.deadline == 0 {
            return Err(StoreError::InvalidArgument(
                "deadline must be positive".into(),
            ));
        }
        Ok(())
    }

    fn put_record(&self, key: JobKey, stripped: &JobRecord) -> Result<()> {
        self.jobs.put(&encode_u64(key), &codec::encode(stripped)?)
    }

    fn put_state(&self, key: JobKey, state: JobState) -> Result<()> {
        self.states.put(&encode_u64(key), &[state.to_byte()])
    }

    fn insert_activatable(&self, job_type: &JobType, key: JobKey) -> Result<()> {
        self.activatable
            .put(&encode_type_key(job_type.as_bytes(), key), &[])
    }

    fn remove_activatable(&self, job_type: &JobType, key: JobKey) -> Result<()> {
        self.activatable
            .delete(&encode_type_key(job_type.as_bytes(), key))
    }

    fn remove_deadline(&self, deadline: u64, key: JobKey) -> Result<()> {
        self.deadlines.delete(&encode_timestamp_key(deadline, key))
    }

    fn remove_backoff(&self, recurring_time: u64, key: JobKey) -> Result<()> {
        self.backoff.delete(&encode_timestamp_key(recurring_time, key))
    }

    // ---------------------------------------------------------------- create

    /// `ABSENT -> ACTIVATABLE`.
    pub fn create(&self, key: JobKey, rec: &JobRecord) -> Result<()> {
        Self::require_type(rec)?;
        self.assert_precondition(key, &[None], "create")?;

        let stripped = rec.without_variables();
        self.put_record(key, &stripped)?;
        self.put_state(key, JobState::Activatable)?;
        self.insert_activatable(&stripped.job_type, key)?;

        self.metrics.inc_created();
        self.notifier.notify(stripped.job_type.as_bytes());
        tracing::debug!(job_key = key, "job created, entering ACTIVATABLE");
        Ok(())
    }

    // -------------------------------------------------------------- activate

    /// `ACTIVATABLE -> ACTIVATED`.
    pub fn activate(&self, key: JobKey, rec: &JobRecord) -> Result<()> {
        Self::require_type(rec)?;
        Self::require_deadline(rec)?;
        self.assert_precondition(key, &[Some(JobState::Activatable)], "activate")?;

        let stripped = rec.without_variables();
        self.put_record(key, &stripped)?;
        self.put_state(key, JobState::Activated)?;
        self.remove_activatable(&stripped.job_type, key)?;
        self.deadlines
            .put(&encode_timestamp_key(stripped.deadline, key), &[])?;

        self.metrics.inc_activated();
        tracing::debug!(job_key = key, "job activated, deadline = {}", stripped.deadline);
        Ok(())
    }

    // --------------------------------------------------------------- timeout

    /// `{ABSENT, ACTIVATED} -> ACTIVATABLE`: behaves like `create`, plus
    /// removal of the prior `(deadline, key)` entry.
    pub fn timeout(&self, key: JobKey, rec: &JobRecord) -> Result<()> {
        Self::require_type(rec)?;
        Self::require_deadline(rec)?;
        self.assert_precondition(
            key,
            &[None, Some(JobState::Activated)],
            "timeout",
        )?;

        let stripped = rec.without_variables();
        self.remove_deadline(stripped.deadline, key)?;
        self.put_record(key, &stripped)?;
        self.put_state(key, JobState::Activatable)?;
        self.insert_activatable(&stripped.job_type, key)?;

        self.metrics.inc_timed_out();
        self.notifier.notify(stripped.job_type.as_bytes());
        tracing::debug!(job_key = key, "job activation timed out, back to ACTIVATABLE");
        Ok(())
    }

    // ---------------------------------------------------- complete / cancel / delete

    fn purge(&self, key: JobKey, rec: &JobRecord) -> Result<()> {
        self.jobs.delete(&encode_u64(key))?;
        self.states.delete(&encode_u64(key))?;
        self.remove_activatable(&rec.job_type, key)?;
        self.remove_deadline(rec.deadline, key)?;
        Ok(())
    }

    /// `ACTIVATED -> ABSENT`. Idempotent.
    pub fn complete(&self, key: JobKey, rec: &JobRecord) -> Result<()> {
        self.purge(key, rec)?;
        self.metrics.inc_completed();
        tracing::debug!(job_key = key, "job completed");
        Ok(())
    }

    /// `* -> ABSENT`. Idempotent. No metric - cancellation is not one of the
    /// five tracked event kinds (§4.6).
    pub fn cancel(&self, key: JobKey, rec: &JobRecord) -> Result<()> {
        self.purge(key, rec)?;
        tracing::debug!(job_key = key, "job cancelled");
        Ok(())
    }

    /// `* -> ABSENT`. Idempotent. No metric, same reasoning as `cancel`.
    pub fn delete(&self, key: JobKey, rec: &JobRecord) -> Result<()> {
        self.purge(key, rec)?;
        tracing::debug!(job_key = key, "job deleted");
        Ok(())
    }

    // -------------------------------------------------------------- disable

    /// `ACTIVATABLE -> FAILED`.
    pub fn disable(&self, key: JobKey, rec: &JobRecord) -> Result<()> {
        Self::require_type(rec)?;
        self.assert_precondition(key, &[Some(JobState::Activatable)], "disable")?;

        let stripped = rec.without_variables();
        self.put_record(key, &stripped)?;
        self.put_state(key, JobState::Failed)?;
        self.remove_activatable(&stripped.job_type, key)?;

        self.metrics.inc_failed();
        tracing::debug!(job_key = key, "job disabled, entering FAILED");
        Ok(())
    }

    // ------------------------------------------------------------ throwError

    /// `ACTIVATABLE -> ERROR_THROWN`.
    pub fn throw_error(&self, key: JobKey, rec: &JobRecord) -> Result<()> {
        Self::require_type(rec)?;
        self.assert_precondition(key, &[Some(JobState::Activatable)], "throwError")?;

        let stripped = rec.without_variables();
        self.put_record(key, &stripped)?;
        self.put_state(key, JobState::ErrorThrown)?;
        self.remove_activatable(&stripped.job_type, key)?;

        tracing::debug!(job_key = key, "job threw an error, entering ERROR_THROWN");
        Ok(())
    }

    // ----------------------------------------------------------------- fail

    /// `ACTIVATED -> {FAILED (backoff), ACTIVATABLE, FAILED}` depending on
    /// `rec.retries`/`rec.retry_backoff` (§4.4 table). Always overwrites the
    /// record and removes any prior `(deadline, key)` entry.
    pub fn fail(&self, key: JobKey, rec: &JobRecord) -> Result<()> {
        self.assert_precondition(key, &[Some(JobState::Activated)], "fail")?;

        let stripped = rec.without_variables();
        self.remove_deadline(stripped.deadline, key)?;
        self.put_record(key, &stripped)?;

        if stripped.retries > 0 && stripped.retry_backoff > 0 {
            self.put_state(key, JobState::Failed)?;
            self.backoff
                .put(&encode_timestamp_key(stripped.recurring_time, key), &[])?;
            self.metrics.inc_failed();
            tracing::debug!(job_key = key, "job failed, sleeping until {}", stripped.recurring_time);
        } else if stripped.retries > 0 {
            self.put_state(key, JobState::Activatable)?;
            self.insert_activatable(&stripped.job_type, key)?;
            self.notifier.notify(stripped.job_type.as_bytes());
            tracing::debug!(job_key = key, "job failed, retrying immediately");
        } else {
            self.put_state(key, JobState::Failed)?;
            self.metrics.inc_failed();
            tracing::debug!(job_key = key, "job failed, no retries left");
        }
        Ok(())
    }

    // --------------------------------------------------------------- resolve

    /// `{FAILED, ERROR_THROWN} -> ACTIVATABLE`.
    pub fn resolve(&self, key: JobKey, rec: &JobRecord) -> Result<()> {
        Self::require_type(rec)?;
        self.assert_precondition(
            key,
            &[Some(JobState::Failed), Some(JobState::ErrorThrown)],
            "resolve",
        )?;

        let stripped = rec.without_variables();
        self.put_record(key, &stripped)?;
        self.put_state(key, JobState::Activatable)?;
        self.insert_activatable(&stripped.job_type, key)?;

        self.notifier.notify(stripped.job_type.as_bytes());
        tracing::debug!(job_key = key, "job resolved, back to ACTIVATABLE");
        Ok(())
    }

    // --------------------------------------------------------- recurAfterBackoff

    /// `FAILED -> ACTIVATABLE`, removing the `(recurringTime, key)` backoff
    /// entry.
    pub fn recur_after_backoff(&self, key: JobKey, rec: &JobRecord) -> Result<()> {
        Self::require_type(rec)?;
        self.assert_precondition(key, &[Some(JobState::Failed)], "recurAfterBackoff")?;

        let stripped = rec.without_variables();
        self.put_record(key, &stripped)?;
        self.put_state(key, JobState::Activatable)?;
        self.insert_activatable(&stripped.job_type, key)?;
        self.remove_backoff(stripped.recurring_time, key)?;

        self.notifier.notify(stripped.job_type.as_bytes());
        tracing::debug!(job_key = key, "job recurred after backoff, back to ACTIVATABLE");
        Ok(())
    }

    // ----------------------------------------------------------- updateJobRetries

    /// Rewrites `retries` on the stored record, if one exists. Does not
    /// touch the state machine (§9 Open Question (a): callers in FAILED
    /// with new positive retries must explicitly `resolve` afterward).
    pub fn update_job_retries(&self, key: JobKey, retries: i32) -> Result<Option<JobRecord>> {
        let Some(mut record) = self.get_job(key)? else {
            return Ok(None);
        };
        record.set_retries(retries);
        self.put_record(key, &record)?;
        Ok(Some(record))
    }

    // ------------------------------------------------------------------ queries

    pub fn exists(&self, key: JobKey) -> Result<bool> {
        self.states.exists(&encode_u64(key))
    }

    /// `NOT_FOUND` from §3 is represented as `None`.
    pub fn get_state(&self, key: JobKey) -> Result<Option<JobState>> {
        match self.states.get(&encode_u64(key))? {
            None => Ok(None),
            Some(bytes) => {
                let byte = *bytes.first().ok_or_else(|| {
                    StoreError::CorruptValue(format!("empty JOB_STATES value for key {key}"))
                })?;
                JobState::from_byte(byte)
                    .map(Some)
                    .ok_or_else(|| StoreError::CorruptValue(format!("unknown state byte {byte}")))
            }
        }
    }

    pub fn is_in_state(&self, key: JobKey, state: JobState) -> Result<bool> {
        Ok(self.get_state(key)? == Some(state))
    }

    pub fn get_job(&self, key: JobKey) -> Result<Option<JobRecord>> {
        self.jobs
            .get(&encode_u64(key))?
            .map(|bytes| codec::decode(&bytes))
            .transpose()
    }

    // ------------------------------------------------------------------ iterators

    /// Visits `(key, JobRecord)` for every `(type, key) ∈ JOB_ACTIVATABLE`,
    /// in key order, until `visitor` returns `false` or the type's prefix is
    /// exhausted. A dangling index entry (no corresponding `JOBS[key]`) is
    /// logged and repaired rather than handed to the visitor.
    pub fn for_each_activatable(
        &self,
        job_type: &[u8],
        visitor: &mut dyn FnMut(JobKey, &JobRecord) -> Result<bool>,
    ) -> Result<()> {
        let prefix = crate::keycodec::encode_bytes(job_type);
        let jobs = &self.jobs;
        let activatable = &self.activatable;
        activatable.scan_prefix(&prefix, &mut |k, _v| {
            let (_, job_key) = decode_type_key(k)?;
            match jobs.get(&encode_u64(job_key))? {
                None => {
                    tracing::warn!(
                        job_key,
                        job_type = %String::from_utf8_lossy(job_type),
                        "dangling JOB_ACTIVATABLE entry, repairing"
                    );
                    activatable.delete(k)?;
                    Ok(true)
                }
                Some(bytes) => {
                    let record = codec::decode(&bytes)?;
                    visitor(job_key, &record)
                }
            }
        })
    }

    /// Walks `JOB_DEADLINES` in ascending deadline order. For each entry
    /// whose deadline is `< upper_bound`, fetches `JOBS[key]` and invokes
    /// `visitor`. A missing job deletes the dangling deadline entry and
    /// continues. Stops when `visitor` returns `false`, or the first entry
    /// with `deadline >= upper_bound` is reached.
    pub fn for_each_timed_out(
        &self,
        upper_bound: u64,
        visitor: &mut dyn FnMut(JobKey, &JobRecord) -> Result<bool>,
    ) -> Result<()> {
        let jobs = &self.jobs;
        let deadlines = &self.deadlines;
        deadlines.scan_all(&mut |k, _v| {
            let (deadline, job_key) = decode_timestamp_key(k)?;
            if deadline >= upper_bound {
                return Ok(false);
            }
            match jobs.get(&encode_u64(job_key))? {
                None => {
                    tracing::warn!(job_key, deadline, "dangling JOB_DEADLINES entry, repairing");
                    deadlines.delete(k)?;
                    Ok(true)
                }
                Some(bytes) => {
                    let record = codec::decode(&bytes)?;
                    visitor(job_key, &record)
                }
            }
        })
    }

    /// Scans `JOB_BACKOFF` in ascending due-time order. For each entry with
    /// `dueTime <= now`, consults `predicate`; `predicate` may return
    /// `false` to pause the scan at that entry. Returns the due-time of the
    /// first unconsumed entry (the nearest future wake-up), or `-1` if none
    /// remain.
    pub fn find_backed_off_jobs(
        &self,
        now: u64,
        predicate: &mut dyn FnMut(JobKey, &JobRecord) -> Result<bool>,
    ) -> Result<i64> {
        let jobs = &self.jobs;
        let backoff = &self.backoff;
        let mut next_due: Option<i64> = None;

        backoff.scan_all(&mut |k, _v| {
            let (due_time, job_key) = decode_timestamp_key(k)?;
            if due_time > now {
                next_due = Some(due_time as i64);
                return Ok(false);
            }
            match jobs.get(&encode_u64(job_key))? {
                None => {
                    tracing::warn!(job_key, due_time, "dangling JOB_BACKOFF entry, repairing");
                    backoff.delete(k)?;
                    Ok(true)
                }
                Some(bytes) => {
                    let record = codec::decode(&bytes)?;
                    if predicate(job_key, &record)? {
                        Ok(true)
                    } else {
                        next_due = Some(due_time as i64);
                        Ok(false)
                    }
                }
            }
        })?;

        Ok(next_due.unwrap_or(-1))
    }
}

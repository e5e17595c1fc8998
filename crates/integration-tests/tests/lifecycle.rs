//! Black-box tests against a real `jobstate-infra-rocks` store, covering the
//! concrete scenarios and invariants from the job state store's design.

use std::sync::Arc;

use jobstate_core::domain::{JobRecord, JobType};
use jobstate_core::metrics::AtomicMetricsSink;
use jobstate_core::StoreError;
use jobstate_infra_rocks::Store;

fn open_store() -> (tempfile::TempDir, Store, Arc<AtomicMetricsSink>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let metrics = Arc::new(AtomicMetricsSink::new());
    let store = Store::open(dir.path(), None, metrics.clone()).expect("store open");
    (dir, store, metrics)
}

fn rec(job_type: &str) -> JobRecord {
    JobRecord {
        job_type: JobType::from(job_type),
        retries: 3,
        retry_backoff: 0,
        recurring_time: 0,
        deadline: 0,
        variables: vec![1, 2, 3],
        body: vec![],
    }
}

#[test]
fn scenario_1_create_enters_activatable_and_notifies() {
    let (_dir, store, _metrics) = open_store();
    let notified = Arc::new(std::sync::Mutex::new(Vec::new()));
    let notified_clone = notified.clone();
    store
        .notifier()
        .set_callback(Some(Box::new(move |t: &str| {
            notified_clone.lock().unwrap().push(t.to_string());
        })));

    let job = rec("payment");
    store
        .with_transaction(|core| core.create(42, &job))
        .unwrap();

    let state = store.with_transaction(|core| core.get_state(42)).unwrap();
    assert_eq!(state, Some(jobstate_core::domain::JobState::Activatable));

    let ids = store
        .with_transaction(|core| {
            let mut ids = vec![];
            core.for_each_activatable(b"payment", &mut |k, _r| {
                ids.push(k);
                Ok(true)
            })?;
            Ok(ids)
        })
        .unwrap();
    assert_eq!(ids, vec![42]);
    assert_eq!(*notified.lock().unwrap(), vec!["payment".to_string()]);
}

#[test]
fn scenario_2_activate_moves_to_deadline_index() {
    let (_dir, store, _metrics) = open_store();
    let mut job = rec("payment");
    store.with_transaction(|core| core.create(42, &job)).unwrap();

    job.deadline = 1000;
    store.with_transaction(|core| core.activate(42, &job)).unwrap();

    let state = store.with_transaction(|core| core.get_state(42)).unwrap();
    assert_eq!(state, Some(jobstate_core::domain::JobState::Activated));

    let still_activatable = store
        .with_transaction(|core| {
            let mut ids = vec![];
            core.for_each_activatable(b"payment", &mut |k, _r| {
                ids.push(k);
                Ok(true)
            })?;
            Ok(ids)
        })
        .unwrap();
    assert!(still_activatable.is_empty());

    let timed_out_1001 = store
        .with_transaction(|core| {
            let mut ids = vec![];
            core.for_each_timed_out(1001, &mut |k, _r| {
                ids.push(k);
                Ok(true)
            })?;
            Ok(ids)
        })
        .unwrap();
    assert_eq!(timed_out_1001, vec![42]);

    let timed_out_1000 = store
        .with_transaction(|core| {
            let mut ids = vec![];
            core.for_each_timed_out(1000, &mut |k, _r| {
                ids.push(k);
                Ok(true)
            })?;
            Ok(ids)
        })
        .unwrap();
    assert!(timed_out_1000.is_empty());
}

#[test]
fn scenario_3_and_4_fail_with_backoff_then_recur() {
    let (_dir, store, _metrics) = open_store();
    let mut job = rec("payment");
    store.with_transaction(|core| core.create(42, &job)).unwrap();
    job.deadline = 1000;
    store.with_transaction(|core| core.activate(42, &job)).unwrap();

    let mut failing = job.clone();
    failing.retries = 2;
    failing.retry_backoff = 500;
    failing.recurring_time = 2000;
    store.with_transaction(|core| core.fail(42, &failing)).unwrap();

    let state = store.with_transaction(|core| core.get_state(42)).unwrap();
    assert_eq!(state, Some(jobstate_core::domain::JobState::Failed));

    let next = store
        .with_transaction(|core| core.find_backed_off_jobs(1999, &mut |_, _| Ok(false)))
        .unwrap();
    assert_eq!(next, 2000);

    let next2 = store
        .with_transaction(|core| core.find_backed_off_jobs(2000, &mut |_, _| Ok(true)))
        .unwrap();
    assert_eq!(next2, -1);

    store
        .with_transaction(|core| core.recur_after_backoff(42, &failing))
        .unwrap();
    let state = store.with_transaction(|core| core.get_state(42)).unwrap();
    assert_eq!(state, Some(jobstate_core::domain::JobState::Activatable));

    let remaining = store
        .with_transaction(|core| core.find_backed_off_jobs(i64::MAX as u64, &mut |_, _| Ok(true)))
        .unwrap();
    assert_eq!(remaining, -1);
}

#[test]
fn scenario_5_delete_clears_all_indexes() {
    let (_dir, store, _metrics) = open_store();
    let job = rec("t");
    store.with_transaction(|core| core.create(7, &job)).unwrap();
    store.with_transaction(|core| core.create(8, &job)).unwrap();

    let mut activating = job.clone();
    activating.deadline = 100;
    store.with_transaction(|core| core.activate(7, &activating)).unwrap();
    store.with_transaction(|core| core.delete(8, &job)).unwrap();

    let activatable = store
        .with_transaction(|core| {
            let mut ids = vec![];
            core.for_each_activatable(b"t", &mut |k, _r| {
                ids.push(k);
                Ok(true)
            })?;
            Ok(ids)
        })
        .unwrap();
    assert!(activatable.is_empty());

    let timed_out = store
        .with_transaction(|core| {
            let mut ids = vec![];
            core.for_each_timed_out(101, &mut |k, _r| {
                ids.push(k);
                Ok(true)
            })?;
            Ok(ids)
        })
        .unwrap();
    assert_eq!(timed_out, vec![7]);
}

#[test]
fn scenario_6_empty_type_is_rejected_and_leaves_no_trace() {
    let (_dir, store, _metrics) = open_store();
    let job = rec("");

    let err = store.with_transaction(|core| core.create(1, &job)).unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument(_)));

    let exists = store.with_transaction(|core| core.exists(1)).unwrap();
    assert!(!exists);
}

#[test]
fn delete_is_idempotent() {
    let (_dir, store, _metrics) = open_store();
    let job = rec("payment");
    store.with_transaction(|core| core.create(1, &job)).unwrap();

    store.with_transaction(|core| core.delete(1, &job)).unwrap();
    store.with_transaction(|core| core.delete(1, &job)).unwrap();

    let exists = store.with_transaction(|core| core.exists(1)).unwrap();
    assert!(!exists);
}

#[test]
fn variables_never_survive_a_commit() {
    let (_dir, store, _metrics) = open_store();
    let job = rec("payment");
    assert!(!job.variables.is_empty());

    store.with_transaction(|core| core.create(1, &job)).unwrap();

    let stored = store.with_transaction(|core| core.get_job(1)).unwrap().unwrap();
    assert!(stored.variables.is_empty());
}

#[test]
fn reopening_the_same_directory_preserves_state() {
    let dir = tempfile::tempdir().unwrap();
    let metrics = Arc::new(AtomicMetricsSink::new());
    let job = rec("payment");

    {
        let store = Store::open(dir.path(), None, metrics.clone()).unwrap();
        store.with_transaction(|core| core.create(1, &job)).unwrap();
        store.close().unwrap();
    }

    let store = Store::open(dir.path(), None, metrics).unwrap();
    let state = store.with_transaction(|core| core.get_state(1)).unwrap();
    assert_eq!(state, Some(jobstate_core::domain::JobState::Activatable));
}

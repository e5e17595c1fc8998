//! Notifier (§4.5, Component F) - a single optional callback invoked with a
//! job type whenever a new job of that type becomes activatable.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Mutex;

/// A fire-and-forget signal that a job type has new activatable work.
///
/// Invoked synchronously on the transaction-applying thread, every time a
/// job enters `ACTIVATABLE` - no de-duplication; the consumer coalesces if
/// it wants to. A panicking callback is caught and logged, never propagated:
/// the store treats notification as best-effort.
#[derive(Default)]
pub struct Notifier {
    callback: Mutex<Option<Box<dyn Fn(&str) + Send + Sync>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the single listener. Only the most recently registered
    /// callback is used; passing `None` disables notifications.
    pub fn set_callback(&self, callback: Option<Box<dyn Fn(&str) + Send + Sync>>) {
        *self.callback.lock().expect("notifier mutex poisoned") = callback;
    }

    /// Invokes the registered callback, if any, with `job_type` decoded as
    /// UTF-8 (lossily, since job types are arbitrary bytes in principle).
    pub fn notify(&self, job_type: &[u8]) {
        let guard = self.callback.lock().expect("notifier mutex poisoned");
        let Some(callback) = guard.as_ref() else {
            return;
        };
        let type_str = String::from_utf8_lossy(job_type).into_owned();
        tracing::trace!(job_type = %type_str, "firing activatable notification");
        if catch_unwind(AssertUnwindSafe(|| callback(&type_str))).is_err() {
            tracing::warn!(job_type = %type_str, "notifier callback panicked, ignoring");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn fires_registered_callback_with_type() {
        let notifier = Notifier::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        notifier.set_callback(Some(Box::new(move |t: &str| {
            seen_clone.lock().unwrap().push(t.to_string());
        })));

        notifier.notify(b"payment");
        notifier.notify(b"shipping");

        assert_eq!(*seen.lock().unwrap(), vec!["payment", "shipping"]);
    }

    #[test]
    fn no_callback_is_a_no_op() {
        let notifier = Notifier::new();
        notifier.notify(b"payment"); // must not panic
    }

    #[test]
    fn panicking_callback_does_not_propagate() {
        let notifier = Notifier::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        notifier.set_callback(Some(Box::new(move |_: &str| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            panic!("boom");
        })));

        notifier.notify(b"payment");
        notifier.notify(b"payment");

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn disabling_clears_callback() {
        let notifier = Notifier::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        notifier.set_callback(Some(Box::new(move |_: &str| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        })));
        notifier.set_callback(None);
        notifier.notify(b"payment");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}

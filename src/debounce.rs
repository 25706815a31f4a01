//! Cancellable delayed task for keystroke debouncing.
//!
//! [`Debouncer::schedule`] arms a task that runs a closure after the
//! quiet interval. Scheduling again before it fires aborts the pending
//! task first, so within one quiet window only the last closure runs.
//! Dropping the debouncer cancels whatever is pending, which keeps
//! callbacks from firing after the owning session is torn down.
//!
//! Must be used from within a tokio runtime.

use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;

pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `f` once the quiet interval elapses without another call.
    pub fn schedule<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let delay = self.delay;
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = pending.take() {
            handle.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            f();
        }));
    }

    /// Drop the pending task, if any.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = pending.take() {
            handle.abort();
        }
    }

    /// True while a scheduled task has not yet run.
    pub fn is_pending(&self) -> bool {
        let pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> Box<dyn FnOnce() + Send>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let make = move |value: &str| -> Box<dyn FnOnce() + Send> {
            let sink = sink.clone();
            let value = value.to_string();
            Box::new(move || sink.lock().unwrap().push(value))
        };
        (calls, make)
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_calls_collapse_to_last() {
        let debouncer = Debouncer::new(Duration::from_millis(250));
        let (calls, make) = recorder();

        for value in ["v", "va", "val"] {
            debouncer.schedule(make(value));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(calls.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(*calls.lock().unwrap(), vec!["val".to_string()]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_windows_fire_separately() {
        let debouncer = Debouncer::new(Duration::from_millis(250));
        let (calls, make) = recorder();

        debouncer.schedule(make("a"));
        tokio::time::sleep(Duration::from_millis(300)).await;
        debouncer.schedule(make("b"));
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_fire() {
        let debouncer = Debouncer::new(Duration::from_millis(250));
        let (calls, make) = recorder();

        debouncer.schedule(make("x"));
        assert!(debouncer.is_pending());
        debouncer.cancel();
        assert!(!debouncer.is_pending());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let (calls, make) = recorder();
        {
            let debouncer = Debouncer::new(Duration::from_millis(250));
            debouncer.schedule(make("late"));
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(calls.lock().unwrap().is_empty());
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Delayed task scheduling for the dispatcher's start and dismiss timers

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Work to run once a timer elapses
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs a task after a delay and hands back a way to cancel it
pub trait Scheduler: Send + Sync {
    /// Schedule `task` to run once `delay` has elapsed
    fn after(&self, delay: Duration, task: Task) -> TimerHandle;
}

/// Cancellation handle for a scheduled task.
///
/// Dropping the handle leaves the task scheduled; call [`TimerHandle::cancel`].
#[must_use = "dropping a TimerHandle does not cancel the timer"]
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TimerHandle {
    /// Wrap a cancellation callback
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Handle for a task that can no longer be cancelled
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    /// Prevent the task from running if it has not started yet
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

// =============================================================================
// Tokio
// =============================================================================

/// Scheduler backed by tokio timers
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: tokio::runtime::Handle,
}

impl TokioScheduler {
    /// Schedule onto the given runtime
    #[must_use]
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Schedule onto the runtime this is called from.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    #[must_use]
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }
}

impl Scheduler for TokioScheduler {
    fn after(&self, delay: Duration, task: Task) -> TimerHandle {
        let join = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
        let abort = join.abort_handle();
        TimerHandle::new(move || abort.abort())
    }
}

// =============================================================================
// Manual (virtual time)
// =============================================================================

#[derive(Default)]
struct ManualQueue {
    now: Duration,
    next_seq: u64,
    tasks: BTreeMap<(Duration, u64), Task>,
}

/// Deterministic scheduler driven by [`ManualScheduler::advance`].
///
/// Clones share the same queue.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    queue: Arc<Mutex<ManualQueue>>,
}

impl ManualScheduler {
    /// Create an empty queue at virtual time zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Virtual time elapsed so far
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.lock().now
    }

    /// Number of tasks still waiting
    #[must_use]
    pub fn pending(&self) -> usize {
        self.lock().tasks.len()
    }

    /// Move virtual time forward, running every task that falls due in
    /// deadline order. Tasks scheduled by those tasks run too if they are
    /// due before the new time.
    pub fn advance(&self, by: Duration) {
        let target = self.elapsed() + by;
        loop {
            let task = {
                let mut queue = self.lock();
                let due = queue
                    .tasks
                    .first_key_value()
                    .map(|(key, _)| *key)
                    .filter(|(deadline, _)| *deadline <= target);
                match due {
                    Some(key) => {
                        queue.now = key.0;
                        queue.tasks.remove(&key)
                    }
                    None => {
                        queue.now = target;
                        None
                    }
                }
            };
            match task {
                Some(task) => task(),
                None => break,
            }
        }
    }
}

impl Scheduler for ManualScheduler {
    fn after(&self, delay: Duration, task: Task) -> TimerHandle {
        let key = {
            let mut queue = self.lock();
            let key = (queue.now + delay, queue.next_seq);
            queue.next_seq += 1;
            queue.tasks.insert(key, task);
            key
        };
        let queue = Arc::downgrade(&self.queue);
        TimerHandle::new(move || {
            if let Some(queue) = queue.upgrade() {
                queue
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .tasks
                    .remove(&key);
            }
        })
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = self.lock();
        f.debug_struct("ManualScheduler")
            .field("now", &queue.now)
            .field("pending", &queue.tasks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> Task) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let make = {
            let log = log.clone();
            move |name: &'static str| -> Task {
                let log = log.clone();
                Box::new(move || log.lock().unwrap().push(name))
            }
        };
        (log, make)
    }

    #[test]
    fn test_manual_runs_in_deadline_order() {
        let scheduler = ManualScheduler::new();
        let (log, task) = recorder();

        let _late = scheduler.after(Duration::from_millis(300), task("late"));
        let _early = scheduler.after(Duration::from_millis(100), task("early"));
        let _tie = scheduler.after(Duration::from_millis(100), task("tie"));

        scheduler.advance(Duration::from_millis(99));
        assert!(log.lock().unwrap().is_empty());

        scheduler.advance(Duration::from_millis(1));
        assert_eq!(*log.lock().unwrap(), vec!["early", "tie"]);

        scheduler.advance(Duration::from_secs(1));
        assert_eq!(*log.lock().unwrap(), vec!["early", "tie", "late"]);
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.elapsed(), Duration::from_millis(1100));
    }

    #[test]
    fn test_manual_cancel() {
        let scheduler = ManualScheduler::new();
        let (log, task) = recorder();

        let handle = scheduler.after(Duration::from_millis(10), task("cancelled"));
        assert_eq!(scheduler.pending(), 1);
        handle.cancel();
        assert_eq!(scheduler.pending(), 0);

        scheduler.advance(Duration::from_secs(1));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_manual_nested_scheduling() {
        let scheduler = ManualScheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let inner_scheduler = scheduler.clone();
        let inner_hits = hits.clone();
        let _outer = scheduler.after(
            Duration::from_millis(10),
            Box::new(move || {
                inner_hits.fetch_add(1, Ordering::SeqCst);
                let hits = inner_hits.clone();
                let _inner = inner_scheduler.after(
                    Duration::from_millis(10),
                    Box::new(move || {
                        hits.fetch_add(1, Ordering::SeqCst);
                    }),
                );
            }),
        );

        scheduler.advance(Duration::from_millis(15));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        scheduler.advance(Duration::from_millis(5));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_scheduler_fires_and_cancels() {
        let scheduler = TokioScheduler::current();
        let hits = Arc::new(AtomicUsize::new(0));

        let fired = hits.clone();
        let _kept = scheduler.after(
            Duration::from_millis(50),
            Box::new(move || {
                fired.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let dropped = hits.clone();
        scheduler
            .after(
                Duration::from_millis(50),
                Box::new(move || {
                    dropped.fetch_add(10, Ordering::SeqCst);
                }),
            )
            .cancel();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}

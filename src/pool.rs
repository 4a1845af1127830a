//! # Worker Pool
//!
//! Bounded concurrent execution of independent work items. At most
//! `concurrency` items run at once; results stream back in completion
//! order; each item resolves to exactly one [`TaskOutcome`], never an
//! unhandled fault that tears down the pool.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, bounded};
use tracing::{debug, warn};

use crate::error::EngineError;

/// How often the dispatcher rechecks the cancel flag while a handoff is
/// pending.
const DISPATCH_TICK: Duration = Duration::from_millis(10);

/// One unit of work: an opaque payload plus the key used for result
/// attribution and logging. Immutable once enqueued.
#[derive(Debug)]
pub struct WorkItem<P> {
    pub key: String,
    pub payload: P,
}

impl<P> WorkItem<P> {
    pub fn new(key: impl Into<String>, payload: P) -> Self {
        Self {
            key: key.into(),
            payload,
        }
    }
}

/// Terminal state of one work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus<T> {
    Success(T),
    Failure(String),
    Timeout,
    Cancelled,
}

/// The resolved result of one item, tagged with its key.
#[derive(Debug, Clone)]
pub struct TaskOutcome<T> {
    pub key: String,
    pub status: OutcomeStatus<T>,
}

/// Cooperative stop signal, triggered externally (e.g. from a Ctrl+C
/// handler). Cloning shares the underlying flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent: repeated calls are indistinguishable from one.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Fixed-size pool of execution slots with a per-item timeout.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    concurrency: u32,
    per_item_timeout: Duration,
}

impl WorkerPool {
    /// Rejects degenerate configurations before any work starts.
    pub fn new(concurrency: u32, per_item_timeout: Duration) -> Result<Self, EngineError> {
        if concurrency == 0 {
            return Err(EngineError::InvalidConfiguration(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if per_item_timeout.is_zero() {
            return Err(EngineError::InvalidConfiguration(
                "per-item timeout must be positive".to_string(),
            ));
        }
        Ok(Self {
            concurrency,
            per_item_timeout,
        })
    }

    /// Execute `items` with at most `concurrency` in flight.
    ///
    /// Returns a lazy stream of outcomes in completion order, one per
    /// dispatched item. After `cancel` fires, pending items never dispatch
    /// and in-flight items resolve as [`OutcomeStatus::Cancelled`]. The
    /// output channel holds at most `concurrency` unconsumed outcomes, so a
    /// slow consumer backpressures the workers.
    pub fn run<P, T, F>(
        &self,
        items: Vec<WorkItem<P>>,
        worker_fn: F,
        cancel: CancelToken,
    ) -> Outcomes<T>
    where
        P: Send + 'static,
        T: Send + 'static,
        F: Fn(P) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let worker_fn = Arc::new(worker_fn);
        // Rendezvous channel: a send completes only when a worker takes the
        // item, so "sent" and "dispatched" are the same event and the
        // cancel check below really does gate dispatch.
        let (job_tx, job_rx) = bounded::<WorkItem<P>>(0);
        let (outcome_tx, outcome_rx) = bounded::<TaskOutcome<T>>(self.concurrency as usize);

        let dispatch_cancel = cancel.clone();
        let dispatcher = thread::spawn(move || {
            'items: for mut item in items {
                loop {
                    if dispatch_cancel.is_cancelled() {
                        debug!("cancellation requested; pending items dropped");
                        break 'items;
                    }
                    match job_tx.send_timeout(item, DISPATCH_TICK) {
                        Ok(()) => continue 'items,
                        Err(SendTimeoutError::Timeout(unsent)) => item = unsent,
                        Err(SendTimeoutError::Disconnected(_)) => break 'items,
                    }
                }
            }
        });

        let mut workers = Vec::with_capacity(self.concurrency as usize);
        for _ in 0..self.concurrency {
            let job_rx = job_rx.clone();
            let outcome_tx = outcome_tx.clone();
            let worker_fn = worker_fn.clone();
            let cancel = cancel.clone();
            let timeout = self.per_item_timeout;

            workers.push(thread::spawn(move || {
                for item in job_rx {
                    let outcome = execute_item(item, &worker_fn, timeout, &cancel);
                    if outcome_tx.send(outcome).is_err() {
                        // Consumer went away; nothing left to report to.
                        break;
                    }
                }
            }));
        }

        Outcomes {
            rx: outcome_rx,
            dispatcher: Some(dispatcher),
            workers,
        }
    }
}

/// Run one item on a disposable runner thread so a hung execution cannot
/// occupy the worker slot past the timeout.
fn execute_item<P, T, F>(
    item: WorkItem<P>,
    worker_fn: &Arc<F>,
    timeout: Duration,
    cancel: &CancelToken,
) -> TaskOutcome<T>
where
    P: Send + 'static,
    T: Send + 'static,
    F: Fn(P) -> anyhow::Result<T> + Send + Sync + 'static,
{
    let WorkItem { key, payload } = item;

    if cancel.is_cancelled() {
        return TaskOutcome {
            key,
            status: OutcomeStatus::Cancelled,
        };
    }

    let (result_tx, result_rx) = bounded(1);
    let runner_fn = Arc::clone(worker_fn);
    thread::spawn(move || {
        let result = panic::catch_unwind(AssertUnwindSafe(|| runner_fn(payload)));
        let _ = result_tx.send(result);
    });

    let status = match result_rx.recv_timeout(timeout) {
        Ok(Ok(Ok(value))) => OutcomeStatus::Success(value),
        Ok(Ok(Err(err))) => {
            warn!(key = %key, "item failed: {err:#}");
            OutcomeStatus::Failure(format!("{err:#}"))
        }
        Ok(Err(panic_payload)) => {
            let message = panic_message(panic_payload);
            warn!(key = %key, "item panicked: {message}");
            OutcomeStatus::Failure(message)
        }
        Err(RecvTimeoutError::Timeout) => {
            // The runner keeps going in the background; its late result is
            // discarded when the channel receiver drops here.
            warn!(key = %key, timeout_ms = timeout.as_millis() as u64, "item timed out");
            OutcomeStatus::Timeout
        }
        Err(RecvTimeoutError::Disconnected) => {
            OutcomeStatus::Failure("worker exited without producing a result".to_string())
        }
    };

    // An item still in flight when the stop signal arrived resolves as
    // Cancelled, whatever its execution produced. Timeouts stay distinct so
    // slow and stopped remain distinguishable.
    let status = match status {
        OutcomeStatus::Timeout => OutcomeStatus::Timeout,
        _ if cancel.is_cancelled() => OutcomeStatus::Cancelled,
        status => status,
    };

    TaskOutcome { key, status }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {msg}")
    } else {
        "panicked".to_string()
    }
}

/// Lazily yields outcomes in completion order. Dropping it drains the
/// remaining outcomes and joins the pool's threads.
pub struct Outcomes<T> {
    rx: Receiver<TaskOutcome<T>>,
    dispatcher: Option<thread::JoinHandle<()>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl<T> Iterator for Outcomes<T> {
    type Item = TaskOutcome<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rx.recv().ok()
    }
}

impl<T> Drop for Outcomes<T> {
    fn drop(&mut self) {
        // Unblock any worker waiting on the outcome channel, then join.
        while self.rx.recv().is_ok() {}
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
        if let Some(handle) = self.dispatcher.take() {
            let _ = handle.join();
        }
    }
}

//! Cancellable background tasks with a single-threaded completion inbox.
//!
//! Grammar/theme acquisition is the one long-running, coarse-grained step
//! in the pipeline. It runs on a worker thread; the completed value is
//! posted into a channel that the owning (rendering) thread drains at the
//! start of its next cycle, so no consumer ever observes a resource
//! mid-initialization. The pool's cancellation token is flipped on
//! teardown and checked before posting: a completion racing a teardown is
//! discarded, never written into live state.
//!
//! Channel policy: unbounded, single consumer. Producers are rare,
//! one-shot loader threads, so backpressure is not a concern; preserving
//! every completion is.

use crossbeam_channel::{Receiver, Sender, unbounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// Shared cancellation flag. Cloning shares the flag, not a snapshot.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Owns the inbox for one document's background completions. Dropping the
/// pool cancels its token; detached workers then discard their results.
#[derive(Debug)]
pub struct TaskPool<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
    token: CancellationToken,
}

impl<T: Send + 'static> TaskPool<T> {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx,
            rx,
            token: CancellationToken::new(),
        }
    }

    /// Token tied to this pool's lifetime; hosts may also cancel it early.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Run `job` on a background thread. A successful result is posted to
    /// the inbox unless the pool was cancelled first; a failed job is
    /// logged and produces nothing (callers keep their fallback state).
    pub fn spawn<F>(&self, name: &'static str, job: F) -> thread::JoinHandle<()>
    where
        F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    {
        let tx = self.tx.clone();
        let token = self.token.clone();
        thread::spawn(move || {
            let outcome = job();
            if token.is_cancelled() {
                tracing::debug!(target: "tasks", task = name, "completion_discarded_after_cancel");
                return;
            }
            match outcome {
                Ok(value) => {
                    if tx.send(value).is_err() {
                        tracing::debug!(target: "tasks", task = name, "inbox_closed");
                    }
                }
                Err(err) => {
                    tracing::warn!(target: "tasks", task = name, %err, "task_failed");
                }
            }
        })
    }

    /// Drain every completion currently queued. Non-blocking; called at
    /// the start of a resolve/render cycle on the owning thread.
    pub fn drain(&self) -> Vec<T> {
        self.rx.try_iter().collect()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl<T: Send + 'static> Default for TaskPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for TaskPool<T> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    #[test]
    fn completion_is_delivered_to_inbox() {
        let pool: TaskPool<u32> = TaskPool::new();
        let handle = pool.spawn("answer", || Ok(42));
        handle.join().unwrap();
        assert_eq!(pool.drain(), vec![42]);
        assert!(pool.drain().is_empty());
    }

    #[test]
    fn failed_job_produces_nothing() {
        let pool: TaskPool<u32> = TaskPool::new();
        let handle = pool.spawn("boom", || anyhow::bail!("no such theme"));
        handle.join().unwrap();
        assert!(pool.drain().is_empty());
    }

    #[test]
    fn cancellation_discards_late_completion() {
        let pool: TaskPool<u32> = TaskPool::new();
        let (gate_tx, gate_rx) = bounded::<()>(0);
        let handle = pool.spawn("slow", move || {
            // Block until the test has cancelled the pool.
            gate_rx.recv().ok();
            Ok(7)
        });
        pool.cancel();
        gate_tx.send(()).unwrap();
        handle.join().unwrap();
        assert!(pool.drain().is_empty());
    }

    #[test]
    fn drop_cancels_token() {
        let pool: TaskPool<u32> = TaskPool::new();
        let token = pool.token();
        drop(pool);
        assert!(token.is_cancelled());
    }
}

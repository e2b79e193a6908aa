// src/api/concurrent_queue.rs
//! Shared FIFO work queue and bounded worker pool for parallel fetching.

use crate::error::AppError;
use crossbeam::deque::{Injector, Steal};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Thread-safe FIFO queue every worker pulls from.
///
/// All work is enqueued before the first worker starts; a worker that finds
/// the queue empty is done.
pub struct WorkQueue<T> {
    injector: Injector<T>,
    /// Items handed out so far
    taken: AtomicUsize,
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            injector: Injector::new(),
            taken: AtomicUsize::new(0),
        }
    }

    /// Enqueues items in order.
    pub fn push_all(&self, items: impl IntoIterator<Item = T>) {
        for item in items {
            self.injector.push(item);
        }
    }

    /// Takes the oldest item, or `None` once the queue is drained.
    pub fn pop(&self) -> Option<T> {
        loop {
            match self.injector.steal() {
                Steal::Success(item) => {
                    self.taken.fetch_add(1, Ordering::SeqCst);
                    return Some(item);
                }
                Steal::Empty => return None,
                Steal::Retry => continue,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.injector.len()
    }

    pub fn is_empty(&self) -> bool {
        self.injector.is_empty()
    }

    /// Number of items popped so far.
    pub fn taken(&self) -> usize {
        self.taken.load(Ordering::SeqCst)
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs `task` once per job on at most `workers` concurrent tasks.
///
/// Workers are started one after another, `start_interval` apart. Each
/// result is sent to the caller over a channel as soon as it is ready; the
/// call returns after the queue is drained and every worker has finished.
/// The first error aborts the remaining workers and is returned.
pub async fn run_pool<J, R, F, Fut>(
    jobs: Vec<J>,
    workers: usize,
    start_interval: Duration,
    task: F,
) -> Result<Vec<R>, AppError>
where
    J: Send + 'static,
    R: Send + 'static,
    F: Fn(J) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, AppError>> + Send + 'static,
{
    let total = jobs.len();
    let queue = Arc::new(WorkQueue::new());
    queue.push_all(jobs);

    let task = Arc::new(task);
    let (sender, mut receiver) = mpsc::unbounded_channel::<Result<R, AppError>>();
    let mut join_set = JoinSet::new();
    let worker_count = workers.max(1).min(total);

    for idx in 0..worker_count {
        if !start_interval.is_zero() {
            tokio::time::sleep(start_interval).await;
        }

        let queue = Arc::clone(&queue);
        let task = Arc::clone(&task);
        let sender = sender.clone();
        join_set.spawn(async move {
            while let Some(job) = queue.pop() {
                let result = task(job).await;
                let failed = result.is_err();
                if sender.send(result).is_err() || failed {
                    break;
                }
            }
            log::debug!("Worker {} finished", idx);
        });
    }
    drop(sender);

    let mut results = Vec::with_capacity(total);
    while let Some(result) = receiver.recv().await {
        match result {
            Ok(value) => results.push(value),
            Err(e) => {
                join_set.abort_all();
                return Err(e);
            }
        }
    }

    // Completion barrier
    while let Some(joined) = join_set.join_next().await {
        joined?;
    }

    log::debug!(
        "Worker pool done: {} of {} jobs completed",
        results.len(),
        queue.taken()
    );
    Ok(results)
}

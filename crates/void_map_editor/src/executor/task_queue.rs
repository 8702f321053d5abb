//! Single-worker FIFO task queue.
//!
//! Jobs are enqueued synchronously when [`TaskQueue::push`] is called, so the
//! execution order is the call order even if the returned handles are
//! awaited later, or never. One worker task drains the queue and runs each
//! job to completion before starting the next.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Failure to obtain a job's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TaskError {
    /// The queue shut down or the job panicked before completing.
    #[error("Task was dropped before completing")]
    Dropped,
}

/// Completion handle of a queued job.
#[must_use = "the job runs regardless; await the handle to wait for it"]
pub struct TaskHandle<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, TaskError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map_err(|_| TaskError::Dropped)
    }
}

/// FIFO queue consumed by a single worker task.
#[derive(Clone)]
pub struct TaskQueue {
    name: &'static str,
    tx: mpsc::UnboundedSender<BoxFuture<'static, ()>>,
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue").field("name", &self.name).finish()
    }
}

impl TaskQueue {
    /// Spawn the worker. Must be called from within a Tokio runtime.
    pub fn spawn(name: &'static str) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<BoxFuture<'static, ()>>();

        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                if AssertUnwindSafe(job).catch_unwind().await.is_err() {
                    log::error!("Job panicked in task queue '{}'", name);
                }
            }
            log::trace!("Task queue '{}' closed", name);
        });

        Self { name, tx }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Enqueue a job behind every job pushed before it.
    pub fn push<F>(&self, job: F) -> TaskHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let (done, rx) = oneshot::channel();
        let job = async move {
            // Nobody waiting is fine
            let _ = done.send(job.await);
        };

        if self.tx.send(Box::pin(job)).is_err() {
            log::warn!("Task queue '{}' is closed, dropping job", self.name);
        }

        TaskHandle { rx }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

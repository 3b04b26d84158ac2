//! Detached dispatch of accepted work.
//!
//! The [`Dispatcher`] runs each accepted event on its own tokio task, tracked
//! by a [`TaskTracker`] and cancelled only through the dispatcher's own root
//! [`CancellationToken`]. Nothing derived from the inbound request reaches the
//! task, so a client disconnect or request timeout never interrupts it.
//!
//! Failures inside a dispatched task are logged at `error` level and go
//! nowhere else.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use uuid::Uuid;

use hookflow_types::error::DispatchError;

use crate::trigger::ProcessingError;

/// Execution context handed to a dispatched job.
///
/// `cancel` is a child of the dispatcher's root token. It fires only when the
/// dispatcher gives up on draining during shutdown.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    pub dispatch_id: String,
    pub accepted_at: DateTime<Utc>,
    pub cancel: CancellationToken,
}

/// Owner of all detached background work.
pub struct Dispatcher {
    tracker: TaskTracker,
    root: CancellationToken,
    /// Dispatches spawn under the read lock; shutdown flips the flag under
    /// the write lock, so no spawn can land after the drain has begun.
    closed: RwLock<bool>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            tracker: TaskTracker::new(),
            root: CancellationToken::new(),
            closed: RwLock::new(false),
        }
    }

    /// Spawn exactly one detached task running `job`.
    ///
    /// Returns as soon as the task is spawned; the job's outcome is only
    /// logged. Refused with [`DispatchError::ShuttingDown`] once
    /// [`Dispatcher::shutdown`] has started.
    pub fn dispatch<F, Fut>(&self, label: &'static str, job: F) -> Result<DispatchContext, DispatchError>
    where
        F: FnOnce(DispatchContext) -> Fut,
        Fut: Future<Output = Result<(), ProcessingError>> + Send + 'static,
    {
        let closed = self.closed.read().unwrap_or_else(PoisonError::into_inner);
        if *closed {
            return Err(DispatchError::ShuttingDown);
        }

        let ctx = DispatchContext {
            dispatch_id: Uuid::now_v7().to_string(),
            accepted_at: Utc::now(),
            cancel: self.root.child_token(),
        };
        let cancel = ctx.cancel.clone();
        let dispatch_id = ctx.dispatch_id.clone();
        let fut = job(ctx.clone());

        self.tracker.spawn(async move {
            let guarded = AssertUnwindSafe(async move {
                tokio::select! {
                    biased;
                    result = fut => result,
                    _ = cancel.cancelled() => Err(ProcessingError::Cancelled),
                }
            })
            .catch_unwind();

            match guarded.await {
                Ok(Ok(())) => {
                    tracing::debug!(dispatch_id = %dispatch_id, job = label, "dispatched job finished");
                }
                Ok(Err(e)) => {
                    tracing::error!(dispatch_id = %dispatch_id, job = label, error = %e, "dispatched job failed");
                }
                Err(_) => {
                    tracing::error!(dispatch_id = %dispatch_id, job = label, "dispatched job panicked");
                }
            }
        });
        drop(closed);

        tracing::debug!(dispatch_id = %ctx.dispatch_id, job = label, "job dispatched");
        Ok(ctx)
    }

    /// Number of dispatched jobs still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.closed.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stop accepting work and wait up to `grace` for in-flight jobs.
    ///
    /// Returns `true` if everything drained. Otherwise the remaining jobs are
    /// cancelled and `false` is returned.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        {
            let mut closed = self.closed.write().unwrap_or_else(PoisonError::into_inner);
            *closed = true;
            self.tracker.close();
        }

        let pending = self.tracker.len();
        tracing::info!(pending, grace_secs = grace.as_secs(), "draining dispatched jobs");

        if tokio::time::timeout(grace, self.tracker.wait()).await.is_ok() {
            tracing::info!("all dispatched jobs drained");
            return true;
        }

        tracing::warn!(remaining = self.tracker.len(), "shutdown grace exceeded, cancelling jobs");
        self.root.cancel();
        false
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

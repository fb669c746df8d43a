//! Pending index mutations.

use std::fmt;
use std::future::Future;

use futures::future::{self, BoxFuture, FutureExt};

use crate::errors::SearchError;

/// Handle on an index mutation the backend may still be applying.
///
/// Adapters decide how eager they are: a backend that applies writes
/// synchronously hands out an already completed task, one that queues them
/// returns a task polling for completion.
#[must_use = "a task does nothing unless awaited with `wait`"]
pub struct Task {
    inner: BoxFuture<'static, Result<(), SearchError>>,
}

impl Task {
    /// A task that has already completed.
    pub fn completed() -> Self {
        Self {
            inner: future::ready(Ok(())).boxed(),
        }
    }

    /// A task that completes when `future` resolves.
    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = Result<(), SearchError>> + Send + 'static,
    {
        Self {
            inner: future.boxed(),
        }
    }

    /// A task that completes once every task in `tasks` has, failing with
    /// the first error.
    pub fn join(tasks: Vec<Task>) -> Self {
        Self::from_future(async move {
            future::try_join_all(tasks.into_iter().map(|task| task.inner)).await?;
            Ok(())
        })
    }

    /// Wait for the backend to finish applying the mutation.
    pub async fn wait(self) -> Result<(), SearchError> {
        self.inner.await
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").finish_non_exhaustive()
    }
}

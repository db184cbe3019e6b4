//! Handles to loads running in the background.

use std::future::Future;

use tokio::task::JoinHandle;
use tracing::error;

use crate::error::{Error, Result};

/// Loads spawned on the Tokio runtime.
///
/// Dropping the handle detaches the loads; they run to completion anyway.
#[derive(Debug, Default)]
pub struct Dispatched {
    tasks: Vec<JoinHandle<()>>,
}

impl Dispatched {
    /// Creates an empty handle.
    #[must_use]
    pub const fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Spawns `load` on the current runtime.
    pub(crate) fn spawn<F>(&mut self, load: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.push(tokio::spawn(load));
    }

    /// Takes over the loads of another handle.
    pub fn extend(&mut self, other: Self) {
        self.tasks.extend(other.tasks);
    }

    /// Number of loads dispatched.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true if nothing was dispatched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Waits for every load to finish.
    ///
    /// Returns the number of loads that completed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Task`] if any load panicked; the remaining loads are
    /// still awaited.
    pub async fn settle(self) -> Result<usize> {
        let total = self.tasks.len();
        let mut failed = 0;
        for task in self.tasks {
            if let Err(e) = task.await {
                error!("Dispatched load failed: {e}");
                failed += 1;
            }
        }
        if failed > 0 {
            return Err(Error::Task(format!("{failed} of {total} loads panicked")));
        }
        Ok(total)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_settle_waits_for_all() {
        let done = Arc::new(AtomicUsize::new(0));
        let mut dispatched = Dispatched::new();
        for _ in 0..5 {
            let done = Arc::clone(&done);
            dispatched.spawn(async move {
                tokio::task::yield_now().await;
                done.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(dispatched.len(), 5);
        assert_eq!(dispatched.settle().await.unwrap(), 5);
        assert_eq!(done.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_settle_reports_panics() {
        let mut dispatched = Dispatched::new();
        dispatched.spawn(async { panic!("boom") });
        dispatched.spawn(async {});
        assert!(matches!(dispatched.settle().await, Err(Error::Task(_))));
    }

    #[tokio::test]
    async fn test_drop_does_not_cancel() {
        let done = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = tokio::sync::oneshot::channel();
        {
            let done = Arc::clone(&done);
            let mut dispatched = Dispatched::new();
            dispatched.spawn(async move {
                done.fetch_add(1, Ordering::SeqCst);
                let _ = tx.send(());
            });
        }
        rx.await.unwrap();
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty() {
        let mut dispatched = Dispatched::default();
        assert!(dispatched.is_empty());
        dispatched.extend(Dispatched::new());
        assert!(dispatched.is_empty());
    }
}

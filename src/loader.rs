// File: src/loader.rs
//! Cancellable background loads owned by a view.
//!
//! A view keeps one `ViewLoader` per fetch it performs. Starting a new load,
//! cancelling, or dropping the loader aborts whatever is still in flight, so
//! a dismissed view never receives a stale result.
use std::future::Future;
use tokio::task::JoinHandle;

#[derive(Debug)]
pub struct ViewLoader<T> {
    pending: Option<JoinHandle<T>>,
}

impl<T> Default for ViewLoader<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T: Send + 'static> ViewLoader<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `fut`, aborting the previous load if it is still running.
    pub fn start<F>(&mut self, fut: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        self.cancel();
        self.pending = Some(tokio::spawn(fut));
    }

    pub fn is_loading(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            if !handle.is_finished() {
                log::debug!("Discarding in-flight view load");
            }
            handle.abort();
        }
    }

    /// Waits for the current load. `None` when nothing is pending or the task
    /// was aborted or panicked.
    pub async fn next(&mut self) -> Option<T> {
        let handle = self.pending.take()?;
        match handle.await {
            Ok(value) => Some(value),
            Err(e) if e.is_cancelled() => None,
            Err(e) => {
                log::error!("View load panicked: {}", e);
                None
            }
        }
    }
}

impl<T> Drop for ViewLoader<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

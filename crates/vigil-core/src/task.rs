use std::future::Future;
use tokio::task::JoinHandle;

/// A spawned monitor that is cancelled when dropped.
///
/// `shutdown` aborts the task and waits for it, so every resource the task
/// owns has been dropped by the time it returns.
pub struct MonitorTask {
    name: &'static str,
    handle: Option<JoinHandle<()>>,
}

impl MonitorTask {
    pub fn spawn<F>(name: &'static str, future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        log::debug!("Starting {name}");
        Self {
            name,
            handle: Some(tokio::spawn(future)),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the task has run to completion (or was cancelled)
    #[must_use]
    pub fn is_finished(&self) -> bool {
        match &self.handle {
            Some(handle) => handle.is_finished(),
            None => true,
        }
    }

    pub async fn shutdown(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            match handle.await {
                Ok(()) => log::debug!("{} finished", self.name),
                Err(e) if e.is_cancelled() => log::debug!("{} stopped", self.name),
                Err(e) => log::error!("{} panicked: {e}", self.name),
            }
        }
    }
}

impl Drop for MonitorTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

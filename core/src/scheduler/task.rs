use crate::telemetry::TaskLog;
use log::warn;
use std::future::Future;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Read side of a task's cancellation signal.
///
/// Handlers check [`Liveness::is_alive`] right before touching shared state,
/// so work that completes after cancellation is dropped.
#[derive(Debug, Clone)]
pub struct Liveness {
    cancelled: watch::Receiver<bool>,
}

impl Liveness {
    pub fn is_alive(&self) -> bool {
        // A dropped handle counts as cancelled.
        !*self.cancelled.borrow() && self.cancelled.has_changed().is_ok()
    }

    /// Resolves once the owning handle is cancelled or dropped.
    pub async fn cancelled(&mut self) {
        while !*self.cancelled.borrow_and_update() {
            if self.cancelled.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Owns a spawned background task together with its cancellation signal.
///
/// Dropping the handle cancels the task.
pub struct TaskHandle {
    log: TaskLog,
    cancel: watch::Sender<bool>,
    join: Option<JoinHandle<()>>,
}

impl TaskHandle {
    /// Spawns `body` on the current tokio runtime.
    pub fn spawn<F, Fut>(name: &'static str, body: F) -> Self
    where
        F: FnOnce(Liveness) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (cancel, cancelled) = watch::channel(false);
        let log = TaskLog::new(name);
        log.started();
        let join = tokio::spawn(body(Liveness { cancelled }));
        Self {
            log,
            cancel,
            join: Some(join),
        }
    }

    pub fn name(&self) -> &'static str {
        self.log.task()
    }

    pub fn liveness(&self) -> Liveness {
        Liveness {
            cancelled: self.cancel.subscribe(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, JoinHandle::is_finished)
    }

    pub fn cancel(&self) {
        if !self.cancel.send_replace(true) {
            self.log.cancelled();
        }
    }

    /// Cancels the task and waits for its loop to exit.
    pub async fn shutdown(mut self) {
        self.cancel();
        if let Some(join) = self.join.take() {
            if let Err(err) = join.await {
                warn!("[{}] task ended abnormally: {}", self.name(), err);
            }
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn cancelled_task_stops_looping() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let handle = TaskHandle::spawn("ticker", move |mut liveness| async move {
            let mut interval = tokio::time::interval(Duration::from_millis(100));
            loop {
                tokio::select! {
                    _ = liveness.cancelled() => break,
                    _ = interval.tick() => {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }
                }
            }
        });

        tokio::time::sleep(Duration::from_millis(450)).await;
        let seen = ticks.load(Ordering::SeqCst);
        assert_eq!(seen, 5);

        let liveness = handle.liveness();
        handle.shutdown().await;
        assert!(!liveness.is_alive());

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), seen);
    }

    #[tokio::test]
    async fn dropping_handle_cancels() {
        let handle = TaskHandle::spawn("idle", |mut liveness| async move {
            liveness.cancelled().await;
        });
        let liveness = handle.liveness();
        assert!(liveness.is_alive());
        assert!(!handle.is_cancelled());
        drop(handle);
        assert!(!liveness.is_alive());
    }
}

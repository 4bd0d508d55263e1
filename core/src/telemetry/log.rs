use log::{debug, info, warn};
use std::fmt::Display;

/// Lifecycle logging for a named background task.
#[derive(Debug, Clone, Copy)]
pub struct TaskLog {
    task: &'static str,
}

impl TaskLog {
    pub fn new(task: &'static str) -> Self {
        Self { task }
    }

    pub fn task(&self) -> &'static str {
        self.task
    }

    pub fn started(&self) {
        info!("[{}] task started", self.task);
    }

    pub fn cancelled(&self) {
        info!("[{}] task cancelled", self.task);
    }

    /// A failure the task recovers from by keeping its previous state.
    pub fn recovered(&self, what: &str, err: &dyn Display) {
        warn!("[{}] {}: {} (keeping previous state)", self.task, what, err);
    }

    pub fn discarded(&self, what: &str) {
        debug!("[{}] {} arrived after cancellation, discarded", self.task, what);
    }
}

//! Per-task output buffer for the parallel scheduler.
use std::sync::{Arc, Mutex, PoisonError};

use super::logger::Logger;
use super::types::{Kind, Log, TaskStatus};

/// Holds one task's output until the task finishes.
///
/// Lines are replayed in order by [`flush_and_complete`](Self::flush_and_complete),
/// under the logger's console lock, so concurrently finishing tasks print
/// whole blocks. Outcomes go straight to the backing [`Logger`].
#[derive(Debug)]
pub struct BufferedLog {
    inner: Arc<Logger>,
    lines: Mutex<Vec<(Kind, String)>>,
}

impl BufferedLog {
    /// Buffer in front of `inner`.
    #[must_use]
    pub const fn new(inner: Arc<Logger>) -> Self {
        Self {
            inner,
            lines: Mutex::new(Vec::new()),
        }
    }

    fn push(&self, kind: Kind, msg: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((kind, msg.to_string()));
    }

    fn drain(&self) -> Vec<(Kind, String)> {
        std::mem::take(&mut *self.lines.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replay what is buffered so far.
    #[cfg(test)]
    pub fn flush(&self) {
        for (kind, msg) in self.drain() {
            kind.emit(&msg);
        }
    }

    /// Replay the buffer and take `task_name` off the status line.
    pub fn flush_and_complete(&self, task_name: &str) {
        let lines = self.drain();
        let mut progress = self
            .inner
            .console
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        progress.clear();
        for (kind, msg) in &lines {
            kind.emit(msg);
        }
        progress.finish(task_name);
        progress.draw();
    }
}

impl Log for BufferedLog {
    fn stage(&self, msg: &str) {
        self.push(Kind::Stage, msg);
    }

    fn info(&self, msg: &str) {
        self.push(Kind::Info, msg);
    }

    fn debug(&self, msg: &str) {
        self.push(Kind::Debug, msg);
    }

    fn warn(&self, msg: &str) {
        self.push(Kind::Warn, msg);
    }

    fn error(&self, msg: &str) {
        self.push(Kind::Error, msg);
    }

    fn dry_run(&self, msg: &str) {
        self.push(Kind::DryRun, msg);
    }

    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        self.inner.record_task(name, status, message);
    }
}

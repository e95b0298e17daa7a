//! Console logger with a run summary.
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use super::types::{Kind, Log, TaskEntry, TaskStatus};
use super::utils::{format_elapsed, log_file_path, terminal_columns};

/// Names of the tasks running on the parallel scheduler, and whether they
/// are currently drawn as a status line.
#[derive(Debug, Default)]
pub(super) struct Progress {
    active: Vec<String>,
    drawn: bool,
}

impl Progress {
    pub(super) fn start(&mut self, name: &str) {
        self.active.push(name.to_string());
    }

    pub(super) fn finish(&mut self, name: &str) {
        self.active.retain(|n| n != name);
    }

    #[cfg(test)]
    pub(super) fn active(&self) -> &[String] {
        &self.active
    }

    /// Erase the status line, if one is drawn.
    pub(super) fn clear(&mut self) {
        if self.drawn {
            print!("\r\x1b[K");
            std::io::stdout().flush().ok();
            self.drawn = false;
        }
    }

    /// Draw the running task names on one terminal row.
    pub(super) fn draw(&mut self) {
        if self.active.is_empty() {
            return;
        }
        let line = truncate(&self.active.join(", "), terminal_columns().saturating_sub(4));
        print!("  \x1b[2m▹ {line}\x1b[0m");
        std::io::stdout().flush().ok();
        self.drawn = true;
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

macro_rules! kind_methods {
    ($($(#[$doc:meta])* $method:ident => $kind:ident),+ $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $method(&self, msg: &str) {
                Kind::$kind.emit(msg);
            }
        )+
    };
}

/// Logger for one gsdl command.
///
/// Messages go to the tracing subscriber installed by
/// [`init_subscriber`](super::init_subscriber), which also mirrors them to
/// `$XDG_CACHE_HOME/gsdl/<command>.log`. Task outcomes are collected for
/// [`print_summary`](Self::print_summary).
#[derive(Debug)]
pub struct Logger {
    entries: Mutex<Vec<TaskEntry>>,
    log_file: Option<PathBuf>,
    started: Instant,
    /// Held while writing to the console from parallel tasks.
    pub(super) console: Mutex<Progress>,
}

impl Logger {
    /// Logger for `command`, reporting that command's log file.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self::with_log_file(log_file_path(command))
    }

    /// Logger that reports `log_file` in its summary.
    #[must_use]
    pub fn with_log_file(log_file: Option<PathBuf>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            log_file,
            started: Instant::now(),
            console: Mutex::new(Progress::default()),
        }
    }

    #[cfg(test)]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Outcomes recorded so far, in completion order.
    #[must_use]
    pub fn task_entries(&self) -> Vec<TaskEntry> {
        self.entries
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    kind_methods! {
        /// Task header.
        stage => Stage,
        /// Informational message.
        info => Info,
        /// Console only with `-v`.
        debug => Debug,
        /// Warning, to stderr.
        warn => Warn,
        /// Error, to stderr.
        error => Error,
        /// Something `--dry-run` held back.
        dry_run => DryRun,
    }

    /// Record a task outcome for the summary.
    pub fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.push(TaskEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }

    /// Number of tasks recorded as failed.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.task_entries()
            .iter()
            .filter(|e| e.status == TaskStatus::Failed)
            .count()
    }

    /// Print every recorded outcome, then the totals and elapsed time.
    pub fn print_summary(&self) {
        let entries = self.task_entries();
        if entries.is_empty() {
            return;
        }

        self.stage("Summary");
        for entry in &entries {
            let (glyph, color) = entry.status.glyph();
            let detail = entry
                .message
                .as_deref()
                .map(|m| format!(" ({m})"))
                .unwrap_or_default();
            self.info(&format!("{color}{glyph} {}{detail}\x1b[0m", entry.name));
        }

        let totals: Vec<String> = TaskStatus::ALL
            .iter()
            .filter_map(|status| {
                let n = entries.iter().filter(|e| e.status == *status).count();
                (n > 0).then(|| format!("{}{n} {}\x1b[0m", status.glyph().1, status.label()))
            })
            .collect();
        self.info(&format!(
            "{} task(s) in {}: {}",
            entries.len(),
            format_elapsed(self.started.elapsed()),
            totals.join(", ")
        ));

        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }

    /// Note that a parallel task started and redraw the status line.
    pub fn notify_task_start(&self, name: &str) {
        let mut progress = self.console.lock().unwrap_or_else(PoisonError::into_inner);
        progress.clear();
        progress.start(name);
        progress.draw();
    }
}

impl Log for Logger {
    fn stage(&self, msg: &str) {
        Kind::Stage.emit(msg);
    }

    fn info(&self, msg: &str) {
        Kind::Info.emit(msg);
    }

    fn debug(&self, msg: &str) {
        Kind::Debug.emit(msg);
    }

    fn warn(&self, msg: &str) {
        Kind::Warn.emit(msg);
    }

    fn error(&self, msg: &str) {
        Kind::Error.emit(msg);
    }

    fn dry_run(&self, msg: &str) {
        Kind::DryRun.emit(msg);
    }

    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        self.record_task(name, status, message);
    }
}

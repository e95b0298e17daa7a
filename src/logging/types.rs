//! Core logging types: message kinds, task outcomes, and the [`Log`] trait.

/// Tracing target for task start headers.
pub(super) const STAGE_TARGET: &str = "gsdl::stage";
/// Tracing target for dry-run notices.
pub(super) const DRY_RUN_TARGET: &str = "gsdl::dry_run";

/// What a log line is, independent of where it ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Kind {
    Stage,
    Info,
    Debug,
    Warn,
    Error,
    DryRun,
}

impl Kind {
    /// Send `msg` to the tracing subscriber.
    pub(super) fn emit(self, msg: &str) {
        match self {
            Self::Stage => tracing::info!(target: STAGE_TARGET, "{msg}"),
            Self::Info => tracing::info!("{msg}"),
            Self::Debug => tracing::debug!("{msg}"),
            Self::Warn => tracing::warn!("{msg}"),
            Self::Error => tracing::error!("{msg}"),
            Self::DryRun => tracing::info!(target: DRY_RUN_TARGET, "{msg}"),
        }
    }
}

/// One task's line in the run summary.
#[derive(Debug, Clone)]
pub struct TaskEntry {
    /// Registered task name, e.g. `gsdl-build-html`.
    pub name: String,
    /// Outcome.
    pub status: TaskStatus,
    /// Skip reason or error text.
    pub message: Option<String>,
}

/// How a task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Ran and succeeded.
    Ok,
    /// Nothing configured for it (e.g. a section without sources).
    NotApplicable,
    /// Ran but had nothing to do.
    Skipped,
    /// Ran without writing anything.
    DryRun,
    /// Returned an error.
    Failed,
}

impl TaskStatus {
    /// Summary glyph and its ANSI color.
    pub(super) const fn glyph(self) -> (&'static str, &'static str) {
        match self {
            Self::Ok => ("✓", "\x1b[32m"),
            Self::NotApplicable => ("·", "\x1b[2m"),
            Self::Skipped => ("○", "\x1b[33m"),
            Self::DryRun => ("~", "\x1b[36m"),
            Self::Failed => ("✗", "\x1b[31m"),
        }
    }

    /// Word used in the summary totals.
    pub(super) const fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NotApplicable => "n/a",
            Self::Skipped => "skipped",
            Self::DryRun => "dry-run",
            Self::Failed => "failed",
        }
    }

    /// Every status, in summary order.
    pub(super) const ALL: [Self; 5] = [
        Self::Ok,
        Self::NotApplicable,
        Self::Skipped,
        Self::DryRun,
        Self::Failed,
    ];
}

/// Where tasks and filters send their output.
///
/// [`Logger`](super::Logger) writes immediately;
/// [`BufferedLog`](super::BufferedLog) holds a parallel task's lines until
/// the task finishes so tasks never interleave on the console.
pub trait Log: Send + Sync {
    /// Task header.
    fn stage(&self, msg: &str);
    fn info(&self, msg: &str);
    /// Shown on the console only with `-v`; always written to the log file.
    fn debug(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
    /// Something that would have been written without `--dry-run`.
    fn dry_run(&self, msg: &str);
    /// Record a task outcome for the summary.
    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>);
}

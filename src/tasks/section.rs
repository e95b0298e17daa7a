use anyhow::{Context as _, Result};

use super::{Context, TaskResult};
use crate::config::Section;
use crate::pipeline::{Pipeline, dest, source};

/// Counters for a task that pushes a batch of files through a pipeline.
///
/// # Examples
///
/// ```
/// use gsdl::tasks::TaskStats;
///
/// let stats = TaskStats { written: 3, filtered: 1, failed: 0 };
/// assert_eq!(stats.summary(false), "3 written, 1 filtered");
/// assert_eq!(stats.summary(true), "3 would be written, 1 filtered");
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TaskStats {
    /// Files written to the destination.
    pub written: usize,
    /// Files suppressed by a filter.
    pub filtered: usize,
    /// Files a filter failed on.
    pub failed: usize,
}

impl TaskStats {
    /// Format the summary string (e.g. "3 written, 1 filtered, 2 failed").
    #[must_use]
    pub fn summary(&self, dry_run: bool) -> String {
        let verb = if dry_run { "would be written" } else { "written" };
        let mut out = format!("{} {verb}", self.written);
        if self.filtered > 0 {
            out.push_str(&format!(", {} filtered", self.filtered));
        }
        if self.failed > 0 {
            out.push_str(&format!(", {} failed", self.failed));
        }
        out
    }

    /// Log the summary and return the appropriate `TaskResult`.
    ///
    /// # Errors
    ///
    /// Returns an error if any file failed.
    pub fn finish(self, ctx: &Context) -> Result<TaskResult> {
        ctx.log.info(&self.summary(ctx.dry_run));
        if self.failed > 0 {
            anyhow::bail!("{} file(s) failed", self.failed);
        }
        Ok(if ctx.dry_run {
            TaskResult::DryRun
        } else {
            TaskResult::Ok
        })
    }
}

/// Read `section`'s sources, run them through `pipeline` and write the
/// survivors to its destination.
///
/// Filter errors are logged under `label` and fail the task once every
/// other file has been written.
pub(super) fn run_section(ctx: &Context, label: &str, section: &Section, pipeline: &Pipeline) -> Result<TaskResult> {
    let records = source::src(&ctx.root, section.src_path.patterns())?;
    ctx.log
        .debug(&format!("{} file(s) matched {:?}", records.len(), section.src_path.patterns()));

    let outcome = pipeline.run(records, ctx.parallel);
    outcome.report_errors(label, &*ctx.log);

    let written = dest::dest(
        &outcome.records,
        &ctx.path(&section.dest_path),
        ctx.dry_run,
        &*ctx.log,
    )
    .with_context(|| format!("writing to {}", section.dest_path))?;

    TaskStats {
        written,
        filtered: outcome.suppressed,
        failed: outcome.errors.len(),
    }
    .finish(ctx)
}

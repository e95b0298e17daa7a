//! Named, dependency-ordered tasks that build a project's dist tree.
pub mod build;
pub mod clean;
pub mod context;
pub mod copy;
pub mod dev;
pub mod dist;
pub mod graph;
pub mod porcelain;
mod section;

/// Declare a task's dependencies by type, expanding to its
/// [`Task::dependencies`] method.
///
/// The ids live in a `const` so the returned slice is `'static`.
///
/// ```ignore
/// impl Task for BuildHtml {
///     task_deps![BuildData];
///     // ...
/// }
/// ```
macro_rules! task_deps {
    [$($dep:ty),+ $(,)?] => {
        fn dependencies(&self) -> &[std::any::TypeId] {
            const DEPS: &[std::any::TypeId] = &[$(std::any::TypeId::of::<$dep>()),+];
            DEPS
        }
    };
}

pub(crate) use task_deps;

pub use context::{Context, Service};
pub use section::TaskStats;

use std::any::TypeId;
use std::time::Instant;

use anyhow::Result;

use crate::config::EffectiveSettings;
use crate::error::TaskError;
use crate::logging::{TaskStatus, format_elapsed};

/// Outcome of a task that did not fail.
///
/// # Examples
///
/// ```
/// use gsdl::tasks::TaskResult;
///
/// let ok = TaskResult::Ok;
/// let skipped = TaskResult::Skipped("no bundles declared".into());
///
/// assert!(matches!(ok, TaskResult::Ok));
/// assert!(matches!(skipped, TaskResult::Skipped(_)));
/// ```
#[derive(Debug, Clone)]
pub enum TaskResult {
    /// Task completed successfully.
    Ok,
    /// Task had nothing to do.
    Skipped(String),
    /// Task ran in dry-run mode.
    DryRun,
}

/// A named unit of work, invoked from the command line by its name.
///
/// Dependencies are declared by type: each task struct's [`TypeId`] is its
/// identity in the graph, hence the `'static` bound.
pub trait Task: Send + Sync + 'static {
    /// Name the task is invoked by.
    fn name(&self) -> &str;

    /// The concrete `TypeId` of this task, used as a dependency identifier.
    fn task_id(&self) -> TypeId {
        TypeId::of::<Self>()
    }

    /// Tasks that must complete before this task starts.
    ///
    /// The default implementation returns an empty slice (no dependencies).
    fn dependencies(&self) -> &[TypeId] {
        &[]
    }

    /// Whether this task has anything to do with the current settings.
    fn should_run(&self, ctx: &Context) -> bool;

    /// Execute the task.
    ///
    /// # Errors
    ///
    /// Returns an error if a source pattern is invalid, any file fails a
    /// filter, or output cannot be written.
    fn run(&self, ctx: &Context) -> Result<TaskResult>;
}

/// Every task known to gsdl, for the given settings.
///
/// Order within the list is arbitrary; execution order is derived from each
/// task's [`Task::dependencies`] declaration.
#[must_use]
pub fn all_tasks(settings: &EffectiveSettings) -> Vec<Box<dyn Task>> {
    vec![
        Box::new(build::BuildData),
        Box::new(build::BuildHtml),
        Box::new(build::BuildLess),
        Box::new(build::BuildScss),
        Box::new(build::BuildCss),
        Box::new(build::BuildStyle),
        Box::new(build::BuildEs6),
        Box::new(build::BuildJs),
        Box::new(build::GsdlBuild),
        Box::new(copy::CopyFonts),
        Box::new(copy::CopyStatic),
        Box::new(copy::CopyData),
        Box::new(copy::GsdlCopy),
        Box::new(clean::Clean::new(settings.clean_task_name())),
        Box::new(dist::BuildForProd),
        Box::new(dist::Dist),
        Box::new(dev::GsdlWatch),
        Box::new(dev::Watch),
        Box::new(dev::Watch2),
        Box::new(dev::Serve),
        Box::new(dev::ServeProd),
        Box::new(porcelain::DefaultTask),
        Box::new(porcelain::BuildAll),
        Box::new(porcelain::CopyAll),
    ]
}

/// Select the tasks needed to run `requested`: the named tasks and
/// everything they transitively depend on, dependencies first.
///
/// # Errors
///
/// Returns [`TaskError::UnknownTask`] if a name is not registered and
/// [`TaskError::DependencyCycle`] if the selection cannot be ordered.
pub fn plan(registry: Vec<Box<dyn Task>>, requested: &[String]) -> Result<Vec<Box<dyn Task>>, TaskError> {
    let mut roots = Vec::with_capacity(requested.len());
    for name in requested {
        let idx = registry
            .iter()
            .position(|t| t.name() == name)
            .ok_or_else(|| TaskError::UnknownTask {
                name: name.clone(),
                known: registry.iter().map(|t| t.name()).collect::<Vec<_>>().join(", "),
            })?;
        roots.push(idx);
    }

    let refs: Vec<&dyn Task> = registry.iter().map(Box::as_ref).collect();
    let order = graph::closure(&refs, &roots)?;

    let mut slots: Vec<Option<Box<dyn Task>>> = registry.into_iter().map(Some).collect();
    Ok(order
        .into_iter()
        .filter_map(|i| slots.get_mut(i).and_then(Option::take))
        .collect())
}

/// Whether a planned task list switches the run to production mode.
#[must_use]
pub fn wants_production(tasks: &[Box<dyn Task>]) -> bool {
    tasks
        .iter()
        .any(|t| t.task_id() == TypeId::of::<dist::BuildForProd>())
}

/// Execute a task, recording the result in the logger.
///
/// Returns `false` if the task failed.
pub fn execute(task: &dyn Task, ctx: &Context) -> bool {
    let name = task.name();
    if !task.should_run(ctx) {
        ctx.log.debug(&format!("skipping task: {name} (not applicable)"));
        ctx.log.record_task(name, TaskStatus::NotApplicable, None);
        return true;
    }

    ctx.log.stage(&format!("Starting '{name}'..."));
    let started = Instant::now();
    let result = task.run(ctx);
    let elapsed = format_elapsed(started.elapsed());

    let (status, message) = match result {
        Ok(TaskResult::Ok) => (TaskStatus::Ok, None),
        Ok(TaskResult::Skipped(reason)) => {
            ctx.log.info(&format!("skipped: {reason}"));
            (TaskStatus::Skipped, Some(reason))
        }
        Ok(TaskResult::DryRun) => (TaskStatus::DryRun, None),
        Err(e) => {
            ctx.log.error(&format!("'{name}' errored after {elapsed}: {e:#}"));
            ctx.log
                .record_task(name, TaskStatus::Failed, Some(&format!("{e:#}")));
            return false;
        }
    };
    ctx.log.info(&format!("Finished '{name}' after {elapsed}"));
    ctx.log.record_task(name, status, message.as_deref());
    true
}

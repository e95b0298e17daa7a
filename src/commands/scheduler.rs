//! Runs a planned task list on OS threads, each task starting as soon as
//! the dependencies it shares with the plan have finished.

use std::any::TypeId;
use std::collections::HashSet;
use std::sync::{Arc, Condvar, Mutex, PoisonError};

use crate::logging::{BufferedLog, Log, Logger};
use crate::tasks::{self, Context, Task};

/// Finished tasks, and a condition variable signalled on every finish.
#[derive(Debug, Default)]
struct Completions {
    done: Mutex<HashSet<TypeId>>,
    changed: Condvar,
}

impl Completions {
    /// Block until every task in `deps` has finished.
    fn wait_for(&self, deps: &[TypeId]) {
        let done = self.done.lock().unwrap_or_else(PoisonError::into_inner);
        drop(
            self.changed
                .wait_while(done, |done| !deps.iter().all(|d| done.contains(d)))
                .unwrap_or_else(PoisonError::into_inner),
        );
    }

    fn finish(&self, id: TypeId) {
        self.done
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
        self.changed.notify_all();
    }
}

/// Run tasks in parallel, each starting once its dependencies finish.
///
/// Every task gets its own scoped OS thread; blocking on the [`Condvar`]
/// inside a rayon worker would starve the pool the pipelines run on.
/// Output is buffered per task and flushed when the task completes.
///
/// A dependency that fails still counts as finished, so its dependents run.
pub(super) fn run_tasks_parallel(tasks: &[&dyn Task], ctx: &Context, log: &Arc<Logger>) {
    let planned: HashSet<TypeId> = tasks.iter().map(|t| t.task_id()).collect();
    let completions = Completions::default();

    std::thread::scope(|s| {
        for &task in tasks {
            let deps: Vec<TypeId> = task
                .dependencies()
                .iter()
                .filter(|d| planned.contains(d))
                .copied()
                .collect();
            let completions = &completions;
            s.spawn(move || {
                completions.wait_for(&deps);
                tracing::debug!(task = task.name(), "dependencies satisfied");
                log.notify_task_start(task.name());

                let buf = Arc::new(BufferedLog::new(Arc::clone(log)));
                tasks::execute(task, &ctx.with_log(Arc::clone(&buf) as Arc<dyn Log>));
                buf.flush_and_complete(task.name());

                completions.finish(task.task_id());
            });
        }
    });
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::tasks::TaskResult;
    use crate::tasks::test_helpers::make_context;

    use anyhow::Result;

    static ORDER: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

    macro_rules! recording_task {
        ($name:ident, $display:expr, $deps:expr) => {
            struct $name;
            impl Task for $name {
                fn name(&self) -> &str {
                    $display
                }
                fn dependencies(&self) -> &[TypeId] {
                    const DEPS: &[TypeId] = $deps;
                    DEPS
                }
                fn should_run(&self, _ctx: &Context) -> bool {
                    true
                }
                fn run(&self, _ctx: &Context) -> Result<TaskResult> {
                    std::thread::sleep(std::time::Duration::from_millis(20));
                    ORDER.lock().unwrap().push($display);
                    Ok(TaskResult::Ok)
                }
            }
        };
    }

    recording_task!(Compile, "compile", &[]);
    recording_task!(Bundle, "bundle", &[TypeId::of::<Compile>()]);
    recording_task!(Publish, "publish", &[TypeId::of::<Bundle>(), TypeId::of::<Compile>()]);
    recording_task!(Stray, "stray", &[TypeId::of::<Compile>()]);

    #[test]
    fn no_dependencies_means_no_wait() {
        Completions::default().wait_for(&[]);
    }

    #[test]
    fn waiter_wakes_once_all_dependencies_finish() {
        let completions = Arc::new(Completions::default());
        let a = TypeId::of::<Compile>();
        let b = TypeId::of::<Bundle>();
        let c = Arc::clone(&completions);
        let waiter = std::thread::spawn(move || c.wait_for(&[a, b]));

        completions.finish(a);
        std::thread::sleep(std::time::Duration::from_millis(30));
        assert!(!waiter.is_finished());
        completions.finish(b);
        waiter.join().expect("waiter should finish");
    }

    #[test]
    fn parallel_run_respects_dependencies() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = make_context(tmp.path().to_path_buf());
        let log = Arc::new(Logger::new("test"));

        // Listed dependents-first; the graph, not list order, decides.
        let tasks: [&dyn Task; 3] = [&Publish, &Bundle, &Compile];
        run_tasks_parallel(&tasks, &ctx, &log);

        let order = ORDER.lock().unwrap().clone();
        let pos = |n: &str| order.iter().position(|o| *o == n).unwrap();
        assert!(pos("compile") < pos("bundle"));
        assert!(pos("bundle") < pos("publish"));
        assert_eq!(log.task_entries().len(), 3);
        assert_eq!(log.failure_count(), 0);
    }

    #[test]
    fn absent_dependencies_are_not_waited_for() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = make_context(tmp.path().to_path_buf());
        let log = Arc::new(Logger::new("test"));

        let tasks: [&dyn Task; 1] = [&Stray];
        run_tasks_parallel(&tasks, &ctx, &log);
        assert_eq!(log.task_entries().len(), 1);
    }
}

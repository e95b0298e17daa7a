//! Short names for the common entry points.
use anyhow::Result;

use super::build::GsdlBuild;
use super::copy::GsdlCopy;
use super::{Context, Task, TaskResult, task_deps};

macro_rules! alias_task {
    ($(#[$doc:meta])* $ty:ident, $name:literal, [$($dep:ty),+]) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $ty;

        impl Task for $ty {
            fn name(&self) -> &'static str {
                $name
            }

            task_deps![$($dep),+];

            fn should_run(&self, _ctx: &Context) -> bool {
                true
            }

            fn run(&self, _ctx: &Context) -> Result<TaskResult> {
                Ok(TaskResult::Ok)
            }
        }
    };
}

alias_task!(
    /// Build and copy everything.
    DefaultTask,
    "default",
    [BuildAll, CopyAll]
);
alias_task!(
    /// Run every build step.
    BuildAll,
    "build",
    [GsdlBuild]
);
alias_task!(
    /// Run every copy step.
    CopyAll,
    "copy",
    [GsdlCopy]
);

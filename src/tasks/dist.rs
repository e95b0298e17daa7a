//! Production builds.
use anyhow::Result;

use super::porcelain::DefaultTask;
use super::{Context, Task, TaskResult, task_deps};

/// Marks the run as a production build.
///
/// Production mode is fixed when the run is planned: any plan containing
/// this task builds minified output without source maps, even for tasks
/// scheduled before it.
#[derive(Debug)]
pub struct BuildForProd;

impl Task for BuildForProd {
    fn name(&self) -> &'static str {
        "gsdl-build-for-prod"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if !ctx.production {
            anyhow::bail!("context was not planned for production");
        }
        ctx.log.info("building for production");
        Ok(TaskResult::Ok)
    }
}

/// Production build of everything.
#[derive(Debug)]
pub struct Dist;

impl Task for Dist {
    fn name(&self) -> &'static str {
        "dist"
    }

    task_deps![BuildForProd, DefaultTask];

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, _ctx: &Context) -> Result<TaskResult> {
        Ok(TaskResult::Ok)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tasks::test_helpers::make_context;
    use std::path::PathBuf;

    #[test]
    fn build_for_prod_requires_production_context() {
        let ctx = make_context(PathBuf::from("/project"));
        assert!(BuildForProd.run(&ctx).is_err());
        let prod = make_context(PathBuf::from("/project")).with_production(true);
        assert!(matches!(BuildForProd.run(&prod).unwrap(), TaskResult::Ok));
    }
}

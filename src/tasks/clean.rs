//! Removing the dist tree.
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use super::{Context, Task, TaskResult};
use crate::error::ConfigError;

/// Canonical `dist`, provided it lies strictly inside `root`.
fn removable_dist(root: &Path, dist: &Path) -> Result<PathBuf, ConfigError> {
    let canonical = |p: &Path| {
        dunce::canonicalize(p).map_err(|e| ConfigError::UnsafeDist {
            path: p.display().to_string(),
            reason: e.to_string(),
        })
    };
    let root = canonical(root)?;
    let dist = canonical(dist)?;
    if dist == root || !dist.starts_with(&root) {
        return Err(ConfigError::UnsafeDist {
            path: dist.display().to_string(),
            reason: format!("not inside the project root {}", root.display()),
        });
    }
    Ok(dist)
}

/// Delete the dist root. The task name comes from `cleanName`.
#[derive(Debug)]
pub struct Clean {
    name: String,
}

impl Clean {
    /// Clean task invoked as `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Task for Clean {
    fn name(&self) -> &str {
        &self.name
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let dist = ctx.dist_dir();
        if !dist.exists() {
            return Ok(TaskResult::Skipped(format!("{} does not exist", dist.display())));
        }
        let dist = removable_dist(&ctx.root, &dist)?;
        if ctx.dry_run {
            ctx.log.dry_run(&format!("would remove {}", dist.display()));
            return Ok(TaskResult::DryRun);
        }
        std::fs::remove_dir_all(&dist).with_context(|| format!("removing {}", dist.display()))?;
        ctx.log.info(&format!("removed {}", dist.display()));
        Ok(TaskResult::Ok)
    }
}

pub mod config;
pub mod list;
pub mod run;
mod scheduler;
pub mod version;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config::EffectiveSettings;
use crate::logging::Logger;
use crate::tasks::{self, Context, Task};

/// Project root and resolved settings, shared by every command.
#[derive(Debug)]
pub struct CommandSetup {
    pub root: PathBuf,
    pub settings: EffectiveSettings,
}

impl CommandSetup {
    /// Locate the project root and resolve its settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be determined or the settings
    /// file cannot be read, parsed or resolved.
    pub fn init(global: &GlobalOpts, log: &Logger) -> Result<Self> {
        let root = global
            .resolve_root()
            .context("cannot determine project root")?;
        let config_path = global.config_path(&root);

        log.debug(&format!("project root: {}", root.display()));
        if config_path.exists() {
            log.debug(&format!("settings: {}", config_path.display()));
        } else {
            log.debug(&format!(
                "no settings file at {}, using defaults",
                config_path.display()
            ));
        }

        let settings = crate::config::load(&config_path)
            .with_context(|| format!("invalid settings in {}", config_path.display()))?;
        log.debug(&format!(
            "{} style bundle(s), dist at {}",
            settings.style.bundles.len(),
            settings.dist
        ));

        Ok(Self { root, settings })
    }
}

/// Execute every task, print the summary, and bail if any task failed.
///
/// Tasks run on the dependency-driven parallel scheduler unless the context
/// disables parallelism, in which case they run in the given order.
///
/// # Errors
///
/// Returns an error if one or more tasks recorded a failure.
pub fn run_tasks_to_completion(tasks: &[&dyn Task], ctx: &Context, log: &Arc<Logger>) -> Result<()> {
    if ctx.parallel && tasks.len() > 1 {
        scheduler::run_tasks_parallel(tasks, ctx, log);
    } else {
        for task in tasks {
            tasks::execute(*task, ctx);
        }
    }

    log.print_summary();

    let count = log.failure_count();
    if count > 0 {
        anyhow::bail!("{count} task(s) failed");
    }
    Ok(())
}

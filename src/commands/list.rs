//! Command: list registered tasks.
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt::Write as _;

use anyhow::Result;

use super::CommandSetup;
use crate::cli::GlobalOpts;
use crate::logging::Logger;
use crate::tasks::{self, Task};

/// One line per task: its name, then its dependencies after a colon.
#[must_use]
pub fn render(tasks: &[Box<dyn Task>]) -> String {
    let names: HashMap<TypeId, &str> = tasks.iter().map(|t| (t.task_id(), t.name())).collect();
    let mut out = String::new();
    for task in tasks {
        let deps: Vec<&str> = task
            .dependencies()
            .iter()
            .filter_map(|d| names.get(d).copied())
            .collect();
        if deps.is_empty() {
            let _ = writeln!(out, "{}", task.name());
        } else {
            let _ = writeln!(out, "{}: {}", task.name(), deps.join(", "));
        }
    }
    out
}

/// Print every task registered for the project's settings.
///
/// # Errors
///
/// Returns an error if settings cannot be loaded.
pub fn run(global: &GlobalOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    print!("{}", render(&tasks::all_tasks(&setup.settings)));
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::tasks::test_helpers::settings;

    #[test]
    fn shows_dependencies_by_name() {
        let out = render(&tasks::all_tasks(&settings("")));
        assert!(out.lines().any(|l| l == "default: build, copy"));
        assert!(out.lines().any(|l| l == "dist: gsdl-build-for-prod, default"));
        assert!(out.lines().any(|l| l == "gsdl-build-html: gsdl-build-data"));
        assert!(out.lines().any(|l| l == "clean"));
    }
}

//! Command: run tasks with their dependencies.
use std::sync::Arc;
use std::sync::mpsc::channel;

use anyhow::{Context as _, Result};

use super::{CommandSetup, run_tasks_to_completion};
use crate::cli::{GlobalOpts, RunOpts};
use crate::logging::{Log, Logger};
use crate::tasks::{self, Context, Service, Task};

/// Run the requested tasks, then keep any watcher or server alive until
/// interrupted.
///
/// Failed tasks do not stop a watcher or server that started; the failure
/// is returned once the wait ends.
///
/// # Errors
///
/// Returns an error if settings cannot be loaded, a task name is unknown,
/// or any task fails.
pub fn run(global: &GlobalOpts, opts: &RunOpts, log: &Arc<Logger>) -> Result<()> {
    let CommandSetup { root, settings } = CommandSetup::init(global, log)?;

    let planned = tasks::plan(tasks::all_tasks(&settings), &opts.tasks)?;
    let production = tasks::wants_production(&planned);
    if production {
        log.info("production build");
    }

    let ctx = Context::new(
        settings,
        root,
        Arc::clone(log) as Arc<dyn Log>,
        global.dry_run,
        global.parallel,
    )
    .with_production(production);

    let order: Vec<&dyn Task> = planned.iter().map(Box::as_ref).collect();
    log.debug(&format!(
        "plan: {}",
        order.iter().map(|t| t.name()).collect::<Vec<_>>().join(", ")
    ));
    let outcome = run_tasks_to_completion(&order, &ctx, log);

    let services = ctx.take_services();
    if !services.is_empty() {
        if let Err(e) = &outcome {
            log.warn(&format!("{e}; still watching"));
        }
        wait_for_interrupt(&services, log)?;
    }
    outcome
}

fn wait_for_interrupt(services: &[Service], log: &Logger) -> Result<()> {
    for service in services {
        match service {
            Service::Watcher(w) => log.info(&format!("watching {}", w.root().display())),
            Service::Server(s) => log.info(&format!("serving http://{}/", s.addr())),
        }
    }
    log.info("press Ctrl-C to stop");

    let (tx, rx) = channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .context("cannot install Ctrl-C handler")?;
    let _ = rx.recv();
    log.info("stopping");
    Ok(())
}

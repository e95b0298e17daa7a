//! Rebuild on source changes.
//!
//! The project root is watched recursively. Each debounced batch of
//! changes is matched against every rule's source globs, and each matching
//! rule's task runs once per batch, on a single worker thread.
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, channel};
use std::thread::JoinHandle;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{DebounceEventResult, DebouncedEventKind, Debouncer, new_debouncer};

use crate::error::ServeError;
use crate::pipeline::source;
use crate::tasks::{self, Context, Task};

/// Re-run `task` when a file matching `patterns` changes.
#[derive(Clone)]
pub struct WatchRule {
    /// Root-relative source globs.
    pub patterns: Vec<String>,
    /// Task to re-run.
    pub task: Arc<dyn Task>,
}

impl std::fmt::Debug for WatchRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchRule")
            .field("patterns", &self.patterns)
            .field("task", &self.task.name())
            .finish()
    }
}

/// Indices of the rules whose globs match `path`.
#[must_use]
pub fn matching_rules(rules: &[WatchRule], root: &Path, path: &Path) -> Vec<usize> {
    rules
        .iter()
        .enumerate()
        .filter(|(_, rule)| source::matches_any(root, &rule.patterns, path))
        .map(|(i, _)| i)
        .collect()
}

/// A running watcher. Dropping it stops watching.
pub struct WatchHandle {
    root: PathBuf,
    _debouncer: Debouncer<RecommendedWatcher>,
    _worker: JoinHandle<()>,
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl WatchHandle {
    /// Directory being watched.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Start watching `ctx.root`, re-running rule tasks in `ctx`.
///
/// # Errors
///
/// Returns an error if the platform watcher cannot be created or attached.
pub fn start(ctx: Context, rules: Vec<WatchRule>, debounce: Duration) -> Result<WatchHandle, ServeError> {
    let (tx, rx) = channel::<DebounceEventResult>();
    let mut debouncer = new_debouncer(debounce, tx).map_err(|e| ServeError::Watch(e.to_string()))?;
    debouncer
        .watcher()
        .watch(&ctx.root, RecursiveMode::Recursive)
        .map_err(|e| ServeError::Watch(format!("{}: {e}", ctx.root.display())))?;

    let root = ctx.root.clone();
    ctx.log.info(&format!("watching {} for changes", root.display()));
    let worker = std::thread::spawn(move || run_worker(&ctx, &rules, &rx));

    Ok(WatchHandle {
        root,
        _debouncer: debouncer,
        _worker: worker,
    })
}

fn run_worker(ctx: &Context, rules: &[WatchRule], rx: &Receiver<DebounceEventResult>) {
    // Ends once the debouncer, and with it the sender, is dropped.
    while let Ok(batch) = rx.recv() {
        let events = match batch {
            Ok(events) => events,
            Err(e) => {
                ctx.log.warn(&format!("watch error: {e}"));
                continue;
            }
        };

        let mut due = BTreeSet::new();
        for event in events.iter().filter(|e| matches!(e.kind, DebouncedEventKind::Any)) {
            let hits = matching_rules(rules, &ctx.root, &event.path);
            if !hits.is_empty() {
                ctx.log.info(&format!(
                    "File {} was changed, running tasks...",
                    event.path.display()
                ));
            }
            due.extend(hits);
        }

        for rule in due.into_iter().filter_map(|i| rules.get(i)) {
            tasks::execute(rule.task.as_ref(), ctx);
        }
    }
}

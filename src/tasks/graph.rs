//! Task dependency graph utilities.

use std::any::TypeId;
use std::collections::HashMap;

use super::Task;
use crate::error::TaskError;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// Indices of `roots` and every task they transitively depend on, in an
/// order where each task follows all of its dependencies.
///
/// Dependencies on tasks absent from `tasks` are ignored. Requested tasks
/// keep their relative order where the graph allows it.
///
/// # Errors
///
/// Returns [`TaskError::DependencyCycle`] naming the task at which a cycle
/// was found.
pub fn closure(tasks: &[&dyn Task], roots: &[usize]) -> Result<Vec<usize>, TaskError> {
    let type_to_idx: HashMap<TypeId, usize> = tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (t.task_id(), i))
        .collect();

    let mut marks = vec![Mark::Unvisited; tasks.len()];
    let mut order = Vec::new();

    // Iterative post-order walk: (node, next dependency to look at).
    for &root in roots {
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        while let Some(top) = stack.last_mut() {
            let (node, next) = *top;
            let Some(task) = tasks.get(node) else {
                stack.pop();
                continue;
            };
            if next == 0 {
                match marks.get(node) {
                    Some(Mark::Unvisited) => {
                        if let Some(m) = marks.get_mut(node) {
                            *m = Mark::Visiting;
                        }
                    }
                    Some(Mark::Visiting) => {
                        return Err(TaskError::DependencyCycle(task.name().to_string()));
                    }
                    _ => {
                        stack.pop();
                        continue;
                    }
                }
            }

            if let Some(dep) = task.dependencies().get(next) {
                top.1 += 1;
                if let Some(&dep_idx) = type_to_idx.get(dep) {
                    match marks.get(dep_idx) {
                        Some(Mark::Visiting) => {
                            return Err(TaskError::DependencyCycle(task.name().to_string()));
                        }
                        Some(Mark::Unvisited) => stack.push((dep_idx, 0)),
                        _ => {}
                    }
                }
            } else {
                if let Some(m) = marks.get_mut(node) {
                    *m = Mark::Done;
                }
                order.push(node);
                stack.pop();
            }
        }
    }

    Ok(order)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::tasks::test_helpers::settings;
    use crate::tasks::{Context, TaskResult, all_tasks};

    use anyhow::Result;

    /// Declare unit-struct tasks, named after the struct, with their deps.
    macro_rules! nodes {
        ($($name:ident => [$($dep:ident),*];)+) => {
            $(
                struct $name;
                impl Task for $name {
                    fn name(&self) -> &str {
                        stringify!($name)
                    }
                    fn dependencies(&self) -> &[TypeId] {
                        const DEPS: &[TypeId] = &[$(TypeId::of::<$dep>()),*];
                        DEPS
                    }
                    fn should_run(&self, _ctx: &Context) -> bool {
                        true
                    }
                    fn run(&self, _ctx: &Context) -> Result<TaskResult> {
                        Ok(TaskResult::Ok)
                    }
                }
            )+
        };
    }

    nodes! {
        Data => [];
        Html => [Data];
        Css => [];
        Build => [Html, Css];
        Site => [Build, Html];
        Fonts => [];
        Ping => [Pong];
        Pong => [Ping];
        Orphan => [Fonts];
    }

    fn order(tasks: &[&dyn Task], roots: &[usize]) -> Vec<String> {
        closure(tasks, roots)
            .unwrap()
            .into_iter()
            .map(|i| tasks[i].name().to_string())
            .collect()
    }

    #[test]
    fn dependencies_come_first() {
        let tasks: [&dyn Task; 3] = [&Build, &Html, &Data];
        assert_eq!(order(&tasks, &[0]), ["Data", "Html", "Build"]);
    }

    #[test]
    fn shared_dependency_runs_once() {
        let tasks: [&dyn Task; 5] = [&Site, &Build, &Html, &Css, &Data];
        assert_eq!(order(&tasks, &[0]), ["Data", "Html", "Css", "Build", "Site"]);
    }

    #[test]
    fn roots_keep_request_order() {
        let tasks: [&dyn Task; 4] = [&Data, &Fonts, &Css, &Html];
        assert_eq!(order(&tasks, &[1, 3, 2]), ["Fonts", "Data", "Html", "Css"]);
    }

    #[test]
    fn unregistered_dependency_is_ignored() {
        let tasks: [&dyn Task; 1] = [&Orphan];
        assert_eq!(order(&tasks, &[0]), ["Orphan"]);
    }

    #[test]
    fn cycle_is_an_error() {
        let tasks: [&dyn Task; 2] = [&Ping, &Pong];
        let err = closure(&tasks, &[0]).unwrap_err();
        assert!(matches!(err, TaskError::DependencyCycle(_)));
    }

    #[test]
    fn every_registered_task_can_be_planned() {
        let registry = all_tasks(&settings(""));
        let refs: Vec<&dyn Task> = registry.iter().map(Box::as_ref).collect();
        let roots: Vec<usize> = (0..refs.len()).collect();
        assert_eq!(closure(&refs, &roots).unwrap().len(), refs.len());
    }
}

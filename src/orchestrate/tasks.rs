//! Ordered pre-build tasks.
//!
//! Each task carries an explicit priority; lower runs first and equal
//! priorities keep registration order. The first failing task aborts the
//! run.

use tracing::info;

use crate::error::OneBuildError;

pub type TaskFn<S> = Box<dyn FnMut(&mut S) -> Result<(), OneBuildError>>;

struct Task<S> {
    name: String,
    priority: i32,
    run: TaskFn<S>,
}

pub struct TaskList<S> {
    tasks: Vec<Task<S>>,
}

impl<S> Default for TaskList<S> {
    fn default() -> Self {
        Self { tasks: Vec::new() }
    }
}

impl<S> TaskList<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F>(&mut self, name: &str, priority: i32, task: F) -> &mut Self
    where
        F: FnMut(&mut S) -> Result<(), OneBuildError> + 'static,
    {
        self.tasks.push(Task {
            name: name.to_string(),
            priority,
            run: Box::new(task),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Task names and priorities in run order.
    pub fn schedule(&mut self) -> Vec<(&str, i32)> {
        self.sort();
        self.tasks
            .iter()
            .map(|t| (t.name.as_str(), t.priority))
            .collect()
    }

    fn sort(&mut self) {
        self.tasks.sort_by_key(|t| t.priority);
    }

    /// Run every task against `state` in priority order.
    pub fn run(&mut self, state: &mut S) -> Result<(), OneBuildError> {
        self.sort();
        for task in &mut self.tasks {
            info!(task = %task.name, priority = task.priority, "running build task");
            (task.run)(state).map_err(|e| OneBuildError::Task {
                name: task.name.clone(),
                source: Box::new(e),
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &'static str) -> impl FnMut(&mut Vec<&'static str>) -> Result<(), OneBuildError> {
        move |log| {
            log.push(name);
            Ok(())
        }
    }

    #[test]
    fn runs_in_priority_order() {
        let mut tasks = TaskList::new();
        tasks
            .add("build", 1, record("build"))
            .add("config", -1000, record("config"))
            .add("check", -999, record("check"));
        let mut log = Vec::new();
        tasks.run(&mut log).unwrap();
        assert_eq!(log, vec!["config", "check", "build"]);
    }

    #[test]
    fn equal_priorities_keep_registration_order() {
        let mut tasks = TaskList::new();
        tasks
            .add("b", 0, record("b"))
            .add("a", 0, record("a"))
            .add("first", -1, record("first"))
            .add("c", 0, record("c"));
        let mut log = Vec::new();
        tasks.run(&mut log).unwrap();
        assert_eq!(log, vec!["first", "b", "a", "c"]);
    }

    #[test]
    fn schedule_reports_run_order() {
        let mut tasks: TaskList<Vec<&'static str>> = TaskList::new();
        tasks.add("late", 5, record("late")).add("early", -5, record("early"));
        assert_eq!(tasks.schedule(), vec![("early", -5), ("late", 5)]);
        assert_eq!(tasks.len(), 2);
    }

    #[test]
    fn first_failure_aborts() {
        let mut tasks = TaskList::new();
        tasks
            .add("ok", 0, record("ok"))
            .add("boom", 1, |_: &mut Vec<&'static str>| {
                Err(OneBuildError::EmptyScenes)
            })
            .add("never", 2, record("never"));
        let mut log = Vec::new();
        let err = tasks.run(&mut log).unwrap_err();
        assert_eq!(log, vec!["ok"]);
        match err {
            OneBuildError::Task { name, source } => {
                assert_eq!(name, "boom");
                assert!(matches!(*source, OneBuildError::EmptyScenes));
            }
            other => panic!("Expected Task error, got {other:?}"),
        }
    }

    #[test]
    fn empty_list_is_a_no_op() {
        let mut tasks: TaskList<()> = TaskList::new();
        assert!(tasks.is_empty());
        tasks.run(&mut ()).unwrap();
    }
}

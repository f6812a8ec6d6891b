// src/graph/registry.rs

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::action::Action;
use crate::errors::{Result, WatchflowError};

use super::task::{Task, TaskKind};
use super::TaskName;

/// Registration-phase task store.
///
/// Children must be registered before any composite that references them,
/// which keeps the graph acyclic without a separate cycle check. Once all
/// tasks are in, call [`TaskRegistry::freeze`]; nothing can be added after
/// that because the registry is consumed.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: HashMap<TaskName, Arc<Task>>,
    /// Registration order, used for stable listing output.
    order: Vec<TaskName>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task.
    ///
    /// Fails with [`WatchflowError::DuplicateTask`] if `name` is taken and
    /// with [`WatchflowError::UnknownChild`] if a child has not been
    /// registered yet. On error the registry is left unchanged.
    pub fn register(&mut self, name: impl Into<TaskName>, kind: TaskKind) -> Result<Arc<Task>> {
        let name = name.into();

        if self.tasks.contains_key(&name) {
            return Err(WatchflowError::DuplicateTask(name));
        }

        if let Some(child) = kind
            .children()
            .iter()
            .find(|child| !self.tasks.contains_key(*child))
        {
            return Err(WatchflowError::UnknownChild {
                task: name,
                child: child.clone(),
            });
        }

        debug!(task = %name, kind = kind.label(), children = ?kind.children(), "registered task");

        let task = Arc::new(Task::new(name.clone(), kind));
        self.tasks.insert(name.clone(), Arc::clone(&task));
        self.order.push(name);
        Ok(task)
    }

    pub fn register_action(
        &mut self,
        name: impl Into<TaskName>,
        action: impl Action + 'static,
    ) -> Result<Arc<Task>> {
        self.register(name, TaskKind::Action(Arc::new(action)))
    }

    pub fn register_sequence<I, S>(&mut self, name: impl Into<TaskName>, children: I) -> Result<Arc<Task>>
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        let children = children.into_iter().map(Into::into).collect();
        self.register(name, TaskKind::Sequence(children))
    }

    pub fn register_parallel<I, S>(&mut self, name: impl Into<TaskName>, children: I) -> Result<Arc<Task>>
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        let children = children.into_iter().map(Into::into).collect();
        self.register(name, TaskKind::Parallel(children))
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<Task>> {
        self.tasks
            .get(name)
            .cloned()
            .ok_or_else(|| WatchflowError::UnknownTask(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// End the registration phase.
    pub fn freeze(self) -> TaskGraph {
        debug!(tasks = self.tasks.len(), "task registry frozen");
        TaskGraph {
            tasks: self.tasks,
            order: self.order,
        }
    }
}

/// Immutable task graph shared by the scheduler and the watch registrar.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    tasks: HashMap<TaskName, Arc<Task>>,
    order: Vec<TaskName>,
}

impl TaskGraph {
    pub fn resolve(&self, name: &str) -> Result<Arc<Task>> {
        self.tasks
            .get(name)
            .cloned()
            .ok_or_else(|| WatchflowError::UnknownTask(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// All tasks in registration order (children before parents).
    pub fn tasks(&self) -> impl Iterator<Item = &Arc<Task>> {
        self.order.iter().filter_map(|name| self.tasks.get(name))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

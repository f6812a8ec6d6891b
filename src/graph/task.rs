// src/graph/task.rs

use std::fmt;

use crate::action::ActionRef;

use super::TaskName;

/// What a task does when it runs.
#[derive(Debug, Clone)]
pub enum TaskKind {
    /// Leaf: execute one action.
    Action(ActionRef),
    /// Run children in declared order, stopping at the first failure.
    Sequence(Vec<TaskName>),
    /// Start all children together and wait for every one of them.
    Parallel(Vec<TaskName>),
}

impl TaskKind {
    /// Child task names, empty for actions.
    pub fn children(&self) -> &[TaskName] {
        match self {
            TaskKind::Action(_) => &[],
            TaskKind::Sequence(children) | TaskKind::Parallel(children) => children,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskKind::Action(_) => "action",
            TaskKind::Sequence(_) => "sequence",
            TaskKind::Parallel(_) => "parallel",
        }
    }
}

/// A named node in the build graph.
#[derive(Debug, Clone)]
pub struct Task {
    name: TaskName,
    kind: TaskKind,
}

impl Task {
    pub(crate) fn new(name: TaskName, kind: TaskKind) -> Self {
        Self { name, kind }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }

    pub fn children(&self) -> &[TaskName] {
        self.kind.children()
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TaskKind::Action(action) => write!(f, "{} ({})", self.name, action.describe()),
            TaskKind::Sequence(children) => write!(f, "{} (sequence {:?})", self.name, children),
            TaskKind::Parallel(children) => write!(f, "{} (parallel {:?})", self.name, children),
        }
    }
}

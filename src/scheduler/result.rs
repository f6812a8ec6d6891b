// src/scheduler/result.rs

//! Per-task run outcome.

use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

use crate::action::ActionError;
use crate::graph::TaskName;

/// Lifecycle of a single task run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Succeeded | RunStatus::Failed)
    }
}

/// Why a run ended up `Failed`.
#[derive(Debug, Clone, Error)]
pub enum RunError {
    #[error(transparent)]
    Action(ActionError),

    /// The run was cancelled before this task could start. Distinct from a
    /// real failure so callers can tell "aborted" from "broken".
    #[error("cancelled")]
    Cancelled,

    #[error("child task '{child}' failed")]
    ChildFailed { child: TaskName },

    #[error("task panicked: {0}")]
    Panicked(String),
}

/// Outcome record for one task in one invocation.
///
/// Built as `pending -> start -> succeed | fail`; the finishing methods take
/// `self`, so a finalized record cannot be changed afterwards.
#[derive(Debug, Clone)]
pub struct RunResult {
    task: TaskName,
    status: RunStatus,
    started_at: Option<Instant>,
    finished_at: Option<Instant>,
    error: Option<RunError>,
}

impl RunResult {
    pub fn pending(task: impl Into<TaskName>) -> Self {
        Self {
            task: task.into(),
            status: RunStatus::Pending,
            started_at: None,
            finished_at: None,
            error: None,
        }
    }

    pub fn start(mut self) -> Self {
        self.status = RunStatus::Running;
        self.started_at = Some(Instant::now());
        self
    }

    pub fn succeed(mut self) -> Self {
        self.status = RunStatus::Succeeded;
        self.finished_at = Some(Instant::now());
        self
    }

    pub fn fail(mut self, error: RunError) -> Self {
        self.status = RunStatus::Failed;
        self.finished_at = Some(Instant::now());
        self.error = Some(error);
        self
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn error(&self) -> Option<&RunError> {
        self.error.as_ref()
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<Instant> {
        self.finished_at
    }

    /// Wall time between start and finish; `None` if the task never started
    /// or has not finished.
    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some(end.saturating_duration_since(start)),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Succeeded
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.error, Some(RunError::Cancelled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_sets_status_and_timestamps() {
        let pending = RunResult::pending("css");
        assert_eq!(pending.status(), RunStatus::Pending);
        assert!(pending.duration().is_none());

        let running = pending.start();
        assert_eq!(running.status(), RunStatus::Running);
        assert!(running.started_at().is_some());
        assert!(!running.status().is_terminal());

        let done = running.succeed();
        assert!(done.is_success());
        assert!(done.duration().is_some());
        assert!(done.error().is_none());
    }

    #[test]
    fn cancelled_is_a_failure_with_a_marker() {
        let result = RunResult::pending("html").fail(RunError::Cancelled);
        assert_eq!(result.status(), RunStatus::Failed);
        assert!(result.is_cancelled());
        assert!(result.started_at().is_none());
    }
}

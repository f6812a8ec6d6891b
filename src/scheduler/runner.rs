// src/scheduler/runner.rs

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::action::ActionContext;
use crate::errors::Result;
use crate::graph::{Task, TaskGraph, TaskKind, TaskName};

use super::report::{ReportRecorder, RunReport};
use super::result::{RunError, RunResult};

type NodeFuture = Pin<Box<dyn Future<Output = RunResult> + Send + 'static>>;

/// Executes tasks from a frozen [`TaskGraph`].
///
/// Composition semantics:
/// - `Action`: run the action; any error becomes a `Failed` result.
/// - `Sequence`: children in order, stop at the first failure.
/// - `Parallel`: children start together as separate tokio tasks; every one
///   is awaited before the composite reports, and it fails if any failed.
///
/// Cancellation is cooperative. Once the token fires no new child starts,
/// but actions already executing are left to finish.
///
/// Cheap to clone; clones share the same graph.
#[derive(Debug, Clone)]
pub struct Scheduler {
    graph: Arc<TaskGraph>,
    root: Arc<PathBuf>,
}

impl Scheduler {
    /// `root` is the working directory handed to every action.
    pub fn new(graph: Arc<TaskGraph>, root: impl Into<PathBuf>) -> Self {
        Self {
            graph,
            root: Arc::new(root.into()),
        }
    }

    pub fn graph(&self) -> &Arc<TaskGraph> {
        &self.graph
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run `name` to completion.
    ///
    /// The only error is [`crate::errors::WatchflowError::UnknownTask`];
    /// action failures are reported through the returned [`RunReport`].
    pub async fn run(&self, name: &str) -> Result<RunReport> {
        self.run_with_cancel(name, CancellationToken::new()).await
    }

    pub async fn run_with_cancel(&self, name: &str, cancel: CancellationToken) -> Result<RunReport> {
        let task = self.graph.resolve(name)?;
        Ok(self.run_task(task, cancel).await)
    }

    /// Run an already-resolved task.
    pub async fn run_task(&self, task: Arc<Task>, cancel: CancellationToken) -> RunReport {
        let name = task.name().to_string();
        let recorder = ReportRecorder::default();

        info!(task = %name, "run started");

        let handle = tokio::spawn(self.run_node(task, cancel, recorder.clone()));
        let root = match handle.await {
            Ok(result) => result,
            Err(join_err) => {
                warn!(task = %name, error = %join_err, "root task aborted");
                RunResult::pending(name.clone())
                    .start()
                    .fail(RunError::Panicked(join_err.to_string()))
            }
        };

        info!(
            task = %name,
            success = root.is_success(),
            cancelled = root.is_cancelled(),
            duration_ms = root.duration().map(|d| d.as_millis() as u64).unwrap_or(0),
            "run finished"
        );

        recorder.finish(root)
    }

    /// Build the future for one node. Boxed and `'static` so composites can
    /// recurse and parallel children can be spawned.
    fn run_node(&self, task: Arc<Task>, cancel: CancellationToken, recorder: ReportRecorder) -> NodeFuture {
        let this = self.clone();

        Box::pin(async move {
            let result = RunResult::pending(task.name());

            if cancel.is_cancelled() {
                debug!(task = %task.name(), "cancelled before start");
                return result.fail(RunError::Cancelled);
            }

            match task.kind() {
                TaskKind::Action(action) => {
                    let result = result.start();
                    let ctx = ActionContext::new(task.name(), this.root.as_path(), cancel.clone());

                    let result = match action.execute(&ctx).await {
                        Ok(artifacts) => {
                            debug!(task = %task.name(), artifacts = artifacts.paths.len(), "action succeeded");
                            result.succeed()
                        }
                        Err(err) => {
                            warn!(task = %task.name(), error = %err, "action failed");
                            result.fail(RunError::Action(err))
                        }
                    };

                    recorder.record(result.clone());
                    result
                }
                TaskKind::Sequence(children) => {
                    let result = result.start();
                    this.run_sequence(&task, children, result, cancel, recorder).await
                }
                TaskKind::Parallel(children) => {
                    let result = result.start();
                    this.run_parallel(&task, children, result, cancel, recorder).await
                }
            }
        })
    }

    async fn run_sequence(
        &self,
        task: &Task,
        children: &[TaskName],
        result: RunResult,
        cancel: CancellationToken,
        recorder: ReportRecorder,
    ) -> RunResult {
        for child_name in children {
            if cancel.is_cancelled() {
                info!(task = %task.name(), next = %child_name, "sequence cancelled; not starting remaining children");
                return result.fail(RunError::Cancelled);
            }

            let child = match self.graph.resolve(child_name) {
                Ok(child) => child,
                Err(err) => {
                    // Registration guarantees children exist.
                    warn!(task = %task.name(), child = %child_name, error = %err, "child missing from graph");
                    return result.fail(RunError::ChildFailed { child: child_name.clone() });
                }
            };

            let child_result = self
                .run_node(child, cancel.clone(), recorder.clone())
                .await;

            if !child_result.is_success() {
                debug!(task = %task.name(), child = %child_name, "sequence stopping at failed child");
                return result.fail(composite_error(child_name, &child_result));
            }
        }

        result.succeed()
    }

    async fn run_parallel(
        &self,
        task: &Task,
        children: &[TaskName],
        result: RunResult,
        cancel: CancellationToken,
        recorder: ReportRecorder,
    ) -> RunResult {
        let mut handles = Vec::with_capacity(children.len());

        for child_name in children {
            match self.graph.resolve(child_name) {
                Ok(child) => {
                    let fut = self.run_node(child, cancel.clone(), recorder.clone());
                    handles.push((child_name.clone(), tokio::spawn(fut)));
                }
                Err(err) => {
                    warn!(task = %task.name(), child = %child_name, error = %err, "child missing from graph");
                }
            }
        }

        debug!(task = %task.name(), children = handles.len(), "parallel children started");

        let mut first_failure: Option<RunError> = None;
        let mut any_cancelled = false;

        for (child_name, handle) in handles {
            let child_result = match handle.await {
                Ok(r) => r,
                Err(join_err) => {
                    warn!(task = %task.name(), child = %child_name, error = %join_err, "parallel child aborted");
                    let failed = RunResult::pending(child_name.clone())
                        .start()
                        .fail(RunError::Panicked(join_err.to_string()));
                    recorder.record(failed.clone());
                    failed
                }
            };

            if child_result.is_success() {
                continue;
            }

            if child_result.is_cancelled() {
                any_cancelled = true;
            } else if first_failure.is_none() {
                first_failure = Some(composite_error(&child_name, &child_result));
            }
        }

        match (first_failure, any_cancelled) {
            (Some(err), _) => result.fail(err),
            (None, true) => result.fail(RunError::Cancelled),
            (None, false) => result.succeed(),
        }
    }
}

/// A composite fails as "cancelled" only if its child was cancelled;
/// anything else is reported as a child failure.
fn composite_error(child: &str, child_result: &RunResult) -> RunError {
    if child_result.is_cancelled() {
        RunError::Cancelled
    } else {
        RunError::ChildFailed {
            child: child.to_string(),
        }
    }
}

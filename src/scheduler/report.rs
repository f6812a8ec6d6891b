// src/scheduler/report.rs

use std::fmt::Write as _;
use std::sync::{Arc, Mutex};

use super::result::RunResult;

/// Append-only collector shared by all branches of one invocation.
///
/// Parallel children finish on different tokio tasks, so the vector sits
/// behind a mutex; every critical section is a single `push`.
#[derive(Debug, Clone, Default)]
pub(crate) struct ReportRecorder {
    results: Arc<Mutex<Vec<RunResult>>>,
}

impl ReportRecorder {
    pub(crate) fn record(&self, result: RunResult) {
        match self.results.lock() {
            Ok(mut guard) => guard.push(result),
            Err(poisoned) => poisoned.into_inner().push(result),
        }
    }

    pub(crate) fn finish(self, root: RunResult) -> RunReport {
        let results = match Arc::try_unwrap(self.results) {
            Ok(mutex) => mutex.into_inner().unwrap_or_else(|p| p.into_inner()),
            // A detached branch still holds a clone; copy what we have.
            Err(shared) => match shared.lock() {
                Ok(guard) => guard.clone(),
                Err(poisoned) => poisoned.into_inner().clone(),
            },
        };
        RunReport { root, results }
    }
}

/// Outcome of one top-level invocation.
///
/// `results` holds one entry per action that actually started, in the order
/// they finished. Tasks skipped by fail-fast or cancellation have no entry.
/// `root` is the overall result for the requested task.
#[derive(Debug, Clone)]
pub struct RunReport {
    root: RunResult,
    results: Vec<RunResult>,
}

impl RunReport {
    pub fn root(&self) -> &RunResult {
        &self.root
    }

    pub fn results(&self) -> &[RunResult] {
        &self.results
    }

    pub fn success(&self) -> bool {
        self.root.is_success()
    }

    pub fn was_cancelled(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Result for a given action, if it ran.
    pub fn result_for(&self, task: &str) -> Option<&RunResult> {
        self.results.iter().find(|r| r.task() == task)
    }

    /// Names of actions that ran, in finishing order.
    pub fn executed(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.task()).collect()
    }

    pub fn failures(&self) -> Vec<&RunResult> {
        self.results.iter().filter(|r| !r.is_success()).collect()
    }

    /// Multi-line, human-readable summary printed by the CLI.
    pub fn summary(&self) -> String {
        let mut out = String::new();

        for result in &self.results {
            let status = if result.is_success() { "ok" } else { "FAILED" };
            let millis = result.duration().map(|d| d.as_millis()).unwrap_or(0);
            let _ = writeln!(out, "  {status:<6} {} ({millis} ms)", result.task());
        }

        for failure in self.failures() {
            if let Some(err) = failure.error() {
                let _ = writeln!(out, "error: task '{}': {}", failure.task(), error_chain(err));
            }
        }

        // No leaf failed, so the cause is only on the root (a panic, say).
        if self.failures().is_empty() && !self.was_cancelled() {
            if let Some(err) = self.root.error() {
                let _ = writeln!(out, "error: task '{}': {}", self.root.task(), error_chain(err));
            }
        }

        if self.was_cancelled() {
            let _ = writeln!(out, "run of '{}' was cancelled", self.root.task());
        }

        let verdict = if self.success() { "succeeded" } else { "failed" };
        let _ = write!(out, "'{}' {verdict}", self.root.task());
        out
    }
}

/// `err: cause: cause-of-cause`.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = write!(msg, ": {cause}");
        source = cause.source();
    }
    msg
}

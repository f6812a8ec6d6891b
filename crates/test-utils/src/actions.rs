//! Fake actions that record what ran, and when, into an [`ExecutionLog`].

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use watchflow::action::{Action, ActionContext, ActionError, ActionFuture, Artifacts};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    Started { task: String, at: Instant },
    Finished { task: String, at: Instant, ok: bool },
}

impl LogEntry {
    pub fn task(&self) -> &str {
        match self {
            LogEntry::Started { task, .. } | LogEntry::Finished { task, .. } => task,
        }
    }
}

/// Shared, append-only record of action starts and finishes.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl ExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, entry: LogEntry) {
        self.entries.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Task names in the order they started.
    pub fn started(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|e| match e {
                LogEntry::Started { task, .. } => Some(task),
                LogEntry::Finished { .. } => None,
            })
            .collect()
    }

    /// Task names in the order they finished.
    pub fn finished(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|e| match e {
                LogEntry::Finished { task, .. } => Some(task),
                LogEntry::Started { .. } => None,
            })
            .collect()
    }

    pub fn start_count(&self, task: &str) -> usize {
        self.started().iter().filter(|t| *t == task).count()
    }

    pub fn start_times(&self, task: &str) -> Vec<Instant> {
        self.entries()
            .into_iter()
            .filter_map(|e| match e {
                LogEntry::Started { task: t, at } if t == task => Some(at),
                _ => None,
            })
            .collect()
    }

    /// Highest number of simultaneously running executions of `task`.
    pub fn max_concurrent(&self, task: &str) -> usize {
        let mut running = 0usize;
        let mut max = 0usize;
        for entry in self.entries() {
            if entry.task() != task {
                continue;
            }
            match entry {
                LogEntry::Started { .. } => {
                    running += 1;
                    max = max.max(running);
                }
                LogEntry::Finished { .. } => running = running.saturating_sub(1),
            }
        }
        max
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

#[derive(Debug, Clone)]
enum Outcome {
    Succeed,
    Fail(String),
}

#[derive(Debug, Clone)]
struct Scripted {
    log: ExecutionLog,
    delay: Duration,
    outcome: Outcome,
}

impl Scripted {
    fn execute<'a>(&'a self, ctx: &'a ActionContext) -> ActionFuture<'a> {
        Box::pin(async move {
            let task = ctx.task().to_string();
            self.log.push(LogEntry::Started {
                task: task.clone(),
                at: Instant::now(),
            });

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let result = match &self.outcome {
                Outcome::Succeed => Ok(Artifacts::none()),
                Outcome::Fail(message) => Err(ActionError::new(message.clone())),
            };

            self.log.push(LogEntry::Finished {
                task,
                at: Instant::now(),
                ok: result.is_ok(),
            });
            result
        })
    }
}

/// Succeeds immediately.
#[derive(Debug, Clone)]
pub struct RecordingAction(Scripted);

impl RecordingAction {
    pub fn new(log: &ExecutionLog) -> Self {
        Self(Scripted {
            log: log.clone(),
            delay: Duration::ZERO,
            outcome: Outcome::Succeed,
        })
    }
}

impl Action for RecordingAction {
    fn describe(&self) -> String {
        "recording".to_string()
    }

    fn execute<'a>(&'a self, ctx: &'a ActionContext) -> ActionFuture<'a> {
        self.0.execute(ctx)
    }
}

/// Fails with a fixed message, optionally after a delay.
#[derive(Debug, Clone)]
pub struct FailingAction(Scripted);

impl FailingAction {
    pub fn new(log: &ExecutionLog, message: impl Into<String>) -> Self {
        Self(Scripted {
            log: log.clone(),
            delay: Duration::ZERO,
            outcome: Outcome::Fail(message.into()),
        })
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.0.delay = delay;
        self
    }
}

impl Action for FailingAction {
    fn describe(&self) -> String {
        "failing".to_string()
    }

    fn execute<'a>(&'a self, ctx: &'a ActionContext) -> ActionFuture<'a> {
        self.0.execute(ctx)
    }
}

/// Sleeps for `delay`, then succeeds.
#[derive(Debug, Clone)]
pub struct SlowAction(Scripted);

impl SlowAction {
    pub fn new(log: &ExecutionLog, delay: Duration) -> Self {
        Self(Scripted {
            log: log.clone(),
            delay,
            outcome: Outcome::Succeed,
        })
    }
}

impl Action for SlowAction {
    fn describe(&self) -> String {
        format!("slow ({:?})", self.0.delay)
    }

    fn execute<'a>(&'a self, ctx: &'a ActionContext) -> ActionFuture<'a> {
        self.0.execute(ctx)
    }
}

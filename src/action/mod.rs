// src/action/mod.rs

//! Leaf units of work.
//!
//! An [`Action`] is the only place where real side effects happen (spawning
//! processes, writing files). The scheduler hands it an [`ActionContext`] and
//! only looks at the returned `Result`; it never inspects what the action
//! actually did.
//!
//! - [`shell`] runs a shell command (style compilation, templating, lint,
//!   tests all go through here).
//! - [`copy`] copies files matching globs into a destination directory.
//! - [`echo`] prints a fixed message.
//! - [`timeout`] wraps any action with a deadline.

use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::graph::TaskName;

pub mod copy;
pub mod echo;
pub mod shell;
pub mod timeout;

pub use copy::CopyAction;
pub use echo::EchoAction;
pub use shell::ShellAction;
pub use timeout::TimeoutAction;

/// Future returned by [`Action::execute`].
pub type ActionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Artifacts, ActionError>> + Send + 'a>>;

/// Shared handle to an action, as stored in the task graph.
pub type ActionRef = Arc<dyn Action>;

/// A named, re-invocable unit of work.
///
/// Implementations must not accumulate state across invocations: the same
/// action is executed again on every watch trigger.
pub trait Action: Send + Sync + fmt::Debug {
    /// Short human-readable description used by `watchflow list`.
    fn describe(&self) -> String;

    /// Run the action once.
    ///
    /// The cancellation token in `ctx` is informational; the scheduler never
    /// interrupts an in-flight action, but long-running actions may choose to
    /// stop early when it fires.
    fn execute<'a>(&'a self, ctx: &'a ActionContext) -> ActionFuture<'a>;
}

/// Everything an action may need from the outside world.
#[derive(Debug, Clone)]
pub struct ActionContext {
    task: TaskName,
    root: PathBuf,
    cancel: CancellationToken,
}

impl ActionContext {
    pub fn new(task: impl Into<TaskName>, root: impl Into<PathBuf>, cancel: CancellationToken) -> Self {
        Self {
            task: task.into(),
            root: root.into(),
            cancel,
        }
    }

    /// Name of the task this action is bound to.
    pub fn task(&self) -> &str {
        &self.task
    }

    /// Project root; relative paths in actions are resolved against it.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

/// Files produced by a successful action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifacts {
    pub paths: Vec<PathBuf>,
}

impl Artifacts {
    /// An action that produced nothing beyond a pass/fail signal.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Run-time failure of a single action.
///
/// Cloneable so it can be stored in a [`crate::scheduler::RunResult`] and
/// handed out to several readers of the run report.
#[derive(Debug, Clone)]
pub struct ActionError {
    message: String,
    cause: Option<Arc<dyn StdError + Send + Sync>>,
}

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(message: impl Into<String>, cause: impl StdError + Send + Sync + 'static) -> Self {
        Self {
            message: message.into(),
            cause: Some(Arc::new(cause)),
        }
    }

    /// A process exited unsuccessfully. `None` means it was killed by a signal.
    pub fn exit_status(code: Option<i32>) -> Self {
        match code {
            Some(code) => Self::new(format!("command exited with status {code}")),
            None => Self::new("command terminated by signal"),
        }
    }

    pub fn timeout(limit: Duration) -> Self {
        Self::new(format!("action timed out after {limit:?}"))
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn has_cause(&self) -> bool {
        self.cause.is_some()
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for ActionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_status_message_includes_code() {
        let err = ActionError::exit_status(Some(3));
        assert_eq!(err.to_string(), "command exited with status 3");
        assert!(err.source().is_none());
    }

    #[test]
    fn cause_is_exposed_as_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = ActionError::with_cause("reading input", io);
        assert_eq!(err.message(), "reading input");
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("no such file"));
    }
}

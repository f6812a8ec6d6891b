// src/watch/reload.rs

//! Reload notification after a successful watch-triggered run.
//!
//! Notifications are fire-and-forget: `notify` must return immediately and
//! any failure is logged and dropped. A broken reload hook never affects the
//! outcome of a run or the state of a binding.

use std::fmt::Debug;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

pub trait ReloadSink: Send + Sync + Debug {
    fn notify(&self, task: &str);
}

/// Used when no `[reload]` section is configured.
#[derive(Debug, Clone, Default)]
pub struct NoopReloadSink;

impl ReloadSink for NoopReloadSink {
    fn notify(&self, task: &str) {
        debug!(task = %task, "no reload sink configured; skipping notification");
    }
}

/// Runs a shell command in the background, e.g. `browser-sync reload`.
///
/// The task name is exported as `WATCHFLOW_TASK` to the command.
#[derive(Debug, Clone)]
pub struct CommandReloadSink {
    cmd: String,
    root: std::path::PathBuf,
}

impl CommandReloadSink {
    pub fn new(cmd: impl Into<String>, root: impl Into<std::path::PathBuf>) -> Self {
        Self {
            cmd: cmd.into(),
            root: root.into(),
        }
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }
}

impl ReloadSink for CommandReloadSink {
    fn notify(&self, task: &str) {
        let mut command = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        };
        command
            .current_dir(&self.root)
            .env("WATCHFLOW_TASK", task)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let task = task.to_string();
        let cmd = self.cmd.clone();

        tokio::spawn(async move {
            match command.status().await {
                Ok(status) if status.success() => {
                    debug!(task = %task, cmd = %cmd, "reload notification sent");
                }
                Ok(status) => {
                    warn!(task = %task, cmd = %cmd, exit_code = status.code().unwrap_or(-1), "reload command failed; ignoring");
                }
                Err(err) => {
                    warn!(task = %task, cmd = %cmd, error = %err, "could not run reload command; ignoring");
                }
            }
        });
    }
}

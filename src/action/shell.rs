// src/action/shell.rs

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use super::{Action, ActionContext, ActionError, ActionFuture, Artifacts};

/// Runs a command through the platform shell in the project root.
///
/// Stdout lines are echoed to our stdout so tool output (lint findings,
/// test results) stays visible; stderr is consumed and logged at debug.
/// A non-zero exit is a failure, which is how "fail on lint errors" and
/// "report test failures" are expressed.
#[derive(Debug, Clone)]
pub struct ShellAction {
    cmd: String,
}

impl ShellAction {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self { cmd: cmd.into() }
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    fn build_command(&self) -> Command {
        if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        }
    }
}

impl Action for ShellAction {
    fn describe(&self) -> String {
        format!("cmd: {}", self.cmd)
    }

    fn execute<'a>(&'a self, ctx: &'a ActionContext) -> ActionFuture<'a> {
        Box::pin(async move {
            info!(task = %ctx.task(), cmd = %self.cmd, "starting process");

            let mut cmd = self.build_command();
            cmd.current_dir(ctx.root())
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);

            let mut child = cmd.spawn().map_err(|e| {
                ActionError::with_cause(format!("failed to spawn `{}`", self.cmd), e)
            })?;

            let stdout_pump = child.stdout.take().map(|stdout| {
                let task = ctx.task().to_string();
                tokio::spawn(async move {
                    let mut lines = BufReader::new(stdout).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        println!("[{task}] {line}");
                    }
                })
            });

            if let Some(stderr) = child.stderr.take() {
                let task = ctx.task().to_string();
                tokio::spawn(async move {
                    let mut lines = BufReader::new(stderr).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        debug!(task = %task, "stderr: {}", line);
                    }
                });
            }

            let status = child.wait().await.map_err(|e| {
                ActionError::with_cause(format!("waiting for `{}`", self.cmd), e)
            })?;

            // Flush remaining stdout before reporting, so output precedes the
            // result line.
            if let Some(pump) = stdout_pump {
                let _ = pump.await;
            }

            info!(
                task = %ctx.task(),
                exit_code = status.code().unwrap_or(-1),
                success = status.success(),
                "process exited"
            );

            if status.success() {
                Ok(Artifacts::none())
            } else {
                Err(ActionError::exit_status(status.code()))
            }
        })
    }
}

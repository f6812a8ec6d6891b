// src/action/echo.rs

use super::{Action, ActionContext, ActionFuture, Artifacts};

/// Prints a fixed message. Handy for smoke-testing a config.
#[derive(Debug, Clone)]
pub struct EchoAction {
    message: String,
}

impl EchoAction {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Action for EchoAction {
    fn describe(&self) -> String {
        format!("echo: {}", self.message)
    }

    fn execute<'a>(&'a self, ctx: &'a ActionContext) -> ActionFuture<'a> {
        Box::pin(async move {
            println!("[{}] {}", ctx.task(), self.message);
            Ok(Artifacts::none())
        })
    }
}

// src/action/timeout.rs

use std::time::Duration;

use tracing::warn;

use super::{Action, ActionContext, ActionError, ActionFuture, ActionRef};

/// Bounds another action's run time.
///
/// When the limit elapses the inner future is dropped (which kills a child
/// process spawned with `kill_on_drop`) and the run fails like any other
/// action error.
#[derive(Debug, Clone)]
pub struct TimeoutAction {
    inner: ActionRef,
    limit: Duration,
}

impl TimeoutAction {
    pub fn new(inner: ActionRef, limit: Duration) -> Self {
        Self { inner, limit }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }
}

impl Action for TimeoutAction {
    fn describe(&self) -> String {
        format!("{} (timeout {:?})", self.inner.describe(), self.limit)
    }

    fn execute<'a>(&'a self, ctx: &'a ActionContext) -> ActionFuture<'a> {
        Box::pin(async move {
            match tokio::time::timeout(self.limit, self.inner.execute(ctx)).await {
                Ok(result) => result,
                Err(_elapsed) => {
                    warn!(task = %ctx.task(), limit = ?self.limit, "action timed out");
                    Err(ActionError::timeout(self.limit))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::action::Artifacts;

    #[derive(Debug)]
    struct Sleepy(Duration);

    impl Action for Sleepy {
        fn describe(&self) -> String {
            "sleepy".to_string()
        }

        fn execute<'a>(&'a self, _ctx: &'a ActionContext) -> ActionFuture<'a> {
            Box::pin(async move {
                tokio::time::sleep(self.0).await;
                Ok(Artifacts::none())
            })
        }
    }

    fn ctx() -> ActionContext {
        ActionContext::new("slow", ".", CancellationToken::new())
    }

    #[tokio::test(start_paused = true)]
    async fn slow_action_becomes_timeout_error() {
        let action = TimeoutAction::new(Arc::new(Sleepy(Duration::from_secs(10))), Duration::from_secs(1));
        let err = action.execute(&ctx()).await.unwrap_err();
        assert!(err.message().contains("timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn fast_action_passes_through() {
        let action = TimeoutAction::new(Arc::new(Sleepy(Duration::from_millis(10))), Duration::from_secs(1));
        assert!(action.execute(&ctx()).await.is_ok());
    }
}

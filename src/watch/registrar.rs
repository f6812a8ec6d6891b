// src/watch/registrar.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::graph::TaskName;
use crate::scheduler::{RunReport, Scheduler};

use super::actor::BindingActor;
use super::machine::BindingState;
use super::patterns::WatchProfile;
use super::reload::ReloadSink;

/// Default quiet period after the last change before a bound task runs.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Glob patterns bound to one task.
#[derive(Debug, Clone)]
pub struct WatchBinding {
    profile: WatchProfile,
    task: TaskName,
    debounce: Duration,
    reload: bool,
}

impl WatchBinding {
    pub fn new(profile: WatchProfile, task: impl Into<TaskName>) -> Self {
        Self {
            profile,
            task: task.into(),
            debounce: DEFAULT_DEBOUNCE,
            reload: false,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Notify the reload sink after each successful run.
    pub fn with_reload(mut self, reload: bool) -> Self {
        self.reload = reload;
        self
    }

    pub fn profile(&self) -> &WatchProfile {
        &self.profile
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn reload(&self) -> bool {
        self.reload
    }
}

/// Notifications emitted by binding actors.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    RunStarted { binding: usize, task: TaskName },
    RunFinished { binding: usize, task: TaskName, report: RunReport },
}

#[derive(Debug)]
struct Route {
    profile: WatchProfile,
    tx: mpsc::UnboundedSender<()>,
}

/// Cloneable fan-out from changed paths to binding actors.
///
/// Handed to the filesystem watcher; sending never blocks, and sends to an
/// actor that already stopped are dropped silently.
#[derive(Debug, Clone)]
pub struct TriggerRouter {
    routes: Arc<Vec<Route>>,
}

impl TriggerRouter {
    /// Trigger every binding whose globs match `rel_path`. Returns how many
    /// bindings were triggered.
    pub fn notify_path(&self, rel_path: &str) -> usize {
        let mut triggered = 0;
        for (index, route) in self.routes.iter().enumerate() {
            if route.profile.matches(rel_path) && route.tx.send(()).is_ok() {
                debug!(binding = index, path = %rel_path, "path matched binding");
                triggered += 1;
            }
        }
        triggered
    }

    /// Trigger one binding directly, bypassing glob matching.
    pub fn trigger(&self, index: usize) -> bool {
        self.routes
            .get(index)
            .is_some_and(|route| route.tx.send(()).is_ok())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[derive(Debug)]
struct BindingHandle {
    task: TaskName,
    state: watch::Receiver<BindingState>,
    join: JoinHandle<()>,
}

/// Owns one actor per binding and the shared shutdown token.
#[derive(Debug)]
pub struct WatchRegistrar {
    handles: Vec<BindingHandle>,
    router: TriggerRouter,
    shutdown: CancellationToken,
}

impl WatchRegistrar {
    /// Spawn the binding actors. Must be called inside a tokio runtime.
    ///
    /// Fails with [`crate::errors::WatchflowError::UnknownTask`] if a binding
    /// names a task missing from the scheduler's graph; nothing is spawned in
    /// that case.
    pub fn start(
        scheduler: Scheduler,
        bindings: Vec<WatchBinding>,
        reload: Arc<dyn ReloadSink>,
        events: Option<mpsc::UnboundedSender<WatchEvent>>,
    ) -> Result<Self> {
        let tasks = bindings
            .iter()
            .map(|binding| scheduler.graph().resolve(binding.task()))
            .collect::<Result<Vec<_>>>()?;

        let shutdown = CancellationToken::new();
        let mut routes = Vec::with_capacity(bindings.len());
        let mut handles = Vec::with_capacity(bindings.len());

        for (index, (binding, task)) in bindings.into_iter().zip(tasks).enumerate() {
            let (tx, rx) = mpsc::unbounded_channel();
            let (state_tx, state_rx) = watch::channel(BindingState::Idle);

            routes.push(Route {
                profile: binding.profile().clone(),
                tx,
            });

            let task_name = binding.task().to_string();
            let actor = BindingActor {
                index,
                binding,
                task,
                scheduler: scheduler.clone(),
                reload: Arc::clone(&reload),
                triggers: rx,
                state_tx,
                events: events.clone(),
                shutdown: shutdown.clone(),
            };

            handles.push(BindingHandle {
                task: task_name,
                state: state_rx,
                join: tokio::spawn(actor.run()),
            });
        }

        info!(bindings = handles.len(), "watch registrar started");

        Ok(Self {
            handles,
            router: TriggerRouter {
                routes: Arc::new(routes),
            },
            shutdown,
        })
    }

    pub fn router(&self) -> TriggerRouter {
        self.router.clone()
    }

    pub fn notify_path(&self, rel_path: &str) -> usize {
        self.router.notify_path(rel_path)
    }

    pub fn trigger(&self, index: usize) -> bool {
        self.router.trigger(index)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn task_of(&self, index: usize) -> Option<&str> {
        self.handles.get(index).map(|h| h.task.as_str())
    }

    pub fn state(&self, index: usize) -> Option<BindingState> {
        self.handles.get(index).map(|h| *h.state.borrow())
    }

    /// Receiver that observes every state change of a binding.
    pub fn state_receiver(&self, index: usize) -> Option<watch::Receiver<BindingState>> {
        self.handles.get(index).map(|h| h.state.clone())
    }

    /// Token that, once cancelled, stops all bindings.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop accepting triggers, let in-flight runs finish, and wait for all
    /// actors to exit.
    pub async fn shutdown(self) {
        info!("watch registrar shutting down");
        self.shutdown.cancel();

        for handle in self.handles {
            if let Err(err) = handle.join.await {
                warn!(task = %handle.task, error = %err, "binding actor ended abnormally");
            }
        }

        info!("watch registrar stopped");
    }
}

// src/watch/actor.rs

//! Async shell around [`BindingMachine`].
//!
//! Each binding gets its own actor task. All state transitions for a binding
//! happen inside that single task, so they are atomic with respect to each
//! other; distinct bindings never wait on one another.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::graph::Task;
use crate::scheduler::{RunReport, Scheduler};

use super::machine::{BindingCommand, BindingMachine, BindingState};
use super::registrar::{WatchBinding, WatchEvent};
use super::reload::ReloadSink;

pub(crate) struct BindingActor {
    pub(crate) index: usize,
    pub(crate) binding: WatchBinding,
    pub(crate) task: Arc<Task>,
    pub(crate) scheduler: Scheduler,
    pub(crate) reload: Arc<dyn ReloadSink>,
    pub(crate) triggers: mpsc::UnboundedReceiver<()>,
    pub(crate) state_tx: watch::Sender<BindingState>,
    pub(crate) events: Option<mpsc::UnboundedSender<WatchEvent>>,
    pub(crate) shutdown: CancellationToken,
}

impl BindingActor {
    pub(crate) async fn run(mut self) {
        let mut machine = BindingMachine::new(self.binding.debounce());
        let mut deadline: Option<Instant> = None;
        let mut running = false;
        let (done_tx, mut done_rx) = mpsc::channel::<RunReport>(1);

        debug!(binding = self.index, task = %self.task.name(), "binding actor started");

        loop {
            let command = tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => break,

                Some(report) = done_rx.recv() => {
                    running = false;
                    self.publish_finished(report);
                    machine.on_run_finished(Instant::now())
                }

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    deadline = None;
                    machine.on_timer(Instant::now())
                }

                msg = self.triggers.recv() => match msg {
                    Some(()) => machine.on_change(Instant::now()),
                    None => {
                        debug!(binding = self.index, "trigger channel closed");
                        break;
                    }
                },
            };

            match command {
                Some(BindingCommand::ArmTimer(at)) => deadline = Some(at),
                Some(BindingCommand::StartRun) => {
                    deadline = None;
                    running = true;
                    self.start_run(done_tx.clone());
                }
                None => {}
            }

            self.state_tx.send_replace(machine.state());
        }

        // Graceful stop: drop pending triggers, but let a run in flight
        // finish. The run saw the same token, so it starts nothing new.
        if running {
            info!(binding = self.index, task = %self.task.name(), "waiting for in-flight run before stopping");
            if let Some(report) = done_rx.recv().await {
                self.publish_finished(report);
            }
        }

        machine.reset();
        self.state_tx.send_replace(machine.state());
        debug!(binding = self.index, "binding actor stopped");
    }

    fn start_run(&self, done_tx: mpsc::Sender<RunReport>) {
        let scheduler = self.scheduler.clone();
        let task = Arc::clone(&self.task);
        let cancel = self.shutdown.clone();

        info!(binding = self.index, task = %task.name(), "watch trigger -> running task");
        if let Some(events) = &self.events {
            let _ = events.send(WatchEvent::RunStarted {
                binding: self.index,
                task: task.name().to_string(),
            });
        }

        tokio::spawn(async move {
            let report = scheduler.run_task(task, cancel).await;
            if done_tx.send(report).await.is_err() {
                warn!("binding actor went away before run completed");
            }
        });
    }

    fn publish_finished(&self, report: RunReport) {
        if report.success() {
            if self.binding.reload() {
                self.reload.notify(self.task.name());
            }
        } else {
            warn!(binding = self.index, task = %self.task.name(), "watch-triggered run failed");
        }

        if let Some(events) = &self.events {
            let _ = events.send(WatchEvent::RunFinished {
                binding: self.index,
                task: self.task.name().to_string(),
                report,
            });
        }
    }
}

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use watchflow::graph::{TaskGraph, TaskRegistry};
use watchflow::scheduler::Scheduler;

use crate::actions::{ExecutionLog, FailingAction, RecordingAction, SlowAction};

/// Fluent wrapper around [`TaskRegistry`] wired to one [`ExecutionLog`].
///
/// Panics on registration errors; use `TaskRegistry` directly to test those.
pub struct RegistryBuilder {
    registry: TaskRegistry,
    log: ExecutionLog,
}

impl RegistryBuilder {
    pub fn new(log: &ExecutionLog) -> Self {
        Self {
            registry: TaskRegistry::new(),
            log: log.clone(),
        }
    }

    pub fn ok(mut self, name: &str) -> Self {
        self.registry
            .register_action(name, RecordingAction::new(&self.log))
            .expect("register ok action");
        self
    }

    pub fn fail(mut self, name: &str, message: &str) -> Self {
        self.registry
            .register_action(name, FailingAction::new(&self.log, message))
            .expect("register failing action");
        self
    }

    pub fn fail_after(mut self, name: &str, message: &str, delay: Duration) -> Self {
        self.registry
            .register_action(name, FailingAction::new(&self.log, message).after(delay))
            .expect("register failing action");
        self
    }

    pub fn slow(mut self, name: &str, delay: Duration) -> Self {
        self.registry
            .register_action(name, SlowAction::new(&self.log, delay))
            .expect("register slow action");
        self
    }

    pub fn sequence(mut self, name: &str, children: &[&str]) -> Self {
        self.registry
            .register_sequence(name, children.iter().copied())
            .expect("register sequence");
        self
    }

    pub fn parallel(mut self, name: &str, children: &[&str]) -> Self {
        self.registry
            .register_parallel(name, children.iter().copied())
            .expect("register parallel");
        self
    }

    pub fn graph(self) -> Arc<TaskGraph> {
        Arc::new(self.registry.freeze())
    }

    /// Scheduler rooted at the current directory.
    pub fn scheduler(self) -> Scheduler {
        Scheduler::new(self.graph(), ".")
    }
}

/// Write `contents` to `dir/Watchflow.toml` and return the path.
pub fn write_config(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("Watchflow.toml");
    std::fs::write(&path, contents).expect("write config");
    path
}

// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Everything here is a *startup* error: bad config, bad registration, a
//! watcher that could not be installed. Run-time failures of individual
//! actions never show up as a `WatchflowError`; they are folded into
//! [`crate::scheduler::RunResult`] values instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchflowError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Task already registered: {0}")]
    DuplicateTask(String),

    #[error("Task '{task}' references unknown child '{child}'")]
    UnknownChild { task: String, child: String },

    #[error("Task not found: {0}")]
    UnknownTask(String),

    #[error("Cycle detected in task graph: {0}")]
    Cycle(String),

    #[error("Invalid glob pattern: {0}")]
    Pattern(String),

    #[error("File watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, WatchflowError>;

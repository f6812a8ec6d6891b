// src/graph/mod.rs

//! Task declarations.
//!
//! - [`task`] holds the tagged [`TaskKind`] variant and the [`Task`] node.
//! - [`registry`] is the two-phase store: a mutable [`TaskRegistry`] during
//!   startup, frozen into an immutable [`TaskGraph`] before anything runs.

pub mod registry;
pub mod task;

/// Canonical task name type used throughout the crate.
pub type TaskName = String;

pub use registry::{TaskGraph, TaskRegistry};
pub use task::{Task, TaskKind};

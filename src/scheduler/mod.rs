// src/scheduler/mod.rs

//! Task execution.
//!
//! - [`result`] defines the per-task [`RunResult`] record and [`RunError`].
//! - [`report`] aggregates results for one invocation into a [`RunReport`].
//! - [`runner`] holds the [`Scheduler`], which walks the task graph and
//!   applies sequence / parallel semantics.

pub mod report;
pub mod result;
pub mod runner;

pub use report::RunReport;
pub use result::{RunError, RunResult, RunStatus};
pub use runner::Scheduler;

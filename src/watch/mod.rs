// src/watch/mod.rs

//! File watching and debounced re-runs.
//!
//! - [`patterns`] compiles a binding's watch / exclude globs.
//! - [`machine`] is the pure `Idle -> Triggered -> Debouncing -> Running`
//!   state machine for one binding.
//! - [`actor`] drives a machine on tokio and runs the bound task.
//! - [`registrar`] owns one actor per binding and routes triggers to them.
//! - [`watcher`] turns `notify` events into root-relative paths for the
//!   registrar.
//! - [`reload`] is the best-effort reload sink notified after a successful
//!   run.

pub(crate) mod actor;
pub mod machine;
pub mod patterns;
pub mod registrar;
pub mod reload;
pub mod watcher;

pub use machine::{BindingCommand, BindingMachine, BindingState};
pub use patterns::{WatchProfile, relative_path};
pub use registrar::{DEFAULT_DEBOUNCE, TriggerRouter, WatchBinding, WatchEvent, WatchRegistrar};
pub use reload::{CommandReloadSink, NoopReloadSink, ReloadSink};
pub use watcher::{WatcherHandle, spawn_watcher};

// src/config/mod.rs

//! TOML configuration: data model, loading, validation, and conversion into
//! a task registry plus watch bindings.

pub mod build;
pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use build::{Project, build_bindings, build_registry, build_reload_sink, resolve_root};
pub use duration::parse_duration;
pub use loader::{default_config_path, load_and_validate, load_from_path, parse_str};
pub use model::{ConfigFile, ConfigSection, RawConfigFile, TaskConfig, WatchConfig};

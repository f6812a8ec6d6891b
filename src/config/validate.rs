// src/config/validate.rs

use crate::config::duration::parse_duration;
use crate::config::model::{ConfigFile, RawConfigFile, TaskConfig};
use crate::errors::{Result, WatchflowError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = WatchflowError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

/// Checks that only need the file itself.
///
/// Graph-level problems (children referenced before they exist, cycles) are
/// reported when the registry is built, by the same code path that handles
/// programmatic registration.
fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    for (name, task) in cfg.task.iter() {
        validate_task(name, task)?;
    }
    validate_watch_bindings(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(WatchflowError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.debounce_ms == 0 {
        return Err(WatchflowError::ConfigError(
            "[config].debounce_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    if let Some(timeout) = &cfg.config.action_timeout {
        parse_duration(timeout).map_err(|e| {
            WatchflowError::ConfigError(format!("[config].action_timeout: {e}"))
        })?;
    }

    if let Some(reload) = &cfg.reload {
        if reload.cmd.trim().is_empty() {
            return Err(WatchflowError::ConfigError(
                "[reload].cmd must not be empty".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_task(name: &str, task: &TaskConfig) -> Result<()> {
    let kinds = task.kinds_set();
    match kinds.len() {
        1 => {}
        0 => {
            return Err(WatchflowError::ConfigError(format!(
                "task '{name}' must set one of `cmd`, `echo`, `copy`, `sequence`, `parallel`"
            )));
        }
        _ => {
            return Err(WatchflowError::ConfigError(format!(
                "task '{name}' sets more than one of {kinds:?}; pick one"
            )));
        }
    }

    if let Some(cmd) = &task.cmd {
        if cmd.trim().is_empty() {
            return Err(WatchflowError::ConfigError(format!(
                "task '{name}' has an empty `cmd`"
            )));
        }
    }

    if let Some(copy) = &task.copy {
        if copy.from.is_empty() {
            return Err(WatchflowError::ConfigError(format!(
                "task '{name}' has an empty `copy.from`"
            )));
        }
    }

    if let Some(timeout) = &task.timeout {
        if task.is_composite() {
            return Err(WatchflowError::ConfigError(format!(
                "task '{name}': `timeout` only applies to action tasks"
            )));
        }
        parse_duration(timeout).map_err(|e| {
            WatchflowError::ConfigError(format!("task '{name}' timeout: {e}"))
        })?;
    }

    if task.children().iter().any(|child| child == name) {
        return Err(WatchflowError::Cycle(format!(
            "task '{name}' lists itself as a child"
        )));
    }

    Ok(())
}

fn validate_watch_bindings(cfg: &RawConfigFile) -> Result<()> {
    for (index, watch) in cfg.watch.iter().enumerate() {
        if !cfg.task.contains_key(&watch.task) {
            return Err(WatchflowError::UnknownTask(watch.task.clone()));
        }
        if watch.glob.is_empty() {
            return Err(WatchflowError::ConfigError(format!(
                "[[watch]] #{index} (task '{}') has no glob",
                watch.task
            )));
        }
        if watch.debounce_ms == Some(0) {
            return Err(WatchflowError::ConfigError(format!(
                "[[watch]] #{index} (task '{}'): debounce_ms must be >= 1",
                watch.task
            )));
        }
    }
    Ok(())
}

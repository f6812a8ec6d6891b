// src/config/build.rs

//! Turn a validated [`ConfigFile`] into runtime objects: the task registry,
//! watch bindings and reload sink.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::action::{ActionRef, CopyAction, EchoAction, ShellAction, TimeoutAction};
use crate::config::duration::parse_duration;
use crate::config::model::{ConfigFile, TaskConfig};
use crate::errors::{Result, WatchflowError};
use crate::graph::{TaskGraph, TaskKind, TaskRegistry};
use crate::scheduler::Scheduler;
use crate::watch::{CommandReloadSink, NoopReloadSink, ReloadSink, WatchBinding, WatchProfile};

/// Register every task in dependency order (children first).
///
/// Tasks in the file may reference each other in any order, so a
/// topological sort decides the registration order. A cycle is reported as
/// [`WatchflowError::Cycle`]; a child that is not declared anywhere surfaces
/// from the registry as [`WatchflowError::UnknownChild`].
pub fn build_registry(cfg: &ConfigFile) -> Result<TaskRegistry> {
    // Edge direction: child -> parent, so children sort first.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.tasks().keys() {
        graph.add_node(name.as_str());
    }
    for (name, task) in cfg.tasks().iter() {
        for child in task.children() {
            graph.add_edge(child.as_str(), name.as_str(), ());
        }
    }

    let order = toposort(&graph, None).map_err(|cycle| {
        WatchflowError::Cycle(format!(
            "cycle detected in task graph involving task '{}'",
            cycle.node_id()
        ))
    })?;

    let default_timeout = cfg
        .config_section()
        .action_timeout
        .as_deref()
        .map(parse_duration)
        .transpose()
        .map_err(WatchflowError::ConfigError)?;

    let mut registry = TaskRegistry::new();
    for name in order {
        // Undeclared children are graph nodes too; skip them here and let
        // the parent's registration report them.
        let Some(task) = cfg.tasks().get(name) else {
            continue;
        };
        let kind = task_kind(name, task, default_timeout)?;
        registry.register(name, kind)?;
    }

    debug!(tasks = registry.len(), "registry built from config");
    Ok(registry)
}

fn task_kind(name: &str, task: &TaskConfig, default_timeout: Option<Duration>) -> Result<TaskKind> {
    if let Some(children) = &task.sequence {
        return Ok(TaskKind::Sequence(children.clone()));
    }
    if let Some(children) = &task.parallel {
        return Ok(TaskKind::Parallel(children.clone()));
    }

    let action: ActionRef = if let Some(cmd) = &task.cmd {
        Arc::new(ShellAction::new(cmd.clone()))
    } else if let Some(message) = &task.echo {
        Arc::new(EchoAction::new(message.clone()))
    } else if let Some(copy) = &task.copy {
        Arc::new(CopyAction::new(&copy.from.to_vec(), copy.to.clone())?)
    } else {
        return Err(WatchflowError::ConfigError(format!(
            "task '{name}' has no action"
        )));
    };

    let timeout = match &task.timeout {
        Some(s) => Some(parse_duration(s).map_err(|e| {
            WatchflowError::ConfigError(format!("task '{name}' timeout: {e}"))
        })?),
        None => default_timeout,
    };

    Ok(match timeout {
        Some(limit) => TaskKind::Action(Arc::new(TimeoutAction::new(action, limit))),
        None => TaskKind::Action(action),
    })
}

/// Compile the `[[watch]]` entries.
pub fn build_bindings(cfg: &ConfigFile) -> Result<Vec<WatchBinding>> {
    let default_debounce = cfg.config_section().debounce_ms;

    cfg.watches()
        .iter()
        .map(|w| {
            let exclude = w.exclude.as_ref().map(|p| p.to_vec()).unwrap_or_default();
            let profile = WatchProfile::new(&w.glob.to_vec(), &exclude)?;
            let debounce = Duration::from_millis(w.debounce_ms.unwrap_or(default_debounce));
            Ok(WatchBinding::new(profile, w.task.clone())
                .with_debounce(debounce)
                .with_reload(w.reload))
        })
        .collect()
}

/// Reload sink from `[reload]`, or a no-op sink.
pub fn build_reload_sink(cfg: &ConfigFile, root: &Path) -> Arc<dyn ReloadSink> {
    match cfg.reload_section() {
        Some(reload) => Arc::new(CommandReloadSink::new(reload.cmd.clone(), root)),
        None => Arc::new(NoopReloadSink),
    }
}

/// Project root: `[config].root` resolved against the config file's
/// directory, or that directory itself.
pub fn resolve_root(cfg: &ConfigFile, config_dir: &Path) -> PathBuf {
    match &cfg.config_section().root {
        Some(root) => config_dir.join(root),
        None => config_dir.to_path_buf(),
    }
}

/// Everything the CLI needs from one config file, ready to run.
#[derive(Debug, Clone)]
pub struct Project {
    pub graph: Arc<TaskGraph>,
    pub bindings: Vec<WatchBinding>,
    pub reload: Arc<dyn ReloadSink>,
    pub root: PathBuf,
    /// `description` values keyed by task name.
    pub descriptions: BTreeMap<String, String>,
}

impl Project {
    /// Build the registry, bindings and reload sink. `config_dir` is the
    /// directory relative paths in the file are resolved against.
    pub fn from_config(cfg: &ConfigFile, config_dir: &Path) -> Result<Self> {
        let graph = Arc::new(build_registry(cfg)?.freeze());
        let bindings = build_bindings(cfg)?;
        let root = resolve_root(cfg, config_dir);
        let reload = build_reload_sink(cfg, &root);

        let descriptions = cfg
            .tasks()
            .iter()
            .filter_map(|(name, task)| {
                task.description
                    .as_ref()
                    .map(|d| (name.clone(), d.clone()))
            })
            .collect();

        Ok(Self {
            graph,
            bindings,
            reload,
            root,
            descriptions,
        })
    }

    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new(Arc::clone(&self.graph), self.root.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::parse_str;

    fn config(text: &str) -> ConfigFile {
        ConfigFile::try_from(parse_str(text).unwrap()).unwrap()
    }

    #[test]
    fn composites_may_be_declared_before_children() {
        // BTreeMap order puts "all" first; toposort must still register
        // "css" and "html" before it.
        let cfg = config(
            r#"
            [task.all]
            parallel = ["css", "html"]

            [task.css]
            echo = "css"

            [task.html]
            echo = "html"
            "#,
        );
        let graph = build_registry(&cfg).unwrap().freeze();
        let order: Vec<&str> = graph.tasks().map(|t| t.name()).collect();
        assert_eq!(order.last(), Some(&"all"));
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn cycle_between_tasks_is_rejected() {
        let cfg = config(
            r#"
            [task.a]
            sequence = ["b"]

            [task.b]
            sequence = ["a"]
            "#,
        );
        let err = build_registry(&cfg).unwrap_err();
        assert!(matches!(err, WatchflowError::Cycle(_)), "got {err:?}");
    }

    #[test]
    fn missing_child_is_unknown_child() {
        let cfg = config(
            r#"
            [task.default]
            sequence = ["lint", "ghost"]

            [task.lint]
            cmd = "true"
            "#,
        );
        match build_registry(&cfg).unwrap_err() {
            WatchflowError::UnknownChild { task, child } => {
                assert_eq!(task, "default");
                assert_eq!(child, "ghost");
            }
            other => panic!("expected UnknownChild, got {other:?}"),
        }
    }

    #[test]
    fn timeouts_wrap_actions() {
        let cfg = config(
            r#"
            [config]
            action_timeout = "30s"

            [task.test]
            cmd = "cargo test"
            timeout = "5s"

            [task.lint]
            cmd = "eslint ."
            "#,
        );
        let graph = build_registry(&cfg).unwrap().freeze();
        let describe = |name: &str| match graph.resolve(name).unwrap().kind() {
            TaskKind::Action(action) => action.describe(),
            other => panic!("expected action, got {}", other.label()),
        };
        assert!(describe("test").contains("5s"), "{}", describe("test"));
        assert!(describe("lint").contains("30s"), "{}", describe("lint"));
    }

    #[test]
    fn bindings_inherit_default_debounce() {
        let cfg = config(
            r#"
            [config]
            debounce_ms = 250

            [task.css]
            echo = "css"

            [[watch]]
            glob = "sass/**/*.scss"
            task = "css"
            reload = true

            [[watch]]
            glob = ["views/*.ejs"]
            task = "css"
            debounce_ms = 20
            "#,
        );
        let bindings = build_bindings(&cfg).unwrap();
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].debounce(), Duration::from_millis(250));
        assert!(bindings[0].reload());
        assert!(bindings[0].profile().matches("sass/site/main.scss"));
        assert_eq!(bindings[1].debounce(), Duration::from_millis(20));
        assert!(!bindings[1].reload());
    }

    #[test]
    fn root_is_relative_to_config_dir() {
        let cfg = config(
            r#"
            [config]
            root = "site"

            [task.hello]
            echo = "hi"
            "#,
        );
        assert_eq!(resolve_root(&cfg, Path::new("/proj")), PathBuf::from("/proj/site"));
    }
}

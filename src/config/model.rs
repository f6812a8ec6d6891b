// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// debounce_ms = 100
/// action_timeout = "60s"
///
/// [reload]
/// cmd = "browser-sync reload"
///
/// [task.css]
/// cmd = "sass sass:public/stylesheets"
///
/// [task.html]
/// cmd = "ejs views/index.ejs -o public/index.html"
///
/// [task.assets]
/// parallel = ["css", "html"]
///
/// [[watch]]
/// glob = "sass/**/*.scss"
/// task = "css"
/// reload = true
/// ```
///
/// Deserialized as-is into a [`RawConfigFile`]; a validated
/// [`ConfigFile`] is produced by `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub reload: Option<ReloadSection>,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,

    /// All `[[watch]]` bindings, in file order.
    #[serde(default)]
    pub watch: Vec<WatchConfig>,
}

/// Validated configuration. Only constructible through `TryFrom`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    reload: Option<ReloadSection>,
    task: BTreeMap<String, TaskConfig>,
    watch: Vec<WatchConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            config: raw.config,
            reload: raw.reload,
            task: raw.task,
            watch: raw.watch,
        }
    }

    pub fn config_section(&self) -> &ConfigSection {
        &self.config
    }

    pub fn reload_section(&self) -> Option<&ReloadSection> {
        self.reload.as_ref()
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }

    pub fn watches(&self) -> &[WatchConfig] {
        &self.watch
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Quiet period after the last change before a bound task runs.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Default per-action timeout (e.g. `"30s"`); none if unset.
    #[serde(default)]
    pub action_timeout: Option<String>,

    /// Project root, relative to the config file's directory.
    #[serde(default)]
    pub root: Option<String>,
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            action_timeout: None,
            root: None,
        }
    }
}

/// `[reload]` section: command run after successful watch runs that opted
/// in with `reload = true`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReloadSection {
    pub cmd: String,
}

/// `[task.<name>]` section. Exactly one of `cmd`, `echo`, `copy`,
/// `sequence` or `parallel` must be set.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TaskConfig {
    /// Shell command to execute.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Message to print.
    #[serde(default)]
    pub echo: Option<String>,

    /// Files to copy.
    #[serde(default)]
    pub copy: Option<CopyConfig>,

    /// Child tasks run one after another, stopping at the first failure.
    #[serde(default)]
    pub sequence: Option<Vec<String>>,

    /// Child tasks run concurrently.
    #[serde(default)]
    pub parallel: Option<Vec<String>>,

    /// Per-action timeout, overriding `[config].action_timeout`.
    #[serde(default)]
    pub timeout: Option<String>,

    /// Free-form text shown by `watchflow list`.
    #[serde(default)]
    pub description: Option<String>,
}

impl TaskConfig {
    /// Names of the kind keys that are set, for validation messages.
    pub fn kinds_set(&self) -> Vec<&'static str> {
        let mut kinds = Vec::new();
        if self.cmd.is_some() {
            kinds.push("cmd");
        }
        if self.echo.is_some() {
            kinds.push("echo");
        }
        if self.copy.is_some() {
            kinds.push("copy");
        }
        if self.sequence.is_some() {
            kinds.push("sequence");
        }
        if self.parallel.is_some() {
            kinds.push("parallel");
        }
        kinds
    }

    /// Child task names for composite tasks; empty for actions.
    pub fn children(&self) -> &[String] {
        self.sequence
            .as_deref()
            .or(self.parallel.as_deref())
            .unwrap_or(&[])
    }

    pub fn is_composite(&self) -> bool {
        self.sequence.is_some() || self.parallel.is_some()
    }
}

/// `copy = { from = [...], to = "..." }`.
#[derive(Debug, Clone, Deserialize)]
pub struct CopyConfig {
    pub from: Patterns,
    pub to: String,
}

/// `[[watch]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    pub glob: Patterns,

    #[serde(default)]
    pub exclude: Option<Patterns>,

    pub task: String,

    /// Notify the reload sink after each successful run.
    #[serde(default)]
    pub reload: bool,

    /// Overrides `[config].debounce_ms` for this binding.
    #[serde(default)]
    pub debounce_ms: Option<u64>,
}

/// A single glob or a list of globs.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Patterns {
    One(String),
    Many(Vec<String>),
}

impl Patterns {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Patterns::One(p) => vec![p.clone()],
            Patterns::Many(ps) => ps.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Patterns::One(p) => p.is_empty(),
            Patterns::Many(ps) => ps.is_empty(),
        }
    }
}


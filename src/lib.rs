// src/lib.rs

pub mod action;
pub mod cli;
pub mod config;
pub mod errors;
pub mod graph;
pub mod logging;
pub mod scheduler;
pub mod signals;
pub mod watch;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, Command};
use crate::config::{Project, load_and_validate};
use crate::errors::WatchflowError;
use crate::graph::TaskKind;
use crate::scheduler::RunReport;
use crate::watch::{WatchEvent, WatchRegistrar, spawn_watcher};

/// How a CLI invocation ended, mapped to the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Exit 0.
    Success,
    /// Exit 1: a task failed or was cancelled.
    Failed,
    /// Exit 2: the requested task is not in the graph.
    UnknownTask,
}

impl Outcome {
    pub fn code(self) -> u8 {
        match self {
            Outcome::Success => 0,
            Outcome::Failed => 1,
            Outcome::UnknownTask => 2,
        }
    }

    pub fn for_report(report: &RunReport) -> Self {
        if report.success() {
            Outcome::Success
        } else {
            Outcome::Failed
        }
    }
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        ExitCode::from(outcome.code())
    }
}

/// High-level entry point used by `main.rs`.
///
/// Startup errors (unreadable config, invalid tasks or bindings) are
/// returned as `Err`; everything after startup is reported as an
/// [`Outcome`].
pub async fn run(args: CliArgs) -> Result<Outcome> {
    let project = load_project(&args.config)?;

    match args.command {
        Command::Run { task } => run_once(&project, &task).await,
        Command::Watch => watch(project).await,
        Command::List => {
            print!("{}", render_listing(&project));
            Ok(Outcome::Success)
        }
    }
}

/// Load, validate and build a project from a config file.
pub fn load_project(config_path: &Path) -> Result<Project> {
    info!("loading config from {:?}", config_path);
    let cfg = load_and_validate(config_path)
        .with_context(|| format!("invalid config {}", config_path.display()))?;

    let project = Project::from_config(&cfg, &config_root_dir(config_path))
        .with_context(|| format!("failed to build tasks from {}", config_path.display()))?;

    debug!(
        tasks = project.graph.len(),
        bindings = project.bindings.len(),
        root = ?project.root,
        "project loaded"
    );
    Ok(project)
}

async fn run_once(project: &Project, task: &str) -> Result<Outcome> {
    let report = match project.scheduler().run(task).await {
        Ok(report) => report,
        Err(WatchflowError::UnknownTask(name)) => {
            eprintln!("watchflow: unknown task '{name}'");
            let known: Vec<&str> = project.graph.tasks().map(|t| t.name()).collect();
            eprintln!("known tasks: {}", known.join(", "));
            return Ok(Outcome::UnknownTask);
        }
        Err(err) => return Err(err.into()),
    };

    print_report(&report);
    Ok(Outcome::for_report(&report))
}

fn print_report(report: &RunReport) {
    let summary = report.summary();
    if report.success() {
        println!("{summary}");
    } else {
        eprintln!("{summary}");
    }
}

async fn watch(project: Project) -> Result<Outcome> {
    watch_until(project, signals::wait_for_shutdown_signal()).await
}

/// Watch the project root until `shutdown` resolves.
///
/// Without bindings nothing is watched, but the call still blocks until
/// shutdown like a watch with bindings would.
pub async fn watch_until<F>(project: Project, shutdown: F) -> Result<Outcome>
where
    F: Future<Output = std::io::Result<()>>,
{
    if project.bindings.is_empty() {
        warn!("no [[watch]] bindings configured; nothing to watch");
        println!("watchflow: no watch bindings, press Ctrl-C to stop");
        if let Err(err) = shutdown.await {
            warn!(error = %err, "signal handler failed; shutting down");
        }
        info!("shutdown requested");
        return Ok(Outcome::Success);
    }

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let registrar = WatchRegistrar::start(
        project.scheduler(),
        project.bindings.clone(),
        project.reload.clone(),
        Some(events_tx),
    )?;

    let _watcher = spawn_watcher(project.root.clone(), registrar.router())
        .with_context(|| format!("failed to watch {}", project.root.display()))?;

    println!(
        "watchflow: watching {} ({} bindings), press Ctrl-C to stop",
        project.root.display(),
        registrar.len()
    );

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            res = &mut shutdown => {
                if let Err(err) = res {
                    warn!(error = %err, "signal handler failed; shutting down");
                }
                info!("shutdown requested");
                break;
            }
            Some(event) = events_rx.recv() => print_watch_event(&event),
        }
    }

    registrar.shutdown().await;

    // Reports from runs that were in flight during shutdown.
    while let Ok(event) = events_rx.try_recv() {
        print_watch_event(&event);
    }

    Ok(Outcome::Success)
}

fn print_watch_event(event: &WatchEvent) {
    match event {
        WatchEvent::RunStarted { binding, task } => {
            info!(binding, task = %task, "change detected, running task");
        }
        WatchEvent::RunFinished { report, .. } => print_report(report),
    }
}

/// Text printed by `watchflow list`.
pub fn render_listing(project: &Project) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    let _ = writeln!(out, "tasks ({}):", project.graph.len());
    for task in project.graph.tasks() {
        let detail = match task.kind() {
            TaskKind::Action(action) => action.describe(),
            TaskKind::Sequence(children) => format!("sequence: {}", children.join(" -> ")),
            TaskKind::Parallel(children) => format!("parallel: {}", children.join(" | ")),
        };
        let _ = writeln!(out, "  {:<16} {detail}", task.name());
        if let Some(description) = project.descriptions.get(task.name()) {
            let _ = writeln!(out, "  {:<16} {description}", "");
        }
    }

    if !project.bindings.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "watch ({}):", project.bindings.len());
        for binding in &project.bindings {
            let profile = binding.profile();
            let _ = write!(
                out,
                "  {} -> {} ({} ms",
                profile.watch_patterns().join(", "),
                binding.task(),
                binding.debounce().as_millis()
            );
            if !profile.exclude_patterns().is_empty() {
                let _ = write!(out, ", exclude {}", profile.exclude_patterns().join(", "));
            }
            if binding.reload() {
                let _ = write!(out, ", reload");
            }
            let _ = writeln!(out, ")");
        }
    }

    out
}

/// Directory that relative paths in the config file resolve against.
///
/// A bare filename like `Watchflow.toml` has an empty parent, which maps to
/// the current working directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

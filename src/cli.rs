// src/cli.rs

//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `watchflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "watchflow",
    version,
    about = "Compose build tasks into sequences and parallel groups, and re-run them on file changes.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        default_value_os_t = crate::config::default_config_path()
    )]
    pub config: PathBuf,

    /// Logging level. Falls back to `WATCHFLOW_LOG`, then `info`.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run a task once and exit.
    Run {
        /// Task to run.
        #[arg(default_value = "default")]
        task: String,
    },
    /// Watch the project and re-run bound tasks on change.
    Watch,
    /// Print tasks and watch bindings without running anything.
    List,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_defaults_to_default_task() {
        let args = CliArgs::try_parse_from(["watchflow", "run"]).unwrap();
        match args.command {
            Command::Run { task } => assert_eq!(task, "default"),
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(args.config, PathBuf::from("Watchflow.toml"));
        assert_eq!(args.config, crate::config::default_config_path());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let args = CliArgs::try_parse_from([
            "watchflow",
            "watch",
            "--config",
            "site/Watchflow.toml",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert!(matches!(args.command, Command::Watch));
        assert_eq!(args.config, PathBuf::from("site/Watchflow.toml"));
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    }
}

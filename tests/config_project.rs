mod common;

use tempfile::tempdir;
use watchflow::cli::{CliArgs, Command};
use watchflow::config::{load_and_validate, parse_str};
use watchflow::errors::WatchflowError;
use watchflow::{Outcome, load_project, render_listing, watch_until};
use watchflow_test_utils::write_config;

use crate::common::TestResult;

const SITE: &str = r#"
[config]
debounce_ms = 100

[task.hello]
echo = "hello world.."
description = "smoke test"

[task.copy]
copy = { from = ["routes/*.js"], to = "copies" }

[task.assets]
parallel = ["hello", "copy"]

[task.default]
sequence = ["assets"]

[[watch]]
glob = ["routes/*.js"]
exclude = "routes/*.test.js"
task = "copy"
reload = true
"#;

fn err_of(text: &str) -> WatchflowError {
    let raw = parse_str(text).unwrap();
    watchflow::config::ConfigFile::try_from(raw).unwrap_err()
}

#[test]
fn loads_tasks_and_bindings_from_file() -> TestResult {
    let dir = tempdir()?;
    let path = write_config(dir.path(), SITE);

    let project = load_project(&path)?;

    assert_eq!(project.graph.len(), 4);
    assert_eq!(project.bindings.len(), 1);
    assert_eq!(project.root, dir.path());
    assert!(project.bindings[0].profile().matches("routes/index.js"));
    assert!(!project.bindings[0].profile().matches("routes/index.test.js"));
    Ok(())
}

#[test]
fn listing_shows_tasks_descriptions_and_bindings() -> TestResult {
    let dir = tempdir()?;
    let project = load_project(&write_config(dir.path(), SITE))?;

    let listing = render_listing(&project);

    assert!(listing.starts_with("tasks (4):"));
    assert!(listing.contains("echo: hello world.."));
    assert!(listing.contains("smoke test"));
    assert!(listing.contains("parallel: hello | copy"));
    assert!(listing.contains("sequence: assets"));
    assert!(listing.contains("routes/*.js -> copy (100 ms, exclude routes/*.test.js, reload)"));
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    let err = load_and_validate(dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, WatchflowError::IoError(_)));
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let dir = tempdir().unwrap();
    let path = write_config(dir.path(), "[task.a\ncmd = ");
    assert!(matches!(load_and_validate(path).unwrap_err(), WatchflowError::TomlError(_)));
}

#[test]
fn empty_config_is_rejected() {
    assert!(matches!(err_of(""), WatchflowError::ConfigError(_)));
}

#[test]
fn task_needs_exactly_one_kind() {
    let none = err_of("[task.a]\ndescription = \"nothing\"\n");
    assert!(matches!(none, WatchflowError::ConfigError(msg) if msg.contains("must set one of")));

    let two = err_of("[task.a]\ncmd = \"make\"\necho = \"hi\"\n");
    assert!(matches!(two, WatchflowError::ConfigError(msg) if msg.contains("more than one")));
}

#[test]
fn bad_durations_are_rejected() {
    let task = err_of("[task.a]\ncmd = \"make\"\ntimeout = \"soon\"\n");
    assert!(matches!(task, WatchflowError::ConfigError(msg) if msg.contains("timeout")));

    let global = err_of("[config]\naction_timeout = \"10x\"\n\n[task.a]\ncmd = \"make\"\n");
    assert!(matches!(global, WatchflowError::ConfigError(msg) if msg.contains("action_timeout")));
}

#[test]
fn timeout_on_composite_is_rejected() {
    let err = err_of(
        "[task.a]\necho = \"a\"\n\n[task.all]\nsequence = [\"a\"]\ntimeout = \"5s\"\n",
    );
    assert!(matches!(err, WatchflowError::ConfigError(msg) if msg.contains("only applies")));
}

#[test]
fn zero_debounce_is_rejected() {
    let global = err_of("[config]\ndebounce_ms = 0\n\n[task.a]\necho = \"a\"\n");
    assert!(matches!(global, WatchflowError::ConfigError(_)));

    let binding = err_of(
        "[task.a]\necho = \"a\"\n\n[[watch]]\nglob = \"*.js\"\ntask = \"a\"\ndebounce_ms = 0\n",
    );
    assert!(matches!(binding, WatchflowError::ConfigError(_)));
}

#[test]
fn binding_to_missing_task_is_unknown_task() {
    let err = err_of("[task.a]\necho = \"a\"\n\n[[watch]]\nglob = \"*.js\"\ntask = \"b\"\n");
    assert!(matches!(err, WatchflowError::UnknownTask(name) if name == "b"));
}

#[test]
fn self_reference_is_a_cycle() {
    let err = err_of("[task.a]\nsequence = [\"a\"]\n");
    assert!(matches!(err, WatchflowError::Cycle(_)));
}

#[test]
fn invalid_glob_surfaces_when_building() -> TestResult {
    let dir = tempdir()?;
    let path = write_config(
        dir.path(),
        "[task.a]\necho = \"a\"\n\n[[watch]]\nglob = \"src/[*.js\"\ntask = \"a\"\n",
    );
    let err = load_project(&path).unwrap_err();
    let root = err.root_cause().to_string();
    assert!(root.contains("src/[*.js"), "{root}");
    Ok(())
}

fn args(config: &std::path::Path, command: Command) -> CliArgs {
    CliArgs {
        config: config.to_path_buf(),
        log_level: None,
        command,
    }
}

#[tokio::test]
async fn run_copies_files_and_exits_zero() -> TestResult {
    let dir = tempdir()?;
    std::fs::create_dir_all(dir.path().join("routes"))?;
    std::fs::write(dir.path().join("routes/index.js"), "module.exports = 1;")?;
    let path = write_config(dir.path(), SITE);

    let code = watchflow::run(args(&path, Command::Run { task: "default".into() })).await?;

    assert_eq!(code, Outcome::Success);
    let copied = std::fs::read_to_string(dir.path().join("copies/index.js"))?;
    assert_eq!(copied, "module.exports = 1;");
    Ok(())
}

#[tokio::test]
async fn unknown_task_exits_two() -> TestResult {
    let dir = tempdir()?;
    let path = write_config(dir.path(), SITE);

    let code = watchflow::run(args(&path, Command::Run { task: "deploy".into() })).await?;

    assert_eq!(code, Outcome::UnknownTask);
    assert_eq!(code.code(), 2);
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn failing_command_exits_one_and_skips_the_rest() -> TestResult {
    let dir = tempdir()?;
    let path = write_config(
        dir.path(),
        r#"
[task.lint]
cmd = "exit 3"

[task.test]
cmd = "touch tested"

[task.default]
sequence = ["lint", "test"]
"#,
    );

    let code = watchflow::run(args(&path, Command::Run { task: "default".into() })).await?;

    assert_eq!(code, Outcome::Failed);
    assert!(!dir.path().join("tested").exists());
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn default_action_timeout_fails_hanging_commands() -> TestResult {
    let dir = tempdir()?;
    let path = write_config(
        dir.path(),
        r#"
[config]
action_timeout = "200ms"

[task.test]
cmd = "sleep 5"
"#,
    );

    let project = load_project(&path)?;
    let report = project.scheduler().run("test").await?;

    assert!(!report.success());
    let err = report.result_for("test").unwrap().error().unwrap().to_string();
    assert!(err.contains("timed out"), "{err}");
    Ok(())
}

#[tokio::test]
async fn list_exits_zero_without_running() -> TestResult {
    let dir = tempdir()?;
    std::fs::create_dir_all(dir.path().join("routes"))?;
    std::fs::write(dir.path().join("routes/index.js"), "x")?;
    let path = write_config(dir.path(), SITE);

    let code = watchflow::run(args(&path, Command::List)).await?;

    assert_eq!(code, Outcome::Success);
    assert!(!dir.path().join("copies").exists());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn watch_without_bindings_still_waits_for_shutdown() -> TestResult {
    let dir = tempdir()?;
    let path = write_config(
        dir.path(),
        r#"
[task.hello]
echo = "hi"
"#,
    );
    let project = load_project(&path)?;
    assert!(project.bindings.is_empty());

    let started = tokio::time::Instant::now();
    let shutdown = async {
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        Ok(())
    };
    let outcome = watch_until(project, shutdown).await?;

    assert_eq!(outcome, Outcome::Success);
    assert!(started.elapsed() >= std::time::Duration::from_millis(200));
    Ok(())
}

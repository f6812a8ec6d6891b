// src/main.rs

use std::process::ExitCode;

use watchflow::{cli, logging, run};

#[tokio::main]
async fn main() -> ExitCode {
    match run_main().await {
        Ok(outcome) => outcome.into(),
        Err(err) => {
            eprintln!("watchflow error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

async fn run_main() -> anyhow::Result<watchflow::Outcome> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}

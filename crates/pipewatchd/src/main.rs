//! pipewatchd - run one pipeline monitoring session
//!
//! Configuration comes from `PIPEWATCH_*` environment variables. The final
//! report is printed to stdout as JSON; logs go to stderr.

mod config;
mod runner;

use std::process::ExitCode;

use anyhow::Result;
use pipewatch_core::init_tracing;
use tracing::{error, info, Level};

use crate::config::RunnerConfig;
use crate::runner::{Outcome, EXIT_ABORTED};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match RunnerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(config::log_format_from_env(), Level::INFO);
            error!(error = %format!("{:#}", e), "invalid configuration");
            return ExitCode::from(EXIT_ABORTED);
        }
    };
    init_tracing(config.log_format, Level::INFO);

    match run(config).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!(error = %format!("{:#}", e), "pipewatchd aborted");
            ExitCode::from(EXIT_ABORTED)
        }
    }
}

async fn run(config: RunnerConfig) -> Result<u8> {
    let monitor = runner::build_monitor(&config)?;
    let params = config.monitor_params();

    info!(
        identity = %config.identity,
        runs_url = %config.runs_url,
        deployment_url = %config.deployment_url,
        probe_instances = config.probe_instances,
        "pipewatchd starting"
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    let outcome = runner::run_until(&monitor, &params, shutdown).await?;
    if let Outcome::Finished(report) = &outcome {
        println!("{}", report.to_json_pretty()?);
        if let Some(path) = &config.report_path {
            runner::write_report(report, path)?;
        }
    }
    Ok(outcome.exit_code())
}

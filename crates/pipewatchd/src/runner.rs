//! One monitoring session raced against a shutdown signal.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use pipewatch_core::{MonitorParams, PipelineMonitor, PipelineReport, ReportStatus};
use pipewatch_http::{default_client, HttpBuildStatusProvider, HttpDeploymentStatusProvider};
use tracing::{info, warn};

use crate::config::RunnerConfig;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILED: u8 = 1;
pub const EXIT_TIMEOUT: u8 = 2;
pub const EXIT_ABORTED: u8 = 3;

#[derive(Debug)]
pub enum Outcome {
    Finished(PipelineReport),
    Cancelled,
}

impl Outcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            Outcome::Finished(report) => match report.status {
                ReportStatus::Success => EXIT_SUCCESS,
                ReportStatus::Failed => EXIT_FAILED,
                ReportStatus::Timeout => EXIT_TIMEOUT,
            },
            Outcome::Cancelled => EXIT_ABORTED,
        }
    }
}

/// Wire the HTTP providers described by `config` into a monitor.
pub fn build_monitor(config: &RunnerConfig) -> Result<PipelineMonitor> {
    let client = default_client(config.http_timeout).context("failed to build HTTP client")?;

    let build = HttpBuildStatusProvider::new(&config.runs_url)
        .with_context(|| format!("bad runs URL '{}'", config.runs_url))?
        .with_client(client.clone());

    let mut deployment = HttpDeploymentStatusProvider::new(&config.deployment_url)
        .with_context(|| format!("bad deployment URL '{}'", config.deployment_url))?
        .with_client(client);
    if config.probe_instances {
        deployment = deployment.probing();
    }

    Ok(PipelineMonitor::new(Arc::new(build), Arc::new(deployment)))
}

/// Run the session until it ends or `shutdown` resolves.
///
/// Losing the race drops the session future, which stops polling.
pub async fn run_until<S>(
    monitor: &PipelineMonitor,
    params: &MonitorParams,
    shutdown: S,
) -> Result<Outcome>
where
    S: Future<Output = ()>,
{
    tokio::select! {
        biased;
        _ = shutdown => {
            warn!(identity = %params.identity, "shutdown requested, cancelling session");
            Ok(Outcome::Cancelled)
        }
        report = monitor.monitor(params) => Ok(Outcome::Finished(report?)),
    }
}

pub fn write_report(report: &PipelineReport, path: &Path) -> Result<()> {
    let json = report.to_json_pretty()?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    info!(path = %path.display(), "report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipewatch_core::fakes::{
        completed_run, deployment, running_run, ScriptedBuildProvider, ScriptedDeploymentProvider,
    };
    use std::time::Duration;

    fn monitor(build: ScriptedBuildProvider) -> PipelineMonitor {
        PipelineMonitor::new(
            Arc::new(build),
            Arc::new(ScriptedDeploymentProvider::always(deployment(1, 1))),
        )
    }

    fn params() -> MonitorParams {
        MonitorParams::new("org/app")
            .with_poll_interval(Duration::from_secs(1))
            .with_max_duration(Duration::from_secs(60))
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_session_maps_to_exit_code() {
        let monitor = monitor(ScriptedBuildProvider::always(vec![completed_run(
            "1", "failure",
        )]));
        let outcome = run_until(&monitor, &params(), std::future::pending())
            .await
            .unwrap();

        assert!(matches!(outcome, Outcome::Finished(ref r) if r.status == ReportStatus::Failed));
        assert_eq!(outcome.exit_code(), EXIT_FAILED);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_session() {
        let build = Arc::new(ScriptedBuildProvider::always(vec![running_run("1")]));
        let monitor = PipelineMonitor::new(
            build.clone(),
            Arc::new(ScriptedDeploymentProvider::always(deployment(1, 1))),
        );

        let outcome = run_until(
            &monitor,
            &params(),
            tokio::time::sleep(Duration::from_millis(2_500)),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, Outcome::Cancelled));
        assert_eq!(outcome.exit_code(), EXIT_ABORTED);
        assert_eq!(build.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_params_are_an_error() {
        let monitor = monitor(ScriptedBuildProvider::always(vec![]));
        let params = MonitorParams::new("  ");
        assert!(run_until(&monitor, &params, std::future::pending())
            .await
            .is_err());
    }

    #[test]
    fn test_build_monitor_rejects_bad_url() {
        let config = RunnerConfig::from_lookup(|key| match key {
            "PIPEWATCH_IDENTITY" => Some("org/app".to_string()),
            "PIPEWATCH_RUNS_URL" => Some("ftp://ci.local/runs".to_string()),
            "PIPEWATCH_DEPLOYMENT_URL" => Some("http://registry.local/deployment".to_string()),
            _ => None,
        })
        .unwrap();
        let err = build_monitor(&config).err().expect("expected an error");
        assert!(err.to_string().contains("runs URL"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_report() {
        let monitor = monitor(ScriptedBuildProvider::always(vec![completed_run(
            "1", "success",
        )]));
        let Outcome::Finished(report) = run_until(&monitor, &params(), std::future::pending())
            .await
            .unwrap()
        else {
            panic!("expected finished session");
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_report(&report, &path).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["status"], "success");
        assert_eq!(written["identity"], "org/app");
    }
}

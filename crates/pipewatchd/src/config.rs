//! Runner configuration loaded from `PIPEWATCH_*` environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use pipewatch_core::{LogFormat, MonitorParams};

pub const ENV_IDENTITY: &str = "PIPEWATCH_IDENTITY";
pub const ENV_BRANCH: &str = "PIPEWATCH_BRANCH";
pub const ENV_POLL_INTERVAL: &str = "PIPEWATCH_POLL_INTERVAL_SECS";
pub const ENV_MAX_DURATION: &str = "PIPEWATCH_MAX_DURATION_SECS";
pub const ENV_RUNS_URL: &str = "PIPEWATCH_RUNS_URL";
pub const ENV_DEPLOYMENT_URL: &str = "PIPEWATCH_DEPLOYMENT_URL";
pub const ENV_PROBE_INSTANCES: &str = "PIPEWATCH_PROBE_INSTANCES";
pub const ENV_HTTP_TIMEOUT: &str = "PIPEWATCH_HTTP_TIMEOUT_SECS";
pub const ENV_REPORT_PATH: &str = "PIPEWATCH_REPORT_PATH";
pub const ENV_LOG_FORMAT: &str = "PIPEWATCH_LOG_FORMAT";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct RunnerConfig {
    pub identity: String,
    pub branch: Option<String>,
    pub poll_interval: Duration,
    pub max_duration: Duration,
    pub runs_url: String,
    pub deployment_url: String,
    pub probe_instances: bool,
    pub http_timeout: Duration,
    pub report_path: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl RunnerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| get(key).ok_or_else(|| anyhow!("{} must be set", key));

        let poll_interval = match get(ENV_POLL_INTERVAL) {
            Some(raw) => secs(ENV_POLL_INTERVAL, &raw)?,
            None => MonitorParams::DEFAULT_POLL_INTERVAL,
        };
        let max_duration = match get(ENV_MAX_DURATION) {
            Some(raw) => secs(ENV_MAX_DURATION, &raw)?,
            None => MonitorParams::DEFAULT_MAX_DURATION,
        };
        let http_timeout = match get(ENV_HTTP_TIMEOUT) {
            Some(raw) => secs(ENV_HTTP_TIMEOUT, &raw)?,
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };
        let probe_instances = match get(ENV_PROBE_INSTANCES) {
            Some(raw) => flag(ENV_PROBE_INSTANCES, &raw)?,
            None => false,
        };
        let log_format = match get(ENV_LOG_FORMAT) {
            Some(raw) => {
                LogFormat::from_str(&raw).map_err(|e| anyhow!("{}: {}", ENV_LOG_FORMAT, e))?
            }
            None => LogFormat::default(),
        };

        Ok(Self {
            identity: required(ENV_IDENTITY)?,
            branch: get(ENV_BRANCH),
            poll_interval,
            max_duration,
            runs_url: required(ENV_RUNS_URL)?,
            deployment_url: required(ENV_DEPLOYMENT_URL)?,
            probe_instances,
            http_timeout,
            report_path: get(ENV_REPORT_PATH).map(PathBuf::from),
            log_format,
        })
    }

    pub fn monitor_params(&self) -> MonitorParams {
        let params = MonitorParams::new(self.identity.clone())
            .with_poll_interval(self.poll_interval)
            .with_max_duration(self.max_duration);
        match &self.branch {
            Some(branch) => params.with_branch(branch.clone()),
            None => params,
        }
    }
}

/// Log format as configured, falling back to text when unset or invalid.
///
/// Used before the full config is loaded so config errors get logged.
pub fn log_format_from_env() -> LogFormat {
    std::env::var(ENV_LOG_FORMAT)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_default()
}

fn secs(key: &str, raw: &str) -> Result<Duration> {
    let n: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{} must be a whole number of seconds, got '{}'", key, raw))?;
    Ok(Duration::from_secs(n))
}

fn flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("{} must be a boolean, got '{}'", key, raw),
    }
}

//! Tool dispatch.
//!
//! A closed mapping from method name to handler. Each request kind owns its
//! parameter schema; unknown methods and malformed params are rejected with
//! dedicated error kinds before any provider is touched.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ToolError;
use crate::monitor::{MonitorParams, PipelineMonitor};
use crate::provider::{BuildStatusProvider, DeploymentStatusProvider};
use crate::summary::deployment_summary;

/// Names of every tool the dispatcher serves.
pub const TOOL_NAMES: &[&str] = &[
    "ping",
    "health_check",
    "check_build_status",
    "check_deployment",
    "monitor_pipeline",
    "deployment_summary",
];

const DEFAULT_RUN_LIMIT: usize = 5;
const MAX_RUN_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoParams {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityParams {
    pub identity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildStatusParams {
    pub identity: String,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorPipelineParams {
    pub identity: String,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,
    #[serde(default)]
    pub max_duration_secs: Option<u64>,
}

impl MonitorPipelineParams {
    pub fn to_monitor_params(&self) -> MonitorParams {
        let mut params = MonitorParams::new(self.identity.clone());
        params.branch = self.branch.clone();
        if let Some(secs) = self.poll_interval_secs {
            params.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = self.max_duration_secs {
            params.max_duration = Duration::from_secs(secs);
        }
        params
    }
}

/// A parsed, validated tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolRequest {
    Ping,
    HealthCheck,
    CheckBuildStatus(BuildStatusParams),
    CheckDeployment(IdentityParams),
    MonitorPipeline(MonitorPipelineParams),
    DeploymentSummary(IdentityParams),
}

impl ToolRequest {
    /// Parse a method name and its JSON params. `null` params mean "none".
    pub fn parse(method: &str, params: Value) -> Result<Self, ToolError> {
        let params = if params.is_null() {
            Value::Object(Default::default())
        } else {
            params
        };

        let request = match method {
            "ping" => {
                decode::<NoParams>(method, params)?;
                ToolRequest::Ping
            }
            "health_check" => {
                decode::<NoParams>(method, params)?;
                ToolRequest::HealthCheck
            }
            "check_build_status" => {
                let p: BuildStatusParams = decode(method, params)?;
                require_identity(method, &p.identity)?;
                if matches!(p.limit, Some(l) if l == 0 || l > MAX_RUN_LIMIT) {
                    return Err(invalid_params(
                        method,
                        format!("limit must be between 1 and {}", MAX_RUN_LIMIT),
                    ));
                }
                ToolRequest::CheckBuildStatus(p)
            }
            "check_deployment" => {
                let p: IdentityParams = decode(method, params)?;
                require_identity(method, &p.identity)?;
                ToolRequest::CheckDeployment(p)
            }
            "monitor_pipeline" => {
                let p: MonitorPipelineParams = decode(method, params)?;
                require_identity(method, &p.identity)?;
                ToolRequest::MonitorPipeline(p)
            }
            "deployment_summary" => {
                let p: IdentityParams = decode(method, params)?;
                require_identity(method, &p.identity)?;
                ToolRequest::DeploymentSummary(p)
            }
            other => return Err(ToolError::UnknownMethod(other.to_string())),
        };
        Ok(request)
    }

    pub fn method(&self) -> &'static str {
        match self {
            ToolRequest::Ping => "ping",
            ToolRequest::HealthCheck => "health_check",
            ToolRequest::CheckBuildStatus(_) => "check_build_status",
            ToolRequest::CheckDeployment(_) => "check_deployment",
            ToolRequest::MonitorPipeline(_) => "monitor_pipeline",
            ToolRequest::DeploymentSummary(_) => "deployment_summary",
        }
    }
}

fn decode<T: DeserializeOwned>(method: &str, params: Value) -> Result<T, ToolError> {
    serde_json::from_value(params).map_err(|e| invalid_params(method, e.to_string()))
}

fn require_identity(method: &str, identity: &str) -> Result<(), ToolError> {
    if identity.trim().is_empty() {
        return Err(invalid_params(method, "identity must not be empty"));
    }
    Ok(())
}

fn invalid_params(method: &str, reason: impl Into<String>) -> ToolError {
    ToolError::InvalidParams {
        method: method.to_string(),
        reason: reason.into(),
    }
}

/// Routes tool requests to their handlers.
pub struct ToolDispatcher {
    build: Arc<dyn BuildStatusProvider>,
    deployment: Arc<dyn DeploymentStatusProvider>,
}

impl ToolDispatcher {
    pub fn new(
        build: Arc<dyn BuildStatusProvider>,
        deployment: Arc<dyn DeploymentStatusProvider>,
    ) -> Self {
        Self { build, deployment }
    }

    /// Parse and dispatch in one step.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, ToolError> {
        let request = ToolRequest::parse(method, params)?;
        self.dispatch(request).await
    }

    pub async fn dispatch(&self, request: ToolRequest) -> Result<Value, ToolError> {
        debug!(method = request.method(), "dispatching tool call");
        match request {
            ToolRequest::Ping => Ok(json!("pong")),
            ToolRequest::HealthCheck => Ok(json!({
                "status": "healthy",
                "timestamp": Utc::now(),
                "server": "pipewatch",
                "version": env!("CARGO_PKG_VERSION"),
                "tools": TOOL_NAMES,
            })),
            ToolRequest::CheckBuildStatus(p) => {
                let mut runs = self
                    .build
                    .get_recent_runs(&p.identity, p.branch.as_deref())
                    .await?;
                let total_runs = runs.len();
                runs.truncate(p.limit.unwrap_or(DEFAULT_RUN_LIMIT));
                Ok(json!({
                    "identity": p.identity,
                    "branch": p.branch,
                    "total_runs": total_runs,
                    "runs": runs,
                }))
            }
            ToolRequest::CheckDeployment(p) => {
                let state = self.deployment.get_deployment_state(&p.identity).await?;
                Ok(serde_json::to_value(state)?)
            }
            ToolRequest::MonitorPipeline(p) => {
                let monitor = PipelineMonitor::new(self.build.clone(), self.deployment.clone());
                let report = monitor.monitor(&p.to_monitor_params()).await?;
                Ok(serde_json::to_value(report)?)
            }
            ToolRequest::DeploymentSummary(p) => {
                let summary =
                    deployment_summary(self.build.as_ref(), self.deployment.as_ref(), &p.identity)
                        .await;
                Ok(serde_json::to_value(summary)?)
            }
        }
    }
}

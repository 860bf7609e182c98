//! Provider records.
//!
//! These are the shapes the two status providers return. They are kept
//! verbatim in the report's final state alongside the derived snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Run status string reported by a build provider for a finished run.
pub const STATUS_COMPLETED: &str = "completed";

/// Outcome string reported by a build provider for a successful run.
pub const OUTCOME_SUCCESS: &str = "success";

/// One automated build/test run as reported by the build-status provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRun {
    pub id: String,
    pub name: String,
    /// Lifecycle status, e.g. `queued`, `in_progress`, `completed`.
    pub status: String,
    /// Conclusion once the run completed; `None` while it is still going.
    #[serde(default)]
    pub outcome: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub branch: Option<String>,
    pub url: String,
}

impl BuildRun {
    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }

    pub fn succeeded(&self) -> bool {
        self.outcome.as_deref() == Some(OUTCOME_SUCCESS)
    }
}

/// A single deployed instance of the pipeline subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentInstance {
    pub url: String,
    pub healthy: bool,
    #[serde(default)]
    pub response_time_ms: Option<f64>,
    /// Number of tools the instance advertises.
    #[serde(default)]
    pub tool_count: usize,
}

/// Deployment state as reported by the deployment-status provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentState {
    pub is_deployed: bool,
    pub healthy_instance_count: usize,
    #[serde(default)]
    pub instances: Vec<DeploymentInstance>,
}

impl DeploymentState {
    /// State with nothing deployed.
    pub fn not_deployed() -> Self {
        Self {
            is_deployed: false,
            healthy_instance_count: 0,
            instances: Vec::new(),
        }
    }

    /// Build a state whose counters are derived from the instance list.
    pub fn from_instances(instances: Vec<DeploymentInstance>) -> Self {
        let healthy_instance_count = instances.iter().filter(|i| i.healthy).count();
        Self {
            is_deployed: !instances.is_empty(),
            healthy_instance_count,
            instances,
        }
    }

    pub fn total_tools(&self) -> usize {
        self.instances.iter().map(|i| i.tool_count).sum()
    }
}

/// Raw outcome of one provider query in one poll iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProviderResponse<T> {
    Ok { data: T },
    Unavailable { error: String },
}

impl<T> ProviderResponse<T> {
    pub fn ok(&self) -> Option<&T> {
        match self {
            ProviderResponse::Ok { data } => Some(data),
            ProviderResponse::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ProviderResponse::Ok { .. })
    }
}

impl<T> From<std::result::Result<T, ProviderError>> for ProviderResponse<T> {
    fn from(result: std::result::Result<T, ProviderError>) -> Self {
        match result {
            Ok(data) => ProviderResponse::Ok { data },
            Err(e) => ProviderResponse::Unavailable {
                error: e.to_string(),
            },
        }
    }
}

//! Per-iteration snapshot derivation and the session state machine.

use serde::{Deserialize, Serialize};

use crate::model::{BuildRun, DeploymentState, ProviderResponse, OUTCOME_SUCCESS};

/// Lifecycle state of the latest build run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildState {
    Queued,
    Running,
    Completed,
    /// No run observed, or the provider could not be read.
    Unknown,
}

impl BuildState {
    fn from_status(status: &str) -> Self {
        match status {
            "completed" => BuildState::Completed,
            "queued" | "pending" | "waiting" | "requested" => BuildState::Queued,
            "in_progress" | "running" => BuildState::Running,
            _ => BuildState::Unknown,
        }
    }
}

/// Conclusion of the latest build run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildOutcome {
    Success,
    /// Any non-null conclusion other than success (`failure`, `cancelled`, ...).
    Failure(String),
    Unknown,
}

impl BuildOutcome {
    fn from_conclusion(conclusion: Option<&str>) -> Self {
        match conclusion {
            None => BuildOutcome::Unknown,
            Some(OUTCOME_SUCCESS) => BuildOutcome::Success,
            Some(other) => BuildOutcome::Failure(other.to_string()),
        }
    }
}

/// Derived view of the build provider for one iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSnapshot {
    pub state: BuildState,
    pub outcome: BuildOutcome,
    pub run_id: Option<String>,
    pub run_url: Option<String>,
    /// False when the provider query failed this iteration.
    pub reachable: bool,
}

impl BuildSnapshot {
    fn from_latest(latest: Option<&BuildRun>) -> Self {
        match latest {
            Some(run) => Self {
                state: BuildState::from_status(&run.status),
                outcome: BuildOutcome::from_conclusion(run.outcome.as_deref()),
                run_id: Some(run.id.clone()),
                run_url: Some(run.url.clone()),
                reachable: true,
            },
            None => Self {
                state: BuildState::Unknown,
                outcome: BuildOutcome::Unknown,
                run_id: None,
                run_url: None,
                reachable: true,
            },
        }
    }

    fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::from_latest(None)
        }
    }

    /// True once no further change is expected from the latest run.
    pub fn is_concluded(&self) -> bool {
        self.state == BuildState::Completed && self.outcome != BuildOutcome::Unknown
    }
}

/// Derived view of the deployment provider for one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentSnapshot {
    pub deployed: bool,
    pub healthy_instance_count: usize,
    pub reachable: bool,
}

/// Combined snapshot of both providers for one poll iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollResult {
    pub build: BuildSnapshot,
    pub deployment: DeploymentSnapshot,
}

impl PollResult {
    /// Derive a snapshot from the raw provider responses.
    ///
    /// Runs are expected most-recent-first; only the first one counts.
    /// An unavailable provider is treated as unknown / not deployed.
    pub fn derive(
        runs: &ProviderResponse<Vec<BuildRun>>,
        deployment: &ProviderResponse<DeploymentState>,
    ) -> Self {
        let build = match runs {
            ProviderResponse::Ok { data } => BuildSnapshot::from_latest(data.first()),
            ProviderResponse::Unavailable { .. } => BuildSnapshot::unreachable(),
        };
        let deployment = match deployment {
            ProviderResponse::Ok { data } => DeploymentSnapshot {
                deployed: data.is_deployed,
                healthy_instance_count: data.healthy_instance_count,
                reachable: true,
            },
            ProviderResponse::Unavailable { .. } => DeploymentSnapshot {
                deployed: false,
                healthy_instance_count: 0,
                reachable: false,
            },
        };
        Self { build, deployment }
    }

    /// Build succeeded and at least one healthy instance is deployed.
    pub fn is_success(&self) -> bool {
        self.build.state == BuildState::Completed
            && self.build.outcome == BuildOutcome::Success
            && self.deployment.deployed
            && self.deployment.healthy_instance_count > 0
    }

    /// Build completed with a conclusion other than success.
    /// Deployment state is not consulted.
    pub fn is_failure(&self) -> bool {
        self.build.state == BuildState::Completed
            && matches!(self.build.outcome, BuildOutcome::Failure(_))
    }
}

/// Monitoring session state machine. `Polling` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Polling,
    Succeeded,
    Failed,
    TimedOut,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionState::Polling)
    }

    /// Advance on a fresh snapshot. Success is checked before failure.
    pub fn observe(self, poll: &PollResult) -> Self {
        if self.is_terminal() {
            return self;
        }
        if poll.is_success() {
            SessionState::Succeeded
        } else if poll.is_failure() {
            SessionState::Failed
        } else {
            SessionState::Polling
        }
    }

    /// Advance when the session deadline has passed.
    pub fn deadline_reached(self) -> Self {
        match self {
            SessionState::Polling => SessionState::TimedOut,
            terminal => terminal,
        }
    }
}

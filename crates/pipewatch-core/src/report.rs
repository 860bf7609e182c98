//! Terminal result of a monitoring session.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{BuildRun, DeploymentState, ProviderResponse};
use crate::snapshot::{PollResult, SessionState};
use crate::timeline::TimelineEvent;

/// Final status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Success,
    Failed,
    Timeout,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Success => "success",
            ReportStatus::Failed => "failed",
            ReportStatus::Timeout => "timeout",
        }
    }

    /// Map a terminal session state to a report status.
    pub fn from_state(state: SessionState) -> Option<Self> {
        match state {
            SessionState::Succeeded => Some(ReportStatus::Success),
            SessionState::Failed => Some(ReportStatus::Failed),
            SessionState::TimedOut => Some(ReportStatus::Timeout),
            SessionState::Polling => None,
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last observation of the session: derived snapshot plus raw responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalState {
    pub poll: PollResult,
    pub build_runs: ProviderResponse<Vec<BuildRun>>,
    pub deployment: ProviderResponse<DeploymentState>,
}

impl FinalState {
    pub fn from_responses(
        build_runs: ProviderResponse<Vec<BuildRun>>,
        deployment: ProviderResponse<DeploymentState>,
    ) -> Self {
        Self {
            poll: PollResult::derive(&build_runs, &deployment),
            build_runs,
            deployment,
        }
    }

    /// State for a session whose providers never answered.
    pub fn unanswered(reason: &str) -> Self {
        Self::from_responses(
            ProviderResponse::Unavailable {
                error: reason.to_string(),
            },
            ProviderResponse::Unavailable {
                error: reason.to_string(),
            },
        )
    }
}

/// The single report produced by a monitoring session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub session_id: Uuid,
    pub identity: String,
    pub branch: Option<String>,
    pub status: ReportStatus,
    pub message: String,
    pub duration_ms: u64,
    /// Number of poll iterations performed.
    pub iterations: u32,
    pub final_state: FinalState,
    pub timeline: Vec<TimelineEvent>,
}

impl PipelineReport {
    pub fn succeeded(&self) -> bool {
        self.status == ReportStatus::Success
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unanswered_final_state_is_unreachable() {
        let state = FinalState::unanswered("no response");
        assert!(!state.poll.build.reachable);
        assert!(!state.poll.deployment.reachable);
        assert!(!state.build_runs.is_available());
        assert!(!state.deployment.is_available());
    }

    #[test]
    fn test_status_from_state() {
        assert_eq!(
            ReportStatus::from_state(SessionState::Succeeded),
            Some(ReportStatus::Success)
        );
        assert_eq!(
            ReportStatus::from_state(SessionState::TimedOut),
            Some(ReportStatus::Timeout)
        );
        assert_eq!(ReportStatus::from_state(SessionState::Polling), None);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_value(ReportStatus::Failed).unwrap(), "failed");
        assert_eq!(ReportStatus::Timeout.to_string(), "timeout");
    }
}

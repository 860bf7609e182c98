//! Pipeline status poller.
//!
//! [`PipelineMonitor::monitor`] polls the build-status and deployment-status
//! providers at a fixed interval, records observable transitions on a
//! [`Timeline`] and returns exactly one [`PipelineReport`] once the pipeline
//! succeeds, fails, or the session deadline passes.
//!
//! `max_duration` bounds the whole session: a provider query still running
//! at the deadline is abandoned and the session reports a timeout.
//!
//! Provider errors never end a session: the affected provider is read as
//! unknown for that iteration and polling continues.
//!
//! The returned future is cancel-safe. Dropping it stops the session at the
//! current await point without producing a report.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::{MonitorError, Result};
use crate::model::{BuildRun, DeploymentState, ProviderResponse};
use crate::obs;
use crate::provider::{BuildStatusProvider, DeploymentStatusProvider};
use crate::report::{FinalState, PipelineReport, ReportStatus};
use crate::snapshot::{BuildOutcome, PollResult, SessionState};
use crate::timeline::{EventKind, Timeline};

const NO_ANSWER_BEFORE_DEADLINE: &str = "no response before the session deadline";

/// Input of a monitoring session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorParams {
    /// Opaque pipeline subject, e.g. `org/app`.
    pub identity: String,
    pub branch: Option<String>,
    pub poll_interval: Duration,
    pub max_duration: Duration,
}

impl MonitorParams {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
    pub const DEFAULT_MAX_DURATION: Duration = Duration::from_secs(60 * 60);

    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            branch: None,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            max_duration: Self::DEFAULT_MAX_DURATION,
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = max_duration;
        self
    }

    /// Reject inputs a session cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.identity.trim().is_empty() {
            return Err(invalid("identity", "must not be empty"));
        }
        if matches!(self.branch.as_deref(), Some(b) if b.trim().is_empty()) {
            return Err(invalid("branch", "must not be empty when given"));
        }
        if self.poll_interval.is_zero() {
            return Err(invalid("poll_interval", "must be greater than zero"));
        }
        if self.max_duration.is_zero() {
            return Err(invalid("max_duration", "must be greater than zero"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> MonitorError {
    MonitorError::InvalidInput {
        field,
        reason: reason.to_string(),
    }
}

/// Polls both providers for one pipeline subject per session.
///
/// Holds no per-session state, so one monitor may run many sessions
/// concurrently.
#[derive(Clone)]
pub struct PipelineMonitor {
    build: Arc<dyn BuildStatusProvider>,
    deployment: Arc<dyn DeploymentStatusProvider>,
}

impl PipelineMonitor {
    pub fn new(
        build: Arc<dyn BuildStatusProvider>,
        deployment: Arc<dyn DeploymentStatusProvider>,
    ) -> Self {
        Self { build, deployment }
    }

    /// Run one monitoring session to completion.
    ///
    /// Fails only when `params` are invalid; every started session yields a
    /// report with status `success`, `failed` or `timeout`.
    pub async fn monitor(&self, params: &MonitorParams) -> Result<PipelineReport> {
        params.validate()?;
        let session_id = Uuid::new_v4();
        let span = obs::session_span(&session_id.to_string(), &params.identity);
        Ok(self.run_session(session_id, params).instrument(span).await)
    }

    /// Query both providers concurrently.
    async fn poll_providers(
        &self,
        params: &MonitorParams,
    ) -> (
        ProviderResponse<Vec<BuildRun>>,
        ProviderResponse<DeploymentState>,
    ) {
        let (runs, deployment) = tokio::join!(
            self.build
                .get_recent_runs(&params.identity, params.branch.as_deref()),
            self.deployment.get_deployment_state(&params.identity),
        );
        (runs.into(), deployment.into())
    }

    async fn run_session(&self, session_id: Uuid, params: &MonitorParams) -> PipelineReport {
        let started = Instant::now();
        let mut timeline = Timeline::new();
        let mut observer = TransitionObserver::default();
        let mut state = SessionState::Polling;
        let mut iterations = 0u32;

        obs::emit_monitor_started(
            &params.identity,
            params.branch.as_deref(),
            params.poll_interval.as_millis() as u64,
            params.max_duration.as_millis() as u64,
        );
        append(
            &mut timeline,
            EventKind::Start,
            format!("Starting pipeline monitoring for {}", params.identity),
            json!({
                "identity": &params.identity,
                "branch": &params.branch,
                "poll_interval_ms": params.poll_interval.as_millis() as u64,
                "max_duration_ms": params.max_duration.as_millis() as u64,
            }),
        );

        let deadline = started + params.max_duration;
        let mut last_state: Option<FinalState> = None;

        let (status, final_state) = loop {
            iterations += 1;
            let Ok((runs, deployment)) =
                tokio::time::timeout_at(deadline, self.poll_providers(params)).await
            else {
                obs::emit_poll_deadline(iterations, params.max_duration.as_millis() as u64);
                state = state.deadline_reached();
                let final_state = last_state
                    .take()
                    .unwrap_or_else(|| FinalState::unanswered(NO_ANSWER_BEFORE_DEADLINE));
                break (ReportStatus::Timeout, final_state);
            };

            if let ProviderResponse::Unavailable { error } = &runs {
                obs::emit_provider_unavailable("build", iterations, error);
            }
            if let ProviderResponse::Unavailable { error } = &deployment {
                obs::emit_provider_unavailable("deployment", iterations, error);
            }

            let final_state = FinalState::from_responses(runs, deployment);
            let poll = &final_state.poll;
            obs::emit_poll_completed(iterations, poll);
            if poll.build.reachable && !poll.build.is_concluded() {
                obs::emit_build_pending(iterations, poll.build.run_id.as_deref());
            }

            observer.observe(poll, &mut timeline);
            state = state.observe(poll);
            if let Some(status) = ReportStatus::from_state(state) {
                break (status, final_state);
            }

            // The last sleep is cut short so the timeout lands on the deadline.
            let now = Instant::now();
            if now < deadline {
                tokio::time::sleep_until((now + params.poll_interval).min(deadline)).await;
            }
            if Instant::now() >= deadline {
                state = state.deadline_reached();
                break (ReportStatus::Timeout, final_state);
            }
            last_state = Some(final_state);
        };
        debug_assert!(state.is_terminal());

        let message = match status {
            ReportStatus::Success => {
                append(
                    &mut timeline,
                    EventKind::PipelineSuccess,
                    "Complete pipeline success",
                    json!({ "iterations": iterations }),
                );
                "Pipeline monitoring completed successfully".to_string()
            }
            ReportStatus::Failed => {
                let conclusion = match &final_state.poll.build.outcome {
                    BuildOutcome::Failure(conclusion) => conclusion.clone(),
                    other => format!("{:?}", other).to_lowercase(),
                };
                append(
                    &mut timeline,
                    EventKind::PipelineFailure,
                    format!("Pipeline failed at build: {}", conclusion),
                    json!({
                        "run_id": &final_state.poll.build.run_id,
                        "url": &final_state.poll.build.run_url,
                        "outcome": &conclusion,
                    }),
                );
                format!("Pipeline failed: build run {}", conclusion)
            }
            ReportStatus::Timeout => {
                let message = format!(
                    "Pipeline monitoring timed out after {:?}",
                    params.max_duration
                );
                append(
                    &mut timeline,
                    EventKind::Timeout,
                    message.clone(),
                    json!({ "iterations": iterations }),
                );
                message
            }
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        obs::emit_monitor_finished(status, duration_ms, iterations);

        PipelineReport {
            session_id,
            identity: params.identity.clone(),
            branch: params.branch.clone(),
            status,
            message,
            duration_ms,
            iterations,
            final_state,
            timeline: timeline.into_events(),
        }
    }
}

fn append(
    timeline: &mut Timeline,
    kind: EventKind,
    message: impl Into<String>,
    payload: serde_json::Value,
) {
    timeline.push(kind, message, payload);
    obs::emit_timeline_appended(kind, timeline.len());
}

/// Remembers what was already recorded so only transitions hit the timeline.
#[derive(Debug, Default)]
struct TransitionObserver {
    last_build: Option<(String, BuildOutcome)>,
    last_deployment: Option<(bool, usize)>,
}

impl TransitionObserver {
    fn observe(&mut self, poll: &PollResult, timeline: &mut Timeline) {
        self.observe_build(poll, timeline);
        self.observe_deployment(poll, timeline);
    }

    fn observe_build(&mut self, poll: &PollResult, timeline: &mut Timeline) {
        let build = &poll.build;
        let Some(run_id) = build.run_id.as_ref() else {
            return;
        };
        if !build.is_concluded() {
            return;
        }
        let key = (run_id.clone(), build.outcome.clone());
        if self.last_build.as_ref() == Some(&key) {
            return;
        }

        let payload = json!({ "run_id": run_id, "url": &build.run_url });
        match &build.outcome {
            BuildOutcome::Success => append(
                timeline,
                EventKind::BuildSuccess,
                "Build run completed successfully",
                payload,
            ),
            BuildOutcome::Failure(conclusion) => append(
                timeline,
                EventKind::BuildFailure,
                format!("Build run failed: {}", conclusion),
                payload,
            ),
            BuildOutcome::Unknown => return,
        }
        self.last_build = Some(key);
    }

    fn observe_deployment(&mut self, poll: &PollResult, timeline: &mut Timeline) {
        let deployment = &poll.deployment;
        // An unreachable provider is not a transition.
        if !deployment.reachable {
            return;
        }
        let current = (deployment.deployed, deployment.healthy_instance_count);
        let changed = match self.last_deployment {
            None => deployment.deployed,
            Some(previous) => previous != current,
        };
        if changed {
            let message = if deployment.deployed {
                format!(
                    "Deployment: {} healthy instance(s) deployed",
                    deployment.healthy_instance_count
                )
            } else {
                "Deployment: not deployed".to_string()
            };
            append(
                timeline,
                EventKind::DeploymentStatus,
                message,
                json!({
                    "deployed": deployment.deployed,
                    "healthy_instance_count": deployment.healthy_instance_count,
                }),
            );
        }
        self.last_deployment = Some(current);
    }
}

//! Structured observability hooks for monitoring sessions.
//!
//! This module provides:
//! - The session-scoped tracing span, attached to the session future with
//!   [`tracing::Instrument`]
//! - Emission functions for session lifecycle events: start, poll, provider
//!   outage, timeline append, finish
//!
//! Events are emitted at `info!` level unless noted (filter with `RUST_LOG`).
//! For JSON output, initialise tracing with [`crate::telemetry::LogFormat::Json`].

use tracing::{debug, info, warn};

use crate::report::ReportStatus;
use crate::snapshot::PollResult;
use crate::timeline::EventKind;

/// Span carrying `session_id` and `identity` for every event of a session.
///
/// # Example
///
/// ```ignore
/// use tracing::Instrument;
///
/// let span = session_span("5b7c...", "org/app");
/// run_session().instrument(span).await;
/// ```
pub fn session_span(session_id: &str, identity: &str) -> tracing::Span {
    tracing::info_span!("pipewatch.session", session_id = %session_id, identity = %identity)
}

/// Emit event: monitoring session started.
pub fn emit_monitor_started(
    identity: &str,
    branch: Option<&str>,
    poll_interval_ms: u64,
    max_duration_ms: u64,
) {
    info!(
        event = "monitor.started",
        identity = %identity,
        branch = branch.unwrap_or("*"),
        poll_interval_ms = poll_interval_ms,
        max_duration_ms = max_duration_ms,
    );
}

/// Emit event: one poll iteration derived a snapshot.
pub fn emit_poll_completed(iteration: u32, poll: &PollResult) {
    debug!(
        event = "monitor.polled",
        iteration = iteration,
        build_state = ?poll.build.state,
        build_outcome = ?poll.build.outcome,
        deployed = poll.deployment.deployed,
        healthy_instances = poll.deployment.healthy_instance_count,
    );
}

/// Emit event: the latest build has no conclusion yet.
///
/// Kept apart from [`emit_provider_unavailable`] so a pending build and an
/// unreachable provider can be told apart in logs.
pub fn emit_build_pending(iteration: u32, run_id: Option<&str>) {
    debug!(
        event = "monitor.build_pending",
        iteration = iteration,
        run_id = run_id.unwrap_or("none"),
    );
}

/// Emit event: a provider query failed this iteration (warning level).
pub fn emit_provider_unavailable(provider: &str, iteration: u32, error: &dyn std::fmt::Display) {
    warn!(
        event = "monitor.provider_unavailable",
        provider = %provider,
        iteration = iteration,
        error = %error,
    );
}

/// Emit event: providers had not answered when the session deadline passed.
pub fn emit_poll_deadline(iteration: u32, max_duration_ms: u64) {
    warn!(
        event = "monitor.poll_deadline",
        iteration = iteration,
        max_duration_ms = max_duration_ms,
    );
}

/// Emit event: an event was appended to the session timeline.
pub fn emit_timeline_appended(kind: EventKind, seq: usize) {
    info!(event = "monitor.timeline_appended", kind = %kind, seq = seq);
}

/// Emit event: session finished with a terminal status.
pub fn emit_monitor_finished(status: ReportStatus, duration_ms: u64, iterations: u32) {
    info!(
        event = "monitor.finished",
        status = %status,
        duration_ms = duration_ms,
        iterations = iterations,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_span_is_named() {
        let span = session_span("session-1", "org/app");
        if let Some(meta) = span.metadata() {
            assert_eq!(meta.name(), "pipewatch.session");
        }
    }
}

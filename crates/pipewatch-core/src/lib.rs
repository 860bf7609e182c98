//! pipewatch core library
//!
//! Watches a build pipeline end to end: polls a build-status provider and a
//! deployment-status provider until the subject is built and healthily
//! deployed, the build fails, or the session times out.

pub mod error;
pub mod fakes;
pub mod model;
pub mod monitor;
pub mod obs;
pub mod provider;
pub mod report;
pub mod snapshot;
pub mod summary;
pub mod telemetry;
pub mod timeline;
pub mod tools;

pub use error::{MonitorError, ProviderError, ProviderResult, Result, ToolError};
pub use model::{BuildRun, DeploymentInstance, DeploymentState, ProviderResponse};
pub use monitor::{MonitorParams, PipelineMonitor};
pub use obs::{
    emit_build_pending, emit_monitor_finished, emit_monitor_started, emit_poll_completed,
    emit_poll_deadline, emit_provider_unavailable, emit_timeline_appended, session_span,
};
pub use provider::{BuildStatusProvider, DeploymentStatusProvider};
pub use report::{FinalState, PipelineReport, ReportStatus};
pub use snapshot::{
    BuildOutcome, BuildSnapshot, BuildState, DeploymentSnapshot, PollResult, SessionState,
};
pub use summary::{deployment_summary, recommendations, DeploymentSummary};
pub use telemetry::{init_tracing, LogFormat};
pub use timeline::{EventKind, Timeline, TimelineEvent};
pub use tools::{ToolDispatcher, ToolRequest, TOOL_NAMES};

//! Append-only event timeline for one monitoring session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Closed set of timeline event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Start,
    BuildSuccess,
    BuildFailure,
    DeploymentStatus,
    PipelineSuccess,
    PipelineFailure,
    Timeout,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Start => "start",
            EventKind::BuildSuccess => "build-success",
            EventKind::BuildFailure => "build-failure",
            EventKind::DeploymentStatus => "deployment-status",
            EventKind::PipelineSuccess => "pipeline-success",
            EventKind::PipelineFailure => "pipeline-failure",
            EventKind::Timeout => "timeout",
        }
    }

    /// Whether this kind closes a session.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EventKind::PipelineSuccess | EventKind::PipelineFailure | EventKind::Timeout
        )
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single timeline entry. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    pub message: String,
    pub payload: Map<String, Value>,
}

/// Ordered, append-only sequence of [`TimelineEvent`]s.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timeline {
    events: Vec<TimelineEvent>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event stamped with the current wall-clock time.
    pub fn push(&mut self, kind: EventKind, message: impl Into<String>, payload: Value) {
        self.push_at(Utc::now(), kind, message, payload);
    }

    /// Append an event with an explicit timestamp.
    ///
    /// Timestamps never go backwards: an earlier `timestamp` is clamped to
    /// the previous event's.
    pub fn push_at(
        &mut self,
        timestamp: DateTime<Utc>,
        kind: EventKind,
        message: impl Into<String>,
        payload: Value,
    ) {
        let timestamp = match self.events.last() {
            Some(last) if last.timestamp > timestamp => last.timestamp,
            _ => timestamp,
        };
        let payload = match payload {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        self.events.push(TimelineEvent {
            timestamp,
            kind,
            message: message.into(),
            payload,
        });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    pub fn last(&self) -> Option<&TimelineEvent> {
        self.events.last()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    pub fn into_events(self) -> Vec<TimelineEvent> {
        self.events
    }
}

//! In-memory fakes for the provider traits (testing only)
//!
//! Provides `ScriptedBuildProvider` and `ScriptedDeploymentProvider`, which
//! replay a fixed script of responses, one per call. Once the script runs
//! out the last response repeats.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::error::{ProviderError, ProviderResult};
use crate::model::{BuildRun, DeploymentInstance, DeploymentState};
use crate::provider::{BuildStatusProvider, DeploymentStatusProvider};

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Script<T> {
    pending: VecDeque<ProviderResult<T>>,
    last: Option<ProviderResult<T>>,
    calls: usize,
}

impl<T: Clone> Script<T> {
    fn new(responses: Vec<ProviderResult<T>>) -> Self {
        Self {
            pending: responses.into(),
            last: None,
            calls: 0,
        }
    }

    fn next(&mut self) -> ProviderResult<T> {
        self.calls += 1;
        if let Some(response) = self.pending.pop_front() {
            self.last = Some(response.clone());
            return response;
        }
        self.last
            .clone()
            .unwrap_or_else(|| Err(ProviderError::Unreachable("script is empty".to_string())))
    }
}

// ---------------------------------------------------------------------------
// ScriptedBuildProvider
// ---------------------------------------------------------------------------

/// Build provider replaying scripted `get_recent_runs` responses.
#[derive(Debug)]
pub struct ScriptedBuildProvider {
    script: Mutex<Script<Vec<BuildRun>>>,
    branches: Mutex<Vec<Option<String>>>,
}

impl ScriptedBuildProvider {
    pub fn new(responses: Vec<ProviderResult<Vec<BuildRun>>>) -> Self {
        Self {
            script: Mutex::new(Script::new(responses)),
            branches: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with the same runs.
    pub fn always(runs: Vec<BuildRun>) -> Self {
        Self::new(vec![Ok(runs)])
    }

    pub fn calls(&self) -> usize {
        self.script.lock().unwrap().calls
    }

    /// Branch filter passed on each call, in call order.
    pub fn branches_seen(&self) -> Vec<Option<String>> {
        self.branches.lock().unwrap().clone()
    }
}

#[async_trait]
impl BuildStatusProvider for ScriptedBuildProvider {
    async fn get_recent_runs(
        &self,
        _identity: &str,
        branch: Option<&str>,
    ) -> ProviderResult<Vec<BuildRun>> {
        self.branches
            .lock()
            .unwrap()
            .push(branch.map(str::to_string));
        self.script.lock().unwrap().next()
    }
}

// ---------------------------------------------------------------------------
// ScriptedDeploymentProvider
// ---------------------------------------------------------------------------

/// Deployment provider replaying scripted `get_deployment_state` responses.
#[derive(Debug)]
pub struct ScriptedDeploymentProvider {
    script: Mutex<Script<DeploymentState>>,
}

impl ScriptedDeploymentProvider {
    pub fn new(responses: Vec<ProviderResult<DeploymentState>>) -> Self {
        Self {
            script: Mutex::new(Script::new(responses)),
        }
    }

    pub fn always(state: DeploymentState) -> Self {
        Self::new(vec![Ok(state)])
    }

    pub fn calls(&self) -> usize {
        self.script.lock().unwrap().calls
    }
}

#[async_trait]
impl DeploymentStatusProvider for ScriptedDeploymentProvider {
    async fn get_deployment_state(&self, _identity: &str) -> ProviderResult<DeploymentState> {
        self.script.lock().unwrap().next()
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A run with the given status and outcome, created `age_secs` ago.
pub fn build_run(id: &str, status: &str, outcome: Option<&str>, age_secs: i64) -> BuildRun {
    BuildRun {
        id: id.to_string(),
        name: "ci".to_string(),
        status: status.to_string(),
        outcome: outcome.map(str::to_string),
        created_at: Utc::now() - Duration::seconds(age_secs),
        branch: Some("main".to_string()),
        url: format!("https://ci.example.com/runs/{}", id),
    }
}

pub fn completed_run(id: &str, outcome: &str) -> BuildRun {
    build_run(id, "completed", Some(outcome), 0)
}

pub fn running_run(id: &str) -> BuildRun {
    build_run(id, "in_progress", None, 0)
}

/// A deployment with `healthy` healthy instances out of `total`.
pub fn deployment(healthy: usize, total: usize) -> DeploymentState {
    let instances = (0..total)
        .map(|i| DeploymentInstance {
            url: format!("https://instance-{}.example.com/mcp", i),
            healthy: i < healthy,
            response_time_ms: Some(20.0),
            tool_count: 2,
        })
        .collect();
    DeploymentState::from_instances(instances)
}

pub fn unreachable(reason: &str) -> ProviderError {
    ProviderError::Unreachable(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_repeats_last_response() {
        let provider = ScriptedBuildProvider::new(vec![
            Err(unreachable("blip")),
            Ok(vec![running_run("1")]),
        ]);

        assert!(provider.get_recent_runs("org/app", None).await.is_err());
        assert_eq!(provider.get_recent_runs("org/app", None).await.unwrap().len(), 1);
        assert_eq!(provider.get_recent_runs("org/app", None).await.unwrap().len(), 1);
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_empty_script_is_unreachable() {
        let provider = ScriptedDeploymentProvider::new(vec![]);
        let err = provider.get_deployment_state("org/app").await.unwrap_err();
        assert!(matches!(err, ProviderError::Unreachable(_)));
    }

    #[test]
    fn test_deployment_fixture_counts() {
        let state = deployment(1, 3);
        assert!(state.is_deployed);
        assert_eq!(state.healthy_instance_count, 1);
        assert_eq!(state.instances.len(), 3);
    }
}

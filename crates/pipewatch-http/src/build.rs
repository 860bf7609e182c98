//! Build-status provider backed by a JSON runs endpoint

use async_trait::async_trait;
use pipewatch_core::{BuildRun, BuildStatusProvider, ProviderResult};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::client::{default_client, parse_endpoint, JsonEndpoint, DEFAULT_TIMEOUT};
use crate::error::Result;

#[derive(Debug, Deserialize)]
struct RunsEnvelope {
    runs: Vec<BuildRun>,
}

/// Queries `GET <runs_url>?identity=<id>[&branch=<b>]`.
///
/// The endpoint answers `{"runs": [...]}`. Runs are re-sorted newest first
/// and, when a branch was requested, runs tagged with another branch are
/// dropped in case the endpoint ignores the filter.
#[derive(Debug, Clone)]
pub struct HttpBuildStatusProvider {
    endpoint: JsonEndpoint,
}

impl HttpBuildStatusProvider {
    pub fn new(runs_url: &str) -> Result<Self> {
        let url = parse_endpoint(runs_url)?;
        Ok(Self {
            endpoint: JsonEndpoint::new(default_client(DEFAULT_TIMEOUT)?, url),
        })
    }

    /// Use a caller-configured client.
    pub fn with_client(mut self, client: Client) -> Self {
        self.endpoint = self.endpoint.with_client(client);
        self
    }

    pub fn runs_url(&self) -> &str {
        self.endpoint.url().as_str()
    }
}

#[async_trait]
impl BuildStatusProvider for HttpBuildStatusProvider {
    async fn get_recent_runs(
        &self,
        identity: &str,
        branch: Option<&str>,
    ) -> ProviderResult<Vec<BuildRun>> {
        let mut query = vec![("identity", identity)];
        if let Some(branch) = branch {
            query.push(("branch", branch));
        }

        let envelope: RunsEnvelope = self.endpoint.get(&query).await?;
        let mut runs = envelope.runs;

        if let Some(branch) = branch {
            runs.retain(|run| run.branch.as_deref().map_or(true, |b| b == branch));
        }
        runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        debug!(identity, count = runs.len(), "fetched build runs");
        Ok(runs)
    }
}

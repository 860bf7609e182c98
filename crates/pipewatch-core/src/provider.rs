//! Status provider traits.
//!
//! The poller talks to the outside world only through these two read
//! interfaces. Endpoints, credentials and rate limits belong to the
//! implementations. In-memory fakes live in the `fakes` module.

use async_trait::async_trait;

use crate::error::ProviderResult;
use crate::model::{BuildRun, DeploymentState};

/// Reports recent automated build/test runs for a pipeline subject.
#[async_trait]
pub trait BuildStatusProvider: Send + Sync {
    /// Recent runs for `identity`, optionally filtered by `branch`,
    /// ordered most-recent-first.
    async fn get_recent_runs(
        &self,
        identity: &str,
        branch: Option<&str>,
    ) -> ProviderResult<Vec<BuildRun>>;
}

/// Reports whether a pipeline subject is deployed and how healthy it is.
#[async_trait]
pub trait DeploymentStatusProvider: Send + Sync {
    async fn get_deployment_state(&self, identity: &str) -> ProviderResult<DeploymentState>;
}

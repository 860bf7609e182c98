//! Deployment-status provider backed by a JSON endpoint

use async_trait::async_trait;
use pipewatch_core::{DeploymentState, DeploymentStatusProvider, ProviderResult};
use reqwest::Client;
use tracing::debug;

use crate::client::{default_client, parse_endpoint, JsonEndpoint, DEFAULT_TIMEOUT};
use crate::error::Result;
use crate::probe::InstanceProbe;

/// Queries `GET <deployment_url>?identity=<id>`, which answers a
/// `DeploymentState` document.
///
/// With probing enabled every listed instance is fetched directly and the
/// reported health is replaced by what the probe saw.
#[derive(Debug, Clone)]
pub struct HttpDeploymentStatusProvider {
    endpoint: JsonEndpoint,
    probe: Option<InstanceProbe>,
}

impl HttpDeploymentStatusProvider {
    pub fn new(deployment_url: &str) -> Result<Self> {
        let url = parse_endpoint(deployment_url)?;
        Ok(Self {
            endpoint: JsonEndpoint::new(default_client(DEFAULT_TIMEOUT)?, url),
            probe: None,
        })
    }

    /// Use a caller-configured client for both the endpoint and probes.
    pub fn with_client(mut self, client: Client) -> Self {
        self.endpoint = self.endpoint.with_client(client.clone());
        self.probe = self.probe.take().map(|p| p.with_client(client));
        self
    }

    /// Probe each instance URL instead of trusting the reported health.
    pub fn with_probe(mut self, probe: InstanceProbe) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Enable probing with the provider's own client.
    pub fn probing(self) -> Self {
        let probe = InstanceProbe::new(self.endpoint.client().clone());
        self.with_probe(probe)
    }

    pub fn deployment_url(&self) -> &str {
        self.endpoint.url().as_str()
    }
}

#[async_trait]
impl DeploymentStatusProvider for HttpDeploymentStatusProvider {
    async fn get_deployment_state(&self, identity: &str) -> ProviderResult<DeploymentState> {
        let state: DeploymentState = self.endpoint.get(&[("identity", identity)]).await?;

        let Some(probe) = &self.probe else {
            return Ok(state);
        };

        let instances = probe.probe_all(&state.instances).await;
        let healthy_instance_count = instances.iter().filter(|i| i.healthy).count();
        debug!(
            identity,
            reported = state.healthy_instance_count,
            probed = healthy_instance_count,
            "probed deployment instances"
        );

        Ok(DeploymentState {
            is_deployed: state.is_deployed || !instances.is_empty(),
            healthy_instance_count,
            instances,
        })
    }
}

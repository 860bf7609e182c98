//! Direct health probing of deployed instances

use std::time::{Duration, Instant};

use futures::future::join_all;
use pipewatch_core::DeploymentInstance;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

/// Per-instance probe timeout used when none is configured.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// An instance that answers 401 is up and merely wants credentials.
pub fn is_healthy_status(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::UNAUTHORIZED
}

/// Probes instance URLs concurrently and overwrites their reported health.
#[derive(Debug, Clone)]
pub struct InstanceProbe {
    client: Client,
    timeout: Duration,
}

impl InstanceProbe {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn probe(&self, instance: &DeploymentInstance) -> DeploymentInstance {
        let started = Instant::now();
        let result = self
            .client
            .get(&instance.url)
            .timeout(self.timeout)
            .send()
            .await;

        let mut probed = instance.clone();
        match result {
            Ok(response) => {
                let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
                probed.healthy = is_healthy_status(response.status());
                probed.response_time_ms = Some((elapsed_ms * 100.0).round() / 100.0);
                debug!(
                    url = %instance.url,
                    status = response.status().as_u16(),
                    healthy = probed.healthy,
                    "probed instance"
                );
            }
            Err(e) => {
                warn!(url = %instance.url, error = %e, "instance probe failed");
                probed.healthy = false;
                probed.response_time_ms = None;
            }
        }
        probed
    }

    pub async fn probe_all(&self, instances: &[DeploymentInstance]) -> Vec<DeploymentInstance> {
        join_all(instances.iter().map(|i| self.probe(i))).await
    }
}

//! One-shot deployment summary with recommendations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{BuildRun, DeploymentState, ProviderResponse};
use crate::provider::{BuildStatusProvider, DeploymentStatusProvider};

/// Health assessment of a pipeline subject at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentSummary {
    pub identity: String,
    pub timestamp: DateTime<Utc>,
    /// Latest run succeeded and at least one healthy instance is deployed.
    pub pipeline_healthy: bool,
    pub build_runs: ProviderResponse<Vec<BuildRun>>,
    pub deployment: ProviderResponse<DeploymentState>,
    pub recommendations: Vec<String>,
}

/// Query both providers once and assess the pipeline.
pub async fn deployment_summary(
    build: &dyn BuildStatusProvider,
    deployment: &dyn DeploymentStatusProvider,
    identity: &str,
) -> DeploymentSummary {
    let (runs, state) = tokio::join!(
        build.get_recent_runs(identity, None),
        deployment.get_deployment_state(identity),
    );
    let build_runs: ProviderResponse<Vec<BuildRun>> = runs.into();
    let deployment: ProviderResponse<DeploymentState> = state.into();

    let latest_succeeded = build_runs
        .ok()
        .and_then(|runs| runs.first())
        .map(BuildRun::succeeded)
        .unwrap_or(false);
    let healthy_deployed = deployment
        .ok()
        .map(|d| d.is_deployed && d.healthy_instance_count > 0)
        .unwrap_or(false);

    DeploymentSummary {
        identity: identity.to_string(),
        timestamp: Utc::now(),
        pipeline_healthy: latest_succeeded && healthy_deployed,
        recommendations: recommendations(&build_runs, &deployment),
        build_runs,
        deployment,
    }
}

/// Actionable hints derived from the current provider responses.
pub fn recommendations(
    build_runs: &ProviderResponse<Vec<BuildRun>>,
    deployment: &ProviderResponse<DeploymentState>,
) -> Vec<String> {
    let mut out = Vec::new();

    match build_runs {
        ProviderResponse::Unavailable { error } => {
            out.push(format!("Build status could not be read: {}", error));
        }
        ProviderResponse::Ok { data } => match data.first() {
            None => out.push(
                "Consider setting up automated builds for testing and deployment".to_string(),
            ),
            Some(latest) if latest.is_completed() && !latest.succeeded() => {
                if latest.outcome.is_some() {
                    out.push(format!("Fix failing build run: {}", latest.url));
                }
            }
            Some(_) => {}
        },
    }

    match deployment {
        ProviderResponse::Unavailable { error } => {
            out.push(format!("Deployment status could not be read: {}", error));
        }
        ProviderResponse::Ok { data } if !data.is_deployed => {
            out.push("Deploy the service to make it reachable remotely".to_string());
        }
        ProviderResponse::Ok { data } => {
            if data.healthy_instance_count == 0 {
                out.push("Check instance health - no healthy instances detected".to_string());
            }
            if data.total_tools() == 0 {
                out.push(
                    "Deployed but no tools detected - check tool registration".to_string(),
                );
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{
        completed_run, deployment as deployed, unreachable, ScriptedBuildProvider,
        ScriptedDeploymentProvider,
    };

    #[tokio::test]
    async fn test_healthy_pipeline_has_no_recommendations() {
        let build = ScriptedBuildProvider::always(vec![completed_run("7", "success")]);
        let deploy = ScriptedDeploymentProvider::always(deployed(2, 2));

        let summary = deployment_summary(&build, &deploy, "org/app").await;
        assert!(summary.pipeline_healthy);
        assert!(summary.recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_failed_run_points_at_url() {
        let build = ScriptedBuildProvider::always(vec![completed_run("9", "failure")]);
        let deploy = ScriptedDeploymentProvider::always(deployed(1, 1));

        let summary = deployment_summary(&build, &deploy, "org/app").await;
        assert!(!summary.pipeline_healthy);
        assert!(summary
            .recommendations
            .iter()
            .any(|r| r.contains("https://ci.example.com/runs/9")));
    }

    #[tokio::test]
    async fn test_unreachable_providers_are_reported() {
        let build = ScriptedBuildProvider::new(vec![Err(unreachable("dns"))]);
        let deploy = ScriptedDeploymentProvider::new(vec![Err(unreachable("tls"))]);

        let summary = deployment_summary(&build, &deploy, "org/app").await;
        assert!(!summary.pipeline_healthy);
        assert_eq!(summary.recommendations.len(), 2);
        assert!(summary.recommendations[0].contains("Build status"));
        assert!(summary.recommendations[1].contains("Deployment status"));
    }

    #[test]
    fn test_deployed_without_health_or_tools() {
        let mut state = deployed(0, 1);
        state.instances[0].tool_count = 0;
        let recs = recommendations(
            &ProviderResponse::Ok { data: vec![] },
            &ProviderResponse::Ok { data: state },
        );
        assert_eq!(recs.len(), 3);
        assert!(recs[0].contains("automated builds"));
        assert!(recs[1].contains("no healthy instances"));
        assert!(recs[2].contains("no tools"));
    }

    #[test]
    fn test_not_deployed_recommends_deploy() {
        let recs = recommendations(
            &ProviderResponse::Ok {
                data: vec![completed_run("1", "success")],
            },
            &ProviderResponse::Ok {
                data: DeploymentState::not_deployed(),
            },
        );
        assert_eq!(recs, vec!["Deploy the service to make it reachable remotely"]);
    }
}

//! Tool dispatcher routed to scripted providers.

use std::sync::Arc;

use pipewatch_core::fakes::{
    build_run, completed_run, deployment, unreachable, ScriptedBuildProvider,
    ScriptedDeploymentProvider,
};
use pipewatch_core::{ToolDispatcher, ToolError, TOOL_NAMES};
use serde_json::{json, Value};

fn dispatcher(build: ScriptedBuildProvider, deploy: ScriptedDeploymentProvider) -> ToolDispatcher {
    ToolDispatcher::new(Arc::new(build), Arc::new(deploy))
}

fn healthy() -> ToolDispatcher {
    dispatcher(
        ScriptedBuildProvider::always(vec![completed_run("1", "success")]),
        ScriptedDeploymentProvider::always(deployment(2, 2)),
    )
}

#[tokio::test]
async fn ping_returns_pong() {
    let result = healthy().call("ping", Value::Null).await.unwrap();
    assert_eq!(result, json!("pong"));
}

#[tokio::test]
async fn health_check_lists_every_tool() {
    let result = healthy().call("health_check", json!({})).await.unwrap();
    assert_eq!(result["status"], "healthy");
    let tools: Vec<&str> = result["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t.as_str().unwrap())
        .collect();
    assert_eq!(tools, TOOL_NAMES);
}

#[tokio::test]
async fn unknown_method_is_explicit() {
    let err = healthy().call("get_forecast", Value::Null).await.unwrap_err();
    assert!(matches!(err, ToolError::UnknownMethod(ref m) if m == "get_forecast"));
}

#[tokio::test]
async fn check_build_status_truncates_to_limit() {
    let runs = (0..8)
        .map(|i| build_run(&i.to_string(), "completed", Some("success"), i))
        .collect();
    let tools = dispatcher(
        ScriptedBuildProvider::always(runs),
        ScriptedDeploymentProvider::always(deployment(1, 1)),
    );

    let result = tools
        .call("check_build_status", json!({ "identity": "org/app" }))
        .await
        .unwrap();
    assert_eq!(result["total_runs"], 8);
    assert_eq!(result["runs"].as_array().unwrap().len(), 5);

    let result = tools
        .call(
            "check_build_status",
            json!({ "identity": "org/app", "limit": 2 }),
        )
        .await
        .unwrap();
    assert_eq!(result["runs"].as_array().unwrap().len(), 2);
    assert_eq!(result["runs"][0]["id"], "0");
}

#[tokio::test]
async fn provider_errors_surface_for_direct_queries() {
    let tools = dispatcher(
        ScriptedBuildProvider::always(vec![]),
        ScriptedDeploymentProvider::new(vec![Err(unreachable("registry down"))]),
    );

    let err = tools
        .call("check_deployment", json!({ "identity": "org/app" }))
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::Provider(_)));
    assert!(err.to_string().contains("registry down"));
}

#[tokio::test]
async fn check_deployment_returns_state() {
    let result = healthy()
        .call("check_deployment", json!({ "identity": "org/app" }))
        .await
        .unwrap();
    assert_eq!(result["is_deployed"], true);
    assert_eq!(result["healthy_instance_count"], 2);
}

#[tokio::test(start_paused = true)]
async fn monitor_pipeline_returns_report() {
    let result = healthy()
        .call(
            "monitor_pipeline",
            json!({ "identity": "org/app", "poll_interval_secs": 1, "max_duration_secs": 5 }),
        )
        .await
        .unwrap();
    assert_eq!(result["status"], "success");
    assert_eq!(result["iterations"], 1);
}

#[tokio::test]
async fn monitor_pipeline_rejects_zero_interval() {
    let err = healthy()
        .call(
            "monitor_pipeline",
            json!({ "identity": "org/app", "poll_interval_secs": 0 }),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::Monitor(_)));
}

#[tokio::test]
async fn deployment_summary_reports_health() {
    let result = healthy()
        .call("deployment_summary", json!({ "identity": "org/app" }))
        .await
        .unwrap();
    assert_eq!(result["pipeline_healthy"], true);
    assert_eq!(result["recommendations"], json!([]));
}

#[tokio::test]
async fn unexpected_params_are_rejected() {
    let err = healthy()
        .call(
            "deployment_summary",
            json!({ "identity": "org/app", "city": "Oslo" }),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::InvalidParams { ref method, .. } if method == "deployment_summary"));
}

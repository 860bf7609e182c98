//! HTTP status providers for pipewatch
//!
//! Generic HTTP+JSON implementations of the core provider traits. Each
//! provider targets one GET endpoint; the response shapes are the core
//! model types serialized as JSON.

pub mod build;
pub mod client;
pub mod deployment;
pub mod error;
pub mod probe;

pub use build::HttpBuildStatusProvider;
pub use client::{default_client, parse_endpoint, DEFAULT_TIMEOUT};
pub use deployment::HttpDeploymentStatusProvider;
pub use error::{HttpError, Result};
pub use probe::{is_healthy_status, InstanceProbe, DEFAULT_PROBE_TIMEOUT};

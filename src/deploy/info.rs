// ABOUTME: Immutable value object describing one deployment.
// ABOUTME: Shared read-only with every per-foundation worker.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Properties of a single deployment, fixed at construction.
///
/// Every worker receives the same shared reference; nothing mutates it once
/// the orchestrator starts. The serialized shape keeps the wire names clients
/// already depend on: `artifact_url`, `manifest`, `environment_variables`,
/// and `data` in snake_case, the remaining fields in PascalCase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeploymentInfo {
    #[serde(rename = "artifact_url")]
    pub artifact_url: String,

    /// Inline manifest text overriding the artifact's own manifest.
    #[serde(rename = "manifest", default)]
    pub manifest: String,

    pub username: String,
    pub password: String,
    pub environment: String,
    pub org: String,
    pub space: String,
    pub app_name: String,

    /// Identifies this deployment across log lines and foundations.
    #[serde(rename = "UUID")]
    pub uuid: String,

    #[serde(rename = "SkipSSL", default)]
    pub skip_ssl: bool,

    #[serde(default)]
    pub instances: u16,

    #[serde(default)]
    pub domain: String,

    /// Local path of the extracted artifact.
    #[serde(default)]
    pub app_path: String,

    #[serde(rename = "environment_variables", default)]
    pub environment_variables: HashMap<String, String>,

    /// Open object for callers to attach their own deployment properties.
    #[serde(rename = "data", default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl DeploymentInfo {
    pub fn has_environment_variables(&self) -> bool {
        !self.environment_variables.is_empty()
    }
}

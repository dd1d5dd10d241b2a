//! Status types for tracking reconciliation state.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Status of the `TenantStack` resource.
#[derive(Debug, Clone, Deserialize, Serialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TenantStackStatus {
    /// Conditions represent the latest available observations
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Observed generation
    #[serde(default)]
    pub observed_generation: Option<i64>,
    /// Last reconciliation time
    #[serde(default)]
    pub last_reconcile_time: Option<String>,
    /// Number of child resources created during the last pass
    #[serde(default)]
    pub resources_created: Option<i32>,
}

/// Condition represents a status condition for the resource.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    pub r#type: String,
    /// Status of condition (True, False, Unknown)
    pub status: String,
    /// Last transition time
    #[serde(default)]
    pub last_transition_time: Option<String>,
    /// Reason for condition
    #[serde(default)]
    pub reason: Option<String>,
    /// Message describing condition
    #[serde(default)]
    pub message: Option<String>,
}

impl TenantStackStatus {
    /// Status written after a fully converged pass.
    pub fn ready(observed_generation: Option<i64>, resources_created: i32) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            conditions: vec![Condition {
                r#type: "Ready".to_string(),
                status: "True".to_string(),
                last_transition_time: Some(now.clone()),
                reason: Some("ReconciliationSucceeded".to_string()),
                message: Some(format!("Created {resources_created} child resources")),
            }],
            observed_generation,
            last_reconcile_time: Some(now),
            resources_created: Some(resources_created),
        }
    }
}

//! `TenantStack` custom resource specification and default values.
//!
//! A `TenantStack` is cluster-scoped: the object name is the tenant
//! identifier, every child resource name is derived from it, and the
//! children live in the per-tenant namespace while their owner references
//! point back at this object.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::status::TenantStackStatus;

/// TenantStack Custom Resource Definition
///
/// Declares one isolated application stack. The controller materializes the
/// declaration into a dedicated `tenant-<name>` namespace holding the
/// workload, its storage, networking, scaling, and credential objects.
///
/// # Example
///
/// ```yaml
/// apiVersion: tenancy.microscaler.io/v1alpha1
/// kind: TenantStack
/// metadata:
///   name: acme
/// spec:
///   hostname: acme.example.org
///   image: registry.example.org/app:1.4.2
///   storage:
///     size: 10Gi
///   database:
///     host: db.infra.svc
///     adminSecretName: acme-db
///     databaseName: acme
///     user: acme
///     password: hunter2
/// ```
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "tenancy.microscaler.io",
    version = "v1alpha1",
    kind = "TenantStack",
    status = "TenantStackStatus",
    printcolumn = r#"{"name":"Hostname", "type":"string", "jsonPath":".spec.hostname"}"#,
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct TenantStackSpec {
    /// Hostname the stack is published under (`https://<hostname>`)
    pub hostname: String,
    /// Container image for the application workload
    pub image: String,
    /// Compute requests/limits for the application container
    #[serde(default)]
    pub resources: Option<WorkloadResources>,
    /// Horizontal autoscaling policy
    #[serde(default)]
    pub autoscaling: AutoscalingSpec,
    /// Persistent storage for application data
    pub storage: StorageSpec,
    /// Connection details for the pre-provisioned database
    pub database: DatabaseRef,
    /// Runtime tuning for the application container
    #[serde(default)]
    pub runtime: Option<RuntimeTuning>,
    /// Cache sidecar configuration
    #[serde(default)]
    pub cache: Option<CacheSpec>,
}

/// Compute resources as quantity strings, e.g. `{"cpu": "500m"}`.
///
/// Kept as plain maps in the schema; converted to typed quantities at
/// synthesis time.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadResources {
    #[serde(default)]
    pub requests: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub limits: Option<BTreeMap<String, String>>,
}

/// Horizontal autoscaling policy for the workload.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AutoscalingSpec {
    /// Enables the autoscaler and the disruption budget
    #[serde(default)]
    pub enabled: bool,
    /// Minimum number of replicas (defaults to 2 when enabled)
    #[serde(default)]
    pub min_replicas: Option<i32>,
    /// Maximum number of replicas
    #[serde(default = "default_max_replicas")]
    pub max_replicas: i32,
    /// Target CPU utilization percentage (defaults to 75)
    #[serde(default, rename = "targetCPU")]
    pub target_cpu: Option<i32>,
}

impl Default for AutoscalingSpec {
    fn default() -> Self {
        Self {
            enabled: false,
            min_replicas: None,
            max_replicas: default_max_replicas(),
            target_cpu: None,
        }
    }
}

fn default_max_replicas() -> i32 {
    10
}

/// Persistent storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageSpec {
    /// Requested volume size, e.g. `10Gi`
    pub size: String,
    /// Storage class; defaults to the shared-filesystem class
    #[serde(default)]
    pub storage_class: Option<String>,
}

/// Reference to a pre-provisioned database.
///
/// The connection details are materialized into a namespaced secret named
/// `admin_secret_name` and only ever reach containers by secret-key
/// reference.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseRef {
    pub host: String,
    /// Name of the credential secret, used verbatim (not derived)
    pub admin_secret_name: String,
    pub database_name: String,
    pub user: String,
    pub password: String,
}

/// Runtime tuning for the application container.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeTuning {
    /// Execution timeout in seconds (defaults to 60)
    #[serde(default)]
    pub max_execution_time: Option<i32>,
    /// Memory ceiling, e.g. `512M`
    #[serde(default)]
    pub memory_limit: Option<String>,
}

/// Cache sidecar configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheSpec {
    /// Memory budget for the cache sidecar in megabytes (defaults to 128)
    #[serde(default, rename = "memoryMB")]
    pub memory_mb: Option<i32>,
}

/// Shared-filesystem storage class used when none is declared.
pub const DEFAULT_STORAGE_CLASS: &str = "csi-cephfs-sc";

impl TenantStackSpec {
    /// Deployment replica count: 1 without autoscaling, else the autoscaler
    /// floor.
    pub fn replicas(&self) -> i32 {
        if self.autoscaling.enabled {
            self.min_replicas()
        } else {
            1
        }
    }

    /// Autoscaler floor (defaults to 2).
    pub fn min_replicas(&self) -> i32 {
        self.autoscaling.min_replicas.unwrap_or(2)
    }

    /// Autoscaler CPU utilization target (defaults to 75%).
    pub fn target_cpu(&self) -> i32 {
        self.autoscaling.target_cpu.unwrap_or(75)
    }

    /// Execution timeout in seconds (defaults to 60).
    pub fn max_execution_time(&self) -> i32 {
        self.runtime
            .as_ref()
            .and_then(|r| r.max_execution_time)
            .unwrap_or(60)
    }

    /// Memory ceiling for the application container (defaults to `512M`).
    pub fn memory_limit(&self) -> String {
        self.runtime
            .as_ref()
            .and_then(|r| r.memory_limit.clone())
            .unwrap_or_else(|| "512M".to_string())
    }

    /// Cache sidecar memory budget in megabytes (defaults to 128).
    pub fn cache_memory_mb(&self) -> i32 {
        self.cache.as_ref().and_then(|c| c.memory_mb).unwrap_or(128)
    }

    /// Declared storage class, falling back to the shared-filesystem class.
    pub fn storage_class(&self) -> &str {
        self.storage
            .storage_class
            .as_deref()
            .unwrap_or(DEFAULT_STORAGE_CLASS)
    }

    /// Volume access mode derived from the storage-class name: node-local
    /// classes only support a single writer, everything else is treated as a
    /// shared filesystem.
    pub fn access_mode(&self) -> &'static str {
        match self.storage_class() {
            "local-path" | "hostpath" => "ReadWriteOnce",
            _ => "ReadWriteMany",
        }
    }

    /// Externally visible URL for the stack.
    pub fn public_url(&self) -> String {
        format!("https://{}", self.hostname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_spec() -> TenantStackSpec {
        TenantStackSpec {
            hostname: "acme.example.org".to_string(),
            image: "registry.example.org/app:1.4.2".to_string(),
            resources: None,
            autoscaling: AutoscalingSpec::default(),
            storage: StorageSpec {
                size: "1Gi".to_string(),
                storage_class: None,
            },
            database: DatabaseRef {
                host: "db".to_string(),
                admin_secret_name: "acme-db".to_string(),
                database_name: "acme".to_string(),
                user: "u".to_string(),
                password: "p".to_string(),
            },
            runtime: None,
            cache: None,
        }
    }

    #[test]
    fn replicas_default_to_one_without_autoscaling() {
        assert_eq!(minimal_spec().replicas(), 1);
    }

    #[test]
    fn replicas_follow_autoscaler_floor_when_enabled() {
        let mut spec = minimal_spec();
        spec.autoscaling.enabled = true;
        assert_eq!(spec.replicas(), 2);
        spec.autoscaling.min_replicas = Some(4);
        assert_eq!(spec.replicas(), 4);
    }

    #[test]
    fn tuning_defaults() {
        let spec = minimal_spec();
        assert_eq!(spec.target_cpu(), 75);
        assert_eq!(spec.max_execution_time(), 60);
        assert_eq!(spec.memory_limit(), "512M");
        assert_eq!(spec.cache_memory_mb(), 128);
    }

    #[test]
    fn declared_tuning_wins_over_defaults() {
        let mut spec = minimal_spec();
        spec.runtime = Some(RuntimeTuning {
            max_execution_time: Some(300),
            memory_limit: Some("1G".to_string()),
        });
        spec.cache = Some(CacheSpec { memory_mb: Some(256) });
        assert_eq!(spec.max_execution_time(), 300);
        assert_eq!(spec.memory_limit(), "1G");
        assert_eq!(spec.cache_memory_mb(), 256);
    }

    #[test]
    fn storage_class_defaults_to_shared_filesystem() {
        let spec = minimal_spec();
        assert_eq!(spec.storage_class(), DEFAULT_STORAGE_CLASS);
        assert_eq!(spec.access_mode(), "ReadWriteMany");
    }

    #[test]
    fn node_local_storage_classes_use_single_writer_mode() {
        let mut spec = minimal_spec();
        spec.storage.storage_class = Some("local-path".to_string());
        assert_eq!(spec.access_mode(), "ReadWriteOnce");
        spec.storage.storage_class = Some("hostpath".to_string());
        assert_eq!(spec.access_mode(), "ReadWriteOnce");
        spec.storage.storage_class = Some("nfs-client".to_string());
        assert_eq!(spec.access_mode(), "ReadWriteMany");
    }

    #[test]
    fn spec_deserializes_from_camel_case() {
        let spec: TenantStackSpec = serde_json::from_value(serde_json::json!({
            "hostname": "acme.example.org",
            "image": "registry.example.org/app:1.4.2",
            "autoscaling": {"enabled": true, "maxReplicas": 5, "targetCPU": 60},
            "storage": {"size": "1Gi", "storageClass": "local-path"},
            "database": {
                "host": "db",
                "adminSecretName": "acme-db",
                "databaseName": "acme",
                "user": "u",
                "password": "p"
            },
            "runtime": {"maxExecutionTime": 120},
            "cache": {"memoryMB": 64}
        }))
        .expect("spec should deserialize");
        assert!(spec.autoscaling.enabled);
        assert_eq!(spec.autoscaling.max_replicas, 5);
        assert_eq!(spec.target_cpu(), 60);
        assert_eq!(spec.max_execution_time(), 120);
        assert_eq!(spec.cache_memory_mb(), 64);
        assert_eq!(spec.database.admin_secret_name, "acme-db");
    }
}

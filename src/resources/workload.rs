//! # Workload Synthesis
//!
//! Builders for the tenant's application Deployment and its scheduled
//! maintenance CronJob.
//!
//! The Deployment runs two containers: the application itself and a
//! memcached sidecar sized by the declaration's cache budget. The CronJob
//! runs the image's maintenance entrypoint every five minutes against the
//! same data volume, with a smaller fixed compute footprint.
//!
//! Both share the injected runtime environment: tuning values as literals,
//! database credentials strictly by secret-key reference.

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::batch::v1::{CronJob, CronJobSpec, JobSpec, JobTemplateSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, EnvVarSource, PersistentVolumeClaimVolumeSource,
    PodSecurityContext, PodSpec, PodTemplateSpec, Probe, ResourceRequirements, SecretKeySelector,
    TCPSocketAction, TopologySpreadConstraint, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;

use crate::crd::{TenantStack, TenantStackSpec};
use crate::error::Result;
use crate::resources::{credentials, names, owner_reference, tenant_id};

const HTTP_PORT: i32 = 8080;
const CACHE_PORT: i32 = 11211;
const DATA_VOLUME: &str = "app-data";
const DATA_MOUNT_PATH: &str = "/var/lib/app/data";
/// Maintenance runs every 5 minutes.
const MAINTENANCE_SCHEDULE: &str = "*/5 * * * *";
/// Unprivileged uid/gid the application image runs as.
const RUN_AS_ID: i64 = 33;

pub fn deployment(tenant: &TenantStack, namespace: &str) -> Result<Deployment> {
    let id = tenant_id(tenant)?;
    let labels = names::labels(id);
    let spec = &tenant.spec;

    Ok(Deployment {
        metadata: ObjectMeta {
            name: Some(names::deployment(id)),
            namespace: Some(namespace.to_string()),
            labels: Some(labels.clone()),
            owner_references: Some(vec![owner_reference(tenant)?]),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(spec.replicas()),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels.clone()),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![app_container(spec), cache_container(spec)],
                    security_context: Some(pod_security_context()),
                    volumes: Some(vec![data_volume(id)]),
                    topology_spread_constraints: Some(spread_constraints(&labels)),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        status: None,
    })
}

pub fn cron_job(tenant: &TenantStack, namespace: &str) -> Result<CronJob> {
    let id = tenant_id(tenant)?;
    let spec = &tenant.spec;

    Ok(CronJob {
        metadata: ObjectMeta {
            name: Some(names::cron_job(id)),
            namespace: Some(namespace.to_string()),
            labels: Some(names::labels(id)),
            owner_references: Some(vec![owner_reference(tenant)?]),
            ..Default::default()
        },
        spec: Some(CronJobSpec {
            schedule: MAINTENANCE_SCHEDULE.to_string(),
            job_template: JobTemplateSpec {
                metadata: None,
                spec: Some(JobSpec {
                    template: PodTemplateSpec {
                        // No pod labels here: the service selector and the
                        // disruption budget must only match workload pods
                        metadata: None,
                        spec: Some(PodSpec {
                            restart_policy: Some("OnFailure".to_string()),
                            security_context: Some(pod_security_context()),
                            containers: vec![Container {
                                name: "maintenance".to_string(),
                                image: Some(spec.image.clone()),
                                command: Some(vec![
                                    "/usr/local/bin/app".to_string(),
                                    "maintenance".to_string(),
                                ]),
                                env: Some(runtime_env(spec)),
                                volume_mounts: Some(vec![data_mount()]),
                                resources: Some(maintenance_resources()),
                                ..Default::default()
                            }],
                            volumes: Some(vec![data_volume(id)]),
                            ..Default::default()
                        }),
                    },
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        status: None,
    })
}

fn app_container(spec: &TenantStackSpec) -> Container {
    Container {
        name: "app".to_string(),
        image: Some(spec.image.clone()),
        ports: Some(vec![ContainerPort {
            name: Some("http".to_string()),
            container_port: HTTP_PORT,
            protocol: Some("TCP".to_string()),
            ..Default::default()
        }]),
        env: Some(runtime_env(spec)),
        resources: workload_resources(spec),
        volume_mounts: Some(vec![data_mount()]),
        liveness_probe: Some(tcp_probe(30, 10, 5)),
        readiness_probe: Some(tcp_probe(10, 5, 3)),
        ..Default::default()
    }
}

/// Memcached sidecar sized by the declared cache budget.
fn cache_container(spec: &TenantStackSpec) -> Container {
    let budget = spec.cache_memory_mb();
    let memory = Quantity(format!("{budget}Mi"));

    Container {
        name: "cache".to_string(),
        image: Some("memcached:alpine".to_string()),
        command: Some(vec![
            "memcached".to_string(),
            "-m".to_string(),
            budget.to_string(),
            "-I".to_string(),
            "2m".to_string(),
        ]),
        ports: Some(vec![ContainerPort {
            name: Some("memcached".to_string()),
            container_port: CACHE_PORT,
            protocol: Some("TCP".to_string()),
            ..Default::default()
        }]),
        resources: Some(ResourceRequirements {
            requests: Some(BTreeMap::from([
                ("cpu".to_string(), Quantity("10m".to_string())),
                ("memory".to_string(), memory.clone()),
            ])),
            limits: Some(BTreeMap::from([
                ("cpu".to_string(), Quantity("100m".to_string())),
                ("memory".to_string(), memory),
            ])),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// The environment contract shared by the workload and the maintenance
/// task: tuning values and the public URL as literals, credentials only by
/// reference to the admin secret's keys.
pub(crate) fn runtime_env(spec: &TenantStackSpec) -> Vec<EnvVar> {
    let secret = &spec.database.admin_secret_name;
    vec![
        EnvVar {
            name: "APP_MAX_EXECUTION_TIME".to_string(),
            value: Some(spec.max_execution_time().to_string()),
            value_from: None,
        },
        EnvVar {
            name: "APP_MEMORY_LIMIT".to_string(),
            value: Some(spec.memory_limit()),
            value_from: None,
        },
        EnvVar {
            name: "APP_URL".to_string(),
            value: Some(spec.public_url()),
            value_from: None,
        },
        secret_env("DB_HOST", secret, credentials::HOST_KEY),
        secret_env("DB_NAME", secret, credentials::DATABASE_KEY),
        secret_env("DB_USER", secret, credentials::USERNAME_KEY),
        secret_env("DB_PASS", secret, credentials::PASSWORD_KEY),
    ]
}

fn secret_env(name: &str, secret_name: &str, key: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: None,
        value_from: Some(EnvVarSource {
            secret_key_ref: Some(SecretKeySelector {
                name: Some(secret_name.to_string()),
                key: key.to_string(),
                optional: None,
            }),
            ..Default::default()
        }),
    }
}

fn tcp_probe(initial_delay: i32, period: i32, timeout: i32) -> Probe {
    Probe {
        tcp_socket: Some(TCPSocketAction {
            port: IntOrString::Int(HTTP_PORT),
            host: None,
        }),
        initial_delay_seconds: Some(initial_delay),
        period_seconds: Some(period),
        timeout_seconds: Some(timeout),
        failure_threshold: Some(3),
        ..Default::default()
    }
}

fn workload_resources(spec: &TenantStackSpec) -> Option<ResourceRequirements> {
    spec.resources.as_ref().map(|r| ResourceRequirements {
        requests: r.requests.as_ref().map(quantities),
        limits: r.limits.as_ref().map(quantities),
        ..Default::default()
    })
}

fn quantities(map: &BTreeMap<String, String>) -> BTreeMap<String, Quantity> {
    map.iter()
        .map(|(k, v)| (k.clone(), Quantity(v.clone())))
        .collect()
}

fn maintenance_resources() -> ResourceRequirements {
    ResourceRequirements {
        requests: Some(BTreeMap::from([
            ("cpu".to_string(), Quantity("100m".to_string())),
            ("memory".to_string(), Quantity("256Mi".to_string())),
        ])),
        limits: Some(BTreeMap::from([
            ("cpu".to_string(), Quantity("500m".to_string())),
            ("memory".to_string(), Quantity("512Mi".to_string())),
        ])),
        ..Default::default()
    }
}

fn pod_security_context() -> PodSecurityContext {
    PodSecurityContext {
        run_as_non_root: Some(true),
        run_as_user: Some(RUN_AS_ID),
        fs_group: Some(RUN_AS_ID),
        ..Default::default()
    }
}

fn data_volume(id: &str) -> Volume {
    Volume {
        name: DATA_VOLUME.to_string(),
        persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
            claim_name: names::data_volume(id),
            read_only: None,
        }),
        ..Default::default()
    }
}

fn data_mount() -> VolumeMount {
    VolumeMount {
        name: DATA_VOLUME.to_string(),
        mount_path: DATA_MOUNT_PATH.to_string(),
        ..Default::default()
    }
}

/// Best-effort spread across distinct hosts and availability zones.
/// `ScheduleAnyway` tolerates unsatisfiable spread instead of rejecting it.
fn spread_constraints(labels: &BTreeMap<String, String>) -> Vec<TopologySpreadConstraint> {
    ["kubernetes.io/hostname", "topology.kubernetes.io/zone"]
        .into_iter()
        .map(|topology_key| TopologySpreadConstraint {
            max_skew: 1,
            topology_key: topology_key.to_string(),
            when_unsatisfiable: "ScheduleAnyway".to_string(),
            label_selector: Some(LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            }),
            ..Default::default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{AutoscalingSpec, CacheSpec, DatabaseRef, RuntimeTuning, StorageSpec};

    fn tenant() -> TenantStack {
        TenantStack::new(
            "acme",
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
                runtime: Some(RuntimeTuning {
                    max_execution_time: Some(120),
                    memory_limit: None,
                }),
                cache: Some(CacheSpec { memory_mb: Some(256) }),
            },
        )
    }

    #[test]
    fn deployment_runs_app_and_cache_containers() {
        let deployment = deployment(&tenant(), "tenant-acme").expect("deployment should build");
        assert_eq!(deployment.metadata.name.as_deref(), Some("acme-deployment"));

        let spec = deployment.spec.expect("deployment spec");
        assert_eq!(spec.replicas, Some(1));

        let pod = spec.template.spec.expect("pod spec");
        let container_names: Vec<&str> =
            pod.containers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(container_names, vec!["app", "cache"]);

        let cache = &pod.containers[1];
        let command = cache.command.as_ref().expect("cache command");
        assert!(command.contains(&"256".to_string()));
    }

    #[test]
    fn deployment_selector_matches_pod_labels() {
        let deployment = deployment(&tenant(), "tenant-acme").expect("deployment should build");
        let spec = deployment.spec.expect("deployment spec");
        let pod_labels = spec.template.metadata.expect("template metadata").labels;
        assert_eq!(spec.selector.match_labels, pod_labels);
    }

    #[test]
    fn credentials_are_injected_by_reference_only() {
        let deployment = deployment(&tenant(), "tenant-acme").expect("deployment should build");
        let pod = deployment.spec.expect("spec").template.spec.expect("pod");
        let env = pod.containers[0].env.as_ref().expect("env");

        for name in ["DB_HOST", "DB_NAME", "DB_USER", "DB_PASS"] {
            let var = env
                .iter()
                .find(|e| e.name == name)
                .unwrap_or_else(|| panic!("{name} missing"));
            assert!(var.value.is_none(), "{name} must not be a literal");
            let key_ref = var
                .value_from
                .as_ref()
                .and_then(|v| v.secret_key_ref.as_ref())
                .expect("secret key ref");
            assert_eq!(key_ref.name.as_deref(), Some("acme-db"));
        }
    }

    #[test]
    fn tuning_values_follow_declaration_and_defaults() {
        let deployment = deployment(&tenant(), "tenant-acme").expect("deployment should build");
        let pod = deployment.spec.expect("spec").template.spec.expect("pod");
        let env = pod.containers[0].env.as_ref().expect("env");

        let value_of = |name: &str| {
            env.iter()
                .find(|e| e.name == name)
                .and_then(|e| e.value.clone())
        };
        assert_eq!(value_of("APP_MAX_EXECUTION_TIME").as_deref(), Some("120"));
        assert_eq!(value_of("APP_MEMORY_LIMIT").as_deref(), Some("512M"));
        assert_eq!(
            value_of("APP_URL").as_deref(),
            Some("https://acme.example.org")
        );
    }

    #[test]
    fn workload_spreads_across_hosts_and_zones() {
        let deployment = deployment(&tenant(), "tenant-acme").expect("deployment should build");
        let pod = deployment.spec.expect("spec").template.spec.expect("pod");
        let constraints = pod.topology_spread_constraints.expect("spread constraints");
        let keys: Vec<&str> = constraints
            .iter()
            .map(|c| c.topology_key.as_str())
            .collect();
        assert_eq!(
            keys,
            vec!["kubernetes.io/hostname", "topology.kubernetes.io/zone"]
        );
        assert!(constraints
            .iter()
            .all(|c| c.when_unsatisfiable == "ScheduleAnyway"));
    }

    #[test]
    fn cron_job_shares_volume_and_env_with_workload() {
        let cron = cron_job(&tenant(), "tenant-acme").expect("cron job should build");
        assert_eq!(cron.metadata.name.as_deref(), Some("acme-cron"));

        let spec = cron.spec.expect("cron spec");
        assert_eq!(spec.schedule, "*/5 * * * *");

        let pod = spec
            .job_template
            .spec
            .expect("job spec")
            .template
            .spec
            .expect("pod spec");
        assert_eq!(pod.restart_policy.as_deref(), Some("OnFailure"));

        let volumes = pod.volumes.expect("volumes");
        assert_eq!(
            volumes[0]
                .persistent_volume_claim
                .as_ref()
                .expect("pvc source")
                .claim_name,
            "acme-data"
        );

        let env = pod.containers[0].env.as_ref().expect("env");
        assert!(env.iter().any(|e| e.name == "DB_PASS"));
        assert!(env.iter().any(|e| e.name == "APP_URL"));
    }

    #[test]
    fn cron_pods_carry_no_labels() {
        // Keeps the service selector and disruption budget off cron pods
        let cron = cron_job(&tenant(), "tenant-acme").expect("cron job should build");
        let template = cron.spec.expect("spec").job_template.spec.expect("job").template;
        assert!(template.metadata.is_none());
    }
}

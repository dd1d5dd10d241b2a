//! # Scaling Synthesis
//!
//! HorizontalPodAutoscaler and PodDisruptionBudget, both synthesized only
//! when the declaration enables autoscaling. When it is disabled the
//! reconciler skips these steps entirely rather than creating and deleting.

use k8s_openapi::api::autoscaling::v2::{
    CrossVersionObjectReference, HorizontalPodAutoscaler, HorizontalPodAutoscalerSpec,
    MetricSpec, MetricTarget, ResourceMetricSource,
};
use k8s_openapi::api::policy::v1::{PodDisruptionBudget, PodDisruptionBudgetSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use crate::crd::TenantStack;
use crate::error::Result;
use crate::resources::{names, owner_reference, tenant_id};

pub fn autoscaler(tenant: &TenantStack, namespace: &str) -> Result<HorizontalPodAutoscaler> {
    let id = tenant_id(tenant)?;
    let spec = &tenant.spec;

    Ok(HorizontalPodAutoscaler {
        metadata: ObjectMeta {
            name: Some(names::autoscaler(id)),
            namespace: Some(namespace.to_string()),
            labels: Some(names::labels(id)),
            owner_references: Some(vec![owner_reference(tenant)?]),
            ..Default::default()
        },
        spec: Some(HorizontalPodAutoscalerSpec {
            scale_target_ref: CrossVersionObjectReference {
                api_version: Some("apps/v1".to_string()),
                kind: "Deployment".to_string(),
                name: names::deployment(id),
            },
            min_replicas: Some(spec.min_replicas()),
            max_replicas: spec.autoscaling.max_replicas,
            metrics: Some(vec![MetricSpec {
                type_: "Resource".to_string(),
                resource: Some(ResourceMetricSource {
                    name: "cpu".to_string(),
                    target: MetricTarget {
                        type_: "Utilization".to_string(),
                        average_utilization: Some(spec.target_cpu()),
                        ..Default::default()
                    },
                }),
                ..Default::default()
            }]),
            behavior: None,
        }),
        status: None,
    })
}

pub fn disruption_budget(tenant: &TenantStack, namespace: &str) -> Result<PodDisruptionBudget> {
    let id = tenant_id(tenant)?;

    Ok(PodDisruptionBudget {
        metadata: ObjectMeta {
            name: Some(names::disruption_budget(id)),
            namespace: Some(namespace.to_string()),
            labels: Some(names::labels(id)),
            owner_references: Some(vec![owner_reference(tenant)?]),
            ..Default::default()
        },
        spec: Some(PodDisruptionBudgetSpec {
            min_available: Some(IntOrString::Int(1)),
            selector: Some(LabelSelector {
                match_labels: Some(names::labels(id)),
                ..Default::default()
            }),
            ..Default::default()
        }),
        status: None,
    })
}

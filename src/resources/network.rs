//! # Network Synthesis
//!
//! Service, Ingress, and the per-namespace isolation NetworkPolicy.
//!
//! The isolation policy is default-deny in both directions with explicit
//! allows: ingress from the ingress controller's namespace, egress to
//! database namespaces on 5432, DNS to kube-system, and plain HTTP/HTTPS
//! anywhere for outbound integrations.

use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, IngressTLS, NetworkPolicy, NetworkPolicyEgressRule,
    NetworkPolicyIngressRule, NetworkPolicyPeer, NetworkPolicyPort, NetworkPolicySpec,
    ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;

use crate::crd::TenantStack;
use crate::error::Result;
use crate::resources::{names, owner_reference, tenant_id};

const HTTP_PORT: i32 = 8080;
const SERVICE_PORT: i32 = 80;
const POSTGRES_PORT: i32 = 5432;
const DNS_PORT: i32 = 53;

pub fn service(tenant: &TenantStack, namespace: &str) -> Result<Service> {
    let id = tenant_id(tenant)?;
    let labels = names::labels(id);

    Ok(Service {
        metadata: ObjectMeta {
            name: Some(names::service(id)),
            namespace: Some(namespace.to_string()),
            labels: Some(labels.clone()),
            owner_references: Some(vec![owner_reference(tenant)?]),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some("ClusterIP".to_string()),
            selector: Some(labels),
            ports: Some(vec![ServicePort {
                name: Some("http".to_string()),
                protocol: Some("TCP".to_string()),
                port: SERVICE_PORT,
                target_port: Some(IntOrString::Int(HTTP_PORT)),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        status: None,
    })
}

pub fn ingress(tenant: &TenantStack, namespace: &str) -> Result<Ingress> {
    let id = tenant_id(tenant)?;
    let hostname = tenant.spec.hostname.clone();

    Ok(Ingress {
        metadata: ObjectMeta {
            name: Some(names::ingress(id)),
            namespace: Some(namespace.to_string()),
            labels: Some(names::labels(id)),
            owner_references: Some(vec![owner_reference(tenant)?]),
            ..Default::default()
        },
        spec: Some(IngressSpec {
            ingress_class_name: Some("nginx".to_string()),
            tls: Some(vec![IngressTLS {
                hosts: Some(vec![hostname.clone()]),
                secret_name: Some(names::tls_secret(id)),
            }]),
            rules: Some(vec![IngressRule {
                host: Some(hostname),
                http: Some(HTTPIngressRuleValue {
                    paths: vec![HTTPIngressPath {
                        path: Some("/".to_string()),
                        path_type: "Prefix".to_string(),
                        backend: IngressBackend {
                            service: Some(IngressServiceBackend {
                                name: names::service(id),
                                port: Some(ServiceBackendPort {
                                    number: Some(SERVICE_PORT),
                                    name: None,
                                }),
                            }),
                            resource: None,
                        },
                    }],
                }),
            }]),
            ..Default::default()
        }),
        status: None,
    })
}

pub fn isolation_policy(tenant: &TenantStack, namespace: &str) -> Result<NetworkPolicy> {
    let id = tenant_id(tenant)?;

    Ok(NetworkPolicy {
        metadata: ObjectMeta {
            name: Some(names::NETWORK_POLICY.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(names::labels(id)),
            owner_references: Some(vec![owner_reference(tenant)?]),
            ..Default::default()
        },
        spec: Some(NetworkPolicySpec {
            // Empty selector: the policy covers every pod in the namespace
            pod_selector: LabelSelector::default(),
            policy_types: Some(vec!["Ingress".to_string(), "Egress".to_string()]),
            ingress: Some(vec![NetworkPolicyIngressRule {
                from: Some(vec![namespace_peer(
                    "kubernetes.io/metadata.name",
                    "ingress-nginx",
                )]),
                ports: None,
            }]),
            egress: Some(vec![
                NetworkPolicyEgressRule {
                    to: Some(vec![namespace_peer(names::DATABASE_NAMESPACE_LABEL, "true")]),
                    ports: Some(vec![tcp_port(POSTGRES_PORT)]),
                },
                NetworkPolicyEgressRule {
                    to: Some(vec![namespace_peer(
                        "kubernetes.io/metadata.name",
                        "kube-system",
                    )]),
                    ports: Some(vec![udp_port(DNS_PORT), tcp_port(DNS_PORT)]),
                },
                // Outbound HTTP/HTTPS for updates and external integrations
                NetworkPolicyEgressRule {
                    to: None,
                    ports: Some(vec![tcp_port(80), tcp_port(443)]),
                },
            ]),
        }),
    })
}

fn namespace_peer(key: &str, value: &str) -> NetworkPolicyPeer {
    NetworkPolicyPeer {
        namespace_selector: Some(LabelSelector {
            match_labels: Some(BTreeMap::from([(key.to_string(), value.to_string())])),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn tcp_port(port: i32) -> NetworkPolicyPort {
    NetworkPolicyPort {
        port: Some(IntOrString::Int(port)),
        protocol: Some("TCP".to_string()),
        ..Default::default()
    }
}

fn udp_port(port: i32) -> NetworkPolicyPort {
    NetworkPolicyPort {
        port: Some(IntOrString::Int(port)),
        protocol: Some("UDP".to_string()),
        ..Default::default()
    }
}

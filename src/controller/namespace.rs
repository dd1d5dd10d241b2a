//! # Namespace Provisioner
//!
//! Ensures exactly one isolation namespace exists per tenant. The name is a
//! deterministic function of the tenant identifier and creation follows the
//! same get-or-create protocol as every child, but the caller treats this as
//! a distinguished first step: a freshly created namespace may not be fully
//! propagated, so the reconciler requeues instead of creating children into
//! it within the same pass.

use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tracing::info;

use crate::cluster::ClusterPort;
use crate::controller::apply::Applied;
use crate::error::Result;
use crate::resources::names;

/// Isolation namespace name for a tenant.
pub fn namespace_name(id: &str) -> String {
    names::namespace(id)
}

/// Get-or-create the tenant namespace, reporting whether it was freshly
/// created. The namespace carries the standard labels but no owner
/// reference: teardown is the finalizer's job, not the garbage collector's.
pub async fn ensure_namespace<C: ClusterPort>(cluster: &C, id: &str) -> Result<Applied> {
    let name = namespace_name(id);

    if cluster.get_namespace(&name).await?.is_some() {
        return Ok(Applied::AlreadyExists);
    }

    let namespace = Namespace {
        metadata: ObjectMeta {
            name: Some(name.clone()),
            labels: Some(names::labels(id)),
            ..Default::default()
        },
        ..Default::default()
    };

    cluster.create_namespace(&namespace).await?;
    info!("Created namespace {}", name);
    Ok(Applied::Created)
}

//! # Finalizer Lifecycle
//!
//! Deletion guard for `TenantStack` resources.
//!
//! The guard token is attached on the first reconciliation of a live tenant
//! and blocks permanent removal of the object until cleanup has completed.
//! Cleanup deletes the tenant namespace; every other child is removed
//! transitively by the platform once the namespace or the owner disappears.
//! The guard is only ever released after cleanup returns success, so a
//! partially-cleaned-up tenant can never be purged.

use tracing::{debug, info};

use crate::cluster::ClusterPort;
use crate::controller::namespace;
use crate::crd::TenantStack;
use crate::error::Result;

/// Guard token recorded in `metadata.finalizers`.
pub const FINALIZER: &str = "tenancy.microscaler.io/finalizer";

pub fn has_guard(tenant: &TenantStack) -> bool {
    tenant
        .metadata
        .finalizers
        .as_ref()
        .is_some_and(|finalizers| finalizers.iter().any(|f| f == FINALIZER))
}

/// Attach the guard and persist, returning the stored object so the caller
/// can continue the pass with the updated resource version. A no-op when the
/// guard is already present.
pub async fn ensure_guard<C: ClusterPort>(cluster: &C, tenant: &TenantStack) -> Result<TenantStack> {
    if has_guard(tenant) {
        return Ok(tenant.clone());
    }

    let mut updated = tenant.clone();
    updated
        .metadata
        .finalizers
        .get_or_insert_with(Vec::new)
        .push(FINALIZER.to_string());
    let stored = cluster.update_tenant(&updated).await?;
    debug!(
        "Registered finalizer on TenantStack {}",
        stored.metadata.name.as_deref().unwrap_or("unknown")
    );
    Ok(stored)
}

/// Pre-delete cleanup: remove the tenant namespace. A namespace that is
/// already gone counts as success; any other failure propagates so the
/// platform retries with the guard still in place.
pub async fn cleanup<C: ClusterPort>(cluster: &C, id: &str) -> Result<()> {
    let name = namespace::namespace_name(id);

    match cluster.get_namespace(&name).await? {
        None => {
            info!("Namespace {} already deleted", name);
            Ok(())
        }
        Some(_) => {
            cluster.delete_namespace(&name).await?;
            info!("Deleted namespace {}", name);
            Ok(())
        }
    }
}

/// Strip the guard and persist, unblocking permanent removal. Only called
/// after [`cleanup`] has succeeded.
pub async fn release_guard<C: ClusterPort>(
    cluster: &C,
    tenant: &TenantStack,
) -> Result<TenantStack> {
    let mut updated = tenant.clone();
    if let Some(finalizers) = updated.metadata.finalizers.as_mut() {
        finalizers.retain(|f| f != FINALIZER);
    }
    cluster.update_tenant(&updated).await
}

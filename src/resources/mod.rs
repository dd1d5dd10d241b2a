//! # Resource Synthesizers
//!
//! Pure builders mapping a `TenantStack` declaration plus a target namespace
//! to fully-formed child objects. No I/O happens here; the reconciler feeds
//! each builder's output through the idempotent applier.
//!
//! Every child carries an owner reference back to the `TenantStack` so the
//! platform garbage-collects it when the tenant is removed, and the shared
//! label pair from [`names::labels`] so selectors line up across objects.

pub mod credentials;
pub mod names;
pub mod network;
pub mod scaling;
pub mod storage;
pub mod workload;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::Resource;

use crate::crd::TenantStack;
use crate::error::{Error, Result};

/// Tenant identifier, i.e. the `TenantStack` object name.
pub(crate) fn tenant_id(tenant: &TenantStack) -> Result<&str> {
    tenant.metadata.name.as_deref().ok_or(Error::MissingName)
}

/// Owner reference for garbage collection of child resources.
pub(crate) fn owner_reference(tenant: &TenantStack) -> Result<OwnerReference> {
    Ok(OwnerReference {
        api_version: TenantStack::api_version(&()).to_string(),
        kind: TenantStack::kind(&()).to_string(),
        name: tenant_id(tenant)?.to_string(),
        uid: tenant.metadata.uid.clone().unwrap_or_default(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    })
}

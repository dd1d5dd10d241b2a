//! Persistent storage for the tenant's application data.

use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimSpec, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

use crate::crd::TenantStack;
use crate::error::Result;
use crate::resources::{names, owner_reference, tenant_id};

/// Claim mounted by both the workload and the maintenance task. The access
/// mode follows the storage class: node-local classes only support a single
/// writer, shared filesystems take many.
pub fn volume_claim(tenant: &TenantStack, namespace: &str) -> Result<PersistentVolumeClaim> {
    let id = tenant_id(tenant)?;
    let spec = &tenant.spec;

    Ok(PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some(names::data_volume(id)),
            namespace: Some(namespace.to_string()),
            labels: Some(names::labels(id)),
            owner_references: Some(vec![owner_reference(tenant)?]),
            ..Default::default()
        },
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec![spec.access_mode().to_string()]),
            storage_class_name: Some(spec.storage_class().to_string()),
            resources: Some(VolumeResourceRequirements {
                requests: Some(BTreeMap::from([(
                    "storage".to_string(),
                    Quantity(spec.storage.size.clone()),
                )])),
                ..Default::default()
            }),
            ..Default::default()
        }),
        status: None,
    })
}

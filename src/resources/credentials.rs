//! # Credential Secret
//!
//! Materializes the tenant's database connection details into a namespaced
//! Secret, named exactly as the declaration's `adminSecretName`. The secret
//! is write-once: the applier creates it if absent and never touches it
//! again, and containers only ever see the values by secret-key reference.

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

use crate::crd::TenantStack;
use crate::error::Result;
use crate::resources::{names, owner_reference, tenant_id};

/// Key under which the database host is stored.
pub const HOST_KEY: &str = "host";
/// Key under which the database name is stored.
pub const DATABASE_KEY: &str = "database";
/// Key under which the database user is stored.
pub const USERNAME_KEY: &str = "username";
/// Key under which the database password is stored.
pub const PASSWORD_KEY: &str = "password";

pub fn secret(tenant: &TenantStack, namespace: &str) -> Result<Secret> {
    let id = tenant_id(tenant)?;
    let db = &tenant.spec.database;

    Ok(Secret {
        metadata: ObjectMeta {
            // The name is used verbatim, not derived from the tenant
            name: Some(db.admin_secret_name.clone()),
            namespace: Some(namespace.to_string()),
            labels: Some(names::labels(id)),
            owner_references: Some(vec![owner_reference(tenant)?]),
            ..Default::default()
        },
        string_data: Some(BTreeMap::from([
            (HOST_KEY.to_string(), db.host.clone()),
            (DATABASE_KEY.to_string(), db.database_name.clone()),
            (USERNAME_KEY.to_string(), db.user.clone()),
            (PASSWORD_KEY.to_string(), db.password.clone()),
        ])),
        ..Default::default()
    })
}

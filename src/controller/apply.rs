//! # Idempotent Applier
//!
//! The get-or-create protocol used uniformly for every synthesized child:
//! look the object up by name, create it when absent, leave it untouched
//! when present.
//!
//! This is deliberately not an upsert. Children that already exist are never
//! reconciled back to the synthesized shape, so operators may hand-tune
//! created resources without the controller reverting them. Divergence is
//! not detected.

use k8s_openapi::NamespaceResourceScope;
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::cluster::ClusterPort;
use crate::error::{Error, Result};

/// Outcome of one get-or-create step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The object was absent and has been created.
    Created,
    /// The object already existed and was left as-is.
    AlreadyExists,
}

pub async fn get_or_create<C, K>(cluster: &C, namespace: &str, obj: &K) -> Result<Applied>
where
    C: ClusterPort,
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Serialize
        + DeserializeOwned
        + Clone
        + std::fmt::Debug
        + Send
        + Sync
        + 'static,
{
    let kind = K::kind(&());
    let name = obj.meta().name.as_deref().ok_or(Error::MissingName)?;

    if cluster.get_namespaced::<K>(namespace, name).await?.is_some() {
        debug!("{} {}/{} already exists", kind, namespace, name);
        return Ok(Applied::AlreadyExists);
    }

    cluster.create_namespaced(namespace, obj).await?;
    info!("Created {} {}/{}", kind, namespace, name);
    Ok(Applied::Created)
}

//! # Cluster Port
//!
//! Narrow access layer for the Kubernetes API.
//!
//! The reconciler only ever needs a handful of operations: read/update the
//! tenant object and its status, get/create/delete the tenant namespace, and
//! get/create namespaced children. [`ClusterPort`] captures exactly that
//! surface so reconciliation logic can run against [`KubeCluster`] in the
//! controller binary and against an in-memory fake in tests.
//!
//! Not-found on read is mapped to `Ok(None)` here, never surfaced as an
//! error: absence is a normal branch of get-or-create and of deletion races.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, DeleteParams, Patch, PatchParams, PostParams};
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::crd::{TenantStack, TenantStackStatus};
use crate::error::{Error, Result};

/// The read/create/update/delete operations the reconciler needs.
#[async_trait]
pub trait ClusterPort: Send + Sync {
    /// Fetch a `TenantStack` by name; `None` if it no longer exists.
    async fn get_tenant(&self, name: &str) -> Result<Option<TenantStack>>;

    /// Persist an updated `TenantStack` (finalizer changes) and return the
    /// stored object.
    async fn update_tenant(&self, tenant: &TenantStack) -> Result<TenantStack>;

    /// Merge-patch the status subresource of a `TenantStack`.
    async fn patch_tenant_status(&self, name: &str, status: &TenantStackStatus) -> Result<()>;

    /// Fetch a namespace by name; `None` if absent.
    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>>;

    /// Create a namespace.
    async fn create_namespace(&self, namespace: &Namespace) -> Result<()>;

    /// Delete a namespace. A 404 is treated as success: the namespace is
    /// gone either way.
    async fn delete_namespace(&self, name: &str) -> Result<()>;

    /// Fetch a namespaced child resource by name; `None` if absent.
    async fn get_namespaced<K>(&self, namespace: &str, name: &str) -> Result<Option<K>>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Serialize
            + DeserializeOwned
            + Clone
            + std::fmt::Debug
            + Send
            + Sync
            + 'static;

    /// Create a namespaced child resource.
    async fn create_namespaced<K>(&self, namespace: &str, obj: &K) -> Result<()>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Serialize
            + DeserializeOwned
            + Clone
            + std::fmt::Debug
            + Send
            + Sync
            + 'static;
}

/// [`ClusterPort`] implementation over a live `kube::Client`.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn tenants(&self) -> Api<TenantStack> {
        Api::all(self.client.clone())
    }

    fn namespaces(&self) -> Api<Namespace> {
        Api::all(self.client.clone())
    }
}

impl std::fmt::Debug for KubeCluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeCluster").finish_non_exhaustive()
    }
}

#[async_trait]
impl ClusterPort for KubeCluster {
    async fn get_tenant(&self, name: &str) -> Result<Option<TenantStack>> {
        Ok(self.tenants().get_opt(name).await?)
    }

    async fn update_tenant(&self, tenant: &TenantStack) -> Result<TenantStack> {
        let name = tenant.metadata.name.as_deref().ok_or(Error::MissingName)?;
        Ok(self
            .tenants()
            .replace(name, &PostParams::default(), tenant)
            .await?)
    }

    async fn patch_tenant_status(&self, name: &str, status: &TenantStackStatus) -> Result<()> {
        let patch = serde_json::json!({ "status": status });
        self.tenants()
            .patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>> {
        Ok(self.namespaces().get_opt(name).await?)
    }

    async fn create_namespace(&self, namespace: &Namespace) -> Result<()> {
        self.namespaces()
            .create(&PostParams::default(), namespace)
            .await?;
        Ok(())
    }

    async fn delete_namespace(&self, name: &str) -> Result<()> {
        match self.namespaces().delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(e)) if e.code == 404 => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_namespaced<K>(&self, namespace: &str, name: &str) -> Result<Option<K>>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Serialize
            + DeserializeOwned
            + Clone
            + std::fmt::Debug
            + Send
            + Sync
            + 'static,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn create_namespaced<K>(&self, namespace: &str, obj: &K) -> Result<()>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Serialize
            + DeserializeOwned
            + Clone
            + std::fmt::Debug
            + Send
            + Sync
            + 'static,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        api.create(&PostParams::default(), obj).await?;
        Ok(())
    }
}

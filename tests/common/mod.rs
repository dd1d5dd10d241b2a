//! Shared test fixtures: an in-memory [`ClusterPort`] implementation and
//! `TenantStack` builders.
//!
//! The fake stores children as serialized objects keyed by kind, namespace,
//! and name, mirrors the API server's not-found/already-exists behavior, and
//! can inject failures to exercise partial-pass recovery.

#![allow(
    dead_code,
    reason = "shared test helpers are not all used by every test binary"
)]

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::NamespaceResourceScope;
use kube::core::ErrorResponse;
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use tenant_stack_controller::cluster::ClusterPort;
use tenant_stack_controller::crd::{
    AutoscalingSpec, DatabaseRef, StorageSpec, TenantStack, TenantStackSpec, TenantStackStatus,
};
use tenant_stack_controller::error::{Error, Result};

/// A `TenantStack` with the fields of the usual end-to-end scenario:
/// autoscaling disabled, node-local storage, database reference pointing at
/// the `<name>-db` secret.
pub fn make_tenant(name: &str) -> TenantStack {
    let mut tenant = TenantStack::new(
        name,
        TenantStackSpec {
            hostname: format!("{name}.example.org"),
            image: "registry.example.org/app:1.4.2".to_string(),
            resources: None,
            autoscaling: AutoscalingSpec::default(),
            storage: StorageSpec {
                size: "1Gi".to_string(),
                storage_class: Some("local-path".to_string()),
            },
            database: DatabaseRef {
                host: "db".to_string(),
                admin_secret_name: format!("{name}-db"),
                database_name: name.to_string(),
                user: "u".to_string(),
                password: "p".to_string(),
            },
            runtime: None,
            cache: None,
        },
    );
    tenant.metadata.uid = Some(format!("uid-{name}"));
    tenant
}

#[derive(Default)]
struct FakeState {
    tenants: BTreeMap<String, TenantStack>,
    namespaces: BTreeMap<String, Namespace>,
    /// Children keyed by `kind/namespace/name`.
    children: BTreeMap<String, serde_json::Value>,
    /// Every successful child create, in order.
    create_log: Vec<String>,
    fail_create_kind: Option<String>,
    fail_namespace_delete: bool,
}

/// In-memory cluster state behind the same port the controller uses.
#[derive(Default)]
pub struct FakeCluster {
    state: Mutex<FakeState>,
}

fn child_key(kind: &str, namespace: &str, name: &str) -> String {
    format!("{kind}/{namespace}/{name}")
}

fn already_exists(kind: &str, name: &str) -> Error {
    Error::Kube(kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: format!("{kind} \"{name}\" already exists"),
        reason: "AlreadyExists".to_string(),
        code: 409,
    }))
}

fn injected_failure(what: &str) -> Error {
    Error::Kube(kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: format!("injected failure for {what}"),
        reason: "InternalError".to_string(),
        code: 500,
    }))
}

impl FakeCluster {
    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake cluster state mutex")
    }

    pub fn insert_tenant(&self, tenant: TenantStack) {
        let name = tenant.metadata.name.clone().expect("tenant name");
        self.state().tenants.insert(name, tenant);
    }

    pub fn tenant(&self, name: &str) -> Option<TenantStack> {
        self.state().tenants.get(name).cloned()
    }

    pub fn namespace_exists(&self, name: &str) -> bool {
        self.state().namespaces.contains_key(name)
    }

    pub fn has_child(&self, kind: &str, namespace: &str, name: &str) -> bool {
        self.state()
            .children
            .contains_key(&child_key(kind, namespace, name))
    }

    /// Deserialize a stored child back into its typed form.
    pub fn child<K>(&self, namespace: &str, name: &str) -> Option<K>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()> + DeserializeOwned,
    {
        let key = child_key(&K::kind(&()), namespace, name);
        self.state()
            .children
            .get(&key)
            .map(|value| serde_json::from_value(value.clone()).expect("stored child deserializes"))
    }

    /// Number of successful child creates so far.
    pub fn created_count(&self) -> usize {
        self.state().create_log.len()
    }

    /// Fail every create of the given kind until cleared.
    pub fn fail_creates_of(&self, kind: &str) {
        self.state().fail_create_kind = Some(kind.to_string());
    }

    pub fn clear_create_failures(&self) {
        self.state().fail_create_kind = None;
    }

    pub fn fail_namespace_deletes(&self, fail: bool) {
        self.state().fail_namespace_delete = fail;
    }
}

#[async_trait]
impl ClusterPort for FakeCluster {
    async fn get_tenant(&self, name: &str) -> Result<Option<TenantStack>> {
        Ok(self.state().tenants.get(name).cloned())
    }

    async fn update_tenant(&self, tenant: &TenantStack) -> Result<TenantStack> {
        let name = tenant.metadata.name.clone().ok_or(Error::MissingName)?;
        self.state().tenants.insert(name, tenant.clone());
        Ok(tenant.clone())
    }

    async fn patch_tenant_status(&self, name: &str, status: &TenantStackStatus) -> Result<()> {
        if let Some(tenant) = self.state().tenants.get_mut(name) {
            tenant.status = Some(status.clone());
        }
        Ok(())
    }

    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>> {
        Ok(self.state().namespaces.get(name).cloned())
    }

    async fn create_namespace(&self, namespace: &Namespace) -> Result<()> {
        let name = namespace.metadata.name.clone().ok_or(Error::MissingName)?;
        let mut state = self.state();
        if state.namespaces.contains_key(&name) {
            return Err(already_exists("Namespace", &name));
        }
        state.namespaces.insert(name, namespace.clone());
        Ok(())
    }

    async fn delete_namespace(&self, name: &str) -> Result<()> {
        let mut state = self.state();
        if state.fail_namespace_delete {
            return Err(injected_failure("namespace delete"));
        }
        // A 404 on delete is success for the caller either way
        state.namespaces.remove(name);
        Ok(())
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
        let key = child_key(&K::kind(&()), namespace, name);
        Ok(self
            .state()
            .children
            .get(&key)
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()?)
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
        let kind = K::kind(&()).to_string();
        let name = obj.meta().name.clone().ok_or(Error::MissingName)?;
        let mut state = self.state();

        if state.fail_create_kind.as_deref() == Some(kind.as_str()) {
            return Err(injected_failure(&kind));
        }

        let key = child_key(&kind, namespace, &name);
        if state.children.contains_key(&key) {
            return Err(already_exists(&kind, &name));
        }

        state.children.insert(key.clone(), serde_json::to_value(obj)?);
        state.create_log.push(key);
        Ok(())
    }
}

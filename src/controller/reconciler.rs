//! # Reconciler
//!
//! Core reconciliation logic for `TenantStack` resources.
//!
//! ## Reconciliation Flow
//!
//! 1. Fetch the tenant by name; absence means it was deleted between event
//!    and processing and the pass converges without error
//! 2. On deletion intent, run namespace cleanup and release the finalizer
//! 3. Otherwise register the finalizer if missing and continue the same pass
//! 4. Ensure the isolation namespace; a freshly created namespace requeues
//!    the pass instead of creating children into it
//! 5. Apply the child resources through get-or-create, in a fixed order:
//!    Secret, Deployment, PVC, Service, Ingress, NetworkPolicy, HPA (when
//!    autoscaling), CronJob, PDB (when autoscaling)
//! 6. Patch the status and converge
//!
//! Every step is idempotent, so any failure simply aborts the pass and the
//! next pass re-runs the whole sequence from the top. There is no rollback
//! and no retry loop inside the controller; requeueing is left to the
//! platform.

use k8s_openapi::NamespaceResourceScope;
use kube::Resource;
use kube_runtime::controller::Action;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::cluster::{ClusterPort, KubeCluster};
use crate::constants::{ERROR_REQUEUE_SECS, NAMESPACE_PROPAGATION_REQUEUE_SECS};
use crate::controller::apply::{self, Applied};
use crate::controller::{finalizer, namespace};
use crate::crd::{TenantStack, TenantStackStatus};
use crate::error::{Error, Result};
use crate::observability::metrics;
use crate::resources::{credentials, network, scaling, storage, workload};

/// Reconciliation context: everything a pass needs, with cluster access
/// behind the [`ClusterPort`] so tests can substitute an in-memory fake.
pub struct Context<C: ClusterPort> {
    pub cluster: C,
}

impl<C: ClusterPort> Context<C> {
    pub fn new(cluster: C) -> Self {
        Self { cluster }
    }

    /// Run one reconciliation pass for the tenant with the given name.
    pub async fn reconcile_tenant(&self, name: &str) -> Result<Action> {
        let Some(tenant) = self.cluster.get_tenant(name).await? else {
            debug!("TenantStack {} not found, ignoring since object must be deleted", name);
            return Ok(Action::await_change());
        };

        if tenant.metadata.deletion_timestamp.is_some() {
            if finalizer::has_guard(&tenant) {
                finalizer::cleanup(&self.cluster, name).await?;
                finalizer::release_guard(&self.cluster, &tenant).await?;
                metrics::increment_cleanups();
                info!("Finalized TenantStack {}", name);
            }
            return Ok(Action::await_change());
        }

        // Registering the guard and first-time provisioning happen in the
        // same pass; the update only bumps the resource version
        let tenant = finalizer::ensure_guard(&self.cluster, &tenant).await?;

        if namespace::ensure_namespace(&self.cluster, name).await? == Applied::Created {
            metrics::increment_namespaces_created();
            info!(
                "Namespace for TenantStack {} was just created, requeueing before child creation",
                name
            );
            return Ok(Action::requeue(Duration::from_secs(
                NAMESPACE_PROPAGATION_REQUEUE_SECS,
            )));
        }

        let ns = namespace::namespace_name(name);
        let mut created = 0;

        created += self.apply(&ns, &credentials::secret(&tenant, &ns)?).await?;
        created += self.apply(&ns, &workload::deployment(&tenant, &ns)?).await?;
        created += self.apply(&ns, &storage::volume_claim(&tenant, &ns)?).await?;
        created += self.apply(&ns, &network::service(&tenant, &ns)?).await?;
        created += self.apply(&ns, &network::ingress(&tenant, &ns)?).await?;
        created += self
            .apply(&ns, &network::isolation_policy(&tenant, &ns)?)
            .await?;
        if tenant.spec.autoscaling.enabled {
            created += self.apply(&ns, &scaling::autoscaler(&tenant, &ns)?).await?;
        }
        created += self.apply(&ns, &workload::cron_job(&tenant, &ns)?).await?;
        if tenant.spec.autoscaling.enabled {
            created += self
                .apply(&ns, &scaling::disruption_budget(&tenant, &ns)?)
                .await?;
        }

        let status = TenantStackStatus::ready(tenant.metadata.generation, created);
        self.cluster.patch_tenant_status(name, &status).await?;
        metrics::increment_resources_created(i64::from(created));

        info!(
            "Successfully reconciled TenantStack {} ({} resources created)",
            name, created
        );
        Ok(Action::await_change())
    }

    async fn apply<K>(&self, namespace: &str, obj: &K) -> Result<i32>
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
        Ok(match apply::get_or_create(&self.cluster, namespace, obj).await? {
            Applied::Created => 1,
            Applied::AlreadyExists => 0,
        })
    }
}

impl<C: ClusterPort> std::fmt::Debug for Context<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context").finish_non_exhaustive()
    }
}

/// Entry point for the kube-runtime controller loop.
pub async fn reconcile(
    tenant: Arc<TenantStack>,
    ctx: Arc<Context<KubeCluster>>,
) -> Result<Action, Error> {
    let start = Instant::now();
    let name = tenant.metadata.name.clone().ok_or(Error::MissingName)?;

    info!("Reconciling TenantStack: {}", name);
    metrics::increment_reconciliations();

    // Re-fetch by name so a deletion between event emission and processing
    // is observed as not-found rather than acting on a stale object
    let action = ctx.reconcile_tenant(&name).await?;
    metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());
    Ok(action)
}

/// Requeue policy for failed passes; the platform's backoff governs timing.
pub fn error_policy(
    tenant: Arc<TenantStack>,
    error: &Error,
    _ctx: Arc<Context<KubeCluster>>,
) -> Action {
    error!(
        "Reconciliation error for {}: {:?}",
        tenant.metadata.name.as_deref().unwrap_or("unknown"),
        error
    );
    metrics::increment_reconciliation_errors();
    Action::requeue(Duration::from_secs(ERROR_REQUEUE_SECS))
}

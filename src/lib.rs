//! # Tenant Stack Controller
//!
//! A Kubernetes controller that provisions isolated, self-contained
//! application stacks, one per declared tenant.
//!
//! ## Overview
//!
//! The controller watches cluster-scoped `TenantStack` resources and drives
//! the cluster toward a matching set of child resources:
//!
//! 1. **Namespace isolation** - Every tenant gets its own `tenant-<name>`
//!    namespace; all children live inside it
//! 2. **Workload** - A Deployment running the application container plus a
//!    memcached sidecar, and a CronJob for periodic maintenance
//! 3. **Storage** - A PersistentVolumeClaim shared by workload and cron
//! 4. **Networking** - Service, Ingress, and a default-deny NetworkPolicy
//! 5. **Scaling** - HorizontalPodAutoscaler and PodDisruptionBudget, only
//!    when the tenant opts into autoscaling
//! 6. **Credentials** - Database connection details materialized once into a
//!    namespaced Secret and injected by reference
//!
//! Creation is strictly get-or-create: existing children are never updated,
//! so operator hand-edits survive reconciliation. Teardown is handled
//! through a finalizer that deletes the tenant namespace before the
//! `TenantStack` itself can be removed; everything else is garbage-collected
//! through owner references.
//!
//! All cluster access goes through the [`cluster::ClusterPort`] trait so the
//! reconciliation logic is testable against an in-memory fake.

pub mod cluster;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod error;
pub mod observability;
pub mod resources;
pub mod server;

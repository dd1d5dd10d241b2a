//! # Controller
//!
//! Reconciliation machinery for `TenantStack` resources.
//!
//! ## Module Structure
//!
//! - `apply` - the generic get-or-create protocol used for every child
//! - `namespace` - provisioning of the per-tenant isolation namespace
//! - `finalizer` - deletion guard lifecycle and namespace teardown
//! - `reconciler` - the orchestrating reconciliation pass

pub mod apply;
pub mod finalizer;
pub mod namespace;
pub mod reconciler;

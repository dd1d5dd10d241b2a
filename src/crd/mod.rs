//! # Custom Resource Definitions
//!
//! CRD types for the Tenant Stack Controller.
//!
//! ## Module Structure
//!
//! - `spec.rs` - Main CRD specification, defaulting rules, and derived values
//! - `status.rs` - Status types for tracking reconciliation state

mod spec;
mod status;

// Re-export all public types
pub use spec::{
    AutoscalingSpec, CacheSpec, DatabaseRef, RuntimeTuning, StorageSpec, TenantStack,
    TenantStackSpec, WorkloadResources, DEFAULT_STORAGE_CLASS,
};
pub use status::{Condition, TenantStackStatus};

//! # Naming and Labels
//!
//! Deterministic child-resource names and the shared label set.
//!
//! Every name is a pure function of the tenant identifier, which is what
//! makes the get-or-create protocol correct: re-running synthesis for the
//! same tenant always targets the same object.

use std::collections::BTreeMap;

/// Value of the `app` label carried by every synthesized object.
pub const APP_LABEL: &str = "tenant-stack";

/// Label key recording which tenant an object belongs to.
pub const TENANT_LABEL_KEY: &str = "tenancy.microscaler.io/tenant";

/// Label marking namespaces that host tenant databases; the isolation
/// policy allows egress to them.
pub const DATABASE_NAMESPACE_LABEL: &str = "tenancy.microscaler.io/database";

/// Fixed name of the per-namespace isolation NetworkPolicy.
pub const NETWORK_POLICY: &str = "tenant-isolation";

pub fn namespace(id: &str) -> String {
    format!("tenant-{id}")
}

pub fn deployment(id: &str) -> String {
    format!("{id}-deployment")
}

pub fn data_volume(id: &str) -> String {
    format!("{id}-data")
}

pub fn service(id: &str) -> String {
    format!("{id}-service")
}

pub fn ingress(id: &str) -> String {
    format!("{id}-ingress")
}

pub fn tls_secret(id: &str) -> String {
    format!("{id}-tls")
}

pub fn autoscaler(id: &str) -> String {
    format!("{id}-hpa")
}

pub fn cron_job(id: &str) -> String {
    format!("{id}-cron")
}

pub fn disruption_budget(id: &str) -> String {
    format!("{id}-pdb")
}

/// The label pair shared by every synthesized object and every selector
/// (service routing, autoscaler target, disruption budget, network policy
/// scope). These must match exactly or cross-resource wiring breaks.
pub fn labels(id: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("app".to_string(), APP_LABEL.to_string()),
        (TENANT_LABEL_KEY.to_string(), id.to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_deterministic() {
        assert_eq!(namespace("acme"), "tenant-acme");
        assert_eq!(deployment("acme"), "acme-deployment");
        assert_eq!(data_volume("acme"), "acme-data");
        assert_eq!(service("acme"), "acme-service");
        assert_eq!(ingress("acme"), "acme-ingress");
        assert_eq!(tls_secret("acme"), "acme-tls");
        assert_eq!(autoscaler("acme"), "acme-hpa");
        assert_eq!(cron_job("acme"), "acme-cron");
        assert_eq!(disruption_budget("acme"), "acme-pdb");
        // Repeated derivation yields the same names
        assert_eq!(deployment("acme"), deployment("acme"));
    }

    #[test]
    fn labels_carry_app_tag_and_tenant() {
        let labels = labels("acme");
        assert_eq!(labels.get("app").map(String::as_str), Some(APP_LABEL));
        assert_eq!(labels.get(TENANT_LABEL_KEY).map(String::as_str), Some("acme"));
        assert_eq!(labels.len(), 2);
    }
}

//! # Tenant Stack Controller
//!
//! Controller binary: wires the watch loop over `TenantStack` resources to
//! the reconciler, serves metrics and health probes, and shuts down cleanly
//! on signal. All reconciliation logic lives in the library.

use anyhow::{Context as _, Result};
use futures::StreamExt;
use kube::{api::Api, Client};
use kube_runtime::{watcher, Controller};
use std::sync::Arc;
use tracing::{error, info};

use tenant_stack_controller::cluster::KubeCluster;
use tenant_stack_controller::constants::DEFAULT_METRICS_PORT;
use tenant_stack_controller::controller::reconciler::{self, Context};
use tenant_stack_controller::crd::TenantStack;
use tenant_stack_controller::observability::metrics;
use tenant_stack_controller::server::{start_server, ServerState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tenant_stack_controller=info".into()),
        )
        .init();

    info!("Starting Tenant Stack Controller");

    metrics::register_metrics().context("Failed to register metrics")?;

    let server_state = Arc::new(ServerState {
        is_ready: Arc::new(std::sync::atomic::AtomicBool::new(false)),
    });

    let server_port = std::env::var("METRICS_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(DEFAULT_METRICS_PORT);

    let probe_state = Arc::clone(&server_state);
    tokio::spawn(async move {
        if let Err(e) = start_server(server_port, probe_state).await {
            error!("HTTP server error: {}", e);
        }
    });

    let client = Client::try_default().await?;

    // TenantStack is cluster-scoped; one watch covers every tenant
    let tenants: Api<TenantStack> = Api::all(client.clone());

    let ctx = Arc::new(Context::new(KubeCluster::new(client)));

    server_state
        .is_ready
        .store(true, std::sync::atomic::Ordering::Relaxed);

    Controller::new(tenants, watcher::Config::default())
        .shutdown_on_signal()
        .run(reconciler::reconcile, reconciler::error_policy, ctx)
        .for_each(|_| std::future::ready(()))
        .await;

    info!("Controller stopped");

    Ok(())
}

use kube::client::APIClient;
use kube::config;
use log::{debug, info};

use module_controller::watch::{reconcile_clients, run_edge_deployment_watch, run_pod_watch};
use module_controller::{ControllerConfig, Result, StatusTracker};

async fn resolve_client() -> Result<APIClient> {
    let cfg = match config::incluster_config() {
        Ok(c) => c,
        Err(e) => {
            debug!("no in-cluster config ({}), falling back to local kubeconfig", e);
            config::load_kube_config().await?
        }
    };
    Ok(APIClient::new(cfg))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    info!("starting module-controller");

    let cfg = ControllerConfig::from_env();
    info!(
        "serving EdgeDeployment '{}' in namespace '{}'",
        cfg.resource_name(),
        cfg.workload_namespace
    );

    let client = resolve_client().await?;
    let clients = reconcile_clients(client.clone(), &cfg);
    let tracker = StatusTracker::new();

    let edge_deployment_watch = tokio::spawn(run_edge_deployment_watch(client.clone(), cfg.clone(), clients));
    let pod_watch = tokio::spawn(run_pod_watch(client, cfg, tracker));

    let _ = tokio::join!(edge_deployment_watch, pod_watch);
    Ok(())
}

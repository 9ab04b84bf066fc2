use futures::StreamExt;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams};
use kube::client::APIClient;

use kube::api::Meta;
use module_definitions::crd::EdgeDeployment;

use crate::config::ControllerConfig;
use crate::reconciler::{self, ReconcileClients};
use crate::status_tracker::StatusTracker;

fn resource_version_of(event: &kube::api::WatchEvent<EdgeDeployment>) -> Option<String> {
    use kube::api::WatchEvent::*;
    match event {
        Added(o) | Modified(o) | Deleted(o) => Meta::resource_ver(o),
        Error(_) => None,
    }
}

/// Establish the cluster-scoped EdgeDeployment watch and dispatch every
/// event to the reconciler. A stream that ends (rather than erroring) is
/// ordinary - the API server's `timeoutSeconds` closes long-poll watches
/// routinely - and is simply re-opened from the last resourceVersion seen.
/// Only a failure to establish the *initial* connection is fatal; every
/// other error is logged and the watch keeps running.
pub async fn run_edge_deployment_watch(client: APIClient, cfg: ControllerConfig, clients: ReconcileClients) {
    let api: Api<EdgeDeployment> = Api::all(client);
    let mut resource_version = "0".to_string();
    loop {
        debug!("(re)establishing EdgeDeployment watch from resourceVersion {}", resource_version);
        let lp = ListParams::default();
        let stream = match api.watch(&lp, &resource_version).await {
            Ok(s) => s,
            Err(e) => {
                error!("fatal: could not establish initial EdgeDeployment watch: {}", e);
                std::process::exit(1);
            }
        };
        futures::pin_mut!(stream);
        while let Some(item) = stream.next().await {
            match item {
                Ok(event) => {
                    if let Some(rv) = resource_version_of(&event) {
                        resource_version = rv;
                    }
                    if let Err(e) = reconciler::handle_cr_event(event, &cfg, &clients).await {
                        error!("reconciliation error (continuing watch): {}", e);
                    }
                }
                Err(e) => warn!("EdgeDeployment watch stream error (continuing): {}", e),
            }
        }
        info!("EdgeDeployment watch stream ended, reconnecting");
    }
}

fn pod_resource_version(event: &kube::api::WatchEvent<Pod>) -> Option<String> {
    use kube::api::WatchEvent::*;
    match event {
        Added(o) | Modified(o) | Deleted(o) => Meta::resource_ver(o),
        Error(_) => None,
    }
}

/// Establish the namespaced Pod watch (workload namespace, no label
/// selector - every pod in that namespace is a candidate module) and feed
/// events into the status tracker. Reconnects from the last observed
/// resourceVersion on stream end, same policy as the EdgeDeployment watch.
pub async fn run_pod_watch(client: APIClient, cfg: ControllerConfig, tracker: StatusTracker) {
    let api: Api<Pod> = Api::namespaced(client, &cfg.workload_namespace);
    let mut resource_version = "0".to_string();
    loop {
        debug!("(re)establishing Pod watch in namespace '{}' from resourceVersion {}", cfg.workload_namespace, resource_version);
        let lp = ListParams::default();
        let stream = match api.watch(&lp, &resource_version).await {
            Ok(s) => s,
            Err(e) => {
                error!("fatal: could not establish initial Pod watch: {}", e);
                std::process::exit(1);
            }
        };
        futures::pin_mut!(stream);
        while let Some(item) = stream.next().await {
            match item {
                Ok(event) => {
                    if let Some(rv) = pod_resource_version(&event) {
                        resource_version = rv;
                    }
                    tracker.handle_pod_event(&event).await;
                }
                Err(e) => warn!("Pod watch stream error (continuing): {}", e),
            }
        }
        info!("Pod watch stream ended, reconnecting");
    }
}

/// Build the typed API handles the reconciler needs, all scoped to the
/// controller's configured workload namespace (Secrets remain in their own
/// fixed namespace).
pub fn reconcile_clients(client: APIClient, cfg: &ControllerConfig) -> ReconcileClients {
    ReconcileClients {
        services: Api::namespaced(client.clone(), &cfg.workload_namespace),
        deployments: Api::namespaced(client.clone(), &cfg.workload_namespace),
        secrets: Api::namespaced(client, crate::config::SECRET_NAMESPACE),
    }
}

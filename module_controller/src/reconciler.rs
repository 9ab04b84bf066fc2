use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Secret, Service};
use kube::api::{Api, DeleteParams, ListParams, Meta, PostParams, WatchEvent};

use module_definitions::crd::EdgeDeployment;

use crate::config::ControllerConfig;
use crate::diff::{self, Plan};
use crate::secrets_reconcile::reconcile_secrets;
use crate::synth::{self, DesiredObjects};
use crate::Result;

/// Everything the reconciler needs to talk to the cluster for one pass.
pub struct ReconcileClients {
    pub services: Api<Service>,
    pub deployments: Api<Deployment>,
    pub secrets: Api<Secret>,
}

async fn list_owned<K>(api: &Api<K>, selector: &str) -> Result<std::collections::BTreeMap<String, K>>
where
    K: Clone + serde::de::DeserializeOwned + Meta,
{
    let lp = ListParams::default().labels(selector);
    let list = api.list(&lp).await?;
    Ok(list
        .items
        .into_iter()
        .fold(std::collections::BTreeMap::new(), |mut acc, item| {
            acc.insert(Meta::name(&item), item);
            acc
        }))
}

/// Run a batch of fallible operations concurrently. A failure in one task
/// is logged but never aborts the rest of the batch - the next CR event
/// re-converges.
async fn run_batch<F, Fut>(items: Vec<F>)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<()>>,
{
    let results = futures::future::join_all(items.into_iter().map(|f| f())).await;
    for result in results {
        if let Err(e) = result {
            error!("reconciliation batch entry failed (continuing batch): {}", e);
        }
    }
}

async fn delete_services(api: &Api<Service>, plan: &Plan<Service>) {
    let tasks = plan.delete.iter().map(|name| {
        let api = api.clone();
        let name = name.clone();
        move || async move {
            api.delete(&name, &DeleteParams::default()).await?;
            info!("deleted service '{}'", name);
            Ok(())
        }
    });
    run_batch(tasks.collect()).await;
}

async fn delete_deployments(api: &Api<Deployment>, plan: &Plan<Deployment>) {
    let tasks = plan.delete.iter().map(|name| {
        let api = api.clone();
        let name = name.clone();
        move || async move {
            api.delete(&name, &DeleteParams::default()).await?;
            info!("deleted deployment '{}'", name);
            Ok(())
        }
    });
    run_batch(tasks.collect()).await;
}

/// A Service's ClusterIP/type is immutable in place, so "update" is realized
/// as delete+create against the same name within this same create phase -
/// `plan.delete` has already removed any prior object by this point in
/// `converge`.
async fn create_services(api: &Api<Service>, plan: Plan<Service>) {
    let tasks = plan.create.into_iter().chain(plan.update.into_iter()).map(|svc| {
        let api = api.clone();
        move || async move {
            let name = svc.metadata.name.clone().expect("synthesized services always carry a name");
            api.create(&PostParams::default(), &svc).await?;
            info!("created service '{}'", name);
            Ok(())
        }
    });
    run_batch(tasks.collect()).await;
}

async fn create_deployments(api: &Api<Deployment>, plan: Vec<Deployment>) {
    let tasks = plan.into_iter().map(|dep| {
        let api = api.clone();
        move || async move {
            let name = dep.metadata.name.clone().expect("synthesized deployments always carry a name");
            api.create(&PostParams::default(), &dep).await?;
            info!("created deployment '{}'", name);
            Ok(())
        }
    });
    run_batch(tasks.collect()).await;
}

/// Carries the live object's resourceVersion forward so the PUT isn't
/// rejected as a stale write.
async fn update_deployments(api: &Api<Deployment>, plan: Vec<Deployment>) {
    let tasks = plan.into_iter().map(|mut dep| {
        let api = api.clone();
        move || async move {
            let name = dep.metadata.name.clone().expect("synthesized deployments always carry a name");
            if let Ok(live) = api.get(&name).await {
                dep.metadata.resource_version = live.metadata.resource_version.clone();
            }
            api.replace(&name, &PostParams::default(), &dep).await?;
            info!("updated deployment '{}'", name);
            Ok(())
        }
    });
    run_batch(tasks.collect()).await;
}

/// Full converge pass for one CR event.
///
/// `Added`/`Modified` drive a full reconciliation; `Deleted` tears down
/// everything this controller owns for that device; any event for a CR
/// whose name doesn't match this controller's own device is ignored -
/// every replica of this controller watches the same cluster-scoped
/// resource kind but only one CR name is ever "its own".
pub async fn handle_cr_event(
    event: WatchEvent<EdgeDeployment>,
    cfg: &ControllerConfig,
    clients: &ReconcileClients,
) -> Result<()> {
    match event {
        WatchEvent::Added(cr) | WatchEvent::Modified(cr) => {
            if Meta::name(&cr) != cfg.resource_name() {
                debug!("ignoring EdgeDeployment '{}': not owned by this device", Meta::name(&cr));
                return Ok(());
            }
            converge(&cr.spec.modules, cfg, clients).await
        }
        WatchEvent::Deleted(cr) => {
            if Meta::name(&cr) != cfg.resource_name() {
                debug!("ignoring deletion of '{}': not owned by this device", Meta::name(&cr));
                return Ok(());
            }
            teardown(cfg, clients).await
        }
        WatchEvent::Error(e) => {
            error!("watch error on EdgeDeployment stream: {}", e);
            Err(failure::err_msg(format!("EdgeDeployment watch error: {}", e)))
        }
    }
}

async fn converge(
    entries: &[module_definitions::spec::ModuleEntry],
    cfg: &ControllerConfig,
    clients: &ReconcileClients,
) -> Result<()> {
    let desired: DesiredObjects = synth::synthesize(entries, cfg);

    reconcile_secrets(&clients.secrets, &desired.secrets).await?;

    let selector = cfg.owned_object_selector();
    let observed_services = list_owned(&clients.services, &selector).await?;
    let observed_deployments = list_owned(&clients.deployments, &selector).await?;

    let service_plan = diff::diff_services(&desired.services, &observed_services);
    let deployment_plan = diff::diff_deployments(&desired.deployments, &observed_deployments);

    // Apply order: deletes first (services, then deployments), creates next
    // (services, then deployments), updates last (deployments only - Service
    // "updates" were already folded into the create phase above as
    // delete+create).
    delete_services(&clients.services, &service_plan).await;
    delete_deployments(&clients.deployments, &deployment_plan).await;
    create_services(&clients.services, service_plan).await;
    create_deployments(&clients.deployments, deployment_plan.create).await;
    update_deployments(&clients.deployments, deployment_plan.update).await;
    Ok(())
}

async fn teardown(cfg: &ControllerConfig, clients: &ReconcileClients) -> Result<()> {
    let selector = cfg.owned_object_selector();
    let services = list_owned(&clients.services, &selector).await?;
    let deployments = list_owned(&clients.deployments, &selector).await?;
    for name in services.keys() {
        clients.services.delete(name, &DeleteParams::default()).await?;
        info!("deleted service '{}' (CR removed)", name);
    }
    for name in deployments.keys() {
        clients.deployments.delete(name, &DeleteParams::default()).await?;
        info!("deleted deployment '{}' (CR removed)", name);
    }
    Ok(())
}

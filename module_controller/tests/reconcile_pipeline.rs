use std::collections::BTreeMap;

use module_controller::createoptions::{CreateOptions, HostConfig, PortBinding};
use module_controller::identity::{Credential, ModuleIdentity};
use module_controller::spec::{ModuleConfig, ModuleEntry, ModuleType};
use module_controller::synth::synthesize;
use module_controller::ControllerConfig;
use module_controller::diff;

fn cfg() -> ControllerConfig {
    ControllerConfig {
        workload_namespace: "microsoft-azure-devices-edge".into(),
        hub_hostname: "myhub.azure-devices.net".into(),
        device_id: "dev1".into(),
        gateway_hostname: None,
        module_generation_id: "gen1".into(),
        log_level: "info".into(),
    }
}

fn entry(module_id: &str, image: &str, exposed: &[&str]) -> ModuleEntry {
    let mut exposed_ports = BTreeMap::new();
    for spec in exposed {
        exposed_ports.insert((*spec).to_string(), serde_json::json!({}));
    }
    ModuleEntry {
        moduleIdentity: ModuleIdentity {
            hubHostname: "myhub.azure-devices.net".into(),
            gatewayHostname: None,
            deviceId: "dev1".into(),
            moduleId: module_id.into(),
            credentials: Credential { authScheme: "sasToken".into(), generationId: "gen1".into() },
        },
        module: ModuleConfig {
            kind: ModuleType::Docker,
            name: module_id.into(),
            version: None,
            image: image.into(),
            createOptions: CreateOptions { exposedPorts: exposed_ports, hostConfig: HostConfig::default(), labels: BTreeMap::new(), env: Vec::new() },
            env: BTreeMap::new(),
            auth: None,
            desiredStatus: None,
            restartPolicy: None,
        },
    }
}

/// A CR with a single module, reconciled against an empty cluster, creates
/// exactly one Service (it exposes a port) and one Deployment.
#[test]
fn first_reconciliation_creates_everything() {
    let entries = vec![entry("tempSensor", "repo/sensor:1", &["8080/tcp"])];
    let desired = synthesize(&entries, &cfg());

    let plan = diff::diff_deployments(&desired.deployments, &BTreeMap::new());
    assert_eq!(plan.create.len(), 1);
    assert!(plan.update.is_empty());

    let svc_plan = diff::diff_services(&desired.services, &BTreeMap::new());
    assert_eq!(svc_plan.create.len(), 1);
}

/// Re-synthesizing the same CR against the previous pass's own output is a
/// complete no-op: nothing to create, update, or delete.
#[test]
fn reconciling_twice_with_no_changes_is_idempotent() {
    let entries = vec![entry("tempSensor", "repo/sensor:1", &["8080/tcp"])];
    let desired_first = synthesize(&entries, &cfg());

    let deployment_plan = diff::diff_deployments(&desired_first.deployments, &desired_first.deployments);
    assert!(deployment_plan.create.is_empty());
    assert!(deployment_plan.update.is_empty());
    assert!(deployment_plan.delete.is_empty());

    let service_plan = diff::diff_services(&desired_first.services, &desired_first.services);
    assert!(service_plan.create.is_empty());
    assert!(service_plan.update.is_empty());
    assert!(service_plan.delete.is_empty());
}

/// Bumping just the image tag of one module produces exactly one Deployment
/// update and touches no other module's Deployment or any Service.
#[test]
fn image_bump_updates_only_the_changed_module() {
    let before = vec![
        entry("tempSensor", "repo/sensor:1", &[]),
        entry("humiditySensor", "repo/humidity:1", &[]),
    ];
    let observed = synthesize(&before, &cfg());

    let after = vec![
        entry("tempSensor", "repo/sensor:2", &[]),
        entry("humiditySensor", "repo/humidity:1", &[]),
    ];
    let desired = synthesize(&after, &cfg());

    let plan = diff::diff_deployments(&desired.deployments, &observed.deployments);
    assert_eq!(plan.update.len(), 1);
    let updated_name = module_controller::naming::deployment_name(&before[0].moduleIdentity);
    assert_eq!(plan.update[0].metadata.name.as_deref(), Some(updated_name.as_str()));
}

/// A module that drops its only host port binding goes from NodePort back
/// to ClusterIP - this must surface as a Service update, not a silent noop.
#[test]
fn dropping_a_host_port_binding_triggers_service_update() {
    let mut with_binding = entry("tempSensor", "repo/sensor:1", &["8080/tcp"]);
    with_binding.module.createOptions.hostConfig.portBindings.insert(
        "8080/tcp".to_string(),
        vec![PortBinding { hostIp: None, hostPort: "30080".to_string() }],
    );
    let observed = synthesize(&[with_binding], &cfg());

    let without_binding = vec![entry("tempSensor", "repo/sensor:1", &["8080/tcp"])];
    let desired = synthesize(&without_binding, &cfg());

    let plan = diff::diff_services(&desired.services, &observed.services);
    assert_eq!(plan.update.len(), 1);
}

/// Modules of an unsupported type never produce a Deployment or Service,
/// regardless of what else is in createOptions.
#[test]
fn non_docker_modules_are_never_synthesized() {
    let mut other = entry("weirdModule", "repo/x:1", &["80/tcp"]);
    other.module.kind = ModuleType::Other;
    let desired = synthesize(&[other], &cfg());
    assert!(desired.deployments.is_empty());
    assert!(desired.services.is_empty());
}

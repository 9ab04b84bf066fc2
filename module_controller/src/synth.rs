use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort as K8sContainerPort, EnvVar, LocalObjectReference, PodSpec,
    PodTemplateSpec, SecurityContext, Service, ServicePort as K8sServicePort, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use module_definitions::createoptions::RegistryAuth;
use module_definitions::identity::ModuleIdentity;
use module_definitions::naming::{self, Labels, ANNOTATION_CREATION_STRING};
use module_definitions::ports::{self, Protocol};
use module_definitions::secrets::secret_name_for;
use module_definitions::spec::{ModuleConfig, ModuleEntry, ModuleType};
use module_definitions::volumes;
use module_definitions::{env as envmod, Result};

use crate::config::ControllerConfig;

pub const PROXY_IMAGE: &str = "envoyproxy/envoy:latest";
pub const PROXY_CONTAINER_NAME: &str = "proxy";

fn protocol_str(p: Protocol) -> String { p.as_str().to_string() }

/// Everything this controller wants to exist for one reconciliation pass.
#[derive(Default, Clone, Debug)]
pub struct DesiredObjects {
    pub services: BTreeMap<String, Service>,
    pub deployments: BTreeMap<String, Deployment>,
    /// Secret name -> registry auth content (one per unique credential).
    pub secrets: BTreeMap<String, RegistryAuth>,
}

fn object_meta(name: &str, labels: &Labels, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        labels: Some(labels.as_map()),
        ..ObjectMeta::default()
    }
}

/// Stamp the `creation-string` annotation with the JSON of the object as it
/// is about to be sent, so the next reconciliation can diff against it
/// in place of a live, server-mutated object.
pub fn stamp_creation_annotation<T: serde::Serialize>(meta: &mut ObjectMeta, obj: &T) -> Result<()> {
    let encoded = serde_json::to_string(obj)?;
    let mut annotations = meta.annotations.take().unwrap_or_default();
    annotations.insert(ANNOTATION_CREATION_STRING.to_string(), encoded);
    meta.annotations = Some(annotations);
    Ok(())
}

fn build_service(identity: &ModuleIdentity, module: &ModuleConfig, namespace: &str) -> Option<Service> {
    let (ports, node_port) = ports::service_ports(&module.createOptions);
    if ports.is_empty() {
        return None;
    }
    let labels = Labels::for_identity(identity);
    let name = naming::service_name(identity);
    let svc_ports = ports
        .into_iter()
        .map(|p| K8sServicePort {
            port: i32::from(p.port),
            target_port: Some(IntOrString::Int(i32::from(p.target_port))),
            protocol: Some(protocol_str(p.protocol)),
            ..K8sServicePort::default()
        })
        .collect();
    let mut service = Service {
        metadata: object_meta(&name, &labels, namespace),
        spec: Some(ServiceSpec {
            selector: Some(labels.as_map()),
            ports: Some(svc_ports),
            type_: Some(if node_port { "NodePort".into() } else { "ClusterIP".into() }),
            ..ServiceSpec::default()
        }),
        ..Service::default()
    };
    let _ = stamp_creation_annotation(&mut service.metadata, &service.clone());
    Some(service)
}

fn build_pod_template(
    identity: &ModuleIdentity,
    module: &ModuleConfig,
    cfg: &ControllerConfig,
) -> PodTemplateSpec {
    let labels = Labels::for_identity(identity);
    let mut pod_labels = labels.as_map();
    // create-options labels win on conflict.
    for (k, v) in &module.createOptions.labels {
        pod_labels.insert(k.clone(), v.clone());
    }

    let edge_device_hostname = cfg
        .gateway_hostname
        .clone()
        .unwrap_or_else(|| cfg.hub_hostname.clone());
    let env: Vec<EnvVar> = envmod::assemble_env(identity, module, &edge_device_hostname, &cfg.log_level);

    let container_ports: Vec<K8sContainerPort> = ports::container_ports(&module.createOptions)
        .into_iter()
        .map(|p| K8sContainerPort { container_port: i32::from(p.port), protocol: Some(protocol_str(p.protocol)), ..K8sContainerPort::default() })
        .collect();

    let sys = volumes::system_volumes(identity.is_edge_agent());
    let (extra_volumes, module_mounts) = volumes::additional_volumes(&module.createOptions);

    let mut volumes_all = sys.volumes;
    volumes_all.extend(extra_volumes.clone());

    let mut module_container_mounts = sys.module_mounts;
    module_container_mounts.extend(module_mounts);

    let security_context = if module.createOptions.hostConfig.privileged {
        Some(SecurityContext { privileged: Some(true), ..SecurityContext::default() })
    } else {
        None
    };

    let module_container = Container {
        name: naming::canonical_name(&identity.moduleId),
        image: Some(module.image.clone()),
        env: Some(env.clone()),
        ports: if container_ports.is_empty() { None } else { Some(container_ports) },
        volume_mounts: Some(module_container_mounts),
        security_context,
        ..Container::default()
    };

    let proxy_container = Container {
        name: PROXY_CONTAINER_NAME.into(),
        image: Some(PROXY_IMAGE.into()),
        env: Some(env),
        volume_mounts: Some(sys.proxy_mounts),
        ..Container::default()
    };

    let image_pull_secrets = module.auth.as_ref().map(|auth| {
        vec![LocalObjectReference { name: Some(secret_name_for(auth)) }]
    });

    PodTemplateSpec {
        metadata: Some(ObjectMeta {
            labels: Some(pod_labels),
            ..ObjectMeta::default()
        }),
        spec: Some(PodSpec {
            containers: vec![module_container, proxy_container],
            volumes: Some(volumes_all),
            image_pull_secrets,
            ..PodSpec::default()
        }),
    }
}

fn build_deployment(identity: &ModuleIdentity, module: &ModuleConfig, cfg: &ControllerConfig) -> Deployment {
    let labels = Labels::for_identity(identity);
    let name = naming::deployment_name(identity);
    let template = build_pod_template(identity, module, cfg);
    let mut deployment = Deployment {
        metadata: object_meta(&name, &labels, &cfg.workload_namespace),
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector { match_labels: Some(labels.as_map()), ..LabelSelector::default() },
            template,
            ..DeploymentSpec::default()
        }),
        ..Deployment::default()
    };
    let _ = stamp_creation_annotation(&mut deployment.metadata, &deployment.clone());
    deployment
}

/// Synthesize the desired object set for every `docker` module in the CR.
/// Non-`docker` modules are skipped with a warning.
pub fn synthesize(entries: &[ModuleEntry], cfg: &ControllerConfig) -> DesiredObjects {
    let mut desired = DesiredObjects::default();
    for entry in entries {
        if entry.module.kind != ModuleType::Docker {
            warn!(
                "skipping module '{}': unsupported type (only 'docker' modules are reconciled)",
                entry.module.name
            );
            continue;
        }
        let identity = &entry.moduleIdentity;
        let module = &entry.module;

        if let Some(auth) = &module.auth {
            desired.secrets.insert(secret_name_for(auth), auth.clone());
        }

        if let Some(service) = build_service(identity, module, &cfg.workload_namespace) {
            desired.services.insert(naming::service_name(identity), service);
        }

        let deployment = build_deployment(identity, module, cfg);
        desired.deployments.insert(naming::deployment_name(identity), deployment);
    }
    desired
}

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::de::DeserializeOwned;

use module_definitions::naming::ANNOTATION_CREATION_STRING;

/// The result of comparing one desired object set against what is actually
/// on the cluster: what needs to be created, updated in place, or deleted.
#[derive(Debug, Default)]
pub struct Plan<T> {
    pub create: Vec<T>,
    pub update: Vec<T>,
    pub delete: Vec<String>,
}

impl<T> Plan<T> {
    fn new() -> Self { Plan { create: Vec::new(), update: Vec::new(), delete: Vec::new() } }
}

/// Decode the `creation-string` annotation, if present and well-formed. A
/// missing or corrupt annotation is not an error here - the caller falls
/// back to comparing against the live object instead.
fn decode_annotation<T: DeserializeOwned>(meta: &ObjectMeta) -> Option<T> {
    let annotations = meta.annotations.as_ref()?;
    let raw = annotations.get(ANNOTATION_CREATION_STRING)?;
    serde_json::from_str(raw).ok()
}

/// The baseline an observed object is diffed against: what this controller
/// last intended to write, recovered from its own annotation, or - failing
/// that - the live object itself (self-healing update).
fn baseline<T: DeserializeOwned + Clone>(observed: &T, meta: &ObjectMeta) -> T {
    decode_annotation(meta).unwrap_or_else(|| observed.clone())
}

fn weakly_equal_service(desired: &Service, baseline: &Service) -> bool {
    if desired.metadata.name != baseline.metadata.name { return false; }
    if desired.metadata.labels != baseline.metadata.labels { return false; }

    let d_spec = desired.spec.as_ref();
    let b_spec = baseline.spec.as_ref();
    let d_type = d_spec.and_then(|s| s.type_.as_ref());
    let b_type = b_spec.and_then(|s| s.type_.as_ref());
    if d_type != b_type { return false; }

    let d_port_count = d_spec.and_then(|s| s.ports.as_ref()).map(Vec::len).unwrap_or(0);
    let b_port_count = b_spec.and_then(|s| s.ports.as_ref()).map(Vec::len).unwrap_or(0);
    d_port_count == b_port_count
}

fn weakly_equal_deployment(desired: &Deployment, baseline: &Deployment) -> bool {
    if desired.metadata.name != baseline.metadata.name { return false; }
    if desired.metadata.labels != baseline.metadata.labels { return false; }

    let d_template_meta = desired.spec.as_ref().map(|s| &s.template.metadata);
    let b_template_meta = baseline.spec.as_ref().map(|s| &s.template.metadata);
    let d_tname = d_template_meta.and_then(|m| m.as_ref()).and_then(|m| m.name.as_ref());
    let b_tname = b_template_meta.and_then(|m| m.as_ref()).and_then(|m| m.name.as_ref());
    if d_tname != b_tname { return false; }
    let d_tlabels = d_template_meta.and_then(|m| m.as_ref()).and_then(|m| m.labels.as_ref());
    let b_tlabels = b_template_meta.and_then(|m| m.as_ref()).and_then(|m| m.labels.as_ref());
    if d_tlabels != b_tlabels { return false; }

    let d_containers = desired.spec.as_ref().map(|s| &s.template.spec).and_then(|s| s.as_ref()).map(|s| &s.containers);
    let b_containers = baseline.spec.as_ref().map(|s| &s.template.spec).and_then(|s| s.as_ref()).map(|s| &s.containers);
    match (d_containers, b_containers) {
        (Some(d), Some(b)) => {
            if d.len() != b.len() { return false; }
            d.iter().zip(b.iter()).all(|(dc, bc)| dc.name == bc.name && dc.image == bc.image)
        }
        (None, None) => true,
        _ => false,
    }
}

/// Classify a desired Service set against what is observed on the cluster.
pub fn diff_services(
    desired: &BTreeMap<String, Service>,
    observed: &BTreeMap<String, Service>,
) -> Plan<Service> {
    let mut plan = Plan::new();
    for (name, want) in desired {
        match observed.get(name) {
            None => plan.create.push(want.clone()),
            Some(have) => {
                let base = baseline(have, &have.metadata);
                if !weakly_equal_service(want, &base) {
                    plan.update.push(want.clone());
                }
            }
        }
    }
    for name in observed.keys() {
        if !desired.contains_key(name) {
            plan.delete.push(name.clone());
        }
    }
    plan
}

/// Classify a desired Deployment set against what is observed on the cluster.
/// Observed objects that carry a `resourceVersion` have it carried forward
/// onto the update in `reconciler` - this function only decides
/// membership in create/update/delete/noop, it does not touch metadata.
pub fn diff_deployments(
    desired: &BTreeMap<String, Deployment>,
    observed: &BTreeMap<String, Deployment>,
) -> Plan<Deployment> {
    let mut plan = Plan::new();
    for (name, want) in desired {
        match observed.get(name) {
            None => plan.create.push(want.clone()),
            Some(have) => {
                let base = baseline(have, &have.metadata);
                if !weakly_equal_deployment(want, &base) {
                    plan.update.push(want.clone());
                }
            }
        }
    }
    for name in observed.keys() {
        if !desired.contains_key(name) {
            plan.delete.push(name.clone());
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::apps::v1::DeploymentSpec;
    use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec, ServicePort, ServiceSpec};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
    use std::collections::BTreeMap as Map;

    fn labels() -> Map<String, String> {
        let mut m = Map::new();
        m.insert("module".into(), "tempsensor".into());
        m.insert("device".into(), "dev1".into());
        m.insert("hub".into(), "hub1".into());
        m
    }

    fn service(name: &str, port_count: usize) -> Service {
        let ports = (0..port_count)
            .map(|i| ServicePort { port: 80 + i as i32, ..ServicePort::default() })
            .collect();
        Service {
            metadata: ObjectMeta { name: Some(name.into()), labels: Some(labels()), ..ObjectMeta::default() },
            spec: Some(ServiceSpec { type_: Some("ClusterIP".into()), ports: Some(ports), ..ServiceSpec::default() }),
            ..Service::default()
        }
    }

    #[test]
    fn missing_service_is_created() {
        let mut desired = Map::new();
        desired.insert("tempsensor".to_string(), service("tempsensor", 1));
        let observed = Map::new();
        let plan = diff_services(&desired, &observed);
        assert_eq!(plan.create.len(), 1);
        assert!(plan.update.is_empty());
        assert!(plan.delete.is_empty());
    }

    #[test]
    fn identical_service_is_a_noop() {
        let mut desired = Map::new();
        desired.insert("tempsensor".to_string(), service("tempsensor", 1));
        let mut observed = Map::new();
        observed.insert("tempsensor".to_string(), service("tempsensor", 1));
        let plan = diff_services(&desired, &observed);
        assert!(plan.create.is_empty());
        assert!(plan.update.is_empty());
    }

    #[test]
    fn port_count_change_triggers_update() {
        let mut desired = Map::new();
        desired.insert("tempsensor".to_string(), service("tempsensor", 2));
        let mut observed = Map::new();
        observed.insert("tempsensor".to_string(), service("tempsensor", 1));
        let plan = diff_services(&desired, &observed);
        assert_eq!(plan.update.len(), 1);
    }

    #[test]
    fn absent_from_desired_is_deleted() {
        let desired = Map::new();
        let mut observed = Map::new();
        observed.insert("tempsensor".to_string(), service("tempsensor", 1));
        let plan = diff_services(&desired, &observed);
        assert_eq!(plan.delete, vec!["tempsensor".to_string()]);
    }

    fn deployment(name: &str, image: &str) -> Deployment {
        let container = Container { name: "tempsensor".into(), image: Some(image.into()), ..Container::default() };
        Deployment {
            metadata: ObjectMeta { name: Some(name.into()), labels: Some(labels()), ..ObjectMeta::default() },
            spec: Some(DeploymentSpec {
                replicas: Some(1),
                selector: LabelSelector { match_labels: Some(labels()), ..LabelSelector::default() },
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta { labels: Some(labels()), ..ObjectMeta::default() }),
                    spec: Some(PodSpec { containers: vec![container], ..PodSpec::default() }),
                },
                ..DeploymentSpec::default()
            }),
            ..Deployment::default()
        }
    }

    #[test]
    fn image_bump_triggers_update() {
        let mut desired = Map::new();
        desired.insert("dep".to_string(), deployment("dep", "repo/image:2"));
        let mut observed = Map::new();
        observed.insert("dep".to_string(), deployment("dep", "repo/image:1"));
        let plan = diff_deployments(&desired, &observed);
        assert_eq!(plan.update.len(), 1);
    }

    #[test]
    fn identical_deployment_is_a_noop() {
        let mut desired = Map::new();
        desired.insert("dep".to_string(), deployment("dep", "repo/image:1"));
        let mut observed = Map::new();
        observed.insert("dep".to_string(), deployment("dep", "repo/image:1"));
        let plan = diff_deployments(&desired, &observed);
        assert!(plan.update.is_empty());
    }

    #[test]
    fn annotation_baseline_is_preferred_over_live_object_drift() {
        // The live object's container image differs from the annotation (e.g. an
        // admission webhook touched it), but the annotation matches desired - no
        // update should be issued purely because of that external drift.
        let mut want = deployment("dep", "repo/image:1");
        let mut have = deployment("dep", "repo/image:1");
        let encoded = serde_json::to_string(&want).unwrap();
        have.metadata.annotations = Some({
            let mut m = Map::new();
            m.insert(ANNOTATION_CREATION_STRING.to_string(), encoded);
            m
        });
        have.spec.as_mut().unwrap().template.spec.as_mut().unwrap().containers[0].image = Some("repo/image:mutated".into());
        want.spec.as_mut().unwrap(); // no-op, keeps `want` explicitly desired

        let mut desired = Map::new();
        desired.insert("dep".to_string(), want);
        let mut observed = Map::new();
        observed.insert("dep".to_string(), have);
        let plan = diff_deployments(&desired, &observed);
        assert!(plan.update.is_empty());
    }
}

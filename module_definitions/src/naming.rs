use std::collections::BTreeMap;

use crate::identity::{ModuleIdentity, EDGE_AGENT_CANONICAL, EDGE_HUB_CANONICAL};

/// Separator used between hub and device in both the CR name and the
/// Deployment name.
pub const NAME_SEP: &str = "-";

pub const LABEL_MODULE: &str = "module";
pub const LABEL_DEVICE: &str = "device";
pub const LABEL_HUB: &str = "hub";

/// Annotation key under which the last-written desired object is stashed,
/// in place of a stateful controller memory.
pub const ANNOTATION_CREATION_STRING: &str = "creation-string";

/// The three identity labels every owned object carries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Labels {
    pub module: String,
    pub device: String,
    pub hub: String,
}

impl Labels {
    pub fn for_identity(id: &ModuleIdentity) -> Self {
        Labels {
            module: canonical_name(&id.moduleId),
            device: id.deviceId.clone(),
            hub: id.hubHostname.clone(),
        }
    }

    pub fn as_map(&self) -> BTreeMap<String, String> {
        let mut m = BTreeMap::new();
        m.insert(LABEL_MODULE.to_string(), self.module.clone());
        m.insert(LABEL_DEVICE.to_string(), self.device.clone());
        m.insert(LABEL_HUB.to_string(), self.hub.clone());
        m
    }
}

/// Canonical module name: reserved aliases for the well-known system
/// modules, otherwise a plain lowercasing of the module id.
pub fn canonical_name(module_id: &str) -> String {
    match module_id {
        "edgeAgent" => EDGE_AGENT_CANONICAL.to_string(),
        "edgeHub" => EDGE_HUB_CANONICAL.to_string(),
        other => other.to_lowercase(),
    }
}

/// Deployment name: `<hub>-<device>-<canonical>-deployment`, lowercased.
pub fn deployment_name(id: &ModuleIdentity) -> String {
    format!(
        "{}{sep}{}{sep}{}{sep}deployment",
        id.hubHostname,
        id.deviceId,
        canonical_name(&id.moduleId),
        sep = NAME_SEP
    )
    .to_lowercase()
}

/// Service name: just the canonical module name.
pub fn service_name(id: &ModuleIdentity) -> String {
    canonical_name(&id.moduleId)
}

/// The CR name this controller instance serves: `<hub><sep><device>`.
pub fn cr_name(hub_hostname: &str, device_id: &str) -> String {
    format!("{}{sep}{}", hub_hostname, device_id, sep = NAME_SEP)
}

/// The label selector used to list every object this controller owns:
/// `device=<deviceId>,hub=<hubHostname>`.
pub fn owned_object_selector(device_id: &str, hub_hostname: &str) -> String {
    format!("{}={},{}={}", LABEL_DEVICE, device_id, LABEL_HUB, hub_hostname)
}

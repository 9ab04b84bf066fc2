use kube_derive::CustomResource;

use crate::spec::ModuleEntry;

/// The watched custom resource: an ordered list of module entries for one
/// device. The CRD is cluster-scoped because its name already encodes the
/// device (`<hub>-<device>`, see `naming::cr_name`) and nothing about it is
/// tenant-specific.
#[derive(CustomResource, Serialize, Deserialize, Debug, Clone, Default)]
#[kube(
    group = "microsoft.azure.devices.edge",
    kind = "EdgeDeployment",
    version = "v1beta1",
    shortname = "ed",
    printcolumn = r#"{"name":"Modules", "jsonPath": ".spec.modules[*].module.name", "type": "string"}"#
)]
#[kube(apiextensions = "v1beta1")] // kubernetes < 1.16
pub struct EdgeDeploymentSpec {
    #[serde(default)]
    pub modules: Vec<ModuleEntry>,
}

use std::collections::BTreeMap;

use crate::createoptions::{CreateOptions, RegistryAuth};
use crate::identity::ModuleIdentity;

/// Module workload type. Only `Docker` is reconciled; anything else is
/// logged and the module is skipped.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    Docker,
    #[serde(other)]
    Other,
}

impl Default for ModuleType {
    fn default() -> Self { ModuleType::Other }
}

/// Declarative configuration for one module, as carried in the CR spec.
///
/// `env` is the semantic env map (already-resolved key/value pairs) layered
/// on top of whatever `createOptions.env` supplies; see `module_definitions::env`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ModuleConfig {
    #[serde(rename = "type", default)]
    pub kind: ModuleType,
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    pub image: String,
    #[serde(default)]
    pub createOptions: CreateOptions,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub auth: Option<RegistryAuth>,
    #[serde(default)]
    pub desiredStatus: Option<String>,
    #[serde(default)]
    pub restartPolicy: Option<String>,
}

/// One entry of the CR's module list: identity plus configuration.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ModuleEntry {
    pub moduleIdentity: ModuleIdentity,
    pub module: ModuleConfig,
}

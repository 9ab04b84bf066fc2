use std::collections::BTreeMap;

/// A single host port binding, as found under `hostConfig.portBindings`.
///
/// `hostPort` is kept as a `String` because that's how the container create
/// API shapes it; it is parsed lazily wherever it is consumed (see `ports`).
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct PortBinding {
    #[serde(default)]
    pub hostIp: Option<String>,
    pub hostPort: String,
}

/// A structured mount entry. Only `type == "bind"` (case-insensitive) is
/// honored by the volume mapper; anything else is ignored rather than
/// rejected, since other mount types may be meaningful upstream even if
/// this controller does not project them.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Mount {
    #[serde(rename = "type")]
    pub kind: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub readOnly: bool,
}

/// Registry credential for pulling a module's image.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct RegistryAuth {
    #[serde(default)]
    pub serverAddress: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// The create-options block of a module spec: a direct translation of the
/// subset of the container create API this controller understands.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct HostConfig {
    #[serde(default)]
    pub portBindings: BTreeMap<String, Vec<PortBinding>>,
    #[serde(default)]
    pub binds: Vec<String>,
    #[serde(default)]
    pub mounts: Vec<Mount>,
    #[serde(default)]
    pub privileged: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct CreateOptions {
    /// Docker-style exposed port map, e.g. `{"80/tcp": {}}`. The value is
    /// opaque (always an empty object in practice) so it is kept as a raw
    /// JSON value rather than modeled further.
    #[serde(default)]
    pub exposedPorts: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub hostConfig: HostConfig,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// `KEY=VALUE` env entries, as opposed to `ModuleConfig::env`'s semantic map.
    #[serde(default)]
    pub env: Vec<String>,
}

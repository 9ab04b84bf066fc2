/// Authentication material for a module: the scheme it proves itself with
/// plus the generation id that scopes that credential to one deployment.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Credential {
    #[serde(default = "default_auth_scheme")]
    pub authScheme: String,
    pub generationId: String,
}
fn default_auth_scheme() -> String { "sasToken".into() }

/// Immutable identity of a single module within a device's deployment.
///
/// Two modules are the same "slot" iff hub, device and module id all match;
/// `credential` may rotate independently (a generation bump) without that
/// counting as a new module.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ModuleIdentity {
    pub hubHostname: String,
    #[serde(default)]
    pub gatewayHostname: Option<String>,
    pub deviceId: String,
    pub moduleId: String,
    #[serde(default)]
    pub credentials: Credential,
}

/// Reserved identity ids with a canonical name that differs from a plain
/// lowercasing of the id (kept as an explicit table rather than relying on
/// the coincidence that lowercasing happens to produce the same string).
pub const EDGE_AGENT_ID: &str = "edgeAgent";
pub const EDGE_HUB_ID: &str = "edgeHub";
pub const EDGE_AGENT_CANONICAL: &str = "edgeagent";
pub const EDGE_HUB_CANONICAL: &str = "edgehub";

impl ModuleIdentity {
    pub fn is_edge_agent(&self) -> bool { self.moduleId == EDGE_AGENT_ID }
    pub fn is_edge_hub(&self) -> bool { self.moduleId == EDGE_HUB_ID }
    pub fn is_well_known(&self) -> bool { self.is_edge_agent() || self.is_edge_hub() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_detection() {
        let mut id = ModuleIdentity { moduleId: "edgeAgent".into(), ..Default::default() };
        assert!(id.is_edge_agent());
        assert!(id.is_well_known());
        id.moduleId = "tempSensor".into();
        assert!(!id.is_well_known());
    }
}

use k8s_openapi::api::core::v1::EnvVar;

use crate::identity::ModuleIdentity;
use crate::spec::ModuleConfig;

pub const WORKLOAD_URI: &str = "unix:///var/run/iotedge/workload.sock";
pub const MANAGEMENT_URI: &str = "unix:///var/run/iotedge/mgmt.sock";
pub const INJECTED_GATEWAY_HOSTNAME: &str = "edgehub";
pub const NETWORK_ID: &str = "azure-iot-edge";
pub const WORKLOAD_API_VERSION: &str = "2019-01-30";
pub const DEFAULT_LOG_LEVEL: &str = "info";

fn envvar(name: &str, value: String) -> EnvVar {
    EnvVar { name: name.into(), value: Some(value), ..EnvVar::default() }
}

/// Build the full env list for a module container: the semantic env map,
/// then `createOptions.env` parsed as `KEY=VALUE` (first `=` only, one-sided
/// entries dropped), then the fixed injected system variables, in that
/// order.
pub fn assemble_env(
    identity: &ModuleIdentity,
    module: &ModuleConfig,
    edge_device_hostname: &str,
    log_level: &str,
) -> Vec<EnvVar> {
    let mut out = Vec::new();

    for (k, v) in &module.env {
        out.push(envvar(k, v.clone()));
    }

    for entry in &module.createOptions.env {
        match entry.splitn(2, '=').collect::<Vec<_>>().as_slice() {
            [key, value] => out.push(envvar(key, (*value).to_string())),
            _ => warn!("dropping one-sided createOptions.env entry '{}'", entry),
        }
    }

    out.push(envvar("IOTEDGE_IOTHUBHOSTNAME", identity.hubHostname.clone()));
    out.push(envvar("IOTEDGE_AUTHSCHEME", identity.credentials.authScheme.clone()));
    out.push(envvar("RuntimeLogLevel", log_level.to_string()));
    out.push(envvar("IOTEDGE_WORKLOADURI", WORKLOAD_URI.to_string()));
    out.push(envvar("IOTEDGE_GATEWAYHOSTNAME", INJECTED_GATEWAY_HOSTNAME.to_string()));
    out.push(envvar("IOTEDGE_MODULEGENERATIONID", identity.credentials.generationId.clone()));
    out.push(envvar("IOTEDGE_DEVICEID", identity.deviceId.clone()));
    out.push(envvar("IOTEDGE_MODULEID", identity.moduleId.clone()));
    out.push(envvar("IOTEDGE_APIVERSION", WORKLOAD_API_VERSION.to_string()));

    if identity.is_edge_agent() {
        out.push(envvar("IOTEDGE_MODE", "kubernetes".to_string()));
        out.push(envvar("IOTEDGE_MANAGEMENTURI", MANAGEMENT_URI.to_string()));
        out.push(envvar("IOTEDGE_NETWORKID", NETWORK_ID.to_string()));
    }
    if identity.is_edge_agent() || identity.is_edge_hub() {
        out.push(envvar("EdgeDeviceHostName", edge_device_hostname.to_string()));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(module_id: &str) -> ModuleIdentity {
        ModuleIdentity { hubHostname: "hub1".into(), deviceId: "dev1".into(), moduleId: module_id.into(), ..Default::default() }
    }

    #[test]
    fn merges_semantic_and_create_options_env() {
        let mut module = ModuleConfig::default();
        module.env.insert("FOO".into(), "bar".into());
        module.createOptions.env = vec!["BAZ=qux".into(), "ONE_SIDED".into()];
        let env = assemble_env(&identity("tempSensor"), &module, "devhost", "info");
        let names: Vec<_> = env.iter().map(|e| e.name.clone()).collect();
        assert!(names.contains(&"FOO".to_string()));
        assert!(names.contains(&"BAZ".to_string()));
        assert!(!names.contains(&"ONE_SIDED".to_string()));
    }

    #[test]
    fn only_well_known_modules_get_device_hostname() {
        let module = ModuleConfig::default();
        let env = assemble_env(&identity("tempSensor"), &module, "devhost", "info");
        assert!(!env.iter().any(|e| e.name == "EdgeDeviceHostName"));

        let env = assemble_env(&identity("edgeHub"), &module, "devhost", "info");
        assert!(env.iter().any(|e| e.name == "EdgeDeviceHostName"));
    }

    #[test]
    fn only_agent_gets_mode_and_management_uri() {
        let module = ModuleConfig::default();
        let env = assemble_env(&identity("edgeHub"), &module, "devhost", "info");
        assert!(!env.iter().any(|e| e.name == "IOTEDGE_MODE"));

        let env = assemble_env(&identity("edgeAgent"), &module, "devhost", "info");
        assert!(env.iter().any(|e| e.name == "IOTEDGE_MODE"));
        assert!(env.iter().any(|e| e.name == "IOTEDGE_MANAGEMENTURI"));
        assert!(env.iter().any(|e| e.name == "IOTEDGE_NETWORKID"));
    }

    #[test]
    fn fixed_vars_are_always_present() {
        let module = ModuleConfig::default();
        let env = assemble_env(&identity("tempSensor"), &module, "devhost", "debug");
        let find = |n: &str| env.iter().find(|e| e.name == n).and_then(|e| e.value.clone());
        assert_eq!(find("IOTEDGE_IOTHUBHOSTNAME"), Some("hub1".into()));
        assert_eq!(find("IOTEDGE_DEVICEID"), Some("dev1".into()));
        assert_eq!(find("IOTEDGE_MODULEID"), Some("tempSensor".into()));
        assert_eq!(find("RuntimeLogLevel"), Some("debug".into()));
    }
}

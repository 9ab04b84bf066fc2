use std::env;

use module_definitions::env::DEFAULT_LOG_LEVEL;
use module_definitions::naming::cr_name;

/// Namespace owned objects (Deployments, Services, Pods) live in.
pub const DEFAULT_WORKLOAD_NAMESPACE: &str = "microsoft-azure-devices-edge";
/// Namespace image-pull Secrets live in. Deliberately distinct from the
/// workload namespace - credentials are shared across devices.
pub const SECRET_NAMESPACE: &str = "default";

/// This controller instance's own identity and the process-wide settings
/// derived from it.
#[derive(Clone, Debug)]
pub struct ControllerConfig {
    pub workload_namespace: String,
    pub hub_hostname: String,
    pub device_id: String,
    pub gateway_hostname: Option<String>,
    pub module_generation_id: String,
    pub log_level: String,
}

impl ControllerConfig {
    /// Load configuration from the process environment. Panics (crashing
    /// the process at startup, before any watch is established) if a
    /// required variable is missing - fail fast on boot, not
    /// mid-reconciliation.
    pub fn from_env() -> Self {
        let workload_namespace = env::var("IOTEDGE_WORKLOAD_NAMESPACE")
            .unwrap_or_else(|_| DEFAULT_WORKLOAD_NAMESPACE.to_string());
        let hub_hostname = env::var("IOTEDGE_HUBHOSTNAME").expect("Need IOTEDGE_HUBHOSTNAME evar");
        let device_id = env::var("IOTEDGE_DEVICEID").expect("Need IOTEDGE_DEVICEID evar");
        let gateway_hostname = env::var("IOTEDGE_GATEWAYHOSTNAME").ok();
        let module_generation_id =
            env::var("IOTEDGE_MODULEGENERATIONID").expect("Need IOTEDGE_MODULEGENERATIONID evar");
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());
        ControllerConfig {
            workload_namespace,
            hub_hostname,
            device_id,
            gateway_hostname,
            module_generation_id,
            log_level,
        }
    }

    /// The CR name this controller instance serves.
    pub fn resource_name(&self) -> String {
        cr_name(&self.hub_hostname, &self.device_id)
    }

    /// The label selector used to list every owned object.
    pub fn owned_object_selector(&self) -> String {
        module_definitions::naming::owned_object_selector(&self.device_id, &self.hub_hostname)
    }
}

use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, EmptyDirVolumeSource, HostPathVolumeSource, Volume, VolumeMount,
};

use crate::createoptions::{CreateOptions, Mount};

pub const WORKLOAD_VOLUME_NAME: &str = "workload";
pub const CONFIG_VOLUME_NAME: &str = "config-volume";
pub const SOCKET_DIR: &str = "/var/run/iotedge";
pub const PROXY_CONFIG_DIR: &str = "/etc/envoy";
const AGENT_CONFIG_MAP: &str = "agentConfigMap";
const MODULE_CONFIG_MAP: &str = "moduleConfigMap";

/// The pod-level volumes and mounts injected into every module pod
/// regardless of what the module itself declares: an `emptyDir` for the
/// workload socket (shared between the module container and the proxy) and
/// a `configMap` source for the proxy's envoy config (proxy-only).
pub struct SystemVolumes {
    pub volumes: Vec<Volume>,
    pub module_mounts: Vec<VolumeMount>,
    pub proxy_mounts: Vec<VolumeMount>,
}

pub fn system_volumes(is_agent: bool) -> SystemVolumes {
    let workload_volume = Volume {
        name: WORKLOAD_VOLUME_NAME.into(),
        empty_dir: Some(EmptyDirVolumeSource::default()),
        ..Volume::default()
    };
    let config_map_name = if is_agent { AGENT_CONFIG_MAP } else { MODULE_CONFIG_MAP };
    let config_volume = Volume {
        name: CONFIG_VOLUME_NAME.into(),
        config_map: Some(ConfigMapVolumeSource {
            name: Some(config_map_name.into()),
            ..ConfigMapVolumeSource::default()
        }),
        ..Volume::default()
    };
    let workload_mount = VolumeMount {
        name: WORKLOAD_VOLUME_NAME.into(),
        mount_path: SOCKET_DIR.into(),
        ..VolumeMount::default()
    };
    let config_mount = VolumeMount {
        name: CONFIG_VOLUME_NAME.into(),
        mount_path: PROXY_CONFIG_DIR.into(),
        ..VolumeMount::default()
    };
    SystemVolumes {
        volumes: vec![workload_volume, config_volume],
        module_mounts: vec![workload_mount.clone()],
        proxy_mounts: vec![workload_mount, config_mount],
    }
}

/// Translate `binds` (`src:dst[:ro]`) into `hostPath` volumes + mounts.
/// Malformed entries are dropped and logged; the rest of the module
/// continues to be processed.
pub fn bind_volumes(binds: &[String]) -> (Vec<Volume>, Vec<VolumeMount>) {
    let mut volumes = Vec::new();
    let mut mounts = Vec::new();
    for bind in binds {
        let parts: Vec<&str> = bind.splitn(3, ':').collect();
        if parts.len() < 2 {
            warn!("dropping malformed bind '{}'", bind);
            continue;
        }
        let (src, dst) = (parts[0], parts[1]);
        let read_only = parts.get(2).map(|opts| opts.contains("ro")).unwrap_or(false);
        volumes.push(Volume {
            name: src.into(),
            host_path: Some(HostPathVolumeSource {
                path: src.into(),
                type_: Some("DirectoryOrCreate".into()),
            }),
            ..Volume::default()
        });
        mounts.push(VolumeMount {
            name: src.into(),
            mount_path: dst.into(),
            read_only: Some(read_only),
            ..VolumeMount::default()
        });
    }
    (volumes, mounts)
}

/// Translate structured `mounts` into `hostPath` volumes + mounts. Only
/// `type == "bind"` (case-insensitive) entries are honored; anything else
/// is silently ignored (not an error - just not a volume this controller
/// knows how to project).
pub fn mount_volumes(mounts: &[Mount]) -> (Vec<Volume>, Vec<VolumeMount>) {
    let mut volumes = Vec::new();
    let mut vmounts = Vec::new();
    for m in mounts {
        if !m.kind.eq_ignore_ascii_case("bind") {
            continue;
        }
        volumes.push(Volume {
            name: m.source.clone(),
            host_path: Some(HostPathVolumeSource {
                path: m.source.clone(),
                type_: Some("DirectoryOrCreate".into()),
            }),
            ..Volume::default()
        });
        vmounts.push(VolumeMount {
            name: m.source.clone(),
            mount_path: m.target.clone(),
            read_only: Some(m.readOnly),
            ..VolumeMount::default()
        });
    }
    (volumes, vmounts)
}

/// All additional volumes (module mounts only - the proxy never sees
/// user-declared binds/mounts).
pub fn additional_volumes(opts: &CreateOptions) -> (Vec<Volume>, Vec<VolumeMount>) {
    let (mut volumes, mut mounts) = bind_volumes(&opts.hostConfig.binds);
    let (mvolumes, mmounts) = mount_volumes(&opts.hostConfig.mounts);
    volumes.extend(mvolumes);
    mounts.extend(mmounts);
    (volumes, mounts)
}

use std::collections::BTreeMap;

use crate::createoptions::CreateOptions;

/// Transport protocol of a port. Parsed case-insensitively, emitted
/// uppercase.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Protocol {
    Tcp,
    Udp,
    Sctp,
}

impl Protocol {
    fn parse(s: &str) -> Option<Protocol> {
        match s.to_ascii_uppercase().as_str() {
            "TCP" => Some(Protocol::Tcp),
            "UDP" => Some(Protocol::Udp),
            "SCTP" => Some(Protocol::Sctp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
            Protocol::Sctp => "SCTP",
        }
    }
}

/// A port a Service should expose for a module.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServicePortSpec {
    pub port: u16,
    pub target_port: u16,
    pub protocol: Protocol,
}

/// A port the module's own container listens on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContainerPortSpec {
    pub port: u16,
    pub protocol: Protocol,
}

/// Parse a docker-style `"<port>/<protocol>"` key. A port is valid iff the
/// left part parses as a non-negative integer and the right part is one of
/// tcp/udp/sctp (case-insensitive). Invalid entries return `None` and are
/// the caller's responsibility to log and drop.
pub fn parse_port_spec(spec: &str) -> Option<(u16, Protocol)> {
    let mut parts = spec.splitn(2, '/');
    let port_str = parts.next()?;
    let proto_str = parts.next()?;
    let port: u16 = port_str.parse().ok()?;
    let protocol = Protocol::parse(proto_str)?;
    Some((port, protocol))
}

/// Derive the Service ports (and whether any host-port binding was seen,
/// which classifies the Service as `NodePort` rather than `ClusterIP`) for
/// a module's create-options.
///
/// `exposedPorts` seeds one service port per valid entry with
/// `targetPort == port`; `hostConfig.portBindings` then override the
/// `targetPort` of the matching entry (or add a new one) with the parsed
/// host port. Keyed by container port so overrides land on the right entry.
pub fn service_ports(opts: &CreateOptions) -> (Vec<ServicePortSpec>, bool) {
    let mut ports: BTreeMap<u16, ServicePortSpec> = BTreeMap::new();

    for key in opts.exposedPorts.keys() {
        match parse_port_spec(key) {
            Some((port, protocol)) => {
                ports.insert(port, ServicePortSpec { port, target_port: port, protocol });
            }
            None => warn!("dropping invalid exposed port spec '{}'", key),
        }
    }

    let mut has_host_binding = false;
    for (key, bindings) in &opts.hostConfig.portBindings {
        let parsed = match parse_port_spec(key) {
            Some(p) => p,
            None => {
                warn!("dropping invalid host port binding spec '{}'", key);
                continue;
            }
        };
        let (port, protocol) = parsed;
        for binding in bindings {
            match binding.hostPort.parse::<u16>() {
                Ok(host_port) => {
                    ports.insert(port, ServicePortSpec { port, target_port: host_port, protocol });
                    has_host_binding = true;
                }
                Err(_) => warn!(
                    "dropping host port binding for '{}' with non-integer hostPort '{}'",
                    key, binding.hostPort
                ),
            }
        }
    }

    (ports.into_iter().map(|(_, v)| v).collect(), has_host_binding)
}

/// Container ports come from `exposedPorts` only; host bindings never
/// introduce a new container port, they only redirect traffic at the
/// Service layer.
pub fn container_ports(opts: &CreateOptions) -> Vec<ContainerPortSpec> {
    opts.exposedPorts
        .keys()
        .filter_map(|k| match parse_port_spec(k) {
            Some((port, protocol)) => Some(ContainerPortSpec { port, protocol }),
            None => {
                warn!("dropping invalid exposed port spec '{}'", k);
                None
            }
        })
        .collect()
}

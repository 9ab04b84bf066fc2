#![allow(non_snake_case)]

#[macro_use]
extern crate serde_derive;
extern crate serde;
extern crate serde_json;

#[macro_use]
extern crate log;

#[macro_use]
extern crate error_chain;
error_chain! {
    types {
        Error, ErrorKind, ResultExt, Result;
    }
    links {}
    foreign_links {
        SerdeJ(serde_json::Error);
        Int(::std::num::ParseIntError);
    }
    errors {
        InvalidModuleType(t: String) {
            description("module type is not supported")
            display("module type '{}' is not supported, only 'docker' modules are reconciled", t)
        }
        InvalidPortSpec(spec: String) {
            description("port specification could not be parsed")
            display("port specification '{}' is not a valid <port>/<protocol> pair", spec)
        }
        InvalidBindSpec(spec: String) {
            description("bind specification could not be parsed")
            display("bind specification '{}' is not a valid src:dst[:ro] triple", spec)
        }
        MissingAnnotation(key: String) {
            description("expected annotation was missing")
            display("object is missing the '{}' annotation", key)
        }
    }
}

/// Identity of a module: who it belongs to and how it authenticates.
pub mod identity;
pub use identity::{Credential, ModuleIdentity};

/// Declarative per-module configuration, as it arrives in the watched CR.
pub mod createoptions;
pub use createoptions::{CreateOptions, HostConfig, Mount, PortBinding, RegistryAuth};

pub mod spec;
pub use spec::{ModuleConfig, ModuleEntry, ModuleType};

/// The watched custom resource.
pub mod crd;
pub use crd::{EdgeDeployment, EdgeDeploymentSpec};

/// Deterministic names and label sets.
pub mod naming;
pub use naming::Labels;

/// Port and protocol parsing.
pub mod ports;
pub use ports::{ContainerPortSpec, Protocol, ServicePortSpec};

/// Volume and mount translation.
pub mod volumes;

/// Environment assembly.
pub mod env;

/// Image-pull secret projection.
pub mod secrets;

/// Module runtime status snapshot.
pub mod status;
pub use status::{ModuleStatus, RuntimeRecord};

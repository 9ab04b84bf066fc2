use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::createoptions::RegistryAuth;

pub const DOCKERCONFIGJSON_KEY: &str = ".dockerconfigjson";
pub const DOCKERCONFIGJSON_SECRET_TYPE: &str = "kubernetes.io/dockerconfigjson";

/// Derive a secret name from a credential's content alone, so that two
/// modules presenting the same registry credential collapse onto the same
/// Secret. The name has to be a valid Kubernetes object
/// name, hence the fixed `regcred-` prefix and hex digest.
pub fn secret_name_for(auth: &RegistryAuth) -> String {
    let mut hasher = DefaultHasher::new();
    auth.serverAddress.hash(&mut hasher);
    auth.username.hash(&mut hasher);
    auth.password.hash(&mut hasher);
    format!("regcred-{:016x}", hasher.finish())
}

/// Render the `.dockercfg`-style JSON blob a dockerconfigjson Secret's data
/// entry holds, base64-encoded as Kubernetes Secret data requires.
pub fn dockerconfigjson_bytes(auth: &RegistryAuth) -> Vec<u8> {
    let userpass = base64::encode(&format!("{}:{}", auth.username, auth.password));
    let doc = serde_json::json!({
        "auths": {
            auth.serverAddress.clone(): {
                "username": auth.username,
                "password": auth.password,
                "auth": userpass,
            }
        }
    });
    serde_json::to_vec(&doc).expect("serializing a fixed-shape json value cannot fail")
}

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, PostParams};

use module_definitions::createoptions::RegistryAuth;
use module_definitions::secrets::{dockerconfigjson_bytes, DOCKERCONFIGJSON_KEY, DOCKERCONFIGJSON_SECRET_TYPE};

use crate::config::SECRET_NAMESPACE;
use crate::Result;

fn build_secret(name: &str, auth: &RegistryAuth) -> Secret {
    let mut data = BTreeMap::new();
    data.insert(DOCKERCONFIGJSON_KEY.to_string(), k8s_openapi::ByteString(dockerconfigjson_bytes(auth)));
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(SECRET_NAMESPACE.to_string()),
            ..ObjectMeta::default()
        },
        type_: Some(DOCKERCONFIGJSON_SECRET_TYPE.to_string()),
        data: Some(data),
        ..Secret::default()
    }
}

fn payload_equal(existing: &Secret, wanted: &Secret) -> bool {
    existing.data.as_ref().and_then(|d| d.get(DOCKERCONFIGJSON_KEY))
        == wanted.data.as_ref().and_then(|d| d.get(DOCKERCONFIGJSON_KEY))
}

/// Ensure every image-pull Secret a module needs exists in the fixed
/// `default` namespace with up-to-date content, creating or replacing as
/// needed. Secrets are never deleted here - an orphaned credential
/// secret is harmless and may still be referenced by another device's CR.
pub async fn reconcile_secrets(
    secrets_api: &Api<Secret>,
    wanted: &BTreeMap<String, RegistryAuth>,
) -> Result<()> {
    for (name, auth) in wanted {
        let desired = build_secret(name, auth);
        match secrets_api.get(name).await {
            Ok(existing) => {
                if !payload_equal(&existing, &desired) {
                    secrets_api.replace(name, &PostParams::default(), &desired).await?;
                    info!("replaced image-pull secret '{}'", name);
                }
            }
            Err(kube::Error::Api(ref e)) if e.code == 404 => {
                secrets_api.create(&PostParams::default(), &desired).await?;
                info!("created image-pull secret '{}'", name);
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> RegistryAuth {
        RegistryAuth { serverAddress: "registry.example.com".into(), username: "bob".into(), password: "hunter2".into() }
    }

    #[test]
    fn built_secret_carries_dockerconfigjson_type_and_namespace() {
        let secret = build_secret("regcred-abc", &auth());
        assert_eq!(secret.type_.as_deref(), Some(DOCKERCONFIGJSON_SECRET_TYPE));
        assert_eq!(secret.metadata.namespace.as_deref(), Some(SECRET_NAMESPACE));
        assert!(secret.data.unwrap().contains_key(DOCKERCONFIGJSON_KEY));
    }

    #[test]
    fn identical_payload_is_considered_equal() {
        let a = build_secret("regcred-abc", &auth());
        let b = build_secret("regcred-abc", &auth());
        assert!(payload_equal(&a, &b));
    }

    #[test]
    fn different_credential_payload_is_not_equal() {
        let a = build_secret("regcred-abc", &auth());
        let mut other = auth();
        other.password = "different".into();
        let b = build_secret("regcred-abc", &other);
        assert!(!payload_equal(&a, &b));
    }
}

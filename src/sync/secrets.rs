// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Secret type checking, tenant copy construction, and creation

use crate::error::{Result, SyncError};
use crate::retry::{is_transient, retry_with_backoff, RetryPolicy};
use k8s_openapi::api::core::v1::Secret;
use kube::{
    api::{DynamicObject, ObjectMeta, PostParams},
    Api, Client, ResourceExt,
};
use tracing::instrument;

/// Interpret a type-erased feed object as a Secret
pub fn as_secret(obj: DynamicObject) -> Result<Secret> {
    if let Some(types) = obj.types.as_ref() {
        let kind = <Secret as k8s_openapi::Resource>::KIND;
        let api_version = <Secret as k8s_openapi::Resource>::API_VERSION;
        if types.kind != kind || types.api_version != api_version {
            return Err(SyncError::TypeMismatch(format!(
                "expected {}/{}, got {}/{} {}",
                api_version,
                kind,
                types.api_version,
                types.kind,
                obj.name_any()
            )));
        }
    }

    let name = obj.name_any();
    obj.try_parse::<Secret>()
        .map_err(|e| SyncError::TypeMismatch(format!("{}: {}", name, e)))
}

/// Build the copy of `secret` written to the tenant cluster.
///
/// Exactly four things are carried over: namespace, name, data and type.
/// Labels, annotations, owner references and the rest of the metadata stay
/// in the management cluster.
pub fn tenant_secret_for(secret: &Secret, namespace: &str) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: secret.metadata.name.clone(),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        data: secret.data.clone(),
        type_: secret.type_.clone(),
        ..Default::default()
    }
}

/// Create `secret` in the tenant cluster.
///
/// Never updates an existing object: a conflict surfaces as
/// [`SyncError::AlreadyExists`].
#[instrument(
    skip(tenant_client, secret, retry),
    fields(secret = %format!("{}/{}", namespace, secret.name_any()))
)]
pub async fn create_tenant_secret(
    tenant_client: Client,
    namespace: &str,
    secret: &Secret,
    retry: &RetryPolicy,
) -> Result<()> {
    let secrets: Api<Secret> = Api::namespaced(tenant_client, namespace);
    let pp = PostParams::default();
    let (secrets, pp) = (&secrets, &pp);

    match retry_with_backoff(retry, "create tenant secret", is_transient, move || {
        secrets.create(pp, secret)
    })
    .await
    {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(err)) if err.code == 409 => Err(SyncError::AlreadyExists(format!(
            "{}/{}",
            namespace,
            secret.name_any()
        ))),
        Err(e) => Err(SyncError::RemoteWriteError(e.to_string())),
    }
}

// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Per-namespace bootstrap credential lookup

use crate::error::{Result, SyncError};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::{Api, Client};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Payload of the bootstrap secret for one namespace.
///
/// The kubeconfig used to reach the tenant cluster is stored under
/// `descriptor_key`; everything else in the payload is ignored.
#[derive(Clone, Debug)]
pub struct BootstrapCredential {
    namespace: String,
    descriptor_key: String,
    payload: BTreeMap<String, ByteString>,
}

impl BootstrapCredential {
    pub fn new(
        namespace: impl Into<String>,
        descriptor_key: impl Into<String>,
        payload: BTreeMap<String, ByteString>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            descriptor_key: descriptor_key.into(),
            payload,
        }
    }

    pub fn from_secret(namespace: &str, descriptor_key: &str, secret: Secret) -> Self {
        Self::new(namespace, descriptor_key, secret.data.unwrap_or_default())
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Raw kubeconfig bytes
    pub fn access_descriptor(&self) -> Result<&[u8]> {
        self.payload
            .get(&self.descriptor_key)
            .map(|v| v.0.as_slice())
            .ok_or_else(|| SyncError::MissingAccessDescriptor(self.descriptor_key.clone()))
    }
}

/// Read the bootstrap secret from the given namespace of the management cluster
#[instrument(skip(client))]
pub async fn fetch_bootstrap_credential(
    client: &Client,
    namespace: &str,
    secret_name: &str,
    descriptor_key: &str,
) -> Result<BootstrapCredential> {
    let secrets: Api<Secret> = Api::namespaced(client.clone(), namespace);

    let Some(secret) = secrets.get_opt(secret_name).await? else {
        return Err(SyncError::BootstrapNotFound(format!(
            "{}/{}",
            namespace, secret_name
        )));
    };

    debug!("Found bootstrap secret {}/{}", namespace, secret_name);
    Ok(BootstrapCredential::from_secret(
        namespace,
        descriptor_key,
        secret,
    ))
}

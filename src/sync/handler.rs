// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Propagates one newly created management-cluster secret into its tenant cluster.

use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::feed::CreateHandler;
use crate::kubernetes::{ensure_namespace_exists, fetch_bootstrap_credential, TenantClientResolver};
use crate::retry::RetryPolicy;
use crate::sync::secrets::{as_secret, create_tenant_secret, tenant_secret_for};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::{api::DynamicObject, Client, ResourceExt};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Result of handling one creation event
#[derive(Debug)]
pub enum SyncOutcome {
    /// The secret now exists in the tenant cluster
    Synced { namespace: String, name: String },
    /// The event was dropped, nothing is retried
    Aborted(SyncError),
}

impl SyncOutcome {
    pub fn is_synced(&self) -> bool {
        matches!(self, SyncOutcome::Synced { .. })
    }
}

pub struct SyncHandler {
    client: Client,
    resolver: Arc<dyn TenantClientResolver>,
    bootstrap_secret_name: String,
    bootstrap_secret_key: String,
    create_tenant_namespace: bool,
    write_retry: RetryPolicy,
}

impl SyncHandler {
    pub fn new(client: Client, resolver: Arc<dyn TenantClientResolver>, config: &Config) -> Self {
        Self {
            client,
            resolver,
            bootstrap_secret_name: config.bootstrap_secret_name.clone(),
            bootstrap_secret_key: config.bootstrap_secret_key.clone(),
            create_tenant_namespace: config.create_tenant_namespace,
            write_retry: config.write_retry_policy(),
        }
    }

    /// Handle an object delivered by the change feed
    pub async fn handle(&self, obj: DynamicObject) -> SyncOutcome {
        match as_secret(obj) {
            Ok(secret) => self.sync_secret(&secret).await,
            Err(e) => {
                warn!("Ignoring object that is not a Secret: {}", e);
                SyncOutcome::Aborted(e)
            }
        }
    }

    /// Copy `secret` into the tenant cluster of its namespace
    #[instrument(
        skip(self, secret),
        fields(secret = %format!(
            "{}/{}",
            secret.namespace().unwrap_or_default(),
            secret.name_any()
        ))
    )]
    pub async fn sync_secret(&self, secret: &Secret) -> SyncOutcome {
        match self.try_sync(secret).await {
            Ok((namespace, name)) => {
                info!(
                    "Successfully synced secret to tenant cluster: {}/{}",
                    namespace, name
                );
                SyncOutcome::Synced { namespace, name }
            }
            Err(e) => {
                match &e {
                    SyncError::AlreadyExists(_) => {
                        warn!("Secret already present in tenant cluster, not updating: {}", e)
                    }
                    _ => error!("Failed to sync secret to tenant cluster: {}", e),
                }
                SyncOutcome::Aborted(e)
            }
        }
    }

    async fn try_sync(&self, secret: &Secret) -> Result<(String, String)> {
        let name = secret.name_any();
        let namespace = secret
            .namespace()
            .ok_or_else(|| SyncError::MissingNamespace(name.clone()))?;

        debug!("Looking up bootstrap secret in namespace {}", namespace);
        let bootstrap = fetch_bootstrap_credential(
            &self.client,
            &namespace,
            &self.bootstrap_secret_name,
            &self.bootstrap_secret_key,
        )
        .await?;
        bootstrap.access_descriptor()?;

        let tenant_client = self.resolver.resolve(&bootstrap).await?;

        if self.create_tenant_namespace {
            ensure_namespace_exists(&tenant_client, &namespace).await?;
        }

        let tenant_secret = tenant_secret_for(secret, &namespace);
        create_tenant_secret(tenant_client, &namespace, &tenant_secret, &self.write_retry).await?;

        Ok((namespace, name))
    }
}

#[async_trait]
impl CreateHandler for SyncHandler {
    async fn on_create(&self, obj: DynamicObject) {
        self.handle(obj).await;
    }
}

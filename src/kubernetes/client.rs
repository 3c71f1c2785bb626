// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Tenant cluster client creation from bootstrap credentials

use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::kubernetes::bootstrap::BootstrapCredential;
use crate::kubernetes::cache::CachingResolver;
use async_trait::async_trait;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Strategy for turning a bootstrap credential into a tenant cluster client
#[async_trait]
pub trait TenantClientResolver: Send + Sync {
    async fn resolve(&self, bootstrap: &BootstrapCredential) -> Result<Client>;
}

/// Builds a fresh client from the kubeconfig stored in the bootstrap credential
#[derive(Clone, Debug, Default)]
pub struct KubeconfigResolver;

#[async_trait]
impl TenantClientResolver for KubeconfigResolver {
    #[instrument(skip(self, bootstrap), fields(namespace = %bootstrap.namespace()))]
    async fn resolve(&self, bootstrap: &BootstrapCredential) -> Result<Client> {
        let raw = bootstrap.access_descriptor()?;
        create_client_from_kubeconfig(raw).await
    }
}

/// Create a Kubernetes client from raw kubeconfig bytes
async fn create_client_from_kubeconfig(raw: &[u8]) -> Result<Client> {
    let kubeconfig: Kubeconfig = serde_yaml::from_slice(raw)
        .map_err(|e| SyncError::InvalidAccessDescriptor(e.to_string()))?;

    let options = KubeConfigOptions::default();
    let client_config = kube::Config::from_custom_kubeconfig(kubeconfig, &options)
        .await
        .map_err(|e| SyncError::ClientConstruction(format!("Failed to create config: {}", e)))?;

    debug!("Tenant cluster endpoint: {}", client_config.cluster_url);

    Client::try_from(client_config)
        .map_err(|e| SyncError::ClientConstruction(format!("Failed to create client: {}", e)))
}

/// Pick the resolver strategy for the given configuration
pub fn resolver_for(config: &Config) -> Arc<dyn TenantClientResolver> {
    if config.cache_tenant_clients {
        Arc::new(CachingResolver::new(KubeconfigResolver))
    } else {
        Arc::new(KubeconfigResolver)
    }
}

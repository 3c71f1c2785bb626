// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Per-namespace tenant client cache

use crate::error::Result;
use crate::kubernetes::bootstrap::BootstrapCredential;
use crate::kubernetes::client::TenantClientResolver;
use async_trait::async_trait;
use kube::Client;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

struct CachedClient {
    descriptor: Vec<u8>,
    client: Client,
}

type Slot = Arc<Mutex<Option<CachedClient>>>;

/// Wraps another resolver and keeps one client per namespace.
///
/// A cached client is reused as long as the kubeconfig bytes in the bootstrap
/// secret are unchanged. Each namespace has its own lock, so concurrent
/// resolves for one namespace construct the client only once while other
/// namespaces proceed independently.
///
/// A namespace keeps its slot only while it holds a working client: a failed
/// resolve removes the slot again, so the map is bounded by the number of
/// namespaces that have synced successfully.
pub struct CachingResolver<R> {
    inner: R,
    slots: Mutex<HashMap<String, Slot>>,
}

impl<R> CachingResolver<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            slots: Mutex::new(HashMap::new()),
        }
    }

    async fn slot(&self, namespace: &str) -> Slot {
        self.slots
            .lock()
            .await
            .entry(namespace.to_string())
            .or_default()
            .clone()
    }

    /// Remove the slot for `namespace` unless another resolve already replaced it
    async fn evict(&self, namespace: &str, slot: &Slot) {
        let mut slots = self.slots.lock().await;
        if slots.get(namespace).is_some_and(|s| Arc::ptr_eq(s, slot)) {
            slots.remove(namespace);
        }
    }
}

#[async_trait]
impl<R: TenantClientResolver> TenantClientResolver for CachingResolver<R> {
    #[instrument(skip(self, bootstrap), fields(namespace = %bootstrap.namespace()))]
    async fn resolve(&self, bootstrap: &BootstrapCredential) -> Result<Client> {
        let descriptor = bootstrap.access_descriptor()?;
        let slot = self.slot(bootstrap.namespace()).await;
        let mut cached = slot.lock().await;

        if let Some(entry) = cached.as_ref() {
            if entry.descriptor == descriptor {
                debug!("Reusing cached tenant client");
                return Ok(entry.client.clone());
            }
            info!("Bootstrap kubeconfig changed, dropping cached tenant client");
        }
        *cached = None;

        match self.inner.resolve(bootstrap).await {
            Ok(client) => {
                *cached = Some(CachedClient {
                    descriptor: descriptor.to_vec(),
                    client: client.clone(),
                });
                Ok(client)
            }
            Err(e) => {
                drop(cached);
                self.evict(bootstrap.namespace(), &slot).await;
                Err(e)
            }
        }
    }
}

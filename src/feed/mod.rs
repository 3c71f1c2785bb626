// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Change feed - watches Secrets in all namespaces and reports newly created ones.
//!
//! The watcher reports every add and modification as an apply. The feed keeps
//! the set of objects it has already seen so that only the first sighting of
//! an object reaches the handler. Objects listed at startup (or after a
//! re-list) are held back until the listing is complete, then queued for the
//! handler after the synced signal has been raised. Queued objects are handed
//! over one at a time, so a shutdown drops whatever is still waiting.

use crate::config::Config;
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::{
    api::{ApiResource, DynamicObject},
    Api, Client, ResourceExt,
};
use kube_runtime::watcher::{self, Event};
use kube_runtime::WatchStreamExt;
use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Receives objects the first time the feed sees them
#[async_trait]
pub trait CreateHandler: Send + Sync {
    async fn on_create(&self, obj: DynamicObject);
}

/// Tracks which objects have been reported as created
#[derive(Default)]
pub struct FeedState {
    seen: HashSet<String>,
    listing: Option<Listing>,
}

#[derive(Default)]
struct Listing {
    keys: HashSet<String>,
    created: Vec<DynamicObject>,
}

impl FeedState {
    /// Apply a watcher event, returning the objects to report as created
    pub fn observe(&mut self, event: Event<DynamicObject>) -> Vec<DynamicObject> {
        match event {
            Event::Init => {
                self.listing = Some(Listing::default());
                Vec::new()
            }
            Event::InitApply(obj) => {
                let key = object_key(&obj);
                let listing = self.listing.get_or_insert_with(Listing::default);
                if listing.keys.insert(key.clone()) && !self.seen.contains(&key) {
                    listing.created.push(obj);
                }
                Vec::new()
            }
            Event::InitDone => {
                let Some(listing) = self.listing.take() else {
                    return Vec::new();
                };
                // Anything missing from the fresh listing was deleted while we were not watching
                self.seen.retain(|key| listing.keys.contains(key));
                self.seen.extend(listing.keys);
                listing.created
            }
            Event::Apply(obj) => {
                if self.seen.insert(object_key(&obj)) {
                    vec![obj]
                } else {
                    Vec::new()
                }
            }
            Event::Delete(obj) => {
                self.seen.remove(&object_key(&obj));
                Vec::new()
            }
        }
    }

    pub fn is_known(&self, obj: &DynamicObject) -> bool {
        self.seen.contains(&object_key(obj))
    }
}

/// UID when available, namespace/name otherwise
fn object_key(obj: &DynamicObject) -> String {
    obj.uid().unwrap_or_else(|| {
        format!("{}/{}", obj.namespace().unwrap_or_default(), obj.name_any())
    })
}

/// Resolves once the initial listing has completed
pub struct SyncedSignal {
    rx: watch::Receiver<bool>,
}

impl SyncedSignal {
    /// Wait for the initial listing, failing after `timeout`
    pub async fn wait(mut self, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, self.rx.wait_for(|synced| *synced)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => Err(SyncError::CacheSyncError(
                "change feed stopped before the initial listing completed".to_string(),
            )),
            Err(_) => Err(SyncError::CacheSyncError(format!(
                "initial listing did not complete within {} seconds",
                timeout.as_secs()
            ))),
        }
    }
}

/// Watch over Secrets in all namespaces
pub struct ChangeFeed {
    api: Api<DynamicObject>,
    watcher_config: watcher::Config,
    synced_tx: watch::Sender<bool>,
}

impl ChangeFeed {
    pub fn new(client: Client, config: &Config) -> (Self, SyncedSignal) {
        let api = Api::all_with(client, &ApiResource::erase::<Secret>(&()));

        let mut watcher_config = watcher::Config::default();
        if let Some(selector) = config.watch_label_selector.as_deref() {
            watcher_config = watcher_config.labels(selector);
        }

        let (synced_tx, rx) = watch::channel(false);
        let feed = Self {
            api,
            watcher_config,
            synced_tx,
        };
        (feed, SyncedSignal { rx })
    }

    /// Dispatch creations to `handler` until `shutdown` resolves.
    ///
    /// Creations are handled one at a time and shutdown is checked before each
    /// of them. A handler that is already running is allowed to finish, queued
    /// creations that have not started are dropped.
    pub async fn run<H, S>(self, handler: Arc<H>, shutdown: S) -> anyhow::Result<()>
    where
        H: CreateHandler + ?Sized,
        S: Future<Output = ()>,
    {
        let stream =
            watcher::watcher(self.api.clone(), self.watcher_config.clone()).default_backoff();
        let mut stream = std::pin::pin!(stream);
        let mut shutdown = std::pin::pin!(shutdown);
        let mut state = FeedState::default();
        let mut pending: VecDeque<DynamicObject> = VecDeque::new();

        info!(
            selector = self.watcher_config.label_selector.as_deref().unwrap_or(""),
            "Secret change feed started"
        );

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    if !pending.is_empty() {
                        info!(dropped = pending.len(), "Dropping queued secret creations");
                    }
                    info!("Shutting down secret change feed");
                    break;
                }
                Some(obj) = async { pending.pop_front() }, if !pending.is_empty() => {
                    debug!(
                        "Secret created: {}/{}",
                        obj.namespace().unwrap_or_default(),
                        obj.name_any()
                    );
                    handler.on_create(obj).await;
                }
                event = stream.next() => {
                    let Some(event) = event else {
                        warn!("Secret watch stream ended");
                        break;
                    };
                    match event {
                        Ok(event) => pending.extend(advance(&mut state, event, &self.synced_tx)),
                        Err(e) => warn!(error = %e, "Secret watch error, backing off"),
                    }
                }
            }
        }

        Ok(())
    }
}

/// Feed one watcher event into `state`, raising the synced signal when a
/// listing completes. Returns the objects to hand to the handler.
fn advance(
    state: &mut FeedState,
    event: Event<DynamicObject>,
    synced_tx: &watch::Sender<bool>,
) -> Vec<DynamicObject> {
    let listing_done = matches!(event, Event::InitDone);
    let created = state.observe(event);

    if listing_done {
        if !*synced_tx.borrow() {
            info!("Initial secret listing complete");
        }
        synced_tx.send_replace(true);
    }

    created
}

/// How the change feed came out of startup
#[derive(Debug, PartialEq, Eq)]
pub enum Startup {
    /// The initial listing completed, the feed keeps running
    Synced,
    /// The feed was shut down before the initial listing completed
    Stopped,
}

/// Wait for the feed running in `feed_task` to finish its initial listing.
///
/// A feed that returns `Ok` before syncing was shut down and is reported as
/// [`Startup::Stopped`]. A feed error, a panic or the timeout fail startup.
pub async fn await_startup(
    synced: SyncedSignal,
    feed_task: &mut JoinHandle<anyhow::Result<()>>,
    timeout: Duration,
) -> anyhow::Result<Startup> {
    use anyhow::Context;

    tokio::select! {
        biased;

        res = &mut *feed_task => {
            res.context("Change feed task panicked")??;
            Ok(Startup::Stopped)
        }
        res = synced.wait(timeout) => {
            let Err(e) = res else {
                return Ok(Startup::Synced);
            };
            // The feed may have stopped cleanly in the meantime
            feed_task.abort();
            match (&mut *feed_task).await {
                Ok(Ok(())) => Ok(Startup::Stopped),
                Ok(Err(feed_err)) => Err(feed_err),
                Err(_) => Err(e).context("Change feed failed to start"),
            }
        }
    }
}

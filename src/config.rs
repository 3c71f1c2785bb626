// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{bootstrap, feed, retry};
use crate::error::{Result, SyncError};
use crate::retry::RetryPolicy;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Name of the secret holding the tenant kubeconfig in each namespace
    pub bootstrap_secret_name: String,
    /// Key of the kubeconfig inside the bootstrap secret
    pub bootstrap_secret_key: String,
    /// Only watch secrets matching this label selector
    pub watch_label_selector: Option<String>,
    /// Reuse tenant clients per namespace until the kubeconfig changes
    pub cache_tenant_clients: bool,
    /// Create the target namespace in the tenant cluster if it is missing
    pub create_tenant_namespace: bool,
    pub write_max_attempts: u32,
    pub initial_sync_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bootstrap_secret_name: bootstrap::SECRET_NAME.to_string(),
            bootstrap_secret_key: bootstrap::KUBECONFIG_KEY.to_string(),
            watch_label_selector: None,
            cache_tenant_clients: false,
            create_tenant_namespace: false,
            write_max_attempts: retry::MAX_ATTEMPTS,
            initial_sync_timeout: Duration::from_secs(feed::INITIAL_SYNC_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let write_max_attempts: u32 =
            parse_or(&lookup, "WRITE_MAX_ATTEMPTS", defaults.write_max_attempts)?;
        if write_max_attempts == 0 {
            return Err(SyncError::ConfigError(
                "WRITE_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }

        let timeout_secs: u64 = parse_or(
            &lookup,
            "INITIAL_SYNC_TIMEOUT_SECS",
            defaults.initial_sync_timeout.as_secs(),
        )?;

        Ok(Config {
            bootstrap_secret_name: lookup("BOOTSTRAP_SECRET_NAME")
                .unwrap_or(defaults.bootstrap_secret_name),
            bootstrap_secret_key: lookup("BOOTSTRAP_SECRET_KEY")
                .unwrap_or(defaults.bootstrap_secret_key),
            watch_label_selector: lookup("WATCH_LABEL_SELECTOR"),
            cache_tenant_clients: parse_or(
                &lookup,
                "CACHE_TENANT_CLIENTS",
                defaults.cache_tenant_clients,
            )?,
            create_tenant_namespace: parse_or(
                &lookup,
                "CREATE_TENANT_NAMESPACE",
                defaults.create_tenant_namespace,
            )?,
            write_max_attempts,
            initial_sync_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Retry policy applied to secret creation in the tenant cluster
    pub fn write_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_max_attempts(self.write_max_attempts)
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| {
                SyncError::ConfigError(format!("Invalid value '{}' for {}: {}", raw, key, e))
            }),
        None => Ok(default),
    }
}

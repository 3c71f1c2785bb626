// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Initial secret sync did not complete: {0}")]
    CacheSyncError(String),

    #[error("Object is not a Secret: {0}")]
    TypeMismatch(String),

    #[error("Secret {0} has no namespace")]
    MissingNamespace(String),

    #[error("Bootstrap secret {0} not found")]
    BootstrapNotFound(String),

    #[error("Bootstrap secret does not contain '{0}' key")]
    MissingAccessDescriptor(String),

    #[error("Failed to parse kubeconfig: {0}")]
    InvalidAccessDescriptor(String),

    #[error("Failed to construct tenant client: {0}")]
    ClientConstruction(String),

    #[error("Namespace creation failed: {0}")]
    NamespaceError(String),

    #[error("Secret {0} already exists in tenant cluster")]
    AlreadyExists(String),

    #[error("Failed to create secret in tenant cluster: {0}")]
    RemoteWriteError(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;

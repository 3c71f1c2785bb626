// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace management in tenant clusters

use crate::error::{Result, SyncError};
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::{ObjectMeta, PostParams},
    Api, Client,
};
use tracing::{debug, info, instrument};

/// Ensure a namespace exists in the tenant cluster, create if it doesn't
#[instrument(skip(client))]
pub async fn ensure_namespace_exists(client: &Client, namespace: &str) -> Result<()> {
    let namespaces: Api<Namespace> = Api::all(client.clone());

    let existing = namespaces.get_opt(namespace).await.map_err(|e| {
        SyncError::NamespaceError(format!("Failed to look up namespace {}: {}", namespace, e))
    })?;
    if existing.is_some() {
        debug!("Namespace {} already exists in tenant cluster", namespace);
        return Ok(());
    }

    info!("Creating namespace {} in tenant cluster", namespace);
    let ns = Namespace {
        metadata: ObjectMeta {
            name: Some(namespace.to_string()),
            ..Default::default()
        },
        ..Default::default()
    };

    match namespaces.create(&PostParams::default(), &ns).await {
        Ok(_) => Ok(()),
        // Created concurrently by someone else
        Err(kube::Error::Api(err)) if err.code == 409 => Ok(()),
        Err(e) => Err(SyncError::NamespaceError(format!(
            "Failed to create namespace {}: {}",
            namespace, e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{already_exists_json, namespace_json, MockService};

    #[tokio::test]
    async fn test_existing_namespace_is_left_alone() {
        let mock =
            MockService::new().on_get("/api/v1/namespaces/team-a", 200, &namespace_json("team-a"));
        let client = mock.clone().into_client();

        ensure_namespace_exists(&client, "team-a").await.unwrap();

        assert!(mock.requests_with_method("POST").is_empty());
    }

    #[tokio::test]
    async fn test_missing_namespace_is_created() {
        let mock = MockService::new().on_post("/api/v1/namespaces", 201, &namespace_json("team-a"));
        let client = mock.clone().into_client();

        ensure_namespace_exists(&client, "team-a").await.unwrap();

        let posts = mock.requests_with_method("POST");
        assert_eq!(posts.len(), 1);
        let body: serde_json::Value = serde_json::from_slice(&posts[0].body).unwrap();
        assert_eq!(body["metadata"]["name"], "team-a");
    }

    #[tokio::test]
    async fn test_concurrently_created_namespace_is_ok() {
        let client = MockService::new()
            .on_post("/api/v1/namespaces", 409, &already_exists_json("namespaces", "team-a"))
            .into_client();

        assert!(ensure_namespace_exists(&client, "team-a").await.is_ok());
    }

    #[tokio::test]
    async fn test_forbidden_create_is_namespace_error() {
        let forbidden = serde_json::json!({
            "kind": "Status",
            "apiVersion": "v1",
            "status": "Failure",
            "message": "namespaces is forbidden",
            "reason": "Forbidden",
            "code": 403
        })
        .to_string();
        let client = MockService::new()
            .on_post("/api/v1/namespaces", 403, &forbidden)
            .into_client();

        let err = ensure_namespace_exists(&client, "team-a").await.unwrap_err();

        assert!(matches!(err, SyncError::NamespaceError(_)));
    }
}

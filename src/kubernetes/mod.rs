// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes plumbing: bootstrap credentials, tenant client resolution and
//! tenant namespace management.

pub mod bootstrap;
pub mod cache;
pub mod client;
pub mod namespaces;

pub use bootstrap::{fetch_bootstrap_credential, BootstrapCredential};
pub use cache::CachingResolver;
pub use client::{resolver_for, KubeconfigResolver, TenantClientResolver};
pub use namespaces::ensure_namespace_exists;

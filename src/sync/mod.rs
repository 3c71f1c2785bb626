// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Secret synchronization into tenant clusters.

pub mod handler;
pub mod secrets;

pub use handler::{SyncHandler, SyncOutcome};
pub use secrets::{as_secret, create_tenant_secret, tenant_secret_for};

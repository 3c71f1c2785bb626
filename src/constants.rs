// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Bootstrap secret holding the tenant cluster kubeconfig
pub mod bootstrap {
    /// Name of the bootstrap secret looked up in the namespace of each synced secret
    pub const SECRET_NAME: &str = "tenant-kubeconfig";
    /// Key in the bootstrap secret data that holds the kubeconfig
    pub const KUBECONFIG_KEY: &str = "kubeconfig";
}

/// Change feed configuration
pub mod feed {
    /// Seconds to wait for the initial secret listing before giving up
    pub const INITIAL_SYNC_TIMEOUT_SECS: u64 = 120;
}

/// Tenant write retry configuration
pub mod retry {
    /// A single attempt, transient failures are not retried unless configured
    pub const MAX_ATTEMPTS: u32 = 1;
    pub const INITIAL_DELAY_MILLIS: u64 = 200;
    pub const MAX_DELAY_SECS: u64 = 30;
}

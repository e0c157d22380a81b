// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait shared by the storage and remote backends.

use async_trait::async_trait;

use crate::error::WiserError;
use crate::types::{AdapterType, HealthStatus};

/// Identity, health and lifecycle for a concrete backend.
///
/// The durable queue and the remote writer implement this alongside their
/// functional trait so the host can report on them uniformly.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Returns the kind of adapter.
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, WiserError>;

    /// Gracefully shuts down the adapter, releasing any held resources.
    async fn shutdown(&self) -> Result<(), WiserError>;
}

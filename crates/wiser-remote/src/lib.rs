// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hosted-backend adapter for the Wiser offline sync core.
//!
//! This crate implements [`RemoteMessageWriter`] against the backend's REST
//! messages table. A write succeeds once the row exists remotely, whether this
//! call inserted it or an earlier one did.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;
use wiser_config::WiserConfig;
use wiser_core::error::WiserError;
use wiser_core::traits::{PluginAdapter, RemoteMessageWriter};
use wiser_core::types::{AdapterType, HealthStatus, QueuedMessage};

use crate::client::RestClient;

/// REST-backed remote message writer.
pub struct HttpMessageWriter {
    client: RestClient,
    signed_in: bool,
}

impl HttpMessageWriter {
    /// Creates a writer from the loaded configuration.
    ///
    /// The HTTP timeout matches `sync.write_timeout_secs` so a hung request
    /// is abandoned at the same point the worker gives up on it.
    pub fn new(config: &WiserConfig) -> Result<Self, WiserError> {
        Self::with_timeout(config, config.sync.write_timeout())
    }

    /// Creates a writer with an explicit request timeout.
    pub fn with_timeout(config: &WiserConfig, timeout: Duration) -> Result<Self, WiserError> {
        let client = RestClient::new(&config.remote, timeout)?;
        info!(
            endpoint = client.endpoint(),
            "remote message writer initialized"
        );
        Ok(Self {
            client,
            signed_in: config
                .remote
                .access_token
                .as_deref()
                .is_some_and(|t| !t.trim().is_empty()),
        })
    }
}

#[async_trait]
impl PluginAdapter for HttpMessageWriter {
    fn name(&self) -> &str {
        "rest"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Remote
    }

    async fn health_check(&self) -> Result<HealthStatus, WiserError> {
        // Probing would require a write; reachability shows up on the next drain.
        if self.signed_in {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Degraded(
                "no access token, writes use the anon key".to_string(),
            ))
        }
    }

    async fn shutdown(&self) -> Result<(), WiserError> {
        Ok(())
    }
}

#[async_trait]
impl RemoteMessageWriter for HttpMessageWriter {
    async fn write_message(&self, message: &QueuedMessage) -> Result<(), WiserError> {
        self.client.insert_message(message).await
    }
}

// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the hosted backend's REST messages endpoint.
//!
//! Inserts use upsert-on-id with duplicate rows ignored, so replaying an
//! entry that already reached the backend is a successful no-op.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::{debug, error, warn};
use wiser_config::model::RemoteConfig;
use wiser_core::types::QueuedMessage;
use wiser_core::WiserError;

use crate::types::{ApiErrorResponse, MessageRow};

/// Preference header asking the backend to skip rows whose id already exists.
const PREFER_IGNORE_DUPLICATES: &str = "resolution=ignore-duplicates,return=minimal";

/// Low-level client for `POST /rest/v1/{table}`.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: reqwest::Client,
    endpoint: String,
}

impl RestClient {
    /// Build a client from the remote section of the configuration.
    ///
    /// Requires `base_url` and `api_key`. The bearer token falls back to the
    /// api key when no user access token is configured.
    pub fn new(config: &RemoteConfig, timeout: Duration) -> Result<Self, WiserError> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| WiserError::Config("remote.base_url is not set".into()))?;
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| WiserError::Config("remote.api_key is not set".into()))?;
        let bearer = config.access_token.as_deref().unwrap_or(api_key);

        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value(api_key, "api_key")?);
        headers.insert(
            AUTHORIZATION,
            header_value(&format!("Bearer {bearer}"), "access_token")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("prefer", HeaderValue::from_static(PREFER_IGNORE_DUPLICATES));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| WiserError::RemoteWrite {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        let endpoint = format!(
            "{}/rest/v1/{}?on_conflict=id",
            base_url.trim_end_matches('/'),
            config.messages_table
        );

        Ok(Self { client, endpoint })
    }

    /// Full insert URL, including the conflict target.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Insert one message row. 2xx and 409 both count as persisted.
    pub async fn insert_message(&self, message: &QueuedMessage) -> Result<(), WiserError> {
        let body = [MessageRow::from(message)];

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let kind = if e.is_timeout() { "timed out" } else { "failed" };
                WiserError::RemoteWrite {
                    message: format!("insert request {kind}: {e}"),
                    source: Some(Box::new(e)),
                }
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(id = %message.id, %status, "message written to backend");
            return Ok(());
        }
        if status == StatusCode::CONFLICT {
            debug!(id = %message.id, "message already present on backend");
            return Ok(());
        }

        let error_body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ApiErrorResponse>(&error_body)
            .map(|e| match e.code {
                Some(code) => format!("{code}: {}", e.message),
                None => e.message,
            })
            .unwrap_or(error_body);

        if is_transient_status(status) {
            warn!(id = %message.id, %status, detail = %detail, "backend unavailable, message stays queued");
        } else {
            error!(id = %message.id, %status, detail = %detail, "backend rejected message");
        }
        Err(WiserError::RemoteWrite {
            message: format!("backend returned {status}: {detail}"),
            source: None,
        })
    }
}

fn header_value(value: &str, field: &str) -> Result<HeaderValue, WiserError> {
    HeaderValue::from_str(value)
        .map_err(|_| WiserError::Config(format!("remote.{field} contains invalid header characters")))
}

/// Whether a failed status looks like a passing backend condition.
///
/// Every failure is retried on the next drain regardless; this only picks the
/// log level.
pub fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

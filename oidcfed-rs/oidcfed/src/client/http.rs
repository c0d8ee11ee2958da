// Copyright 2020-2025 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! A reqwest-backed [`Fetch`] implementation.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::client::error::FetchError;
use crate::client::{Fetch, WELL_KNOWN_PATH};
use crate::error::ConfigError;
use crate::utils::is_compact_jws;

/// Transport configuration for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Connection establishment timeout.
    pub connect_timeout: Duration,
    /// Whether to verify TLS certificates. Disable only against test
    /// federations.
    pub verify_tls: bool,
    /// Upper bound on accepted response bodies.
    pub max_response_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            verify_tls: true,
            max_response_bytes: 512 * 1024,
        }
    }
}

impl HttpConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn with_verify_tls(mut self, verify_tls: bool) -> Self {
        self.verify_tls = verify_tls;
        self
    }

    pub fn with_max_response_bytes(mut self, max_response_bytes: usize) -> Self {
        self.max_response_bytes = max_response_bytes;
        self
    }
}

/// Retrieves federation documents over HTTPS.
///
/// The fetcher shares one connection pool across all requests of a
/// resolution and only ever exposes immutable response bodies.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_response_bytes: usize,
}

impl HttpFetcher {
    /// Builds a fetcher from the given transport configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the underlying HTTP client cannot
    /// be constructed from the configuration.
    pub fn new(config: HttpConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| ConfigError::invalid("http", e.to_string()))?;

        Ok(Self {
            client,
            max_response_bytes: config.max_response_bytes,
        })
    }

    /// GETs `url` and returns the body after checking status, size and
    /// compact-JWS syntax.
    async fn get_statement(&self, url: Url, query: &[(&str, &str)]) -> Result<String, FetchError> {
        debug!(%url, "fetching federation document");

        let response = self
            .client
            .get(url.clone())
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::network(url.as_str(), e))?
            .error_for_status()
            .map_err(|e| FetchError::network(url.as_str(), e))?;

        if let Some(length) = response.content_length() {
            if length > self.max_response_bytes as u64 {
                return Err(FetchError::malformed(
                    url.as_str(),
                    format!("response of {length} bytes exceeds the {} byte limit", self.max_response_bytes),
                ));
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::network(url.as_str(), e))?;
        if body.len() > self.max_response_bytes {
            return Err(FetchError::malformed(
                url.as_str(),
                format!(
                    "response of {} bytes exceeds the {} byte limit",
                    body.len(),
                    self.max_response_bytes
                ),
            ));
        }

        let body = String::from_utf8(body.to_vec())
            .map_err(|_| FetchError::malformed(url.as_str(), "body is not valid UTF-8"))?;
        let statement = body.trim();
        if !is_compact_jws(statement) {
            return Err(FetchError::malformed(url.as_str(), "body is not a compact JWS"));
        }

        Ok(statement.to_string())
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch_entity_configuration(&self, entity_id: &str) -> Result<String, FetchError> {
        let location = format!("{}{WELL_KNOWN_PATH}", entity_id.trim_end_matches('/'));
        let url = Url::parse(&location).map_err(|e| FetchError::network(location.as_str(), e))?;

        self.get_statement(url, &[]).await
    }

    async fn fetch_subordinate_statement(
        &self,
        fetch_endpoint: &str,
        iss: &str,
        sub: &str,
    ) -> Result<String, FetchError> {
        let url = Url::parse(fetch_endpoint).map_err(|e| FetchError::network(fetch_endpoint, e))?;

        self.get_statement(url, &[("iss", iss), ("sub", sub)]).await
    }
}

// Copyright 2020-2025 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Error types for federation document retrieval

use thiserror::Error;

/// Errors that can occur while retrieving federation documents
#[derive(Debug, Error, strum::IntoStaticStr)]
#[non_exhaustive]
pub enum FetchError {
    /// Transport failure or non-success HTTP status
    #[error("request to {url} failed")]
    Network {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Response body is not a federation statement
    #[error("malformed response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },
}

impl FetchError {
    pub(crate) fn network(url: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        FetchError::Network {
            url: url.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn malformed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        FetchError::MalformedResponse {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Stable kind string for diagnostics.
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

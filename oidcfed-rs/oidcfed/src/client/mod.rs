// Copyright 2020-2025 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Client module provides the network-facing interface of the resolver.
//!
//! Federation documents are plain HTTPS resources: every entity publishes its
//! entity configuration under [`WELL_KNOWN_PATH`], and superiors expose a
//! fetch endpoint serving subordinate statements. The [`Fetch`] trait is the
//! seam between the chain resolver and the transport; [`HttpFetcher`] is the
//! reqwest-backed implementation.

pub mod error;
mod http;

use async_trait::async_trait;
pub use error::FetchError;
pub use http::*;

/// Path under which every federation entity publishes its entity
/// configuration.
pub const WELL_KNOWN_PATH: &str = "/.well-known/openid-federation";

/// Retrieval of signed federation documents.
///
/// Implementations return the raw compact-JWS body; parsing and signature
/// verification happen in the statement layer. No retries are performed at
/// this layer: a failed fetch is a single dead edge for the caller.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Retrieves the entity configuration published by `entity_id`.
    ///
    /// Performs a GET on `{entity_id}/.well-known/openid-federation`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] on transport failure or a non-success
    /// status, and [`FetchError::MalformedResponse`] if the body is not a
    /// compact JWS.
    async fn fetch_entity_configuration(&self, entity_id: &str) -> Result<String, FetchError>;

    /// Retrieves the subordinate statement that `iss` publishes about `sub`.
    ///
    /// Performs a GET on the superior's `fetch_endpoint` with `iss` and
    /// `sub` query parameters. Same error model as
    /// [`Fetch::fetch_entity_configuration`].
    async fn fetch_subordinate_statement(
        &self,
        fetch_endpoint: &str,
        iss: &str,
        sub: &str,
    ) -> Result<String, FetchError>;
}

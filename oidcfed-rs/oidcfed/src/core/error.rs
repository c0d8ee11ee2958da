// Copyright 2020-2025 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Error types for statement validation and discovery operations

use thiserror::Error;

use crate::client::error::FetchError;

/// Errors from parsing and validating federation statements
#[derive(Debug, Error, strum::IntoStaticStr)]
#[non_exhaustive]
pub enum StatementError {
    /// Statement is not a syntactically valid signed JWT
    #[error("malformed JWT: {reason}")]
    MalformedJwt { reason: String },

    /// Signature verification against the expected keyset failed
    #[error("untrusted statement issued by {iss}: {reason}")]
    Untrusted { iss: String, reason: String },

    /// A required claim is absent
    #[error("missing required claim '{claim}'")]
    MissingClaim { claim: String },

    /// Statement lifetime is over
    #[error("statement about {sub} expired at {exp}")]
    Expired { sub: String, exp: u64 },

    /// Statement was issued in the future
    #[error("statement about {sub} is not yet valid (iat {iat})")]
    NotYetValid { sub: String, iat: u64 },
}

impl StatementError {
    pub(crate) fn malformed(reason: impl ToString) -> Self {
        StatementError::MalformedJwt {
            reason: reason.to_string(),
        }
    }

    pub(crate) fn untrusted(iss: impl Into<String>, reason: impl Into<String>) -> Self {
        StatementError::Untrusted {
            iss: iss.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(claim: impl Into<String>) -> Self {
        StatementError::MissingClaim { claim: claim.into() }
    }

    /// Stable kind string for diagnostics.
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

/// Composite error for discovery operations
#[derive(Debug, Error, strum::IntoStaticStr)]
#[non_exhaustive]
pub enum OperationError {
    /// Document retrieval failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Statement validation failed
    #[error(transparent)]
    Statement(#[from] StatementError),

    /// Superior publishes no fetch endpoint for subordinate statements
    #[error("{entity} publishes no federation_fetch_endpoint")]
    NoFetchEndpoint { entity: String },

    /// Operation interrupted by cancellation
    #[error("operation cancelled")]
    Cancelled,
}

impl OperationError {
    /// Stable kind string for diagnostics, delegating to the wrapped error
    /// where there is one.
    pub fn kind(&self) -> &'static str {
        match self {
            OperationError::Fetch(e) => e.kind(),
            OperationError::Statement(e) => e.kind(),
            other => other.into(),
        }
    }
}

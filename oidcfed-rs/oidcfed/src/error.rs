// Copyright 2020-2025 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Error types for the oidcfed library
//!
//! This module re-exports all domain-specific error types used throughout the
//! library, providing a single location for users to discover and import
//! error types.
//!
//! ## Error Architecture
//!
//! The library uses domain-specific error types instead of a monolithic error
//! enum. Each domain has its own error type:
//!
//! - [`FetchError`] - HTTP retrieval of federation documents
//! - [`StatementError`] - JWS and temporal validation of statements
//! - [`PolicyError`] - metadata policy evaluation
//! - [`TrustMarkError`] - required trust-mark filtering
//! - [`OperationError`] - composite error for discovery operations
//! - [`ResolveError`] - the resolver's top-level error
//! - [`ConfigError`] - resolver configuration errors
//!
//! Every enum derives [`strum::IntoStaticStr`], so each error exposes a
//! stable kind string for operator-facing logs and diagnostics.

use thiserror::Error;

// Fetch errors
pub use crate::client::error::FetchError;
// Discovery operation errors
pub use crate::core::error::{OperationError, StatementError};
// Policy engine errors
pub use crate::core::policy::PolicyError;
// Resolver errors
pub use crate::core::resolver::ResolveError;
// Trust-mark errors
pub use crate::core::trust_marks::TrustMarkError;

/// Configuration-related errors
#[derive(Debug, Error, strum::IntoStaticStr)]
#[non_exhaustive]
pub enum ConfigError {
    /// Invalid configuration field
    #[error("invalid configuration: {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// Copyright 2020-2025 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! # Trust-Mark Validation
//!
//! Filters a subject's declared trust marks against a caller-required set.
//! A mark counts only if its JWS verifies under the keyset published by the
//! issuer named in the mark itself. Issuer entity configurations can be
//! supplied ahead of time through
//! [`TrustMarkValidator::with_issuer_configurations`]; otherwise they are
//! fetched on demand.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, warn};

use crate::client::Fetch;
use crate::core::error::{OperationError, StatementError};
use crate::core::types::{EntityConfiguration, TrustMarkClaims, TrustMarkEntry};
use crate::core::{jws, operations, Clock};
use crate::utils::same_entity;

/// Errors from required trust-mark filtering
#[derive(Debug, Error, strum::IntoStaticStr)]
#[non_exhaustive]
pub enum TrustMarkError {
    /// None of the required trust marks could be validated
    #[error("required trust marks are not valid: {reason}")]
    InvalidRequiredTrustMark { reason: String },
}

impl TrustMarkError {
    /// Stable kind string for diagnostics.
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

/// Validates required trust marks against a subject's declared marks.
pub struct TrustMarkValidator<'a, F: Fetch + ?Sized> {
    fetcher: &'a F,
    issuer_configurations: HashMap<String, EntityConfiguration>,
    skew_secs: u64,
}

impl<'a, F: Fetch + ?Sized> TrustMarkValidator<'a, F> {
    pub fn new(fetcher: &'a F) -> Self {
        Self {
            fetcher,
            issuer_configurations: HashMap::new(),
            skew_secs: 0,
        }
    }

    /// Supplies already-validated issuer entity configurations, keyed by
    /// their `sub`. Marks from these issuers skip the network.
    pub fn with_issuer_configurations(
        mut self,
        configurations: impl IntoIterator<Item = EntityConfiguration>,
    ) -> Self {
        self.issuer_configurations
            .extend(configurations.into_iter().map(|ec| (ec.sub().to_string(), ec)));
        self
    }

    pub fn with_clock_skew(mut self, skew_secs: u64) -> Self {
        self.skew_secs = skew_secs;
        self
    }

    /// Succeeds iff at least one of `required_ids` is carried by `subject`
    /// with a verifiable trust mark. An empty `required_ids` short-circuits
    /// to success.
    ///
    /// # Errors
    ///
    /// [`TrustMarkError::InvalidRequiredTrustMark`] when no required mark
    /// verifies. Per-mark rejection reasons are logged.
    pub async fn validate(
        &self,
        subject: &EntityConfiguration,
        required_ids: &[String],
        clock: &dyn Clock,
    ) -> Result<(), TrustMarkError> {
        if required_ids.is_empty() {
            return Ok(());
        }

        for entry in subject.trust_marks() {
            if !required_ids.iter().any(|id| id == &entry.id) {
                continue;
            }
            match self.verify_mark(subject, entry, clock).await {
                Ok(()) => {
                    debug!(id = %entry.id, "required trust mark verified");
                    return Ok(());
                }
                Err(e) => warn!(id = %entry.id, error = %e, "trust mark rejected"),
            }
        }

        Err(TrustMarkError::InvalidRequiredTrustMark {
            reason: format!(
                "none of the {} required trust marks could be verified for {}",
                required_ids.len(),
                subject.sub()
            ),
        })
    }

    async fn verify_mark(
        &self,
        subject: &EntityConfiguration,
        entry: &TrustMarkEntry,
        clock: &dyn Clock,
    ) -> Result<(), OperationError> {
        let decoded = jws::decode_unverified(&entry.trust_mark)?;
        let claims: TrustMarkClaims =
            serde_json::from_value(decoded.payload).map_err(StatementError::malformed)?;
        let iss = claims.iss.as_deref().ok_or_else(|| StatementError::missing("iss"))?;

        let issuer = self.issuer_configuration(iss, clock).await?;
        let jwks = issuer.jwks().ok_or_else(|| StatementError::missing("jwks"))?;
        jws::verify_signature(&entry.trust_mark, jwks, iss)?;

        if let Some(id) = claims.id.as_deref() {
            if id != entry.id {
                return Err(
                    StatementError::untrusted(iss, "trust mark id does not match the declaring entry").into(),
                );
            }
        }
        if let Some(sub) = claims.sub.as_deref() {
            if !same_entity(sub, subject.sub()) {
                return Err(StatementError::untrusted(iss, "trust mark subject does not match").into());
            }
        }

        let now = clock.now();
        if let Some(exp) = claims.exp {
            if now >= exp.saturating_add(self.skew_secs) {
                return Err(StatementError::Expired {
                    sub: subject.sub().to_string(),
                    exp,
                }
                .into());
            }
        }
        if let Some(iat) = claims.iat {
            if iat > now.saturating_add(self.skew_secs) {
                return Err(StatementError::NotYetValid {
                    sub: subject.sub().to_string(),
                    iat,
                }
                .into());
            }
        }

        Ok(())
    }

    async fn issuer_configuration(&self, iss: &str, clock: &dyn Clock) -> Result<EntityConfiguration, OperationError> {
        let known = self
            .issuer_configurations
            .iter()
            .find(|(sub, _)| same_entity(sub, iss))
            .map(|(_, configuration)| configuration);
        if let Some(known) = known {
            return Ok(known.clone());
        }

        operations::fetch_entity_configuration(self.fetcher, iss, clock, self.skew_secs).await
    }
}

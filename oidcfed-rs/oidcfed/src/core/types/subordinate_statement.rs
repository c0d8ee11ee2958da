// Copyright 2020-2025 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! # Subordinate Statement
//!
//! A federation statement issued by a superior about one of its immediate
//! descendants: the descendant keys the superior attests, and the metadata
//! policy the superior imposes on the descendant's subtree. Served from the
//! superior's `federation_fetch_endpoint`.

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::Header;
use serde_json::{Map, Value};

use crate::core::error::StatementError;
use crate::core::types::{check_temporal, EntityConfiguration, StatementClaims};
use crate::core::{jws, Clock};
use crate::utils::same_entity;

/// A parsed subordinate statement.
///
/// Created unverified by [`SubordinateStatement::parse`];
/// [`SubordinateStatement::validate`] verifies it under the attesting
/// superior's keyset.
#[derive(Debug, Clone)]
pub struct SubordinateStatement {
    raw_jwt: String,
    header: Header,
    payload: Value,
    claims: StatementClaims,
    is_valid: bool,
}

impl SubordinateStatement {
    /// Decodes a compact JWS into a subordinate statement without verifying
    /// the signature.
    ///
    /// # Errors
    ///
    /// Returns [`StatementError::MalformedJwt`] on syntax or claim-type
    /// errors.
    pub fn parse(raw_jwt: impl Into<String>) -> Result<Self, StatementError> {
        let raw_jwt = raw_jwt.into();
        let decoded = jws::decode_unverified(&raw_jwt)?;
        let claims: StatementClaims =
            serde_json::from_value(decoded.payload.clone()).map_err(StatementError::malformed)?;

        Ok(Self {
            raw_jwt,
            header: decoded.header,
            payload: decoded.payload,
            claims,
            is_valid: false,
        })
    }

    /// Verifies this statement as issued by `superior` about
    /// `descendant_sub`.
    ///
    /// The signature must verify under the superior's validated keyset, the
    /// `iss` claim must name the superior and the `sub` claim the attested
    /// descendant.
    ///
    /// # Errors
    ///
    /// [`StatementError::MissingClaim`], [`StatementError::Untrusted`],
    /// [`StatementError::Expired`] or [`StatementError::NotYetValid`].
    pub fn validate(
        &mut self,
        superior: &EntityConfiguration,
        descendant_sub: &str,
        clock: &dyn Clock,
        skew_secs: u64,
    ) -> Result<(), StatementError> {
        let (iss, sub, iat, exp, _attested_jwks) = self.claims.required()?;

        let superior_jwks = superior.jwks().ok_or_else(|| StatementError::missing("jwks"))?;
        jws::verify_signature(&self.raw_jwt, superior_jwks, iss)?;

        if !same_entity(iss, superior.sub()) {
            return Err(StatementError::untrusted(
                iss,
                "issuer does not match the attesting superior",
            ));
        }
        if !same_entity(sub, descendant_sub) {
            return Err(StatementError::untrusted(
                iss,
                "subject does not match the attested descendant",
            ));
        }
        check_temporal(sub, iat, exp, clock.now(), skew_secs)?;

        self.is_valid = true;
        Ok(())
    }

    /// True only after [`SubordinateStatement::validate`] succeeded.
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// The attesting superior.
    pub fn iss(&self) -> &str {
        self.claims.iss.as_deref().unwrap_or_default()
    }

    /// The attested descendant.
    pub fn sub(&self) -> &str {
        self.claims.sub.as_deref().unwrap_or_default()
    }

    pub fn iat(&self) -> u64 {
        self.claims.iat.unwrap_or_default()
    }

    pub fn exp(&self) -> u64 {
        self.claims.exp.unwrap_or_default()
    }

    /// The descendant keys the superior attests.
    pub fn jwks(&self) -> Option<&JwkSet> {
        self.claims.jwks.as_ref()
    }

    /// Metadata policy documents imposed on the descendant's subtree, keyed
    /// by entity type tag.
    pub fn metadata_policy(&self) -> &Map<String, Value> {
        &self.claims.metadata_policy
    }

    /// The raw statement claims.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The verified JWS serialization this statement was parsed from.
    pub fn raw_jwt(&self) -> &str {
        &self.raw_jwt
    }
}

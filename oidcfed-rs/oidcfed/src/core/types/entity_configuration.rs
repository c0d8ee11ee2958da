// Copyright 2020-2025 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! # Entity Configuration
//!
//! A self-issued federation statement in which an entity describes itself:
//! its keys, its metadata per entity type, the superiors that may attest it
//! (`authority_hints`) and, for trust anchors, the constraints it imposes on
//! chains. Published under `/.well-known/openid-federation` as a compact JWS
//! signed with the entity's own keys.

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::Header;
use serde_json::{Map, Value};

use crate::core::error::StatementError;
use crate::core::types::{check_temporal, Constraints, StatementClaims, TrustMarkEntry};
use crate::core::{jws, Clock};
use crate::utils::same_entity;

/// A parsed entity configuration.
///
/// Created by [`EntityConfiguration::parse`] in an unverified state;
/// [`EntityConfiguration::validate_by_itself`] performs signature and
/// lifetime validation and flips [`EntityConfiguration::is_valid`]. After
/// validation the value is treated as immutable.
#[derive(Debug, Clone)]
pub struct EntityConfiguration {
    raw_jwt: String,
    header: Header,
    payload: Value,
    claims: StatementClaims,
    is_valid: bool,
}

impl EntityConfiguration {
    /// Decodes a compact JWS into an entity configuration without verifying
    /// the signature.
    ///
    /// # Errors
    ///
    /// Returns [`StatementError::MalformedJwt`] if `raw_jwt` is not a JWS
    /// over a JSON object or a claim has the wrong type.
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

    /// Verifies this entity configuration against its own keyset.
    ///
    /// Checks that the required claims `{iss, sub, iat, exp, jwks}` are
    /// present, that the statement is self-issued (`iss == sub`), that the
    /// signature verifies under the `jwks` claim, and that the statement is
    /// within its lifetime (with the given symmetric skew tolerance).
    ///
    /// # Errors
    ///
    /// [`StatementError::MissingClaim`], [`StatementError::Untrusted`],
    /// [`StatementError::Expired`] or [`StatementError::NotYetValid`].
    pub fn validate_by_itself(&mut self, clock: &dyn Clock, skew_secs: u64) -> Result<(), StatementError> {
        let (iss, sub, iat, exp, jwks) = self.claims.required()?;

        if !same_entity(iss, sub) {
            return Err(StatementError::untrusted(
                iss,
                "entity configuration is not self-issued (iss differs from sub)",
            ));
        }
        jws::verify_signature(&self.raw_jwt, jwks, iss)?;
        check_temporal(sub, iat, exp, clock.now(), skew_secs)?;

        self.is_valid = true;
        Ok(())
    }

    /// True only after [`EntityConfiguration::validate_by_itself`] succeeded.
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// The entity identifier this configuration describes.
    pub fn sub(&self) -> &str {
        self.claims.sub.as_deref().unwrap_or_default()
    }

    pub fn iss(&self) -> &str {
        self.claims.iss.as_deref().unwrap_or_default()
    }

    pub fn iat(&self) -> u64 {
        self.claims.iat.unwrap_or_default()
    }

    pub fn exp(&self) -> u64 {
        self.claims.exp.unwrap_or_default()
    }

    /// The entity's published keyset.
    pub fn jwks(&self) -> Option<&JwkSet> {
        self.claims.jwks.as_ref()
    }

    /// Superior entities that may attest this one, in preference order.
    pub fn authority_hints(&self) -> &[String] {
        &self.claims.authority_hints
    }

    /// Declared metadata documents, keyed by entity type tag.
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.claims.metadata
    }

    /// Trust marks the entity presents about itself.
    pub fn trust_marks(&self) -> &[TrustMarkEntry] {
        &self.claims.trust_marks
    }

    /// Chain constraints, meaningful on trust anchor configurations.
    pub fn constraints(&self) -> Constraints {
        self.claims.constraints.clone().unwrap_or_default()
    }

    /// The endpoint serving subordinate statements issued by this entity.
    pub fn federation_fetch_endpoint(&self) -> Option<&str> {
        self.claims
            .metadata
            .get("federation_entity")?
            .get("federation_fetch_endpoint")?
            .as_str()
    }

    /// The raw statement claims.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The verified JWS serialization this configuration was parsed from.
    pub fn raw_jwt(&self) -> &str {
        &self.raw_jwt
    }
}

// Copyright 2020-2025 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Types for federation statements and resolved trust chains.

mod chain;
mod entity_configuration;
mod subordinate_statement;
mod trust_mark;

pub use chain::*;
pub use entity_configuration::*;
use jsonwebtoken::jwk::JwkSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
pub use subordinate_statement::*;
pub use trust_mark::*;

use crate::core::error::StatementError;

/// Entity type tags whose metadata the resolver can compose.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum MetadataType {
    #[default]
    #[serde(rename = "openid_provider")]
    OpenidProvider,
    #[serde(rename = "openid_relying_party")]
    OpenidRelyingParty,
    #[serde(rename = "oauth_resource")]
    OauthResource,
}

impl MetadataType {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Constraints a trust anchor imposes on chains built under it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraints {
    /// Maximum number of edges between subject and anchor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_path_length: Option<u32>,
}

/// Lenient typed view over a statement payload.
///
/// Every field is optional or defaulted: a statement parses as long as it is
/// a well-formed JWS over a JSON object, and missing required claims only
/// surface as [`StatementError::MissingClaim`] during validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct StatementClaims {
    pub iss: Option<String>,
    pub sub: Option<String>,
    pub iat: Option<u64>,
    pub exp: Option<u64>,
    pub jwks: Option<JwkSet>,
    #[serde(default)]
    pub authority_hints: Vec<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub metadata_policy: Map<String, Value>,
    #[serde(default)]
    pub trust_marks: Vec<TrustMarkEntry>,
    pub constraints: Option<Constraints>,
}

impl StatementClaims {
    /// Returns the claims every signed statement must carry.
    pub(crate) fn required(&self) -> Result<(&str, &str, u64, u64, &JwkSet), StatementError> {
        let iss = self.iss.as_deref().ok_or_else(|| StatementError::missing("iss"))?;
        let sub = self.sub.as_deref().ok_or_else(|| StatementError::missing("sub"))?;
        let iat = self.iat.ok_or_else(|| StatementError::missing("iat"))?;
        let exp = self.exp.ok_or_else(|| StatementError::missing("exp"))?;
        let jwks = self.jwks.as_ref().ok_or_else(|| StatementError::missing("jwks"))?;
        Ok((iss, sub, iat, exp, jwks))
    }
}

/// Checks statement lifetime against `now` with a symmetric skew tolerance.
///
/// An `exp` exactly equal to `now` counts as expired.
pub(crate) fn check_temporal(sub: &str, iat: u64, exp: u64, now: u64, skew_secs: u64) -> Result<(), StatementError> {
    if now >= exp.saturating_add(skew_secs) {
        return Err(StatementError::Expired { sub: sub.into(), exp });
    }
    if iat > now.saturating_add(skew_secs) {
        return Err(StatementError::NotYetValid { sub: sub.into(), iat });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_metadata_type_names() {
        assert_eq!(MetadataType::OpenidProvider.as_str(), "openid_provider");
        assert_eq!(MetadataType::OpenidRelyingParty.as_str(), "openid_relying_party");
        assert_eq!(MetadataType::OauthResource.as_str(), "oauth_resource");

        assert_eq!(
            MetadataType::from_str("openid_relying_party").unwrap(),
            MetadataType::OpenidRelyingParty
        );
        assert!(MetadataType::from_str("device_grant").is_err());
    }

    #[test]
    fn test_exp_on_the_second_is_expired() {
        assert!(matches!(
            check_temporal("https://rp.example", 0, 100, 100, 0),
            Err(StatementError::Expired { exp: 100, .. })
        ));
        assert!(check_temporal("https://rp.example", 0, 101, 100, 0).is_ok());
    }

    #[test]
    fn test_skew_is_symmetric() {
        // 30 seconds past exp, tolerated with 60 seconds of skew.
        assert!(check_temporal("https://rp.example", 0, 100, 130, 60).is_ok());
        // Issued 30 seconds in the future, same tolerance.
        assert!(check_temporal("https://rp.example", 130, 300, 100, 60).is_ok());
        assert!(matches!(
            check_temporal("https://rp.example", 200, 300, 100, 60),
            Err(StatementError::NotYetValid { iat: 200, .. })
        ));
    }
}

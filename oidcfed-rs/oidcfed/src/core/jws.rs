// Copyright 2020-2025 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! JWS decoding and signature verification against a JWK set.
//!
//! Federation statements are compact JWS. This module only answers two
//! questions: what does a statement say (without trusting it), and is its
//! signature covered by a given keyset. Temporal validation is the statement
//! layer's responsibility, so the [`jsonwebtoken::Validation`] used here has
//! every built-in claim check disabled.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Header, Validation};
use serde_json::Value;

use crate::core::error::StatementError;

/// A decoded but unverified compact JWS.
pub(crate) struct DecodedStatement {
    pub header: Header,
    pub payload: Value,
}

/// Decodes the JWS header and payload without verifying the signature.
pub(crate) fn decode_unverified(raw: &str) -> Result<DecodedStatement, StatementError> {
    let header = decode_header(raw).map_err(StatementError::malformed)?;

    let payload_segment = raw
        .split('.')
        .nth(1)
        .ok_or_else(|| StatementError::malformed("missing payload segment"))?;
    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload_segment)
        .map_err(StatementError::malformed)?;
    let payload: Value = serde_json::from_slice(&payload_bytes).map_err(StatementError::malformed)?;
    if !payload.is_object() {
        return Err(StatementError::malformed("payload is not a JSON object"));
    }

    Ok(DecodedStatement { header, payload })
}

/// Verifies the signature of `raw` against `jwks` and returns the claims.
///
/// Key selection follows the JWS header: a `kid` must name a key of the set;
/// without a `kid` every key of the set is tried. `issuer` only provides
/// error context.
pub(crate) fn verify_signature(raw: &str, jwks: &JwkSet, issuer: &str) -> Result<Value, StatementError> {
    let header = decode_header(raw).map_err(StatementError::malformed)?;

    let candidates: Vec<&Jwk> = match header.kid.as_deref() {
        Some(kid) => {
            let key = jwks
                .find(kid)
                .ok_or_else(|| StatementError::untrusted(issuer, format!("no key with kid '{kid}' in the keyset")))?;
            vec![key]
        }
        None => jwks.keys.iter().collect(),
    };
    if candidates.is_empty() {
        return Err(StatementError::untrusted(issuer, "keyset is empty"));
    }

    let validation = signature_only_validation(header.alg);
    let mut last_error = None;
    for jwk in candidates {
        let Ok(key) = DecodingKey::from_jwk(jwk) else {
            continue;
        };
        match decode::<Value>(raw, &key, &validation) {
            Ok(data) => return Ok(data.claims),
            Err(e) => last_error = Some(e),
        }
    }

    Err(StatementError::untrusted(
        issuer,
        last_error.map_or_else(
            || "no usable key in the keyset".to_string(),
            |e| format!("signature verification failed: {e}"),
        ),
    ))
}

fn signature_only_validation(alg: Algorithm) -> Validation {
    let mut validation = Validation::new(alg);
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation
}

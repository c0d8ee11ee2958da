// Copyright 2020-2025 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! # Metadata Policy Engine
//!
//! Applies one metadata policy document to one metadata document, claim by
//! claim. A policy maps claim names to operator sets; operators are always
//! evaluated in the fixed order of [`OPERATOR_ORDER`], regardless of their
//! order in the document.
//!
//! The engine is applied once per chain hop, anchor towards subject, against
//! the then-current document. Operator sets from different hops are never
//! merged; a later hop that contradicts an earlier hop's outcome simply
//! fails on its own operators.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// The fixed evaluation order of policy operators within one claim.
pub const OPERATOR_ORDER: [&str; 7] = [
    "value",
    "add",
    "default",
    "one_of",
    "subset_of",
    "superset_of",
    "essential",
];

/// Errors from metadata policy evaluation
#[derive(Debug, Error, strum::IntoStaticStr)]
#[non_exhaustive]
pub enum PolicyError {
    /// A policy operator rejected the claim's value
    #[error("policy operator '{operator}' rejected claim '{claim}'")]
    Violation { claim: String, operator: &'static str },

    /// The policy document itself is not well-formed
    #[error("malformed policy: {reason}")]
    MalformedPolicy { reason: String },
}

impl PolicyError {
    fn violation(claim: &str, operator: &'static str) -> Self {
        PolicyError::Violation {
            claim: claim.to_string(),
            operator,
        }
    }

    fn malformed(reason: impl Into<String>) -> Self {
        PolicyError::MalformedPolicy { reason: reason.into() }
    }

    /// Stable kind string for diagnostics.
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

/// Applies `policy` to `metadata` and returns the transformed document.
///
/// Both documents are JSON objects. A `null` policy is the identity.
/// Operator names outside [`OPERATOR_ORDER`] are logged and ignored.
///
/// # Errors
///
/// [`PolicyError::Violation`] when `one_of`, `superset_of` or `essential`
/// reject a claim, [`PolicyError::MalformedPolicy`] when either document has
/// the wrong shape.
pub fn apply_policy(metadata: &Value, policy: &Value) -> Result<Value, PolicyError> {
    let mut result = metadata
        .as_object()
        .cloned()
        .ok_or_else(|| PolicyError::malformed("metadata is not a JSON object"))?;

    if policy.is_null() {
        return Ok(Value::Object(result));
    }
    let policy = policy
        .as_object()
        .ok_or_else(|| PolicyError::malformed("policy is not a JSON object"))?;

    for (claim, operators) in policy {
        let operators = operators
            .as_object()
            .ok_or_else(|| PolicyError::malformed(format!("operator set for claim '{claim}' is not an object")))?;

        for operator in OPERATOR_ORDER {
            if let Some(operand) = operators.get(operator) {
                apply_operator(&mut result, claim, operator, operand)?;
            }
        }
        for unknown in operators.keys().filter(|name| !OPERATOR_ORDER.contains(&name.as_str())) {
            debug!(claim = %claim, operator = %unknown, "ignoring unrecognized policy operator");
        }
    }

    Ok(Value::Object(result))
}

fn apply_operator(
    metadata: &mut Map<String, Value>,
    claim: &str,
    operator: &'static str,
    operand: &Value,
) -> Result<(), PolicyError> {
    match operator {
        "value" => {
            metadata.insert(claim.to_string(), operand.clone());
        }
        "add" => {
            let additions = operand_array(claim, operator, operand)?;
            let current = metadata.get(claim).map(claim_values).unwrap_or_default();

            let mut merged = Vec::with_capacity(current.len() + additions.len());
            for value in current.into_iter().chain(additions.iter().cloned()) {
                if !merged.contains(&value) {
                    merged.push(value);
                }
            }
            metadata.insert(claim.to_string(), Value::Array(merged));
        }
        "default" => {
            if !metadata.contains_key(claim) {
                metadata.insert(claim.to_string(), operand.clone());
            }
        }
        "one_of" => {
            let allowed = operand_array(claim, operator, operand)?;
            if let Some(current) = metadata.get(claim) {
                if !allowed.contains(current) {
                    return Err(PolicyError::violation(claim, operator));
                }
            }
        }
        "subset_of" => {
            let allowed = operand_array(claim, operator, operand)?;
            if let Some(current) = metadata.get(claim) {
                let mut kept = Vec::new();
                for value in claim_values(current) {
                    if allowed.contains(&value) && !kept.contains(&value) {
                        kept.push(value);
                    }
                }
                // An empty intersection removes the claim; a later
                // `essential` operator then decides whether that is fatal.
                if kept.is_empty() {
                    metadata.remove(claim);
                } else {
                    metadata.insert(claim.to_string(), Value::Array(kept));
                }
            }
        }
        "superset_of" => {
            let required = operand_array(claim, operator, operand)?;
            if let Some(current) = metadata.get(claim) {
                let values = claim_values(current);
                if required.iter().any(|value| !values.contains(value)) {
                    return Err(PolicyError::violation(claim, operator));
                }
            }
        }
        "essential" => {
            let essential = operand
                .as_bool()
                .ok_or_else(|| PolicyError::malformed(format!("'essential' for claim '{claim}' is not a boolean")))?;
            if essential && !metadata.contains_key(claim) {
                return Err(PolicyError::violation(claim, operator));
            }
        }
        _ => unreachable!("operator names come from OPERATOR_ORDER"),
    }

    Ok(())
}

fn operand_array<'a>(claim: &str, operator: &str, operand: &'a Value) -> Result<&'a Vec<Value>, PolicyError> {
    operand
        .as_array()
        .ok_or_else(|| PolicyError::malformed(format!("'{operator}' for claim '{claim}' is not an array")))
}

/// A claim treated as a set: arrays stay as-is, scalars become singletons.
fn claim_values(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_empty_policy_is_identity() {
        let metadata = json!({ "scope": ["openid", "profile"], "contacts": "ops@rp.example" });

        assert_eq!(apply_policy(&metadata, &json!({})).unwrap(), metadata);
        assert_eq!(apply_policy(&metadata, &Value::Null).unwrap(), metadata);
    }

    #[test]
    fn test_value_replaces_unconditionally() {
        let metadata = json!({ "token_endpoint_auth_method": "client_secret_basic" });
        let policy = json!({ "token_endpoint_auth_method": { "value": "private_key_jwt" } });

        let once = apply_policy(&metadata, &policy).unwrap();
        assert_eq!(once["token_endpoint_auth_method"], "private_key_jwt");

        // Idempotent on reapplication.
        let twice = apply_policy(&once, &policy).unwrap();
        assert_eq!(twice, once);
    }

    #[test]
    fn test_add_unions_and_deduplicates() {
        let metadata = json!({ "scope": ["openid", "email"] });
        let policy = json!({ "scope": { "add": ["profile", "openid"] } });

        let result = apply_policy(&metadata, &policy).unwrap();
        assert_eq!(result["scope"], json!(["openid", "email", "profile"]));
    }

    #[test]
    fn test_add_to_absent_claim() {
        let result = apply_policy(&json!({}), &json!({ "scope": { "add": ["openid"] } })).unwrap();
        assert_eq!(result["scope"], json!(["openid"]));
    }

    #[test]
    fn test_default_only_fills_gaps() {
        let policy = json!({ "grant_types": { "default": ["authorization_code"] } });

        let absent = apply_policy(&json!({}), &policy).unwrap();
        assert_eq!(absent["grant_types"], json!(["authorization_code"]));

        let present = apply_policy(&json!({ "grant_types": ["implicit"] }), &policy).unwrap();
        assert_eq!(present["grant_types"], json!(["implicit"]));
    }

    #[test]
    fn test_one_of_accepts_listed_scalar() {
        let policy = json!({ "id_token_signed_response_alg": { "one_of": ["RS256", "ES256"] } });

        let metadata = json!({ "id_token_signed_response_alg": "ES256" });
        assert!(apply_policy(&metadata, &policy).is_ok());

        let metadata = json!({ "id_token_signed_response_alg": "HS256" });
        let err = apply_policy(&metadata, &policy).unwrap_err();
        assert!(matches!(
            err,
            PolicyError::Violation { ref claim, operator: "one_of" } if claim == "id_token_signed_response_alg"
        ));
    }

    #[test]
    fn test_one_of_skips_absent_claim() {
        let policy = json!({ "id_token_signed_response_alg": { "one_of": ["RS256"] } });
        assert!(apply_policy(&json!({}), &policy).is_ok());
    }

    #[test]
    fn test_subset_of_filters_preserving_order() {
        let metadata = json!({ "scope": ["openid", "profile", "email"] });
        let policy = json!({ "scope": { "subset_of": ["openid", "profile"] } });

        let result = apply_policy(&metadata, &policy).unwrap();
        assert_eq!(result["scope"], json!(["openid", "profile"]));
    }

    #[test]
    fn test_subset_of_empty_intersection_removes_claim() {
        let metadata = json!({ "scope": ["email"] });
        let policy = json!({ "scope": { "subset_of": ["openid"] } });

        let result = apply_policy(&metadata, &policy).unwrap();
        assert!(result.get("scope").is_none());
    }

    #[test]
    fn test_subset_then_essential_fails_on_removed_claim() {
        let metadata = json!({ "scope": ["email"] });
        let policy = json!({ "scope": { "subset_of": ["openid"], "essential": true } });

        let err = apply_policy(&metadata, &policy).unwrap_err();
        assert!(matches!(err, PolicyError::Violation { operator: "essential", .. }));
    }

    #[test]
    fn test_superset_of_requires_every_value() {
        let policy = json!({ "response_types": { "superset_of": ["code"] } });

        assert!(apply_policy(&json!({ "response_types": ["code", "code id_token"] }), &policy).is_ok());

        let err = apply_policy(&json!({ "response_types": ["id_token"] }), &policy).unwrap_err();
        assert!(matches!(err, PolicyError::Violation { operator: "superset_of", .. }));
    }

    #[test]
    fn test_essential_missing_claim_fails() {
        let policy = json!({ "jwks": { "essential": true } });

        let err = apply_policy(&json!({}), &policy).unwrap_err();
        assert!(matches!(
            err,
            PolicyError::Violation { ref claim, operator: "essential" } if claim == "jwks"
        ));

        assert!(apply_policy(&json!({ "jwks": { "keys": [] } }), &policy).is_ok());
    }

    #[test]
    fn test_value_applies_before_checks() {
        // `value` runs first, so the check operators see the replaced value.
        let metadata = json!({ "scope": ["email"] });
        let policy = json!({ "scope": { "value": ["openid"], "subset_of": ["openid", "profile"] } });

        let result = apply_policy(&metadata, &policy).unwrap();
        assert_eq!(result["scope"], json!(["openid"]));
    }

    #[test]
    fn test_scalar_claim_is_a_singleton_set() {
        let metadata = json!({ "scope": "openid" });
        let policy = json!({ "scope": { "subset_of": ["openid", "profile"] } });

        let result = apply_policy(&metadata, &policy).unwrap();
        assert_eq!(result["scope"], json!(["openid"]));
    }

    #[test]
    fn test_unknown_operator_is_ignored() {
        let metadata = json!({ "scope": ["openid"] });
        let policy = json!({ "scope": { "regexp": "^openid$" } });

        assert_eq!(apply_policy(&metadata, &policy).unwrap(), metadata);
    }

    #[test]
    fn test_malformed_operator_shapes() {
        assert!(matches!(
            apply_policy(&json!({}), &json!({ "scope": { "add": "openid" } })),
            Err(PolicyError::MalformedPolicy { .. })
        ));
        assert!(matches!(
            apply_policy(&json!({}), &json!({ "scope": { "essential": "yes" } })),
            Err(PolicyError::MalformedPolicy { .. })
        ));
        assert!(matches!(
            apply_policy(&json!({}), &json!({ "scope": 7 })),
            Err(PolicyError::MalformedPolicy { .. })
        ));
    }
}

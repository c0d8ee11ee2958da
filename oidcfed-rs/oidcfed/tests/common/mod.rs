// Copyright 2020-2025 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Shared fixtures: deterministic in-memory federations signed with
//! symmetric test keys, a static [`Fetch`] implementation and a fixed
//! clock.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use oidcfed::client::{Fetch, FetchError};
use oidcfed::core::Clock;
use serde_json::{json, Value};

/// The fixed "now" every test resolves at.
pub const NOW: u64 = 1_700_000_000;

pub const TA: &str = "https://ta.example";
pub const IM: &str = "https://im.example";
pub const RP: &str = "https://rp.example";

pub const TA_KEY: (&str, &[u8]) = ("ta-key", b"trust-anchor-signing-secret");
pub const IM_KEY: (&str, &[u8]) = ("im-key", b"intermediate-signing-secret");
pub const RP_KEY: (&str, &[u8]) = ("rp-key", b"relying-party-signing-secret");

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

pub fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(NOW))
}

/// JWKS claim value for a symmetric test key.
pub fn jwks(key: (&str, &[u8])) -> Value {
    json!({
        "keys": [{ "kty": "oct", "kid": key.0, "k": URL_SAFE_NO_PAD.encode(key.1) }]
    })
}

/// Signs `claims` as a compact JWS with the given test key.
pub fn sign(claims: &Value, key: (&str, &[u8])) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(key.0.to_string());
    encode(&header, claims, &EncodingKey::from_secret(key.1)).expect("signing test claims cannot fail")
}

/// Builds a signed entity configuration for `sub`, merging `extra` claims
/// over the defaults.
pub fn entity_configuration(sub: &str, key: (&str, &[u8]), extra: Value) -> String {
    let mut claims = json!({
        "iss": sub,
        "sub": sub,
        "iat": NOW - 10,
        "exp": NOW + 3600,
        "jwks": jwks(key),
    });
    merge(&mut claims, extra);
    sign(&claims, key)
}

/// Builds a signed subordinate statement `iss` issues about `sub`, merging
/// `extra` claims over the defaults. `issuer_key` must be the superior's
/// signing key; `subject_key` is the descendant keyset being attested.
pub fn subordinate_statement(
    iss: &str,
    sub: &str,
    issuer_key: (&str, &[u8]),
    subject_key: (&str, &[u8]),
    extra: Value,
) -> String {
    let mut claims = json!({
        "iss": iss,
        "sub": sub,
        "iat": NOW - 10,
        "exp": NOW + 7200,
        "jwks": jwks(subject_key),
    });
    merge(&mut claims, extra);
    sign(&claims, issuer_key)
}

/// Entity configuration claims that make `sub` a superior: a federation
/// fetch endpoint under the entity's own URL.
pub fn fetch_endpoint_metadata(sub: &str) -> Value {
    json!({
        "metadata": {
            "federation_entity": {
                "federation_fetch_endpoint": format!("{sub}/fetch")
            }
        }
    })
}

fn merge(claims: &mut Value, extra: Value) {
    let claims = claims.as_object_mut().expect("default claims are an object");
    if let Value::Object(extra) = extra {
        claims.extend(extra);
    }
}

/// An in-memory [`Fetch`] implementation serving prepared documents.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    configurations: HashMap<String, String>,
    statements: HashMap<(String, String), String>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, entity_id: &str, jwt: String) -> Self {
        self.configurations.insert(normalize(entity_id), jwt);
        self
    }

    pub fn with_statement(mut self, iss: &str, sub: &str, jwt: String) -> Self {
        self.statements.insert((normalize(iss), normalize(sub)), jwt);
        self
    }
}

fn normalize(entity_id: &str) -> String {
    entity_id.trim_end_matches('/').to_string()
}

#[async_trait]
impl Fetch for StaticFetcher {
    async fn fetch_entity_configuration(&self, entity_id: &str) -> Result<String, FetchError> {
        self.configurations
            .get(&normalize(entity_id))
            .cloned()
            .ok_or_else(|| FetchError::MalformedResponse {
                url: entity_id.to_string(),
                reason: "no such entity in the test federation".to_string(),
            })
    }

    async fn fetch_subordinate_statement(
        &self,
        _fetch_endpoint: &str,
        iss: &str,
        sub: &str,
    ) -> Result<String, FetchError> {
        self.statements
            .get(&(normalize(iss), normalize(sub)))
            .cloned()
            .ok_or_else(|| FetchError::MalformedResponse {
                url: iss.to_string(),
                reason: format!("no statement about {sub} in the test federation"),
            })
    }
}

/// A three-level federation: RP under IM under TA, every edge attested.
pub fn three_level_federation() -> StaticFetcher {
    StaticFetcher::new()
        .with_entity(
            RP,
            entity_configuration(
                RP,
                RP_KEY,
                json!({
                    "authority_hints": [IM],
                    "metadata": { "openid_relying_party": { "scope": ["openid", "profile", "email"] } },
                }),
            ),
        )
        .with_entity(
            IM,
            entity_configuration(
                IM,
                IM_KEY,
                merged(fetch_endpoint_metadata(IM), json!({ "authority_hints": [TA] })),
            ),
        )
        .with_entity(TA, entity_configuration(TA, TA_KEY, fetch_endpoint_metadata(TA)))
        .with_statement(IM, RP, subordinate_statement(IM, RP, IM_KEY, RP_KEY, json!({})))
        .with_statement(TA, IM, subordinate_statement(TA, IM, TA_KEY, IM_KEY, json!({})))
}

/// Merges two JSON objects, `b` winning on conflicts.
pub fn merged(mut a: Value, b: Value) -> Value {
    merge(&mut a, b);
    a
}

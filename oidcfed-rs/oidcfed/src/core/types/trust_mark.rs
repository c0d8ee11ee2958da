// Copyright 2020-2025 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Trust mark claims and the entries carrying them inside entity
//! configurations.

use serde::{Deserialize, Serialize};

/// One entry of an entity configuration's `trust_marks` claim: the mark's
/// identifier and its JWS serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustMarkEntry {
    pub id: String,
    pub trust_mark: String,
}

/// Claims of a decoded trust mark.
///
/// All fields are optional at the type level; the validator decides which
/// absences are acceptable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrustMarkClaims {
    pub iss: Option<String>,
    pub sub: Option<String>,
    pub id: Option<String>,
    pub iat: Option<u64>,
    pub exp: Option<u64>,
}

// Copyright 2020-2025 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Applies a metadata policy to a metadata document offline, the way each
//! chain hop does during resolution.

use oidcfed::core::policy::apply_policy;
use oidcfed_examples::init_logging;
use serde_json::json;

fn main() -> anyhow::Result<()> {
    init_logging();

    let metadata = json!({
        "client_name": "Example RP",
        "scope": ["openid", "profile", "email"],
        "response_types": ["code"],
    });

    let policy = json!({
        "scope": { "subset_of": ["openid", "profile"] },
        "token_endpoint_auth_method": { "default": "private_key_jwt" },
        "response_types": { "superset_of": ["code"], "essential": true },
    });

    println!("metadata before:");
    println!("{}", serde_json::to_string_pretty(&metadata)?);
    println!();
    println!("policy:");
    println!("{}", serde_json::to_string_pretty(&policy)?);

    let composed = apply_policy(&metadata, &policy)?;

    println!();
    println!("metadata after:");
    println!("{}", serde_json::to_string_pretty(&composed)?);

    Ok(())
}

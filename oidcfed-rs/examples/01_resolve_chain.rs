// Copyright 2020-2025 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Resolves a trust chain for a subject entity against a trust anchor and
//! prints the composed metadata plus the serialized chain.
//!
//! ```sh
//! cargo run --example 01_resolve_chain -- \
//!     https://rp.example.org https://trust-anchor.example.org \
//!     --metadata-type openid_relying_party
//! ```

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use oidcfed::client::HttpConfig;
use oidcfed::core::resolver::{ResolverConfig, TrustChainResolver};
use oidcfed_examples::init_logging;

#[derive(Parser)]
struct Args {
    /// Entity identifier of the subject whose chain is resolved.
    subject: String,

    /// Entity identifier of the trust anchor.
    trust_anchor: String,

    /// Metadata type to compose: openid_provider, openid_relying_party or
    /// oauth_resource.
    #[arg(long, default_value = "openid_provider")]
    metadata_type: String,

    /// Trust-mark identifiers of which at least one must verify on the
    /// subject. May be repeated.
    #[arg(long = "require-trust-mark")]
    required_trust_marks: Vec<String>,

    /// Overall resolution deadline in seconds.
    #[arg(long, default_value_t = 30)]
    deadline_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();

    let config = ResolverConfig::new(&args.subject, args.trust_anchor.as_str())
        .with_metadata_type_name(&args.metadata_type)?
        .with_required_trust_marks(args.required_trust_marks)
        .with_http(HttpConfig::default())
        .with_deadline(Duration::from_secs(args.deadline_secs));

    let resolver = TrustChainResolver::from_config(config)?;
    let chain = resolver
        .resolve()
        .await
        .with_context(|| format!("resolving {} failed", args.subject))?;

    println!("subject:        {}", chain.subject);
    println!("trust anchor:   {}", chain.anchor);
    println!("path length:    {} nodes", chain.trust_path.len());
    println!("expires at:     {} (unix)", chain.exp);
    println!();
    println!("final {} metadata:", chain.metadata_type);
    println!("{}", serde_json::to_string_pretty(&chain.final_metadata)?);
    println!();
    println!("serialized chain:");
    println!("{}", serde_json::to_string_pretty(&chain.serialize())?);

    Ok(())
}

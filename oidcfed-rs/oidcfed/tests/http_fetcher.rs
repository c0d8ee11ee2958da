// Copyright 2020-2025 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

mod common;

use common::*;
use mockito::Matcher;
use oidcfed::client::{Fetch, FetchError, HttpConfig, HttpFetcher};
use oidcfed::core::resolver::{ResolverConfig, TrustChainResolver};
use oidcfed::core::types::MetadataType;
use serde_json::json;

fn fetcher() -> HttpFetcher {
    HttpFetcher::new(HttpConfig::default()).expect("default HTTP configuration is buildable")
}

#[tokio::test]
async fn test_fetch_entity_configuration_hits_well_known() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;
    let entity_id = format!("{}/rp", server.url());
    let jwt = entity_configuration(&entity_id, RP_KEY, json!({}));

    let mock = server
        .mock("GET", "/rp/.well-known/openid-federation")
        .with_status(200)
        .with_body(&jwt)
        .create_async()
        .await;

    let body = fetcher().fetch_entity_configuration(&entity_id).await?;
    assert_eq!(body, jwt);
    mock.assert_async().await;

    Ok(())
}

#[tokio::test]
async fn test_fetch_subordinate_statement_sends_query_parameters() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;
    let jwt = subordinate_statement(TA, RP, TA_KEY, RP_KEY, json!({}));

    let mock = server
        .mock("GET", "/fetch")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("iss".into(), TA.into()),
            Matcher::UrlEncoded("sub".into(), RP.into()),
        ]))
        .with_status(200)
        .with_body(&jwt)
        .create_async()
        .await;

    let endpoint = format!("{}/fetch", server.url());
    let body = fetcher().fetch_subordinate_statement(&endpoint, TA, RP).await?;
    assert_eq!(body, jwt);
    mock.assert_async().await;

    Ok(())
}

#[tokio::test]
async fn test_non_success_status_is_a_network_error() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;
    let entity_id = format!("{}/rp", server.url());

    server
        .mock("GET", "/rp/.well-known/openid-federation")
        .with_status(404)
        .create_async()
        .await;

    let err = fetcher().fetch_entity_configuration(&entity_id).await.unwrap_err();
    assert!(matches!(err, FetchError::Network { .. }));

    Ok(())
}

#[tokio::test]
async fn test_non_jws_body_is_malformed() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;
    let entity_id = format!("{}/rp", server.url());

    server
        .mock("GET", "/rp/.well-known/openid-federation")
        .with_status(200)
        .with_body(r#"{"keys": []}"#)
        .create_async()
        .await;

    let err = fetcher().fetch_entity_configuration(&entity_id).await.unwrap_err();
    assert!(matches!(err, FetchError::MalformedResponse { .. }));

    Ok(())
}

#[tokio::test]
async fn test_oversized_body_is_rejected() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;
    let entity_id = format!("{}/rp", server.url());

    server
        .mock("GET", "/rp/.well-known/openid-federation")
        .with_status(200)
        .with_body("a".repeat(4096))
        .create_async()
        .await;

    let small = HttpFetcher::new(HttpConfig::default().with_max_response_bytes(1024))?;
    let err = small.fetch_entity_configuration(&entity_id).await.unwrap_err();
    assert!(matches!(err, FetchError::MalformedResponse { .. }));

    Ok(())
}

#[tokio::test]
async fn test_resolution_over_http() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;
    let ta = format!("{}/ta", server.url());
    let rp = format!("{}/rp", server.url());

    let rp_jwt = entity_configuration(
        &rp,
        RP_KEY,
        json!({
            "authority_hints": [ta],
            "metadata": { "openid_relying_party": { "scope": ["openid", "profile", "email"] } },
        }),
    );
    let ta_jwt = entity_configuration(
        &ta,
        TA_KEY,
        json!({
            "metadata": {
                "federation_entity": { "federation_fetch_endpoint": format!("{ta}/fetch") }
            }
        }),
    );
    let statement_jwt = subordinate_statement(
        &ta,
        &rp,
        TA_KEY,
        RP_KEY,
        json!({
            "metadata_policy": { "openid_relying_party": { "scope": { "subset_of": ["openid", "profile"] } } }
        }),
    );

    server
        .mock("GET", "/rp/.well-known/openid-federation")
        .with_status(200)
        .with_body(&rp_jwt)
        .create_async()
        .await;
    server
        .mock("GET", "/ta/.well-known/openid-federation")
        .with_status(200)
        .with_body(&ta_jwt)
        .create_async()
        .await;
    server
        .mock("GET", "/ta/fetch")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(&statement_jwt)
        .create_async()
        .await;

    let config = ResolverConfig::new(&rp, ta.as_str()).with_metadata_type(MetadataType::OpenidRelyingParty);
    let chain = TrustChainResolver::new(fetcher(), config)
        .with_clock(fixed_clock())
        .resolve()
        .await?;

    assert!(chain.is_valid);
    assert_eq!(chain.trust_path.len(), 2);
    assert_eq!(chain.final_metadata["scope"], json!(["openid", "profile"]));

    Ok(())
}

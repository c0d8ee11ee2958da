// Copyright 2020-2025 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! # Discovery Operations
//!
//! I/O-bound building blocks of chain discovery: resolving entity
//! configurations, walking authority hints and attaching verified
//! subordinate statements to discovery tree nodes.
//!
//! Per-edge failures are not fatal here. A hint that does not resolve or a
//! statement that does not verify is logged and skipped; the caller decides
//! whether losing every edge is fatal. Only cancellation aborts an operation
//! as a whole.

use std::collections::HashMap;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::Fetch;
use crate::core::error::{OperationError, StatementError};
use crate::core::types::{EntityConfiguration, SubordinateStatement, VerifiedNode};
use crate::core::Clock;
use crate::utils::same_entity;

/// Fetches and self-validates the entity configuration of `entity_id`.
///
/// # Errors
///
/// Fetch, parse or validation failures, and an untrusted-statement error if
/// the returned configuration describes a different entity than requested.
pub(crate) async fn fetch_entity_configuration<F>(
    fetcher: &F,
    entity_id: &str,
    clock: &dyn Clock,
    skew_secs: u64,
) -> Result<EntityConfiguration, OperationError>
where
    F: Fetch + ?Sized,
{
    let raw = fetcher.fetch_entity_configuration(entity_id).await?;
    let mut entity_configuration = EntityConfiguration::parse(raw)?;
    entity_configuration.validate_by_itself(clock, skew_secs)?;

    if !same_entity(entity_configuration.sub(), entity_id) {
        return Err(StatementError::untrusted(
            entity_configuration.iss(),
            format!("entity configuration describes {} instead of {entity_id}", entity_configuration.sub()),
        )
        .into());
    }

    Ok(entity_configuration)
}

/// Resolves the validated configurations of a node's superiors.
///
/// Walks `authority_hints` in order, capped at `max_authority_hints`
/// (overflow hints are logged and ignored). A hint matching an entry of
/// `superiors_hints` reuses the prefetched configuration instead of
/// refetching it. Hints that fail to resolve or validate are logged and
/// dropped.
pub(crate) async fn get_superiors<F>(
    fetcher: &F,
    entity_configuration: &EntityConfiguration,
    max_authority_hints: usize,
    superiors_hints: &HashMap<String, EntityConfiguration>,
    clock: &dyn Clock,
    skew_secs: u64,
    cancellation: &CancellationToken,
) -> Result<Vec<EntityConfiguration>, OperationError>
where
    F: Fetch + ?Sized,
{
    let hints = entity_configuration.authority_hints();
    if hints.len() > max_authority_hints {
        warn!(
            sub = entity_configuration.sub(),
            dropped = hints.len() - max_authority_hints,
            "authority hints exceed the configured cap, extra hints ignored"
        );
    }

    let mut superiors = Vec::new();
    for hint in hints.iter().take(max_authority_hints) {
        if cancellation.is_cancelled() {
            return Err(OperationError::Cancelled);
        }

        let known = superiors_hints
            .iter()
            .find(|(sub, _)| same_entity(sub, hint))
            .map(|(_, configuration)| configuration);
        if let Some(known) = known {
            debug!(superior = %hint, "reusing prefetched superior entity configuration");
            superiors.push(known.clone());
            continue;
        }

        match fetch_entity_configuration(fetcher, hint, clock, skew_secs).await {
            Ok(superior) => superiors.push(superior),
            Err(e) => warn!(
                sub = entity_configuration.sub(),
                superior = %hint,
                error = %e,
                "authority hint did not resolve, skipping"
            ),
        }
    }

    Ok(superiors)
}

/// Fetches and verifies the statement `superior` issues about `descendant`.
///
/// # Errors
///
/// Missing fetch endpoint, fetch failures, or statement validation failures.
pub(crate) async fn validate_by_superior<F>(
    fetcher: &F,
    descendant: &EntityConfiguration,
    superior: &EntityConfiguration,
    clock: &dyn Clock,
    skew_secs: u64,
) -> Result<SubordinateStatement, OperationError>
where
    F: Fetch + ?Sized,
{
    let endpoint = superior
        .federation_fetch_endpoint()
        .ok_or_else(|| OperationError::NoFetchEndpoint {
            entity: superior.sub().to_string(),
        })?;

    let raw = fetcher
        .fetch_subordinate_statement(endpoint, superior.sub(), descendant.sub())
        .await?;
    let mut statement = SubordinateStatement::parse(raw)?;
    statement.validate(superior, descendant.sub(), clock, skew_secs)?;

    Ok(statement)
}

/// Attaches every superior that successfully attests `node`.
///
/// Returns the attesting superiors in the order they were offered. Rejected
/// edges are logged and skipped.
pub(crate) async fn validate_by_superiors<F>(
    fetcher: &F,
    node: &mut VerifiedNode,
    superiors: &[EntityConfiguration],
    clock: &dyn Clock,
    skew_secs: u64,
    cancellation: &CancellationToken,
) -> Result<Vec<EntityConfiguration>, OperationError>
where
    F: Fetch + ?Sized,
{
    let mut attested = Vec::new();
    for superior in superiors {
        if cancellation.is_cancelled() {
            return Err(OperationError::Cancelled);
        }

        match validate_by_superior(fetcher, &node.entity_configuration, superior, clock, skew_secs).await {
            Ok(statement) => {
                debug!(sub = node.sub(), superior = superior.sub(), "subordinate statement verified");
                node.record_superior(superior.clone(), statement);
                attested.push(superior.clone());
            }
            Err(OperationError::Cancelled) => return Err(OperationError::Cancelled),
            Err(e) => warn!(
                sub = node.sub(),
                superior = superior.sub(),
                error = %e,
                "subordinate statement rejected, skipping edge"
            ),
        }
    }

    Ok(attested)
}

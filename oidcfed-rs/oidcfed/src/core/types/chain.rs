// Copyright 2020-2025 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! # Trust Chain
//!
//! The discovery tree node and the resolved chain. A [`VerifiedNode`]
//! decorates an entity configuration with the superiors that attested it;
//! superiors are referenced by their `sub` URL through side maps, never by
//! back-pointers, so the tree stays acyclic by construction.

use std::collections::HashMap;

use serde_json::Value;

use crate::core::types::{EntityConfiguration, MetadataType, SubordinateStatement};
use crate::utils::same_entity;

/// One node of the discovery tree.
#[derive(Debug, Clone)]
pub struct VerifiedNode {
    /// The node's own validated entity configuration.
    pub entity_configuration: EntityConfiguration,
    /// Validated configurations of the superiors that attested this node,
    /// keyed by the superior's `sub`.
    pub verified_by_superiors: HashMap<String, EntityConfiguration>,
    /// The subordinate statements those superiors issued about this node,
    /// keyed by the superior's `sub`.
    pub verified_descendant_statements: HashMap<String, SubordinateStatement>,
}

impl VerifiedNode {
    pub fn new(entity_configuration: EntityConfiguration) -> Self {
        Self {
            entity_configuration,
            verified_by_superiors: HashMap::new(),
            verified_descendant_statements: HashMap::new(),
        }
    }

    /// The node's entity identifier.
    pub fn sub(&self) -> &str {
        self.entity_configuration.sub()
    }

    /// Records a superior that successfully attested this node.
    pub(crate) fn record_superior(&mut self, superior: EntityConfiguration, statement: SubordinateStatement) {
        let key = superior.sub().to_string();
        self.verified_descendant_statements.insert(key.clone(), statement);
        self.verified_by_superiors.insert(key, superior);
    }

    /// The verified statement that `superior_sub` issued about this node,
    /// tolerating a trailing-slash spelling difference.
    pub fn statement_from(&self, superior_sub: &str) -> Option<&SubordinateStatement> {
        self.verified_descendant_statements
            .iter()
            .find(|(key, _)| same_entity(key, superior_sub))
            .map(|(_, statement)| statement)
    }
}

/// A resolved and validated trust chain.
///
/// Produced only by the resolver; every statement along
/// [`TrustChain::trust_path`] has been cryptographically verified and the
/// chain as a whole is within its lifetime.
#[derive(Debug, Clone)]
pub struct TrustChain {
    /// The subject the chain was resolved for.
    pub subject: String,
    /// The trust anchor terminating the chain.
    pub anchor: String,
    /// Which metadata document was composed.
    pub metadata_type: MetadataType,
    /// Nodes from subject to anchor, inclusive.
    pub trust_path: Vec<VerifiedNode>,
    /// The subject's effective metadata after policy composition.
    pub final_metadata: Value,
    /// Expiration of the chain: the earliest `exp` along the path, in
    /// seconds since the Unix epoch.
    pub exp: u64,
    /// Always true for a chain returned by the resolver.
    pub is_valid: bool,
}

impl TrustChain {
    /// The canonical wire representation of the chain.
    ///
    /// An interleaved JSON array, in subject-to-anchor order: each node's
    /// entity configuration payload followed, for every non-terminal node,
    /// by the array of verified subordinate statement payloads about that
    /// node, ordered by the node's `authority_hints`.
    pub fn serialize(&self) -> Value {
        let mut out = Vec::with_capacity(self.trust_path.len() * 2);
        for (index, node) in self.trust_path.iter().enumerate() {
            out.push(node.entity_configuration.payload().clone());
            if index + 1 < self.trust_path.len() {
                out.push(Value::Array(Self::statements_about(node)));
            }
        }
        Value::Array(out)
    }

    fn statements_about(node: &VerifiedNode) -> Vec<Value> {
        let mut payloads = Vec::with_capacity(node.verified_descendant_statements.len());
        for hint in node.entity_configuration.authority_hints() {
            if let Some(statement) = node.statement_from(hint) {
                payloads.push(statement.payload().clone());
            }
        }
        payloads
    }
}

// Copyright 2020-2025 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! # Trust Chain Resolver
//!
//! Orchestrates a full resolution: anchor and subject resolution, breadth-
//! first discovery up the federation tree, path selection, metadata policy
//! composition and chain expiry.
//!
//! Discovery is an explicit BFS over `tree[depth]` levels with a `visited`
//! set for loop prevention; the tree is immutable once built and the chosen
//! path is the output of a pure selection step. Per-edge failures are logged
//! and recovered locally; losing every path to the anchor, a policy
//! violation on the chosen path, or a failed trust-mark filter are fatal.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::client::error::FetchError;
use crate::client::{Fetch, HttpConfig, HttpFetcher};
use crate::core::error::{OperationError, StatementError};
use crate::core::policy::{self, PolicyError};
use crate::core::trust_marks::{TrustMarkError, TrustMarkValidator};
use crate::core::types::{EntityConfiguration, MetadataType, TrustChain, VerifiedNode};
use crate::core::{operations, Clock, SystemClock, DEFAULT_MAX_PATH_LEN, MAX_CLOCK_SKEW_SECS};
use crate::error::ConfigError;
use crate::utils::same_entity;

/// Default bound on authority hints followed per hop.
pub const DEFAULT_MAX_AUTHORITY_HINTS: usize = 10;

/// Errors terminating a resolution
#[derive(Debug, Error, strum::IntoStaticStr)]
#[non_exhaustive]
pub enum ResolveError {
    /// The resolver configuration is unusable
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// The trust anchor's entity configuration could not be resolved
    #[error("trust anchor could not be resolved: {reason}")]
    TrustAnchorNeeded { reason: String },

    /// Discovery could not produce a validated path, or the subject lacks
    /// the requested metadata type
    #[error("metadata discovery failed for {subject}: {reason}")]
    MetadataDiscovery { subject: String, reason: String },

    /// The resolved chain is already expired
    #[error("trust chain expired at {exp}")]
    Expired { exp: u64 },

    /// The per-resolution deadline elapsed
    #[error("resolution deadline exceeded")]
    DeadlineExceeded,

    /// The resolution was cancelled
    #[error("resolution cancelled")]
    Cancelled,

    /// Document retrieval failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Statement validation failed
    #[error(transparent)]
    Statement(#[from] StatementError),

    /// A discovery operation failed
    #[error(transparent)]
    Operation(#[from] OperationError),

    /// Policy composition rejected the chain
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// The required trust-mark filter failed
    #[error(transparent)]
    TrustMark(#[from] TrustMarkError),
}

impl ResolveError {
    /// Stable kind string for diagnostics, delegating to the wrapped error
    /// where there is one.
    pub fn kind(&self) -> &'static str {
        match self {
            ResolveError::Fetch(e) => e.kind(),
            ResolveError::Statement(e) => e.kind(),
            ResolveError::Operation(e) => e.kind(),
            ResolveError::Policy(e) => e.kind(),
            ResolveError::TrustMark(e) => e.kind(),
            other => other.into(),
        }
    }
}

/// How the trust anchor is designated.
#[derive(Debug, Clone)]
pub enum TrustAnchor {
    /// Resolve the anchor's entity configuration from its URL.
    Url(String),
    /// Use an out-of-band obtained entity configuration.
    Configuration(Box<EntityConfiguration>),
}

impl From<&str> for TrustAnchor {
    fn from(url: &str) -> Self {
        TrustAnchor::Url(url.to_string())
    }
}

impl From<String> for TrustAnchor {
    fn from(url: String) -> Self {
        TrustAnchor::Url(url)
    }
}

impl From<EntityConfiguration> for TrustAnchor {
    fn from(configuration: EntityConfiguration) -> Self {
        TrustAnchor::Configuration(Box::new(configuration))
    }
}

/// Configuration of one resolution.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// The entity whose chain is resolved.
    pub subject: String,
    /// The root of trust.
    pub trust_anchor: TrustAnchor,
    /// Which metadata document to compose.
    pub metadata_type: MetadataType,
    /// Trust-mark identifiers of which at least one must verify on the
    /// subject. Empty disables the filter.
    pub required_trust_marks: Vec<String>,
    /// Bound on authority hints followed per hop.
    pub max_authority_hints: usize,
    /// Transport configuration for [`TrustChainResolver::from_config`].
    pub http: HttpConfig,
    /// Symmetric clock skew tolerance for statement lifetimes.
    pub clock_skew_secs: u64,
    /// Per-resolution deadline. In-flight fetches are abandoned when it
    /// elapses.
    pub deadline: Option<Duration>,
}

impl ResolverConfig {
    pub fn new(subject: impl Into<String>, trust_anchor: impl Into<TrustAnchor>) -> Self {
        Self {
            subject: subject.into(),
            trust_anchor: trust_anchor.into(),
            metadata_type: MetadataType::default(),
            required_trust_marks: Vec::new(),
            max_authority_hints: DEFAULT_MAX_AUTHORITY_HINTS,
            http: HttpConfig::default(),
            clock_skew_secs: 0,
            deadline: None,
        }
    }

    pub fn with_metadata_type(mut self, metadata_type: MetadataType) -> Self {
        self.metadata_type = metadata_type;
        self
    }

    /// Sets the metadata type from its wire name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for names outside the recognized
    /// set.
    pub fn with_metadata_type_name(self, name: &str) -> Result<Self, ConfigError> {
        let metadata_type = MetadataType::from_str(name)
            .map_err(|_| ConfigError::invalid("metadata_type", format!("unrecognized metadata type '{name}'")))?;
        Ok(self.with_metadata_type(metadata_type))
    }

    pub fn with_required_trust_marks(mut self, required_trust_marks: impl IntoIterator<Item = String>) -> Self {
        self.required_trust_marks = required_trust_marks.into_iter().collect();
        self
    }

    pub fn with_max_authority_hints(mut self, max_authority_hints: usize) -> Self {
        self.max_authority_hints = max_authority_hints;
        self
    }

    pub fn with_http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    pub fn with_clock_skew(mut self, skew_secs: u64) -> Self {
        self.clock_skew_secs = skew_secs;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.subject).map_err(|e| ConfigError::invalid("subject", e.to_string()))?;
        if let TrustAnchor::Url(url) = &self.trust_anchor {
            Url::parse(url).map_err(|e| ConfigError::invalid("trust_anchor", e.to_string()))?;
        }
        if self.max_authority_hints == 0 {
            return Err(ConfigError::invalid("max_authority_hints", "must be at least 1"));
        }
        if self.clock_skew_secs > MAX_CLOCK_SKEW_SECS {
            return Err(ConfigError::invalid(
                "clock_skew_secs",
                format!("must not exceed {MAX_CLOCK_SKEW_SECS} seconds"),
            ));
        }
        Ok(())
    }
}

/// Resolves trust chains for one `(subject, anchor)` pair.
///
/// Stateless across resolutions: every [`TrustChainResolver::resolve`] call
/// owns its discovery tree and visited set, so resolvers can be shared
/// freely.
pub struct TrustChainResolver<F: Fetch> {
    fetcher: F,
    config: ResolverConfig,
    clock: Arc<dyn Clock>,
    cancellation: CancellationToken,
}

impl TrustChainResolver<HttpFetcher> {
    /// Builds a resolver whose fetcher is constructed from the
    /// configuration's HTTP section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the HTTP client cannot be built.
    pub fn from_config(config: ResolverConfig) -> Result<Self, ConfigError> {
        let fetcher = HttpFetcher::new(config.http.clone())?;
        Ok(Self::new(fetcher, config))
    }
}

impl<F: Fetch> TrustChainResolver<F> {
    pub fn new(fetcher: F, config: ResolverConfig) -> Self {
        Self {
            fetcher,
            config,
            clock: Arc::new(SystemClock),
            cancellation: CancellationToken::new(),
        }
    }

    /// Overrides the time source used for statement lifetimes.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// A token that cancels this resolver's in-progress resolutions.
    ///
    /// Cancellation is cooperative: it is observed between nodes and before
    /// fetches, and a cancelled resolution returns [`ResolveError::Cancelled`]
    /// without partial results.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Resolves the configured subject up to the trust anchor.
    ///
    /// On success the returned [`TrustChain`] carries the composed metadata
    /// and a future expiration. On failure the error's
    /// [`ResolveError::kind`] names the primary cause; per-hop diagnostics
    /// are emitted as log records during discovery.
    pub async fn resolve(&self) -> Result<TrustChain, ResolveError> {
        self.config.validate()?;

        match self.config.deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.resolve_inner())
                .await
                .map_err(|_| ResolveError::DeadlineExceeded)?,
            None => self.resolve_inner().await,
        }
    }

    async fn resolve_inner(&self) -> Result<TrustChain, ResolveError> {
        let anchor = self.resolve_anchor().await?;
        let max_path_len = path_length_bound(&anchor);
        info!(
            subject = %self.config.subject,
            anchor = anchor.sub(),
            max_path_len,
            "starting trust chain resolution"
        );

        let subject = self.resolve_subject().await?;
        if !self.config.required_trust_marks.is_empty() {
            TrustMarkValidator::new(&self.fetcher)
                .with_clock_skew(self.config.clock_skew_secs)
                .validate(&subject, &self.config.required_trust_marks, self.clock.as_ref())
                .await?;
        }

        let tree = self.discover(subject, &anchor, max_path_len).await?;
        let path = select_path(&tree, anchor.sub()).ok_or_else(|| ResolveError::MetadataDiscovery {
            subject: self.config.subject.clone(),
            reason: format!("no validated path to {} within {max_path_len} hops", anchor.sub()),
        })?;

        let final_metadata = compose_metadata(&path, self.config.metadata_type)?;

        let exp = path
            .iter()
            .map(|node| node.entity_configuration.exp())
            .min()
            .expect("a selected trust path is never empty");
        if exp <= self.clock.now() {
            return Err(ResolveError::Expired { exp });
        }

        info!(
            subject = %self.config.subject,
            anchor = anchor.sub(),
            path_len = path.len(),
            exp,
            "trust chain resolved"
        );

        Ok(TrustChain {
            subject: path[0].sub().to_string(),
            anchor: anchor.sub().to_string(),
            metadata_type: self.config.metadata_type,
            trust_path: path,
            final_metadata,
            exp,
            is_valid: true,
        })
    }

    async fn resolve_anchor(&self) -> Result<EntityConfiguration, ResolveError> {
        let resolved = match &self.config.trust_anchor {
            TrustAnchor::Configuration(configuration) if configuration.is_valid() => Ok((**configuration).clone()),
            TrustAnchor::Configuration(configuration) => {
                let mut configuration = (**configuration).clone();
                configuration
                    .validate_by_itself(self.clock.as_ref(), self.config.clock_skew_secs)
                    .map(|()| configuration)
                    .map_err(OperationError::from)
            }
            TrustAnchor::Url(url) => {
                operations::fetch_entity_configuration(
                    &self.fetcher,
                    url,
                    self.clock.as_ref(),
                    self.config.clock_skew_secs,
                )
                .await
            }
        };

        resolved.map_err(|e| ResolveError::TrustAnchorNeeded { reason: e.to_string() })
    }

    async fn resolve_subject(&self) -> Result<EntityConfiguration, ResolveError> {
        operations::fetch_entity_configuration(
            &self.fetcher,
            &self.config.subject,
            self.clock.as_ref(),
            self.config.clock_skew_secs,
        )
        .await
        .map_err(lift)
    }

    /// Builds the discovery tree, level by level, up to `max_path_len`
    /// edges.
    async fn discover(
        &self,
        subject: EntityConfiguration,
        anchor: &EntityConfiguration,
        max_path_len: usize,
    ) -> Result<Vec<Vec<VerifiedNode>>, ResolveError> {
        // The anchor is the one superior whose configuration is already
        // known; hints naming it are served from here instead of the
        // network.
        let mut superiors_hints = HashMap::new();
        superiors_hints.insert(anchor.sub().to_string(), anchor.clone());

        let mut tree = vec![vec![VerifiedNode::new(subject)]];
        let mut visited: HashSet<String> = HashSet::new();

        while tree.len() - 1 < max_path_len {
            if self.cancellation.is_cancelled() {
                return Err(ResolveError::Cancelled);
            }

            let depth = tree.len() - 1;
            let mut level = std::mem::take(&mut tree[depth]);
            let mut next: Vec<VerifiedNode> = Vec::new();

            for node in level.iter_mut() {
                if !visited.insert(node.sub().trim_end_matches('/').to_string()) {
                    debug!(sub = node.sub(), depth, "discovery loop detected, node already expanded");
                    continue;
                }

                let superiors = operations::get_superiors(
                    &self.fetcher,
                    &node.entity_configuration,
                    self.config.max_authority_hints,
                    &superiors_hints,
                    self.clock.as_ref(),
                    self.config.clock_skew_secs,
                    &self.cancellation,
                )
                .await
                .map_err(lift)?;

                let attested = operations::validate_by_superiors(
                    &self.fetcher,
                    node,
                    &superiors,
                    self.clock.as_ref(),
                    self.config.clock_skew_secs,
                    &self.cancellation,
                )
                .await
                .map_err(lift)?;

                for superior in attested {
                    if !next.iter().any(|candidate| same_entity(candidate.sub(), superior.sub())) {
                        next.push(VerifiedNode::new(superior));
                    }
                }
            }

            tree[depth] = level;
            if next.is_empty() {
                break;
            }
            debug!(depth = depth + 1, nodes = next.len(), "discovery level complete");
            tree.push(next);
        }

        Ok(tree)
    }
}

fn lift(error: OperationError) -> ResolveError {
    match error {
        OperationError::Cancelled => ResolveError::Cancelled,
        OperationError::Fetch(e) => ResolveError::Fetch(e),
        OperationError::Statement(e) => ResolveError::Statement(e),
        other => ResolveError::Operation(other),
    }
}

/// The chain length bound the anchor imposes: its declared
/// `max_path_length`, defaulting to (and capped at)
/// [`DEFAULT_MAX_PATH_LEN`].
fn path_length_bound(anchor: &EntityConfiguration) -> usize {
    match anchor.constraints().max_path_length {
        Some(declared) => {
            let bound = (declared as usize).min(DEFAULT_MAX_PATH_LEN);
            if bound < declared as usize {
                warn!(declared, bound, "clamping the anchor's max_path_length constraint");
            }
            bound
        }
        None => DEFAULT_MAX_PATH_LEN,
    }
}

/// Selects the trust path from the subject to the anchor over an immutable
/// discovery tree.
///
/// Depth-first from the subject, trying superiors in each node's
/// `authority_hints` order and backtracking over dead ends; the first path
/// whose terminal node is the anchor wins. Selection depends only on the
/// tree, never on fetch completion order.
fn select_path(tree: &[Vec<VerifiedNode>], anchor_sub: &str) -> Option<Vec<VerifiedNode>> {
    let subject = tree.first()?.first()?;
    path_from(tree, 0, subject, anchor_sub)
}

fn path_from(tree: &[Vec<VerifiedNode>], depth: usize, node: &VerifiedNode, anchor_sub: &str) -> Option<Vec<VerifiedNode>> {
    if same_entity(node.sub(), anchor_sub) {
        return Some(vec![node.clone()]);
    }

    let next_level = tree.get(depth + 1)?;
    for hint in node.entity_configuration.authority_hints() {
        if node.statement_from(hint).is_none() {
            continue;
        }
        let Some(superior) = next_level.iter().find(|candidate| same_entity(candidate.sub(), hint)) else {
            continue;
        };
        if let Some(mut ancestors) = path_from(tree, depth + 1, superior, anchor_sub) {
            let mut path = Vec::with_capacity(ancestors.len() + 1);
            path.push(node.clone());
            path.append(&mut ancestors);
            return Some(path);
        }
    }

    None
}

/// Composes the subject's effective metadata along `path`.
///
/// Starts from the subject's own document for `metadata_type` and applies
/// each hop's policy from the anchor end towards the subject end. The
/// subject itself issues no statement on its own path, so it contributes no
/// policy.
fn compose_metadata(path: &[VerifiedNode], metadata_type: MetadataType) -> Result<Value, ResolveError> {
    let subject = &path[0];
    let mut metadata = subject
        .entity_configuration
        .metadata()
        .get(metadata_type.as_str())
        .cloned()
        .ok_or_else(|| ResolveError::MetadataDiscovery {
            subject: subject.sub().to_string(),
            reason: format!("entity declares no {metadata_type} metadata"),
        })?;

    for index in (0..path.len().saturating_sub(1)).rev() {
        let node = &path[index];
        let superior_sub = path[index + 1].sub();
        let statement = node
            .statement_from(superior_sub)
            .expect("every non-terminal path node carries a statement from its successor");

        if let Some(hop_policy) = statement.metadata_policy().get(metadata_type.as_str()) {
            debug!(sub = node.sub(), superior = superior_sub, "applying hop metadata policy");
            metadata = policy::apply_policy(&metadata, hop_policy)?;
        }
    }

    Ok(metadata)
}

/// Resolves one trust chain with a dedicated resolver.
///
/// Convenience wrapper over [`TrustChainResolver`] for callers that do not
/// need to customize the clock or keep the resolver around.
pub async fn resolve_trust_chain<F: Fetch>(
    fetcher: F,
    subject: impl Into<String>,
    trust_anchor: impl Into<TrustAnchor>,
    metadata_type: MetadataType,
    required_trust_marks: impl IntoIterator<Item = String>,
) -> Result<TrustChain, ResolveError> {
    let config = ResolverConfig::new(subject, trust_anchor)
        .with_metadata_type(metadata_type)
        .with_required_trust_marks(required_trust_marks);

    TrustChainResolver::new(fetcher, config).resolve().await
}

// Copyright 2020-2025 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! # OIDC Federation
//!
//! The **oidcfed** library resolves OpenID Connect Federation trust chains.
//! Given a *subject* entity and a *trust anchor*, it discovers, fetches and
//! cryptographically validates the chain of signed federation statements that
//! links the subject to the anchor, then composes the subject's effective
//! metadata by applying each hop's metadata policy in order.
//!
//! A federation is a tree of entities. Every entity publishes a self-signed
//! **entity configuration** under `/.well-known/openid-federation`; superiors
//! additionally issue **subordinate statements** about their immediate
//! descendants. The resolver walks this tree upward from the subject,
//! verifying every statement it touches, and returns either a fully
//! validated, time-bounded [`core::types::TrustChain`] or a definitive error.
//!
//! The crate is split into:
//! - [`client`]: network retrieval of federation documents.
//! - [`core`]: statements, the metadata policy engine, trust-mark
//!   validation and the chain resolver itself.
//! - [`error`]: the domain-specific error types.

pub mod client;
pub mod core;
pub mod error;
mod utils;

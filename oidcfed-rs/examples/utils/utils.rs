// Copyright 2020-2025 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Shared helpers for the oidcfed examples.

use tracing_subscriber::EnvFilter;

/// Initializes log output for the examples; control verbosity with
/// `RUST_LOG` (e.g. `RUST_LOG=oidcfed=debug`).
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

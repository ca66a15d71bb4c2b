// SPDX-License-Identifier: Apache-2.0
//! Centralized `tracing` setup for the coordinator's binaries and tests.

use std::sync::Once;

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Initializes a compact console subscriber for a named component.
///
/// Respects `RUST_LOG` if set, otherwise defaults to `info`. Safe to call
/// from a binary's `main`; returns an error if a global subscriber is
/// already installed (e.g. when called twice).
pub fn init_logging(component_name: &str, default_level: Level) -> Result<(), String> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_str()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .compact()
        .try_init()
        .map_err(|e| e.to_string())?;

    tracing::info!(component = component_name, "logging initialized");
    Ok(())
}

static TEST_LOGGING_INIT: Once = Once::new();

/// Idempotent logging init for tests; multiple calls across test binaries
/// are safe since only the first one installs a subscriber.
pub fn ensure_test_logging() {
    TEST_LOGGING_INIT.call_once(|| {
        let _ = init_logging("test", Level::DEBUG);
    });
}

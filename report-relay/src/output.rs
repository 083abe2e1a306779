// Copyright (c) The report-relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Diagnostic output for the relay itself.
//!
//! The relay never writes to stdout or stderr directly. Everything it has to say about its own
//! operation goes through `tracing`; hosts that do not install their own subscriber can call
//! [`init_tracing`] to get a plain stderr logger.

use std::sync::Once;
use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::{
    Layer, filter::Targets, layer::SubscriberExt, util::SubscriberInitExt,
};

/// The environment variable used to configure log filtering, in `tracing` targets syntax (for
/// example `report_relay=debug`).
pub const LOG_ENV_VAR: &str = "REPORT_RELAY_LOG";

static INIT_LOGGER: Once = Once::new();

/// Installs a stderr logger filtered by [`LOG_ENV_VAR`].
///
/// Only the first call has any effect. If another global subscriber is already installed, it is
/// left in place.
pub fn init_tracing() {
    INIT_LOGGER.call_once(|| {
        let level_str = std::env::var(LOG_ENV_VAR).unwrap_or_default();

        // An empty or unparseable filter falls back to INFO.
        let (targets, invalid) = if level_str.is_empty() {
            (Targets::new().with_default(LevelFilter::INFO), None)
        } else {
            match level_str.parse::<Targets>() {
                Ok(targets) => (targets, None),
                Err(error) => (Targets::new().with_default(LevelFilter::INFO), Some(error)),
            }
        };

        let layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(targets);

        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            return;
        }

        if let Some(error) = invalid {
            warn!("ignoring invalid {LOG_ENV_VAR} value `{level_str}`: {error}");
        }
    });
}

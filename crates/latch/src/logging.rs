// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use latch_config::LoggingConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. Fails if a global subscriber
/// is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<(), TryInitError> {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

	tracing_subscriber::registry()
		.with(filter)
		.with(config.json.then(|| tracing_subscriber::fmt::layer().json()))
		.with((!config.json).then(|| tracing_subscriber::fmt::layer()))
		.try_init()
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for Latch.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`LATCH_*`)
//!
//! # Usage
//!
//! ```ignore
//! use latch_config::load_config;
//!
//! let config = load_config()?;
//! println!("refreshing every {:?}", config.refresh.period());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::LatchConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatchConfig {
	pub cache: CacheConfig,
	pub refresh: RefreshConfig,
	pub notifier: NotifierConfig,
	pub evaluator: EvaluatorConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`LATCH_*`)
/// 2. Config file (`/etc/latch/latch.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<LatchConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only.
pub fn load_config_from_env() -> Result<LatchConfig, ConfigError> {
	load_from_sources(vec![Box::new(EnvSource)])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<LatchConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Merge `sources` in precedence order and resolve the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<LatchConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = LatchConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Resolve a merged layer into a validated configuration.
pub fn finalize(layer: LatchConfigLayer) -> Result<LatchConfig, ConfigError> {
	let config = LatchConfig {
		cache: layer.cache.unwrap_or_default().finalize(),
		refresh: layer.refresh.unwrap_or_default().finalize(),
		notifier: layer.notifier.unwrap_or_default().finalize(),
		evaluator: layer.evaluator.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
	};

	validate_config(&config)?;

	info!(
		cache_enabled = config.cache.enabled,
		default_ttl_ms = config.cache.default_ttl_ms,
		max_entries = config.cache.max_entries,
		refresh_enabled = config.refresh.enabled,
		refresh_period_ms = config.refresh.period_ms,
		notifier_workers = config.notifier.workers,
		auto_create = config.evaluator.auto_create,
		"Latch configuration loaded"
	);

	Ok(config)
}

/// Validate cross-field configuration rules.
fn validate_config(config: &LatchConfig) -> Result<(), ConfigError> {
	if config.notifier.workers == 0 {
		return Err(ConfigError::Validation(
			"notifier.workers must be at least 1".to_string(),
		));
	}
	if config.notifier.queue_capacity == 0 {
		return Err(ConfigError::Validation(
			"notifier.queue_capacity must be at least 1".to_string(),
		));
	}
	if config.notifier.task_timeout_ms == 0 {
		return Err(ConfigError::Validation(
			"notifier.task_timeout_ms must be greater than 0".to_string(),
		));
	}
	if config.refresh.period_ms == 0 {
		return Err(ConfigError::Validation(
			"refresh.period_ms must be greater than 0".to_string(),
		));
	}
	if config.cache.enabled && config.cache.max_entries == 0 {
		return Err(ConfigError::Validation(
			"cache.max_entries must be at least 1 when the cache is enabled".to_string(),
		));
	}

	Ok(())
}

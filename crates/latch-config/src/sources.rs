// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, TOML files, and environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::LatchConfigLayer;
use crate::sections::{
	CacheConfigLayer, EvaluatorConfigLayer, LoggingConfigLayer, NotifierConfigLayer,
	RefreshConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<LatchConfigLayer, ConfigError>;
}

pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<LatchConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(LatchConfigLayer::default())
	}
}

/// TOML file source. A missing file yields an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/latch/latch.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<LatchConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(LatchConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: LatchConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: `LATCH_<SECTION>_<FIELD>`, e.g. `LATCH_CACHE_DEFAULT_TTL_MS`.
/// Logging uses `LATCH_LOG_LEVEL` and `LATCH_LOG_JSON`.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<LatchConfigLayer, ConfigError> {
		debug!("loading environment variables");
		layer_from_lookup(&|name: &str| std::env::var(name).ok())
	}
}

type Lookup<'a> = dyn Fn(&str) -> Option<String> + 'a;

pub(crate) fn layer_from_lookup(lookup: &Lookup<'_>) -> Result<LatchConfigLayer, ConfigError> {
	let env = Env { lookup };
	Ok(LatchConfigLayer {
		cache: Some(CacheConfigLayer {
			enabled: env.bool("LATCH_CACHE_ENABLED"),
			default_ttl_ms: env.parse("LATCH_CACHE_DEFAULT_TTL_MS")?,
			max_entries: env.parse("LATCH_CACHE_MAX_ENTRIES")?,
			sweep_interval_ms: env.parse("LATCH_CACHE_SWEEP_INTERVAL_MS")?,
		}),
		refresh: Some(RefreshConfigLayer {
			enabled: env.bool("LATCH_REFRESH_ENABLED"),
			initial_delay_ms: env.parse("LATCH_REFRESH_INITIAL_DELAY_MS")?,
			period_ms: env.parse("LATCH_REFRESH_PERIOD_MS")?,
		}),
		notifier: Some(NotifierConfigLayer {
			workers: env.parse("LATCH_NOTIFIER_WORKERS")?,
			queue_capacity: env.parse("LATCH_NOTIFIER_QUEUE_CAPACITY")?,
			task_timeout_ms: env.parse("LATCH_NOTIFIER_TASK_TIMEOUT_MS")?,
		}),
		evaluator: Some(EvaluatorConfigLayer {
			auto_create: env.bool("LATCH_EVALUATOR_AUTO_CREATE"),
			audit_enabled: env.bool("LATCH_EVALUATOR_AUDIT_ENABLED"),
		}),
		logging: Some(LoggingConfigLayer {
			level: env.var("LATCH_LOG_LEVEL"),
			json: env.bool("LATCH_LOG_JSON"),
		}),
	})
}

struct Env<'a> {
	lookup: &'a Lookup<'a>,
}

impl Env<'_> {
	fn var(&self, name: &str) -> Option<String> {
		(self.lookup)(name).filter(|s| !s.is_empty())
	}

	fn bool(&self, name: &str) -> Option<bool> {
		self.var(name)
			.map(|v| v.eq_ignore_ascii_case("true") || v == "1")
	}

	fn parse<T: FromStr>(&self, name: &str) -> Result<Option<T>, ConfigError> {
		match self.var(name) {
			Some(v) => v.trim().parse().map(Some).map_err(|_| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid {} value '{v}'", std::any::type_name::<T>()),
			}),
			None => Ok(None),
		}
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The contract for per-feature evaluation strategies.
//!
//! A strategy is persisted as a [`StrategyConfig`] (type tag plus string
//! parameters) and rebuilt at evaluation time through a [`StrategyRegistry`],
//! which maps each tag to a constructor.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::ExecutionContext;
use crate::error::{LatchError, Result};
use crate::repository::FeatureRepository;

/// The persisted form of a strategy attached to a feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyConfig {
	#[serde(rename = "type")]
	pub type_name: String,
	#[serde(default)]
	pub params: BTreeMap<String, String>,
}

impl StrategyConfig {
	pub fn new(type_name: impl Into<String>) -> Self {
		Self {
			type_name: type_name.into(),
			params: BTreeMap::new(),
		}
	}

	pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.insert(key.into(), value.into());
		self
	}
}

#[async_trait]
pub trait FlippingStrategy: Send + Sync {
	/// Stable tag the strategy is registered under.
	fn type_name(&self) -> &str;

	fn init_params(&self) -> BTreeMap<String, String> {
		BTreeMap::new()
	}

	async fn evaluate(
		&self,
		feature_id: &str,
		features: &dyn FeatureRepository,
		ctx: &ExecutionContext,
	) -> Result<bool>;

	fn to_config(&self) -> StrategyConfig {
		StrategyConfig {
			type_name: self.type_name().to_string(),
			params: self.init_params(),
		}
	}
}

impl std::fmt::Debug for dyn FlippingStrategy {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FlippingStrategy")
			.field("type_name", &self.type_name())
			.field("params", &self.init_params())
			.finish()
	}
}

pub type StrategyFactory =
	Arc<dyn Fn(&BTreeMap<String, String>) -> Result<Arc<dyn FlippingStrategy>> + Send + Sync>;

/// Maps strategy tags to constructors.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
	factories: HashMap<String, StrategyFactory>,
}

impl StrategyRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a constructor, replacing any previous one for the same tag.
	pub fn register<F>(&mut self, type_name: impl Into<String>, factory: F) -> &mut Self
	where
		F: Fn(&BTreeMap<String, String>) -> Result<Arc<dyn FlippingStrategy>> + Send + Sync + 'static,
	{
		self.factories.insert(type_name.into(), Arc::new(factory));
		self
	}

	pub fn contains(&self, type_name: &str) -> bool {
		self.factories.contains_key(type_name)
	}

	pub fn type_names(&self) -> Vec<&str> {
		let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
		names.sort_unstable();
		names
	}

	pub fn create(&self, config: &StrategyConfig) -> Result<Arc<dyn FlippingStrategy>> {
		let factory = self.factories.get(&config.type_name).ok_or_else(|| {
			LatchError::invalid_strategy(&config.type_name, "no strategy registered under this type")
		})?;
		factory(&config.params)
	}
}

impl std::fmt::Debug for StrategyRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("StrategyRegistry")
			.field("types", &self.type_names())
			.finish()
	}
}

/// Fetches a parameter a strategy cannot be built without.
pub fn required_param<'a>(
	strategy: &str,
	params: &'a BTreeMap<String, String>,
	key: &str,
) -> Result<&'a str> {
	params
		.get(key)
		.map(String::as_str)
		.ok_or_else(|| LatchError::invalid_strategy(strategy, format!("missing parameter '{key}'")))
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;
use std::sync::Arc;

use latch_core::{
	ExecutionContext, Feature, FeatureRepository, FlippingStrategy, LatchError, Permission,
	Result, StrategyRegistry,
};
use latch_notify::FeatureNotifier;
use tracing::{debug, instrument, warn};

use crate::decision::{DecisionReason, ToggleDecision};

/// Answers "is this feature on for this caller?".
///
/// The evaluation order is:
/// 1. Resolve the feature (auto-creating it disabled if configured)
/// 2. Disabled features are off; ACL and strategy are not consulted
/// 3. The caller must hold USE on the feature
/// 4. A strategy passed for this call decides if present
/// 5. Otherwise the feature's own strategy decides if present
/// 6. Otherwise the feature is on
///
/// A positive answer is reported to "feature used" listeners without waiting
/// for them.
pub struct ToggleEvaluator {
	features: Arc<dyn FeatureRepository>,
	strategies: Arc<StrategyRegistry>,
	notifier: Option<Arc<FeatureNotifier>>,
	auto_create: bool,
}

impl ToggleEvaluator {
	pub fn new(features: Arc<dyn FeatureRepository>, strategies: Arc<StrategyRegistry>) -> Self {
		Self {
			features,
			strategies,
			notifier: None,
			auto_create: false,
		}
	}

	pub fn with_notifier(mut self, notifier: Arc<FeatureNotifier>) -> Self {
		self.notifier = Some(notifier);
		self
	}

	/// When set, checking an unknown feature creates it disabled instead of
	/// failing with `NotFound`.
	pub fn with_auto_create(mut self, auto_create: bool) -> Self {
		self.auto_create = auto_create;
		self
	}

	pub fn auto_create(&self) -> bool {
		self.auto_create
	}

	pub fn features(&self) -> &Arc<dyn FeatureRepository> {
		&self.features
	}

	pub fn strategies(&self) -> &Arc<StrategyRegistry> {
		&self.strategies
	}

	pub async fn check(&self, id: &str, context: &ExecutionContext) -> Result<bool> {
		Ok(self.evaluate(id, context).await?.enabled)
	}

	/// Like [`check`](Self::check), but `strategy` replaces the feature's own
	/// strategy for this call.
	pub async fn check_overriding_strategy(
		&self,
		id: &str,
		context: &ExecutionContext,
		strategy: &dyn FlippingStrategy,
	) -> Result<bool> {
		Ok(self.evaluate_with(id, context, Some(strategy)).await?.enabled)
	}

	pub async fn evaluate(&self, id: &str, context: &ExecutionContext) -> Result<ToggleDecision> {
		self.evaluate_with(id, context, None).await
	}

	#[instrument(skip(self, context, override_strategy), fields(feature = %id))]
	pub async fn evaluate_with(
		&self,
		id: &str,
		context: &ExecutionContext,
		override_strategy: Option<&dyn FlippingStrategy>,
	) -> Result<ToggleDecision> {
		let feature = match self.features.read(id).await {
			Ok(feature) => feature,
			Err(e) if e.is_not_found() && self.auto_create => {
				return self.create_missing(id).await;
			}
			Err(e) => return Err(e),
		};

		let decision = self.decide(&feature, context, override_strategy).await?;
		debug!(enabled = decision.enabled, reason = %decision.reason, "toggle evaluated");
		if decision.enabled {
			self.notify_used(id, context);
		}
		Ok(decision)
	}

	/// Evaluates every stored feature. Reads the whole store in one call
	/// rather than going through the cache, and does not count as usage.
	///
	/// A feature whose evaluation fails, for example one bound to an unknown
	/// strategy, is logged and left out of the result. Only a failing store
	/// fails the whole call.
	#[instrument(skip(self, context))]
	pub async fn check_all(&self, context: &ExecutionContext) -> Result<BTreeMap<String, bool>> {
		let mut results = BTreeMap::new();
		for feature in self.features.find_all().await? {
			match self.decide(&feature, context, None).await {
				Ok(decision) => {
					results.insert(feature.id, decision.enabled);
				}
				Err(e) => warn!(feature = %feature.id, error = %e, "skipping feature in bulk check"),
			}
		}
		Ok(results)
	}

	async fn decide(
		&self,
		feature: &Feature,
		context: &ExecutionContext,
		override_strategy: Option<&dyn FlippingStrategy>,
	) -> Result<ToggleDecision> {
		if !feature.enabled {
			return Ok(ToggleDecision::off(&feature.id, DecisionReason::Disabled));
		}

		if !feature.acl.is_granted(context.principal(), Permission::Use) {
			return Ok(ToggleDecision::off(&feature.id, DecisionReason::AccessDenied));
		}

		if let Some(strategy) = override_strategy {
			let enabled = strategy
				.evaluate(&feature.id, self.features.as_ref(), context)
				.await?;
			return Ok(ToggleDecision::new(
				&feature.id,
				enabled,
				DecisionReason::OverrideStrategy,
			));
		}

		if let Some(config) = &feature.strategy {
			let strategy = self.strategies.create(config)?;
			let enabled = strategy
				.evaluate(&feature.id, self.features.as_ref(), context)
				.await?;
			return Ok(ToggleDecision::new(
				&feature.id,
				enabled,
				DecisionReason::BoundStrategy,
			));
		}

		Ok(ToggleDecision::new(&feature.id, true, DecisionReason::Enabled))
	}

	async fn create_missing(&self, id: &str) -> Result<ToggleDecision> {
		match self.features.create(Feature::new(id)).await {
			Ok(()) => debug!(feature = %id, "auto-created missing feature"),
			// Another caller created it first.
			Err(LatchError::AlreadyExists { .. }) => {}
			Err(e) => return Err(e),
		}
		Ok(ToggleDecision::off(id, DecisionReason::AutoCreated))
	}

	fn notify_used(&self, id: &str, context: &ExecutionContext) {
		let Some(notifier) = &self.notifier else {
			return;
		};
		let id: Arc<str> = Arc::from(id);
		let context = Arc::new(context.clone());
		notifier.notify(move |listener| {
			let (id, context) = (Arc::clone(&id), Arc::clone(&context));
			Box::pin(async move { listener.on_feature_used(&id, &context).await })
		});
	}
}

impl std::fmt::Debug for ToggleEvaluator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ToggleEvaluator")
			.field("strategies", &self.strategies)
			.field("auto_create", &self.auto_create)
			.field("notifier", &self.notifier.is_some())
			.finish()
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use latch_cache::{CacheSweeper, CacheStats, InMemoryCache, RefreshScheduler};
use latch_core::{
	ExecutionContext, Feature, FeatureRepository, FlippingStrategy, Principal, Property,
	PropertyRepository, PropertyValue, Result,
};
use latch_eval::{SecuredFeatures, ToggleDecision, ToggleEvaluator};
use latch_notify::{
	DispatchStats, Dispatcher, FeatureListener, FeatureNotifier, PropertyListener,
	PropertyNotifier, UsageMetrics,
};
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::builder::LatchBuilder;

/// Refresh and sweep loops owned by a [`Latch`].
#[derive(Default)]
pub(crate) struct Background {
	pub(crate) feature_refresh: Option<RefreshScheduler<Feature, dyn FeatureRepository>>,
	pub(crate) property_refresh: Option<RefreshScheduler<Property, dyn PropertyRepository>>,
	pub(crate) feature_sweeper: Option<CacheSweeper<Feature>>,
	pub(crate) property_sweeper: Option<CacheSweeper<Property>>,
}

impl Background {
	pub(crate) fn start(&self) {
		if let Some(refresh) = &self.feature_refresh {
			refresh.start();
		}
		if let Some(refresh) = &self.property_refresh {
			refresh.start();
		}
		if let Some(sweeper) = &self.feature_sweeper {
			sweeper.start();
		}
		if let Some(sweeper) = &self.property_sweeper {
			sweeper.start();
		}
	}

	async fn stop(&self) {
		if let Some(refresh) = &self.feature_refresh {
			refresh.stop().await;
		}
		if let Some(refresh) = &self.property_refresh {
			refresh.stop().await;
		}
		if let Some(sweeper) = &self.feature_sweeper {
			sweeper.stop().await;
		}
		if let Some(sweeper) = &self.property_sweeper {
			sweeper.stop().await;
		}
	}

	fn is_refreshing(&self) -> bool {
		self.feature_refresh.as_ref().is_some_and(|r| r.is_running())
			|| self.property_refresh.as_ref().is_some_and(|r| r.is_running())
	}
}

pub(crate) struct Parts {
	pub(crate) features: Arc<dyn FeatureRepository>,
	pub(crate) properties: Arc<dyn PropertyRepository>,
	pub(crate) evaluator: ToggleEvaluator,
	pub(crate) feature_notifier: Arc<FeatureNotifier>,
	pub(crate) property_notifier: Arc<PropertyNotifier>,
	pub(crate) dispatcher: Arc<Dispatcher>,
	pub(crate) usage: Arc<UsageMetrics>,
	pub(crate) feature_cache: Option<Arc<InMemoryCache<Feature>>>,
	pub(crate) property_cache: Option<Arc<InMemoryCache<Property>>>,
	pub(crate) background: Background,
	pub(crate) default_context: RwLock<ExecutionContext>,
}

/// Entry point for toggle checks, property reads and administration.
///
/// Writes go through the audit decorator, then the cache decorator, then the
/// store. Toggle checks read through the cache.
pub struct Latch {
	features: Arc<dyn FeatureRepository>,
	properties: Arc<dyn PropertyRepository>,
	evaluator: ToggleEvaluator,
	feature_notifier: Arc<FeatureNotifier>,
	property_notifier: Arc<PropertyNotifier>,
	dispatcher: Arc<Dispatcher>,
	usage: Arc<UsageMetrics>,
	feature_cache: Option<Arc<InMemoryCache<Feature>>>,
	property_cache: Option<Arc<InMemoryCache<Property>>>,
	background: Background,
	default_context: RwLock<ExecutionContext>,
	closed: AtomicBool,
}

impl Latch {
	pub fn builder() -> LatchBuilder {
		LatchBuilder::new()
	}

	pub(crate) fn from_parts(parts: Parts) -> Self {
		Self {
			features: parts.features,
			properties: parts.properties,
			evaluator: parts.evaluator,
			feature_notifier: parts.feature_notifier,
			property_notifier: parts.property_notifier,
			dispatcher: parts.dispatcher,
			usage: parts.usage,
			feature_cache: parts.feature_cache,
			property_cache: parts.property_cache,
			background: parts.background,
			default_context: parts.default_context,
			closed: AtomicBool::new(false),
		}
	}

	// Toggle checks

	/// Checks `id` against the default context.
	pub async fn check(&self, id: &str) -> Result<bool> {
		let context = self.default_context();
		self.evaluator.check(id, &context).await
	}

	/// Checks `id` with `context` layered over the default context.
	pub async fn check_with(&self, id: &str, context: &ExecutionContext) -> Result<bool> {
		let context = self.resolve(context);
		self.evaluator.check(id, &context).await
	}

	/// Checks `id` with `strategy` in place of the feature's own strategy.
	pub async fn check_overriding(
		&self,
		id: &str,
		context: &ExecutionContext,
		strategy: &dyn FlippingStrategy,
	) -> Result<bool> {
		let context = self.resolve(context);
		self.evaluator
			.check_overriding_strategy(id, &context, strategy)
			.await
	}

	pub async fn evaluate(&self, id: &str, context: &ExecutionContext) -> Result<ToggleDecision> {
		let context = self.resolve(context);
		self.evaluator.evaluate(id, &context).await
	}

	/// Features that cannot be evaluated are logged and left out.
	pub async fn check_all(&self, context: &ExecutionContext) -> Result<BTreeMap<String, bool>> {
		let context = self.resolve(context);
		self.evaluator.check_all(&context).await
	}

	pub fn default_context(&self) -> ExecutionContext {
		self.default_context.read().clone()
	}

	pub fn set_default_context(&self, context: ExecutionContext) {
		*self.default_context.write() = context;
	}

	fn resolve(&self, context: &ExecutionContext) -> ExecutionContext {
		self.default_context.read().merged(context)
	}

	// Features

	pub async fn create_feature(&self, feature: Feature) -> Result<()> {
		self.features.create(feature).await
	}

	pub async fn feature(&self, id: &str) -> Result<Feature> {
		self.features.read(id).await
	}

	pub async fn find_feature(&self, id: &str) -> Result<Option<Feature>> {
		self.features.find_by_id(id).await
	}

	pub async fn exists_feature(&self, id: &str) -> Result<bool> {
		self.features.exists(id).await
	}

	pub async fn all_features(&self) -> Result<Vec<Feature>> {
		self.features.find_all().await
	}

	pub async fn update_feature(&self, feature: Feature) -> Result<()> {
		self.features.update(feature).await
	}

	pub async fn delete_feature(&self, id: &str) -> Result<()> {
		self.features.delete(id).await
	}

	pub async fn enable(&self, id: &str) -> Result<()> {
		self.features.toggle_on(id).await
	}

	pub async fn disable(&self, id: &str) -> Result<()> {
		self.features.toggle_off(id).await
	}

	// Groups

	pub async fn add_to_group(&self, id: &str, group: &str) -> Result<()> {
		self.features.add_to_group(id, group).await
	}

	pub async fn remove_from_group(&self, id: &str, group: &str) -> Result<()> {
		self.features.remove_from_group(id, group).await
	}

	pub async fn group(&self, group: &str) -> Result<Vec<Feature>> {
		self.features.read_group(group).await
	}

	pub async fn groups(&self) -> Result<BTreeSet<String>> {
		self.features.list_groups().await
	}

	pub async fn enable_group(&self, group: &str) -> Result<()> {
		self.features.enable_group(group).await
	}

	pub async fn disable_group(&self, group: &str) -> Result<()> {
		self.features.disable_group(group).await
	}

	// Properties

	pub async fn create_property(&self, property: Property) -> Result<()> {
		self.properties.create(property).await
	}

	pub async fn property(&self, id: &str) -> Result<Property> {
		self.properties.read(id).await
	}

	pub async fn property_value(&self, id: &str) -> Result<PropertyValue> {
		Ok(self.properties.read(id).await?.value)
	}

	pub async fn all_properties(&self) -> Result<Vec<Property>> {
		self.properties.find_all().await
	}

	pub async fn update_property(&self, property: Property) -> Result<()> {
		self.properties.update(property).await
	}

	/// Parses `raw` as the property's current type.
	pub async fn set_property_value(&self, id: &str, raw: &str) -> Result<()> {
		self.properties.update_value(id, raw).await
	}

	pub async fn delete_property(&self, id: &str) -> Result<()> {
		self.properties.delete(id).await
	}

	/// Prepares both stores.
	pub async fn create_schema(&self) -> Result<()> {
		self.features.create_schema().await?;
		self.properties.create_schema().await
	}

	// Administration

	/// Feature writes authorized against each feature's ACL for `principal`.
	pub fn as_principal(&self, principal: Principal) -> SecuredFeatures {
		SecuredFeatures::new(Arc::clone(&self.features), principal)
	}

	pub fn feature_repository(&self) -> &Arc<dyn FeatureRepository> {
		&self.features
	}

	pub fn property_repository(&self) -> &Arc<dyn PropertyRepository> {
		&self.properties
	}

	pub fn register_feature_listener(
		&self,
		name: impl Into<String>,
		listener: Arc<dyn FeatureListener>,
	) {
		self.feature_notifier.register(name, listener);
	}

	pub fn unregister_feature_listener(&self, name: &str) -> bool {
		self.feature_notifier.unregister(name)
	}

	pub fn register_property_listener(
		&self,
		name: impl Into<String>,
		listener: Arc<dyn PropertyListener>,
	) {
		self.property_notifier.register(name, listener);
	}

	pub fn unregister_property_listener(&self, name: &str) -> bool {
		self.property_notifier.unregister(name)
	}

	pub fn usage(&self) -> &UsageMetrics {
		&self.usage
	}

	pub fn dispatch_stats(&self) -> DispatchStats {
		self.dispatcher.stats()
	}

	pub fn feature_cache_stats(&self) -> Option<CacheStats> {
		self.feature_cache.as_ref().map(|c| c.stats())
	}

	pub fn property_cache_stats(&self) -> Option<CacheStats> {
		self.property_cache.as_ref().map(|c| c.stats())
	}

	pub fn is_refreshing(&self) -> bool {
		self.background.is_refreshing()
	}

	/// Reloads both caches from their stores now.
	pub async fn refresh_caches(&self) -> Result<()> {
		if let Some(refresh) = &self.background.feature_refresh {
			refresh.tick_now().await?;
		}
		if let Some(refresh) = &self.background.property_refresh {
			refresh.tick_now().await?;
		}
		Ok(())
	}

	/// Stops the background loops and drains queued listener work. Later
	/// calls do nothing.
	pub async fn shutdown(&self) {
		if self.closed.swap(true, Ordering::SeqCst) {
			return;
		}
		self.background.stop().await;
		self.dispatcher.shutdown().await;
		let stats = self.dispatcher.stats();
		if stats.dropped > 0 {
			warn!(dropped = stats.dropped, "listener events were dropped");
		}
		info!("latch shut down");
	}
}

impl std::fmt::Debug for Latch {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Latch")
			.field("evaluator", &self.evaluator)
			.field("dispatch", &self.dispatcher.stats())
			.field("closed", &self.closed.load(Ordering::SeqCst))
			.finish()
	}
}

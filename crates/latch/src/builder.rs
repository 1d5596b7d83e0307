// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;
use std::sync::Arc;

use latch_cache::{Cache, CacheSweeper, CachingRepository, InMemoryCache, RefreshScheduler};
use latch_config::LatchConfig;
use latch_core::{
	Entity, ExecutionContext, Feature, FeatureRepository, FlippingStrategy, InMemoryRepository,
	Property, PropertyRepository, Repository, Result, StrategyRegistry,
};
use latch_eval::ToggleEvaluator;
use latch_notify::{
	AuditListener, AuditSink, Dispatcher, FeatureListener, FeatureNotifier, NotifyingRepository,
	PropertyListener, PropertyNotifier, TracingAuditSink, UsageMetrics,
};
use parking_lot::RwLock;
use tracing::info;

use crate::client::{Background, Latch};

const AUDIT_LISTENER: &str = "audit";
const USAGE_LISTENER: &str = "usage-metrics";

/// Builder for [`Latch`].
///
/// Without explicit stores the instance runs on empty in-memory
/// repositories.
pub struct LatchBuilder {
	config: LatchConfig,
	feature_store: Option<Arc<dyn FeatureRepository>>,
	property_store: Option<Arc<dyn PropertyRepository>>,
	strategies: StrategyRegistry,
	feature_listeners: Vec<(String, Arc<dyn FeatureListener>)>,
	property_listeners: Vec<(String, Arc<dyn PropertyListener>)>,
	audit_sinks: Vec<Arc<dyn AuditSink>>,
	default_context: ExecutionContext,
}

impl LatchBuilder {
	pub fn new() -> Self {
		Self {
			config: LatchConfig::default(),
			feature_store: None,
			property_store: None,
			strategies: StrategyRegistry::new(),
			feature_listeners: Vec::new(),
			property_listeners: Vec::new(),
			audit_sinks: Vec::new(),
			default_context: ExecutionContext::new(),
		}
	}

	pub fn config(mut self, config: LatchConfig) -> Self {
		self.config = config;
		self
	}

	pub fn feature_store(mut self, store: Arc<dyn FeatureRepository>) -> Self {
		self.feature_store = Some(store);
		self
	}

	pub fn property_store(mut self, store: Arc<dyn PropertyRepository>) -> Self {
		self.property_store = Some(store);
		self
	}

	/// Registers a strategy constructor under `type_name`.
	pub fn strategy<F>(mut self, type_name: impl Into<String>, factory: F) -> Self
	where
		F: Fn(&BTreeMap<String, String>) -> Result<Arc<dyn FlippingStrategy>> + Send + Sync + 'static,
	{
		self.strategies.register(type_name, factory);
		self
	}

	pub fn strategies(mut self, strategies: StrategyRegistry) -> Self {
		self.strategies = strategies;
		self
	}

	pub fn feature_listener(
		mut self,
		name: impl Into<String>,
		listener: Arc<dyn FeatureListener>,
	) -> Self {
		self.feature_listeners.push((name.into(), listener));
		self
	}

	pub fn property_listener(
		mut self,
		name: impl Into<String>,
		listener: Arc<dyn PropertyListener>,
	) -> Self {
		self.property_listeners.push((name.into(), listener));
		self
	}

	/// Adds a sink next to the tracing sink. Ignored when auditing is off.
	pub fn audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
		self.audit_sinks.push(sink);
		self
	}

	/// Context merged under every per-call context.
	pub fn default_context(mut self, context: ExecutionContext) -> Self {
		self.default_context = context;
		self
	}

	pub fn auto_create(mut self, auto_create: bool) -> Self {
		self.config.evaluator.auto_create = auto_create;
		self
	}

	/// Wires the stores, caches and listeners together and starts the
	/// background tasks. Must be called from within a tokio runtime.
	pub async fn build(self) -> Result<Latch> {
		let config = self.config;
		let feature_store = self
			.feature_store
			.unwrap_or_else(|| Arc::new(InMemoryRepository::<Feature>::new()));
		let property_store = self
			.property_store
			.unwrap_or_else(|| Arc::new(InMemoryRepository::<Property>::new()));

		let dispatcher = Arc::new(Dispatcher::new(
			config.notifier.workers,
			config.notifier.queue_capacity,
			config.notifier.task_timeout(),
		));
		let feature_notifier = Arc::new(FeatureNotifier::new(Arc::clone(&dispatcher)));
		let property_notifier = Arc::new(PropertyNotifier::new(Arc::clone(&dispatcher)));

		let usage = Arc::new(UsageMetrics::new());
		feature_notifier.register(USAGE_LISTENER, Arc::clone(&usage) as Arc<dyn FeatureListener>);
		if config.evaluator.audit_enabled {
			let mut sinks: Vec<Arc<dyn AuditSink>> = vec![Arc::new(TracingAuditSink::new())];
			sinks.extend(self.audit_sinks);
			let audit = Arc::new(AuditListener::new(sinks));
			feature_notifier.register(AUDIT_LISTENER, Arc::clone(&audit) as Arc<dyn FeatureListener>);
			property_notifier.register(AUDIT_LISTENER, audit as Arc<dyn PropertyListener>);
		}
		for (name, listener) in self.feature_listeners {
			feature_notifier.register(name, listener);
		}
		for (name, listener) in self.property_listeners {
			property_notifier.register(name, listener);
		}

		let mut background = Background::default();

		let feature_cache = config.cache.enabled.then(|| {
			Arc::new(InMemoryCache::<Feature>::new(
				config.cache.default_ttl(),
				config.cache.max_entries,
			))
		});
		let cached_features: Arc<dyn FeatureRepository> = match &feature_cache {
			Some(cache) => {
				let cache: Arc<dyn Cache<Feature>> = Arc::clone(cache) as Arc<dyn Cache<Feature>>;
				background.feature_refresh =
					refresh_scheduler(&config, Arc::clone(&feature_store), Arc::clone(&cache));
				background.feature_sweeper = sweeper(&config, Arc::clone(&cache));
				Arc::new(CachingRepository::new(Arc::clone(&feature_store), cache))
			}
			None => Arc::clone(&feature_store),
		};

		let property_cache = config.cache.enabled.then(|| {
			Arc::new(InMemoryCache::<Property>::new(
				config.cache.default_ttl(),
				config.cache.max_entries,
			))
		});
		let cached_properties: Arc<dyn PropertyRepository> = match &property_cache {
			Some(cache) => {
				let cache: Arc<dyn Cache<Property>> = Arc::clone(cache) as Arc<dyn Cache<Property>>;
				background.property_refresh =
					refresh_scheduler(&config, Arc::clone(&property_store), Arc::clone(&cache));
				background.property_sweeper = sweeper(&config, Arc::clone(&cache));
				Arc::new(CachingRepository::new(Arc::clone(&property_store), cache))
			}
			None => Arc::clone(&property_store),
		};

		let features: Arc<dyn FeatureRepository> = Arc::new(NotifyingRepository::new(
			cached_features,
			Arc::clone(&feature_notifier),
		));
		let properties: Arc<dyn PropertyRepository> = Arc::new(NotifyingRepository::new(
			cached_properties,
			Arc::clone(&property_notifier),
		));

		let evaluator = ToggleEvaluator::new(Arc::clone(&features), Arc::new(self.strategies))
			.with_notifier(Arc::clone(&feature_notifier))
			.with_auto_create(config.evaluator.auto_create);

		background.start();
		info!(
			cache = config.cache.enabled,
			refresh = config.refresh.enabled,
			auto_create = config.evaluator.auto_create,
			audit = config.evaluator.audit_enabled,
			"latch started"
		);

		Ok(Latch::from_parts(crate::client::Parts {
			features,
			properties,
			evaluator,
			feature_notifier,
			property_notifier,
			dispatcher,
			usage,
			feature_cache,
			property_cache,
			background,
			default_context: RwLock::new(self.default_context),
		}))
	}
}

impl Default for LatchBuilder {
	fn default() -> Self {
		Self::new()
	}
}

fn refresh_scheduler<E, R>(
	config: &LatchConfig,
	store: Arc<R>,
	cache: Arc<dyn Cache<E>>,
) -> Option<RefreshScheduler<E, R>>
where
	E: Entity,
	R: Repository<E> + ?Sized + 'static,
{
	if !config.refresh.enabled {
		return None;
	}
	Some(RefreshScheduler::new(
		store,
		cache,
		config.refresh.initial_delay(),
		config.refresh.period(),
	))
}

fn sweeper<E: Entity>(config: &LatchConfig, cache: Arc<dyn Cache<E>>) -> Option<CacheSweeper<E>> {
	let interval = config.cache.sweep_interval()?;
	Some(CacheSweeper::new(format!("{}-cache-sweeper", E::KIND), cache, interval))
}

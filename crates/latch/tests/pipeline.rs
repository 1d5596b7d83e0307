// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use latch::{
	DecisionReason, EventAction, ExecutionContext, Feature, FeatureListener, FeatureRepository,
	InMemoryRepository, Latch, LatchConfig, LatchError, ListenerError, MemoryAuditSink,
	Permission, Principal, Property, PropertyRepository, PropertyValue, Repository, Result,
	StrategyConfig,
};

/// Store wrapper counting single-entity reads.
struct CountingStore {
	inner: InMemoryRepository<Feature>,
	reads: AtomicUsize,
}

impl CountingStore {
	fn new() -> Self {
		Self {
			inner: InMemoryRepository::new(),
			reads: AtomicUsize::new(0),
		}
	}

	fn reads(&self) -> usize {
		self.reads.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl Repository<Feature> for CountingStore {
	async fn exists(&self, id: &str) -> Result<bool> {
		self.inner.exists(id).await
	}

	async fn find_by_id(&self, id: &str) -> Result<Option<Feature>> {
		self.reads.fetch_add(1, Ordering::SeqCst);
		self.inner.find_by_id(id).await
	}

	async fn find_all(&self) -> Result<Vec<Feature>> {
		self.inner.find_all().await
	}

	async fn create(&self, entity: Feature) -> Result<()> {
		self.inner.create(entity).await
	}

	async fn update(&self, entity: Feature) -> Result<()> {
		self.inner.update(entity).await
	}

	async fn delete(&self, id: &str) -> Result<()> {
		self.inner.delete(id).await
	}

	async fn save(&self, entities: Vec<Feature>) -> Result<()> {
		self.inner.save(entities).await
	}

	async fn delete_all(&self) -> Result<()> {
		self.inner.delete_all().await
	}

	async fn count(&self) -> Result<usize> {
		self.inner.count().await
	}
}

impl FeatureRepository for CountingStore {}

fn no_background() -> LatchConfig {
	let mut config = LatchConfig::default();
	config.refresh.enabled = false;
	config.cache.sweep_interval_ms = 0;
	config
}

async fn counting_latch() -> (Arc<CountingStore>, Latch) {
	let store = Arc::new(CountingStore::new());
	store.create(Feature::new("f1").enabled(true)).await.unwrap();
	let latch = Latch::builder()
		.config(no_background())
		.feature_store(Arc::clone(&store) as Arc<dyn FeatureRepository>)
		.build()
		.await
		.unwrap();
	(store, latch)
}

#[tokio::test]
async fn test_read_through_hits_store_once() {
	let (store, latch) = counting_latch().await;

	assert!(latch.check("f1").await.unwrap());
	assert_eq!(store.reads(), 1);
	assert!(latch.check("f1").await.unwrap());
	assert_eq!(store.reads(), 1);

	let stats = latch.feature_cache_stats().unwrap();
	assert_eq!(stats.misses, 1);
	assert_eq!(stats.hits, 1);
	latch.shutdown().await;
}

#[tokio::test]
async fn test_write_invalidates_cached_entry() {
	let (store, latch) = counting_latch().await;
	assert!(latch.check("f1").await.unwrap());

	latch.disable("f1").await.unwrap();
	assert!(!latch.check("f1").await.unwrap());

	let mut feature = latch.feature("f1").await.unwrap();
	feature.enabled = true;
	latch.update_feature(feature).await.unwrap();
	assert!(latch.check("f1").await.unwrap());
	assert!(store.reads() >= 3);

	latch.delete_feature("f1").await.unwrap();
	assert!(latch.check("f1").await.unwrap_err().is_not_found());
	latch.shutdown().await;
}

#[tokio::test]
async fn test_auto_create() {
	let latch = Latch::builder()
		.config(no_background())
		.auto_create(true)
		.build()
		.await
		.unwrap();

	let decision = latch.evaluate("fresh", &ExecutionContext::new()).await.unwrap();
	assert_eq!(decision.reason, DecisionReason::AutoCreated);
	assert!(!decision.enabled);
	assert!(latch.exists_feature("fresh").await.unwrap());
	latch.shutdown().await;
}

#[tokio::test]
async fn test_default_context_is_merged_under_call_context() {
	let latch = Latch::builder()
		.config(no_background())
		.default_context(ExecutionContext::for_principal(
			Principal::new("svc").with_group("internal"),
		))
		.build()
		.await
		.unwrap();

	let mut acl = latch::AccessControlList::new();
	acl.grant_groups(Permission::Use, ["internal"]);
	latch
		.create_feature(Feature::new("f1").enabled(true).with_acl(acl))
		.await
		.unwrap();

	assert!(latch.check("f1").await.unwrap());
	assert!(latch
		.check_with("f1", &ExecutionContext::new().with_value("region", "eu"))
		.await
		.unwrap());
	let outsider = ExecutionContext::for_principal(Principal::new("bob"));
	assert!(!latch.check_with("f1", &outsider).await.unwrap());
	latch.shutdown().await;
}

#[tokio::test]
async fn test_properties_and_groups() {
	let latch = Latch::builder().config(no_background()).build().await.unwrap();

	latch
		.create_property(Property::new("timeout", PropertyValue::Int(30)))
		.await
		.unwrap();
	assert_eq!(latch.property_value("timeout").await.unwrap(), PropertyValue::Int(30));
	latch.set_property_value("timeout", "45").await.unwrap();
	assert_eq!(latch.property_value("timeout").await.unwrap(), PropertyValue::Int(45));
	let err = latch.set_property_value("timeout", "soon").await.unwrap_err();
	assert!(matches!(err, LatchError::InvalidPropertyValue { .. }));

	latch.create_feature(Feature::new("a")).await.unwrap();
	latch.create_feature(Feature::new("b")).await.unwrap();
	latch.add_to_group("a", "checkout").await.unwrap();
	latch.add_to_group("b", "checkout").await.unwrap();
	latch.enable_group("checkout").await.unwrap();
	assert!(latch.check("a").await.unwrap());
	assert!(latch.check("b").await.unwrap());
	assert_eq!(latch.group("checkout").await.unwrap().len(), 2);

	latch.remove_from_group("b", "checkout").await.unwrap();
	latch.disable_group("checkout").await.unwrap();
	assert!(!latch.check("a").await.unwrap());
	assert!(latch.check("b").await.unwrap());
	latch.shutdown().await;
}

#[tokio::test]
async fn test_set_property_value_keeps_store_changes_missed_by_cache() {
	let store = Arc::new(InMemoryRepository::<Property>::new());
	store
		.create(Property::new("timeout", PropertyValue::Int(30)).with_description("old"))
		.await
		.unwrap();
	let latch = Latch::builder()
		.config(no_background())
		.property_store(Arc::clone(&store) as Arc<dyn PropertyRepository>)
		.build()
		.await
		.unwrap();
	assert_eq!(latch.property("timeout").await.unwrap().description.as_deref(), Some("old"));

	let mut edited = store.read("timeout").await.unwrap();
	edited.description = Some("new".to_string());
	store.update(edited).await.unwrap();

	latch.set_property_value("timeout", "45").await.unwrap();
	let stored = store.read("timeout").await.unwrap();
	assert_eq!(stored.value, PropertyValue::Int(45));
	assert_eq!(stored.description.as_deref(), Some("new"));
	assert_eq!(latch.property("timeout").await.unwrap(), stored);
	latch.shutdown().await;
}

#[tokio::test]
async fn test_check_all_survives_a_misconfigured_feature() {
	let latch = Latch::builder().config(no_background()).build().await.unwrap();
	latch.create_feature(Feature::new("good").enabled(true)).await.unwrap();
	latch
		.create_feature(
			Feature::new("bad")
				.enabled(true)
				.with_strategy(StrategyConfig::new("unknown")),
		)
		.await
		.unwrap();

	let all = latch.check_all(&ExecutionContext::new()).await.unwrap();
	assert_eq!(all.get("good"), Some(&true));
	assert!(!all.contains_key("bad"));
	latch.shutdown().await;
}

#[tokio::test]
async fn test_as_principal_enforces_write_permissions() {
	let latch = Latch::builder().config(no_background()).build().await.unwrap();
	let mut acl = latch::AccessControlList::new();
	acl.grant_users(Permission::Toggle, ["ops"]);
	latch.create_feature(Feature::new("f1").with_acl(acl)).await.unwrap();

	let err = latch.as_principal(Principal::new("dev")).toggle_on("f1").await.unwrap_err();
	assert!(matches!(err, LatchError::AccessDenied { .. }));

	latch.as_principal(Principal::new("ops")).toggle_on("f1").await.unwrap();
	assert!(latch.check("f1").await.unwrap());
	latch.shutdown().await;
}

#[tokio::test]
async fn test_every_operation_is_audited_once() {
	let sink = Arc::new(MemoryAuditSink::new());
	let mut config = no_background();
	// A single worker keeps events in order.
	config.notifier.workers = 1;
	let latch = Latch::builder()
		.config(config)
		.audit_sink(Arc::clone(&sink) as Arc<dyn latch::AuditSink>)
		.build()
		.await
		.unwrap();

	latch.create_feature(Feature::new("f1")).await.unwrap();
	latch.enable("f1").await.unwrap();
	// One miss and one hit.
	assert!(latch.check("f1").await.unwrap());
	assert!(latch.check("f1").await.unwrap());
	latch.disable("f1").await.unwrap();
	assert!(!latch.check("f1").await.unwrap());

	latch.shutdown().await;
	assert_eq!(
		sink.actions(),
		vec![
			EventAction::Create,
			EventAction::ToggleOn,
			EventAction::Hit,
			EventAction::Hit,
			EventAction::ToggleOff,
		]
	);
	assert_eq!(latch.usage().hits("f1"), 2);
}

struct Counting(AtomicUsize);

#[async_trait]
impl FeatureListener for Counting {
	async fn on_toggle_on(&self, _id: &str) -> std::result::Result<(), ListenerError> {
		self.0.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}
}

struct Failing;

#[async_trait]
impl FeatureListener for Failing {
	async fn on_toggle_on(&self, _id: &str) -> std::result::Result<(), ListenerError> {
		Err(ListenerError::failed("downstream rejected event"))
	}
}

struct Panicking;

#[async_trait]
impl FeatureListener for Panicking {
	async fn on_toggle_on(&self, _id: &str) -> std::result::Result<(), ListenerError> {
		panic!("listener bug")
	}
}

struct Hanging;

#[async_trait]
impl FeatureListener for Hanging {
	async fn on_toggle_on(&self, _id: &str) -> std::result::Result<(), ListenerError> {
		tokio::time::sleep(Duration::from_secs(3600)).await;
		Ok(())
	}
}

#[tokio::test(start_paused = true)]
async fn test_listener_isolation() {
	let mut config = no_background();
	config.evaluator.audit_enabled = false;
	config.notifier.workers = 2;
	config.notifier.task_timeout_ms = 100;

	let counting = Arc::new(Counting(AtomicUsize::new(0)));
	let latch = Latch::builder()
		.config(config)
		.feature_listener("counting", Arc::clone(&counting) as Arc<dyn FeatureListener>)
		.feature_listener("failing", Arc::new(Failing))
		.feature_listener("panicking", Arc::new(Panicking))
		.feature_listener("hanging", Arc::new(Hanging))
		.build()
		.await
		.unwrap();
	latch.create_feature(Feature::new("f1")).await.unwrap();

	let started = tokio::time::Instant::now();
	for _ in 0..3 {
		latch.enable("f1").await.unwrap();
	}
	assert_eq!(started.elapsed(), Duration::ZERO);

	tokio::time::sleep(Duration::from_secs(1)).await;
	assert_eq!(counting.0.load(Ordering::SeqCst), 3);

	let stats = latch.dispatch_stats();
	assert_eq!(stats.timed_out, 3);
	assert_eq!(stats.failed, 6);
	latch.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_is_idempotent_and_stops_background_work() {
	let latch = Latch::builder().build().await.unwrap();
	assert!(latch.is_refreshing());

	latch.shutdown().await;
	assert!(!latch.is_refreshing());
	latch.shutdown().await;

	// Writes still work; their notifications are dropped.
	latch.create_feature(Feature::new("late")).await.unwrap();
	assert!(latch.dispatch_stats().dropped >= 1);
}

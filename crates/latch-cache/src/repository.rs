// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Read-through, write-invalidate repository decorator.

use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use latch_core::{
	Entity, Feature, FeatureRepository, Property, PropertyRepository, Repository, Result,
};
use tracing::{debug, instrument};

use crate::cache::Cache;

/// Wraps a repository with a [`Cache`].
///
/// Single-entity reads go through the cache. Writes go to the store first and
/// then drop the affected entries; written payloads are never copied into the
/// cache except on `create`. Bulk reads always hit the store.
pub struct CachingRepository<E: Entity, R: ?Sized> {
	inner: Arc<R>,
	cache: Arc<dyn Cache<E>>,
	_entity: PhantomData<fn() -> E>,
}

impl<E: Entity, R: ?Sized> Clone for CachingRepository<E, R> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
			cache: Arc::clone(&self.cache),
			_entity: PhantomData,
		}
	}
}

impl<E: Entity, R: Repository<E> + ?Sized> CachingRepository<E, R> {
	pub fn new(inner: Arc<R>, cache: Arc<dyn Cache<E>>) -> Self {
		Self {
			inner,
			cache,
			_entity: PhantomData,
		}
	}

	pub fn inner(&self) -> &Arc<R> {
		&self.inner
	}

	pub fn cache(&self) -> &Arc<dyn Cache<E>> {
		&self.cache
	}
}

#[async_trait]
impl<E: Entity, R: Repository<E> + ?Sized> Repository<E> for CachingRepository<E, R> {
	async fn exists(&self, id: &str) -> Result<bool> {
		self.inner.exists(id).await
	}

	#[instrument(skip(self), fields(kind = %E::KIND))]
	async fn find_by_id(&self, id: &str) -> Result<Option<E>> {
		if let Some(hit) = self.cache.get(id) {
			return Ok(Some(hit));
		}
		let loaded = self.inner.find_by_id(id).await?;
		if let Some(entity) = &loaded {
			debug!(id, "populating cache from store");
			self.cache.put(id, entity.clone(), None);
		}
		Ok(loaded)
	}

	/// Always goes to the store and leaves the cache as it is.
	async fn fetch(&self, id: &str) -> Result<E> {
		self.inner.fetch(id).await
	}

	async fn find_all(&self) -> Result<Vec<E>> {
		self.inner.find_all().await
	}

	#[instrument(skip(self, entity), fields(kind = %E::KIND, id = %entity.id()))]
	async fn create(&self, entity: E) -> Result<()> {
		let cached = entity.clone();
		self.inner.create(entity).await?;
		self.cache.put(cached.id(), cached.clone(), None);
		Ok(())
	}

	#[instrument(skip(self, entity), fields(kind = %E::KIND, id = %entity.id()))]
	async fn update(&self, entity: E) -> Result<()> {
		let id = entity.id().to_string();
		self.inner.update(entity).await?;
		self.cache.evict(&id);
		Ok(())
	}

	#[instrument(skip(self), fields(kind = %E::KIND))]
	async fn delete(&self, id: &str) -> Result<()> {
		self.inner.delete(id).await?;
		self.cache.evict(id);
		Ok(())
	}

	#[instrument(skip(self, entities), fields(kind = %E::KIND, count = entities.len()))]
	async fn save(&self, entities: Vec<E>) -> Result<()> {
		self.inner.save(entities).await?;
		self.cache.clear();
		Ok(())
	}

	#[instrument(skip(self), fields(kind = %E::KIND))]
	async fn delete_all(&self) -> Result<()> {
		self.inner.delete_all().await?;
		self.cache.clear();
		Ok(())
	}

	async fn count(&self) -> Result<usize> {
		self.inner.count().await
	}

	async fn create_schema(&self) -> Result<()> {
		self.inner.create_schema().await
	}
}

#[async_trait]
impl<R: FeatureRepository + ?Sized> FeatureRepository for CachingRepository<Feature, R> {
	async fn toggle_on(&self, id: &str) -> Result<()> {
		self.inner.toggle_on(id).await?;
		self.cache.evict(id);
		Ok(())
	}

	async fn toggle_off(&self, id: &str) -> Result<()> {
		self.inner.toggle_off(id).await?;
		self.cache.evict(id);
		Ok(())
	}

	async fn add_to_group(&self, id: &str, group: &str) -> Result<()> {
		self.inner.add_to_group(id, group).await?;
		self.cache.evict(id);
		Ok(())
	}

	async fn remove_from_group(&self, id: &str, group: &str) -> Result<()> {
		self.inner.remove_from_group(id, group).await?;
		self.cache.evict(id);
		Ok(())
	}

	async fn exists_group(&self, group: &str) -> Result<bool> {
		self.inner.exists_group(group).await
	}

	async fn read_group(&self, group: &str) -> Result<Vec<Feature>> {
		self.inner.read_group(group).await
	}

	async fn list_groups(&self) -> Result<BTreeSet<String>> {
		self.inner.list_groups().await
	}

	async fn enable_group(&self, group: &str) -> Result<()> {
		self.inner.enable_group(group).await?;
		self.cache.clear();
		Ok(())
	}

	async fn disable_group(&self, group: &str) -> Result<()> {
		self.inner.disable_group(group).await?;
		self.cache.clear();
		Ok(())
	}
}

#[async_trait]
impl<R: PropertyRepository + ?Sized> PropertyRepository for CachingRepository<Property, R> {
	async fn update_value(&self, id: &str, raw: &str) -> Result<()> {
		self.inner.update_value(id, raw).await?;
		self.cache.evict(id);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::cache::InMemoryCache;
	use crate::testing::CountingRepository;
	use latch_core::{InMemoryRepository, LatchError, PropertyValue};
	use std::time::Duration;

	fn caching(
		store: Arc<CountingRepository<Feature>>,
	) -> CachingRepository<Feature, CountingRepository<Feature>> {
		let cache: Arc<dyn Cache<Feature>> =
			Arc::new(InMemoryCache::new(Duration::from_secs(60), 100));
		CachingRepository::new(store, cache)
	}

	async fn store_with(features: Vec<Feature>) -> Arc<CountingRepository<Feature>> {
		let store = Arc::new(CountingRepository::new(InMemoryRepository::new()));
		for f in features {
			store.create(f).await.unwrap();
		}
		store.reset();
		store
	}

	#[tokio::test]
	async fn test_read_through_hits_store_once() {
		let store = store_with(vec![Feature::new("f1")]).await;
		let repo = caching(Arc::clone(&store));

		repo.read("f1").await.unwrap();
		assert_eq!(store.reads(), 1);
		repo.read("f1").await.unwrap();
		repo.find_by_id("f1").await.unwrap();
		assert_eq!(store.reads(), 1);

		repo.cache().clear();
		repo.read("f1").await.unwrap();
		assert_eq!(store.reads(), 2);
	}

	#[tokio::test]
	async fn test_fetch_bypasses_cache_and_leaves_it_alone() {
		let store = store_with(vec![Feature::new("f1")]).await;
		let repo = caching(Arc::clone(&store));
		assert!(!repo.read("f1").await.unwrap().enabled);

		store.update(Feature::new("f1").enabled(true)).await.unwrap();
		assert!(repo.fetch("f1").await.unwrap().enabled);
		assert_eq!(store.reads(), 2);
		assert!(!repo.read("f1").await.unwrap().enabled);
		assert_eq!(store.reads(), 2);
	}

	#[tokio::test]
	async fn test_group_edit_does_not_write_back_stale_copy() {
		let store = store_with(vec![Feature::new("f1")]).await;
		let repo = caching(Arc::clone(&store));
		repo.read("f1").await.unwrap();

		store.update(Feature::new("f1").enabled(true)).await.unwrap();
		repo.add_to_group("f1", "checkout").await.unwrap();

		let stored = store.read("f1").await.unwrap();
		assert!(stored.enabled);
		assert!(stored.in_group("checkout"));
		assert!(repo.read("f1").await.unwrap().enabled);
	}

	#[tokio::test]
	async fn test_missing_entity_is_not_cached() {
		let store = store_with(vec![]).await;
		let repo = caching(Arc::clone(&store));

		assert!(repo.read("nope").await.unwrap_err().is_not_found());
		assert!(repo.find_by_id("nope").await.unwrap().is_none());
		assert_eq!(store.reads(), 2);
		assert_eq!(repo.cache().size(), 0);
	}

	#[tokio::test]
	async fn test_update_invalidates() {
		let store = store_with(vec![Feature::new("f1")]).await;
		let repo = caching(Arc::clone(&store));

		assert!(!repo.read("f1").await.unwrap().enabled);
		repo.update(Feature::new("f1").enabled(true)).await.unwrap();
		assert_eq!(repo.cache().size(), 0);
		assert!(repo.read("f1").await.unwrap().enabled);
	}

	#[tokio::test]
	async fn test_failed_update_keeps_cache() {
		let store = store_with(vec![Feature::new("f1")]).await;
		let repo = caching(Arc::clone(&store));
		repo.read("f1").await.unwrap();

		let err = repo.update(Feature::new("f2")).await.unwrap_err();
		assert!(err.is_not_found());
		assert_eq!(repo.cache().size(), 1);
	}

	#[tokio::test]
	async fn test_create_populates_and_delete_evicts() {
		let store = store_with(vec![]).await;
		let repo = caching(Arc::clone(&store));

		repo.create(Feature::new("f1")).await.unwrap();
		repo.read("f1").await.unwrap();
		assert_eq!(store.reads(), 0);

		let err = repo.create(Feature::new("f1")).await.unwrap_err();
		assert!(matches!(err, LatchError::AlreadyExists { .. }));

		repo.delete("f1").await.unwrap();
		assert!(repo.find_by_id("f1").await.unwrap().is_none());
		assert_eq!(store.reads(), 1);
	}

	#[tokio::test]
	async fn test_bulk_operations_bypass_and_clear() {
		let store = store_with(vec![Feature::new("f1"), Feature::new("f2")]).await;
		let repo = caching(Arc::clone(&store));
		repo.read("f1").await.unwrap();
		repo.read("f2").await.unwrap();

		assert_eq!(repo.find_all().await.unwrap().len(), 2);
		assert_eq!(repo.count().await.unwrap(), 2);
		assert!(repo.exists("f1").await.unwrap());
		assert_eq!(store.bulk_reads(), 1);

		repo.save(vec![Feature::new("f3")]).await.unwrap();
		assert_eq!(repo.cache().size(), 0);

		repo.read("f1").await.unwrap();
		repo.delete_all().await.unwrap();
		assert_eq!(repo.cache().size(), 0);
	}

	#[tokio::test]
	async fn test_toggle_evicts() {
		let store = store_with(vec![Feature::new("f1").with_group("g1")]).await;
		let repo = caching(Arc::clone(&store));

		assert!(!repo.read("f1").await.unwrap().enabled);
		repo.toggle_on("f1").await.unwrap();
		assert!(repo.read("f1").await.unwrap().enabled);

		repo.disable_group("g1").await.unwrap();
		assert_eq!(repo.cache().size(), 0);
		assert!(!repo.read("f1").await.unwrap().enabled);

		repo.remove_from_group("f1", "g1").await.unwrap();
		assert!(repo.read("f1").await.unwrap().group.is_none());
		assert!(!repo.exists_group("g1").await.unwrap());
	}

	#[tokio::test]
	async fn test_property_update_value_evicts() {
		let store = Arc::new(InMemoryRepository::<Property>::new());
		store
			.create(Property::new("timeout", PropertyValue::Int(30)))
			.await
			.unwrap();
		let cache: Arc<dyn Cache<Property>> =
			Arc::new(InMemoryCache::new(Duration::from_secs(60), 10));
		let repo = CachingRepository::new(store, cache);

		assert_eq!(repo.read("timeout").await.unwrap().value, PropertyValue::Int(30));
		repo.update_value("timeout", "45").await.unwrap();
		assert_eq!(repo.read("timeout").await.unwrap().value, PropertyValue::Int(45));
	}

	#[tokio::test]
	async fn test_wraps_trait_objects() {
		let store: Arc<dyn FeatureRepository> =
			Arc::new(InMemoryRepository::with_entities([Feature::new("f1")]).unwrap());
		let cache: Arc<dyn Cache<Feature>> =
			Arc::new(InMemoryCache::new(Duration::from_secs(60), 10));
		let repo = CachingRepository::new(store, cache);
		repo.toggle_on("f1").await.unwrap();
		assert!(repo.read("f1").await.unwrap().enabled);
	}
}

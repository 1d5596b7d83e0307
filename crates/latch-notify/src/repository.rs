// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Repository decorator that publishes lifecycle events after each
//! successful write.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use latch_core::{
	Feature, FeatureRepository, Property, PropertyRepository, Repository, Result,
};
use tracing::instrument;

use crate::listener::{FeatureListener, PropertyListener};
use crate::notifier::Notifier;

/// Wraps a repository and notifies listeners of every successful write.
///
/// Reads pass straight through and are never observed. A failed write
/// notifies nobody. Meant to sit outside the caching decorator so each
/// logical operation is reported once.
pub struct NotifyingRepository<L: ?Sized, R: ?Sized> {
	inner: Arc<R>,
	notifier: Arc<Notifier<L>>,
}

impl<L: ?Sized, R: ?Sized> NotifyingRepository<L, R> {
	pub fn new(inner: Arc<R>, notifier: Arc<Notifier<L>>) -> Self {
		Self { inner, notifier }
	}

	pub fn inner(&self) -> &Arc<R> {
		&self.inner
	}

	pub fn notifier(&self) -> &Arc<Notifier<L>> {
		&self.notifier
	}
}

impl<L: ?Sized, R: ?Sized> Clone for NotifyingRepository<L, R> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
			notifier: Arc::clone(&self.notifier),
		}
	}
}

impl<R: FeatureRepository + ?Sized> NotifyingRepository<dyn FeatureListener, R> {
	fn feature_changed(&self, feature: Feature, created: bool) {
		let feature = Arc::new(feature);
		self.notifier.notify(move |listener| {
			let feature = Arc::clone(&feature);
			Box::pin(async move {
				if created {
					listener.on_create(&feature).await
				} else {
					listener.on_update(&feature).await
				}
			})
		});
	}

	fn toggled(&self, id: &str, enabled: bool) {
		let id: Arc<str> = Arc::from(id);
		self.notifier.notify(move |listener| {
			let id = Arc::clone(&id);
			Box::pin(async move {
				if enabled {
					listener.on_toggle_on(&id).await
				} else {
					listener.on_toggle_off(&id).await
				}
			})
		});
	}

	fn group_changed(&self, id: &str, group: &str, added: bool) {
		let id: Arc<str> = Arc::from(id);
		let group: Arc<str> = Arc::from(group);
		self.notifier.notify(move |listener| {
			let (id, group) = (Arc::clone(&id), Arc::clone(&group));
			Box::pin(async move {
				if added {
					listener.on_add_to_group(&id, &group).await
				} else {
					listener.on_remove_from_group(&id, &group).await
				}
			})
		});
	}

	async fn set_group_enabled(&self, group: &str, enabled: bool) -> Result<()> {
		let members = self.inner.read_group(group).await?;
		if enabled {
			self.inner.enable_group(group).await?;
		} else {
			self.inner.disable_group(group).await?;
		}
		for feature in members {
			self.toggled(&feature.id, enabled);
		}
		Ok(())
	}
}

#[async_trait]
impl<R: FeatureRepository + ?Sized> Repository<Feature>
	for NotifyingRepository<dyn FeatureListener, R>
{
	async fn exists(&self, id: &str) -> Result<bool> {
		self.inner.exists(id).await
	}

	async fn find_by_id(&self, id: &str) -> Result<Option<Feature>> {
		self.inner.find_by_id(id).await
	}

	async fn fetch(&self, id: &str) -> Result<Feature> {
		self.inner.fetch(id).await
	}

	async fn find_all(&self) -> Result<Vec<Feature>> {
		self.inner.find_all().await
	}

	#[instrument(skip(self, entity), fields(id = %entity.id))]
	async fn create(&self, entity: Feature) -> Result<()> {
		self.inner.create(entity.clone()).await?;
		self.feature_changed(entity, true);
		Ok(())
	}

	#[instrument(skip(self, entity), fields(id = %entity.id))]
	async fn update(&self, entity: Feature) -> Result<()> {
		self.inner.update(entity.clone()).await?;
		self.feature_changed(entity, false);
		Ok(())
	}

	#[instrument(skip(self))]
	async fn delete(&self, id: &str) -> Result<()> {
		self.inner.delete(id).await?;
		let id: Arc<str> = Arc::from(id);
		self.notifier.notify(move |listener| {
			let id = Arc::clone(&id);
			Box::pin(async move { listener.on_delete(&id).await })
		});
		Ok(())
	}

	/// Reported as one update per saved feature.
	async fn save(&self, entities: Vec<Feature>) -> Result<()> {
		self.inner.save(entities.clone()).await?;
		for feature in entities {
			self.feature_changed(feature, false);
		}
		Ok(())
	}

	#[instrument(skip(self))]
	async fn delete_all(&self) -> Result<()> {
		self.inner.delete_all().await?;
		self.notifier
			.notify(|listener| Box::pin(async move { listener.on_delete_all().await }));
		Ok(())
	}

	async fn count(&self) -> Result<usize> {
		self.inner.count().await
	}

	async fn create_schema(&self) -> Result<()> {
		self.inner.create_schema().await?;
		self.notifier
			.notify(|listener| Box::pin(async move { listener.on_create_schema().await }));
		Ok(())
	}
}

#[async_trait]
impl<R: FeatureRepository + ?Sized> FeatureRepository
	for NotifyingRepository<dyn FeatureListener, R>
{
	async fn toggle_on(&self, id: &str) -> Result<()> {
		self.inner.toggle_on(id).await?;
		self.toggled(id, true);
		Ok(())
	}

	async fn toggle_off(&self, id: &str) -> Result<()> {
		self.inner.toggle_off(id).await?;
		self.toggled(id, false);
		Ok(())
	}

	async fn add_to_group(&self, id: &str, group: &str) -> Result<()> {
		self.inner.add_to_group(id, group).await?;
		self.group_changed(id, group, true);
		Ok(())
	}

	async fn remove_from_group(&self, id: &str, group: &str) -> Result<()> {
		self.inner.remove_from_group(id, group).await?;
		self.group_changed(id, group, false);
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

	/// Reported as a toggle-on per group member.
	async fn enable_group(&self, group: &str) -> Result<()> {
		self.set_group_enabled(group, true).await
	}

	async fn disable_group(&self, group: &str) -> Result<()> {
		self.set_group_enabled(group, false).await
	}
}

impl<R: PropertyRepository + ?Sized> NotifyingRepository<dyn PropertyListener, R> {
	fn property_changed(&self, property: Property, created: bool) {
		let property = Arc::new(property);
		self.notifier.notify(move |listener| {
			let property = Arc::clone(&property);
			Box::pin(async move {
				if created {
					listener.on_create(&property).await
				} else {
					listener.on_update(&property).await
				}
			})
		});
	}
}

#[async_trait]
impl<R: PropertyRepository + ?Sized> Repository<Property>
	for NotifyingRepository<dyn PropertyListener, R>
{
	async fn exists(&self, id: &str) -> Result<bool> {
		self.inner.exists(id).await
	}

	async fn find_by_id(&self, id: &str) -> Result<Option<Property>> {
		self.inner.find_by_id(id).await
	}

	async fn fetch(&self, id: &str) -> Result<Property> {
		self.inner.fetch(id).await
	}

	async fn find_all(&self) -> Result<Vec<Property>> {
		self.inner.find_all().await
	}

	#[instrument(skip(self, entity), fields(id = %entity.id))]
	async fn create(&self, entity: Property) -> Result<()> {
		self.inner.create(entity.clone()).await?;
		self.property_changed(entity, true);
		Ok(())
	}

	#[instrument(skip(self, entity), fields(id = %entity.id))]
	async fn update(&self, entity: Property) -> Result<()> {
		self.inner.update(entity.clone()).await?;
		self.property_changed(entity, false);
		Ok(())
	}

	#[instrument(skip(self))]
	async fn delete(&self, id: &str) -> Result<()> {
		self.inner.delete(id).await?;
		let id: Arc<str> = Arc::from(id);
		self.notifier.notify(move |listener| {
			let id = Arc::clone(&id);
			Box::pin(async move { listener.on_delete(&id).await })
		});
		Ok(())
	}

	async fn save(&self, entities: Vec<Property>) -> Result<()> {
		self.inner.save(entities.clone()).await?;
		for property in entities {
			self.property_changed(property, false);
		}
		Ok(())
	}

	#[instrument(skip(self))]
	async fn delete_all(&self) -> Result<()> {
		self.inner.delete_all().await?;
		self.notifier
			.notify(|listener| Box::pin(async move { listener.on_delete_all().await }));
		Ok(())
	}

	async fn count(&self) -> Result<usize> {
		self.inner.count().await
	}

	async fn create_schema(&self) -> Result<()> {
		self.inner.create_schema().await?;
		self.notifier
			.notify(|listener| Box::pin(async move { listener.on_create_schema().await }));
		Ok(())
	}
}

#[async_trait]
impl<R: PropertyRepository + ?Sized> PropertyRepository
	for NotifyingRepository<dyn PropertyListener, R>
{
	/// Reported as an update carrying the property as stored after the write.
	#[instrument(skip(self, raw))]
	async fn update_value(&self, id: &str, raw: &str) -> Result<()> {
		self.inner.update_value(id, raw).await?;
		let property = self.inner.fetch(id).await?;
		self.property_changed(property, false);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dispatcher::Dispatcher;
	use crate::error::ListenerError;
	use latch_core::{InMemoryRepository, PropertyValue};
	use parking_lot::Mutex;
	use std::time::Duration;

	#[derive(Default)]
	struct Recorder {
		seen: Mutex<Vec<String>>,
	}

	impl Recorder {
		fn seen(&self) -> Vec<String> {
			self.seen.lock().clone()
		}

		fn push(&self, entry: String) -> std::result::Result<(), ListenerError> {
			self.seen.lock().push(entry);
			Ok(())
		}
	}

	#[async_trait]
	impl FeatureListener for Recorder {
		async fn on_create(&self, f: &Feature) -> std::result::Result<(), ListenerError> {
			self.push(format!("create:{}", f.id))
		}
		async fn on_update(&self, f: &Feature) -> std::result::Result<(), ListenerError> {
			self.push(format!("update:{}", f.id))
		}
		async fn on_delete(&self, id: &str) -> std::result::Result<(), ListenerError> {
			self.push(format!("delete:{id}"))
		}
		async fn on_toggle_on(&self, id: &str) -> std::result::Result<(), ListenerError> {
			self.push(format!("on:{id}"))
		}
		async fn on_toggle_off(&self, id: &str) -> std::result::Result<(), ListenerError> {
			self.push(format!("off:{id}"))
		}
		async fn on_add_to_group(
			&self,
			id: &str,
			group: &str,
		) -> std::result::Result<(), ListenerError> {
			self.push(format!("add:{id}:{group}"))
		}
	}

	#[async_trait]
	impl PropertyListener for Recorder {
		async fn on_update(&self, p: &Property) -> std::result::Result<(), ListenerError> {
			self.push(format!("update:{}={}", p.id, p.value))
		}
	}

	struct Fixture {
		dispatcher: Arc<Dispatcher>,
		recorder: Arc<Recorder>,
	}

	fn fixture() -> Fixture {
		Fixture {
			dispatcher: Arc::new(Dispatcher::new(1, 64, Duration::from_secs(1))),
			recorder: Arc::new(Recorder::default()),
		}
	}

	#[tokio::test]
	async fn test_feature_writes_are_reported_in_order() {
		let fx = fixture();
		let notifier = Arc::new(Notifier::<dyn FeatureListener>::new(Arc::clone(&fx.dispatcher)));
		notifier.register("recorder", Arc::clone(&fx.recorder) as Arc<dyn FeatureListener>);
		let repo = NotifyingRepository::new(Arc::new(InMemoryRepository::<Feature>::new()), notifier);

		repo.create(Feature::new("f1")).await.unwrap();
		repo.toggle_on("f1").await.unwrap();
		repo.add_to_group("f1", "g1").await.unwrap();
		repo.read("f1").await.unwrap();
		repo.delete("f1").await.unwrap();

		fx.dispatcher.shutdown().await;
		assert_eq!(
			fx.recorder.seen(),
			vec!["create:f1", "on:f1", "add:f1:g1", "delete:f1"]
		);
	}

	#[tokio::test]
	async fn test_failed_write_notifies_nobody() {
		let fx = fixture();
		let notifier = Arc::new(Notifier::<dyn FeatureListener>::new(Arc::clone(&fx.dispatcher)));
		notifier.register("recorder", Arc::clone(&fx.recorder) as Arc<dyn FeatureListener>);
		let repo = NotifyingRepository::new(Arc::new(InMemoryRepository::<Feature>::new()), notifier);

		assert!(repo.update(Feature::new("missing")).await.is_err());
		assert!(repo.toggle_off("missing").await.is_err());

		fx.dispatcher.shutdown().await;
		assert!(fx.recorder.seen().is_empty());
		assert_eq!(fx.dispatcher.stats().dispatched, 0);
	}

	#[tokio::test]
	async fn test_enable_group_reports_each_member() {
		let fx = fixture();
		let notifier = Arc::new(Notifier::<dyn FeatureListener>::new(Arc::clone(&fx.dispatcher)));
		let store = Arc::new(InMemoryRepository::<Feature>::new());
		store.create(Feature::new("a").with_group("g")).await.unwrap();
		store.create(Feature::new("b").with_group("g")).await.unwrap();
		notifier.register("recorder", Arc::clone(&fx.recorder) as Arc<dyn FeatureListener>);
		let repo = NotifyingRepository::new(store, notifier);

		repo.enable_group("g").await.unwrap();
		fx.dispatcher.shutdown().await;
		assert_eq!(fx.recorder.seen(), vec!["on:a", "on:b"]);
		assert!(repo.read("a").await.unwrap().enabled);
	}

	#[tokio::test]
	async fn test_property_update_value_reports_update() {
		let fx = fixture();
		let notifier = Arc::new(Notifier::<dyn PropertyListener>::new(Arc::clone(&fx.dispatcher)));
		notifier.register("recorder", Arc::clone(&fx.recorder) as Arc<dyn PropertyListener>);
		let store = Arc::new(InMemoryRepository::<Property>::new());
		store
			.create(Property::new("timeout", PropertyValue::Int(30)))
			.await
			.unwrap();
		let repo = NotifyingRepository::new(store, notifier);

		repo.update_value("timeout", "45").await.unwrap();
		fx.dispatcher.shutdown().await;
		assert_eq!(fx.recorder.seen(), vec!["update:timeout=45"]);
	}
}

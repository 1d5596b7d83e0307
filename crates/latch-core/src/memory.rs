// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::entity::Entity;
use crate::error::{LatchError, Result};
use crate::feature::Feature;
use crate::property::Property;
use crate::repository::{FeatureRepository, PropertyRepository, Repository};

/// A repository backed by an ordered in-process map.
///
/// `find_all` returns entities sorted by id. Updates keep the stored
/// `created_at` and stamp `updated_at` with the current time.
#[derive(Debug)]
pub struct InMemoryRepository<E: Entity> {
	entities: RwLock<BTreeMap<String, E>>,
}

impl<E: Entity> Default for InMemoryRepository<E> {
	fn default() -> Self {
		Self {
			entities: RwLock::new(BTreeMap::new()),
		}
	}
}

impl<E: Entity> InMemoryRepository<E> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a repository holding `entities`, rejecting invalid or duplicate ids.
	pub fn with_entities(entities: impl IntoIterator<Item = E>) -> Result<Self> {
		let mut map = BTreeMap::new();
		for entity in entities {
			entity.validate()?;
			let id = entity.id().to_string();
			if map.contains_key(&id) {
				return Err(LatchError::already_exists(E::KIND, id));
			}
			map.insert(id, entity);
		}
		Ok(Self {
			entities: RwLock::new(map),
		})
	}
}

fn restamp<E: Entity>(entity: &mut E, previous: Option<&E>) {
	let created_at = previous.map_or_else(|| entity.created_at(), |p| p.created_at());
	entity.set_timestamps(created_at, Utc::now());
}

#[async_trait]
impl<E: Entity> Repository<E> for InMemoryRepository<E> {
	async fn exists(&self, id: &str) -> Result<bool> {
		Ok(self.entities.read().await.contains_key(id))
	}

	async fn find_by_id(&self, id: &str) -> Result<Option<E>> {
		Ok(self.entities.read().await.get(id).cloned())
	}

	async fn find_all(&self) -> Result<Vec<E>> {
		Ok(self.entities.read().await.values().cloned().collect())
	}

	#[instrument(skip(self, entity), fields(kind = %E::KIND, id = %entity.id()))]
	async fn create(&self, entity: E) -> Result<()> {
		entity.validate()?;
		let mut entities = self.entities.write().await;
		if entities.contains_key(entity.id()) {
			return Err(LatchError::already_exists(E::KIND, entity.id()));
		}
		entities.insert(entity.id().to_string(), entity);
		Ok(())
	}

	#[instrument(skip(self, entity), fields(kind = %E::KIND, id = %entity.id()))]
	async fn update(&self, mut entity: E) -> Result<()> {
		entity.validate()?;
		let mut entities = self.entities.write().await;
		let Some(previous) = entities.get(entity.id()) else {
			return Err(LatchError::not_found(E::KIND, entity.id()));
		};
		restamp(&mut entity, Some(previous));
		entities.insert(entity.id().to_string(), entity);
		Ok(())
	}

	#[instrument(skip(self), fields(kind = %E::KIND))]
	async fn delete(&self, id: &str) -> Result<()> {
		match self.entities.write().await.remove(id) {
			Some(_) => Ok(()),
			None => Err(LatchError::not_found(E::KIND, id)),
		}
	}

	#[instrument(skip(self, batch), fields(kind = %E::KIND, count = batch.len()))]
	async fn save(&self, batch: Vec<E>) -> Result<()> {
		for entity in &batch {
			entity.validate()?;
		}
		let mut entities = self.entities.write().await;
		for mut entity in batch {
			if let Some(previous) = entities.get(entity.id()) {
				restamp(&mut entity, Some(previous));
			}
			entities.insert(entity.id().to_string(), entity);
		}
		Ok(())
	}

	#[instrument(skip(self), fields(kind = %E::KIND))]
	async fn delete_all(&self) -> Result<()> {
		self.entities.write().await.clear();
		Ok(())
	}

	async fn count(&self) -> Result<usize> {
		Ok(self.entities.read().await.len())
	}
}

impl FeatureRepository for InMemoryRepository<Feature> {}

impl PropertyRepository for InMemoryRepository<Property> {}

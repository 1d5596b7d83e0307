// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::entity::{validate_id, Entity, EntityKind};
use crate::error::{LatchError, Result};
use crate::feature::Feature;
use crate::property::Property;

/// CRUD access to a backing store holding one kind of entity.
///
/// Implementations are the source of truth. Decorators (caching, auditing)
/// implement the same trait and delegate to an inner repository.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
	async fn exists(&self, id: &str) -> Result<bool>;

	/// Like [`find_by_id`](Self::find_by_id) but a missing entity is an error.
	async fn read(&self, id: &str) -> Result<E> {
		self.find_by_id(id)
			.await?
			.ok_or_else(|| LatchError::not_found(E::KIND, id))
	}

	async fn find_by_id(&self, id: &str) -> Result<Option<E>>;

	/// Reads from the source of truth, skipping any cache in between.
	///
	/// Read-modify-write paths use this so a stale cached copy is never
	/// written back over the store.
	async fn fetch(&self, id: &str) -> Result<E> {
		self.read(id).await
	}

	async fn find_all(&self) -> Result<Vec<E>>;

	/// Fails with `AlreadyExists` if the id is taken.
	async fn create(&self, entity: E) -> Result<()>;

	/// Fails with `NotFound` if the id is unknown.
	async fn update(&self, entity: E) -> Result<()>;

	/// Fails with `NotFound` if the id is unknown.
	async fn delete(&self, id: &str) -> Result<()>;

	/// Inserts or replaces every entity.
	async fn save(&self, entities: Vec<E>) -> Result<()>;

	async fn delete_all(&self) -> Result<()>;

	async fn count(&self) -> Result<usize>;

	/// Prepares the backing store. Calling it again is a no-op.
	async fn create_schema(&self) -> Result<()> {
		Ok(())
	}
}

/// Feature store operations layered over the base contract.
///
/// Every method has a default written in terms of [`Repository`], so a store
/// only needs to implement the base trait. Decorators override them to keep
/// their own bookkeeping precise.
#[async_trait]
pub trait FeatureRepository: Repository<Feature> {
	async fn toggle_on(&self, id: &str) -> Result<()> {
		set_enabled(self, id, true).await
	}

	async fn toggle_off(&self, id: &str) -> Result<()> {
		set_enabled(self, id, false).await
	}

	async fn add_to_group(&self, id: &str, group: &str) -> Result<()> {
		validate_id(group)?;
		let mut feature = self.fetch(id).await?;
		feature.group = Some(group.to_string());
		feature.touch();
		self.update(feature).await
	}

	/// Fails with `NotFound` for the group if the feature is not in it.
	async fn remove_from_group(&self, id: &str, group: &str) -> Result<()> {
		let mut feature = self.fetch(id).await?;
		if !feature.in_group(group) {
			return Err(LatchError::not_found(EntityKind::Group, group));
		}
		feature.group = None;
		feature.touch();
		self.update(feature).await
	}

	async fn exists_group(&self, group: &str) -> Result<bool> {
		Ok(self.find_all().await?.iter().any(|f| f.in_group(group)))
	}

	/// Fails with `NotFound` if no feature belongs to the group.
	async fn read_group(&self, group: &str) -> Result<Vec<Feature>> {
		let members: Vec<Feature> = self
			.find_all()
			.await?
			.into_iter()
			.filter(|f| f.in_group(group))
			.collect();
		if members.is_empty() {
			return Err(LatchError::not_found(EntityKind::Group, group));
		}
		Ok(members)
	}

	async fn list_groups(&self) -> Result<BTreeSet<String>> {
		Ok(self
			.find_all()
			.await?
			.into_iter()
			.filter_map(|f| f.group)
			.collect())
	}

	async fn enable_group(&self, group: &str) -> Result<()> {
		set_group_enabled(self, group, true).await
	}

	async fn disable_group(&self, group: &str) -> Result<()> {
		set_group_enabled(self, group, false).await
	}
}

#[async_trait]
pub trait PropertyRepository: Repository<Property> {
	/// Parses `raw` with the property's current type and stores it.
	async fn update_value(&self, id: &str, raw: &str) -> Result<()> {
		let mut property = self.fetch(id).await?;
		property.set_value_from_str(raw)?;
		self.update(property).await
	}
}

async fn set_enabled<R>(repo: &R, id: &str, enabled: bool) -> Result<()>
where
	R: Repository<Feature> + ?Sized,
{
	let mut feature = repo.fetch(id).await?;
	feature.enabled = enabled;
	feature.touch();
	repo.update(feature).await
}

async fn set_group_enabled<R>(repo: &R, group: &str, enabled: bool) -> Result<()>
where
	R: FeatureRepository + ?Sized,
{
	let mut members = repo.read_group(group).await?;
	for feature in &mut members {
		feature.enabled = enabled;
		feature.touch();
	}
	repo.save(members).await
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use latch_core::{
	Entity, Feature, FeatureRepository, InMemoryRepository, LatchError, Repository, Result,
};

/// Store wrapper that counts reads and can be switched into a failing state.
pub struct CountingRepository<E: Entity> {
	inner: InMemoryRepository<E>,
	reads: AtomicUsize,
	bulk_reads: AtomicUsize,
	failing: AtomicBool,
}

impl<E: Entity> CountingRepository<E> {
	pub fn new(inner: InMemoryRepository<E>) -> Self {
		Self {
			inner,
			reads: AtomicUsize::new(0),
			bulk_reads: AtomicUsize::new(0),
			failing: AtomicBool::new(false),
		}
	}

	pub fn reads(&self) -> usize {
		self.reads.load(Ordering::SeqCst)
	}

	pub fn bulk_reads(&self) -> usize {
		self.bulk_reads.load(Ordering::SeqCst)
	}

	pub fn reset(&self) {
		self.reads.store(0, Ordering::SeqCst);
		self.bulk_reads.store(0, Ordering::SeqCst);
	}

	pub fn set_failing(&self, failing: bool) {
		self.failing.store(failing, Ordering::SeqCst);
	}

	fn check(&self) -> Result<()> {
		if self.failing.load(Ordering::SeqCst) {
			Err(LatchError::BackingStoreUnavailable("store offline".to_string()))
		} else {
			Ok(())
		}
	}
}

#[async_trait]
impl<E: Entity> Repository<E> for CountingRepository<E> {
	async fn exists(&self, id: &str) -> Result<bool> {
		self.check()?;
		self.inner.exists(id).await
	}

	async fn find_by_id(&self, id: &str) -> Result<Option<E>> {
		self.reads.fetch_add(1, Ordering::SeqCst);
		self.check()?;
		self.inner.find_by_id(id).await
	}

	async fn find_all(&self) -> Result<Vec<E>> {
		self.bulk_reads.fetch_add(1, Ordering::SeqCst);
		self.check()?;
		self.inner.find_all().await
	}

	async fn create(&self, entity: E) -> Result<()> {
		self.check()?;
		self.inner.create(entity).await
	}

	async fn update(&self, entity: E) -> Result<()> {
		self.check()?;
		self.inner.update(entity).await
	}

	async fn delete(&self, id: &str) -> Result<()> {
		self.check()?;
		self.inner.delete(id).await
	}

	async fn save(&self, entities: Vec<E>) -> Result<()> {
		self.check()?;
		self.inner.save(entities).await
	}

	async fn delete_all(&self) -> Result<()> {
		self.check()?;
		self.inner.delete_all().await
	}

	async fn count(&self) -> Result<usize> {
		self.check()?;
		self.inner.count().await
	}
}

impl FeatureRepository for CountingRepository<Feature> {}

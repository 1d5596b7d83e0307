// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Periodic reload of a whole repository into its cache.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use latch_core::{Entity, Repository, Result};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::cache::Cache;
use crate::periodic::PeriodicWorker;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
	pub succeeded: u64,
	pub failed: u64,
	pub last_success_at: Option<DateTime<Utc>>,
}

struct Shared<E: Entity, R: ?Sized> {
	repository: Arc<R>,
	cache: Arc<dyn Cache<E>>,
	tick_lock: Mutex<()>,
	succeeded: AtomicU64,
	failed: AtomicU64,
	last_success_at: parking_lot::Mutex<Option<DateTime<Utc>>>,
	_entity: PhantomData<fn() -> E>,
}

impl<E: Entity, R: Repository<E> + ?Sized> Shared<E, R> {
	/// Reads the store first so a failing store leaves the cache untouched.
	async fn refresh(&self) -> Result<usize> {
		let _serial = self.tick_lock.lock().await;
		let entities = match self.repository.find_all().await {
			Ok(entities) => entities,
			Err(e) => {
				self.failed.fetch_add(1, Ordering::Relaxed);
				return Err(e);
			}
		};

		let loaded = entities.len();
		self.cache.clear();
		for entity in entities {
			let id = entity.id().to_string();
			self.cache.put(&id, entity, None);
		}

		self.succeeded.fetch_add(1, Ordering::Relaxed);
		*self.last_success_at.lock() = Some(Utc::now());
		Ok(loaded)
	}
}

/// Keeps a cache warm by reloading every entity from the store on a fixed
/// period, bounding how stale a missed invalidation can leave an entry.
pub struct RefreshScheduler<E: Entity, R: ?Sized> {
	shared: Arc<Shared<E, R>>,
	worker: PeriodicWorker,
}

impl<E: Entity, R: Repository<E> + ?Sized + 'static> RefreshScheduler<E, R> {
	pub fn new(
		repository: Arc<R>,
		cache: Arc<dyn Cache<E>>,
		initial_delay: Duration,
		period: Duration,
	) -> Self {
		Self {
			shared: Arc::new(Shared {
				repository,
				cache,
				tick_lock: Mutex::new(()),
				succeeded: AtomicU64::new(0),
				failed: AtomicU64::new(0),
				last_success_at: parking_lot::Mutex::new(None),
				_entity: PhantomData,
			}),
			worker: PeriodicWorker::new(format!("{}-cache-refresh", E::KIND), initial_delay, period),
		}
	}

	/// Starts the background loop. Returns `false` if it is already running.
	pub fn start(&self) -> bool {
		let shared = Arc::clone(&self.shared);
		self.worker.start(move || {
			let shared = Arc::clone(&shared);
			async move {
				match shared.refresh().await {
					Ok(loaded) => debug!(kind = %E::KIND, loaded, "cache refreshed"),
					Err(e) => warn!(
						kind = %E::KIND,
						error = %e,
						"cache refresh failed, keeping current entries"
					),
				}
			}
		})
	}

	/// Stops the loop, waiting for an in-flight refresh. Idempotent.
	pub async fn stop(&self) -> bool {
		self.worker.stop().await
	}

	pub fn is_running(&self) -> bool {
		self.worker.is_running()
	}

	/// Runs one refresh now, serialized with scheduled ticks. Returns the
	/// number of entities loaded.
	#[instrument(skip(self), fields(kind = %E::KIND))]
	pub async fn tick_now(&self) -> Result<usize> {
		self.shared.refresh().await
	}

	pub fn stats(&self) -> RefreshStats {
		RefreshStats {
			succeeded: self.shared.succeeded.load(Ordering::Relaxed),
			failed: self.shared.failed.load(Ordering::Relaxed),
			last_success_at: *self.shared.last_success_at.lock(),
		}
	}

	pub fn period(&self) -> Duration {
		self.worker.period()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::cache::InMemoryCache;
	use crate::repository::CachingRepository;
	use crate::testing::CountingRepository;
	use latch_core::{Feature, InMemoryRepository};

	struct Fixture {
		store: Arc<CountingRepository<Feature>>,
		cache: Arc<dyn Cache<Feature>>,
		scheduler: RefreshScheduler<Feature, CountingRepository<Feature>>,
	}

	async fn fixture(ttl_ms: u64, period_ms: u64) -> Fixture {
		let store = Arc::new(CountingRepository::new(InMemoryRepository::new()));
		store.create(Feature::new("f1")).await.unwrap();
		store.create(Feature::new("f2")).await.unwrap();
		let cache: Arc<dyn Cache<Feature>> =
			Arc::new(InMemoryCache::new(Duration::from_millis(ttl_ms), 100));
		let scheduler = RefreshScheduler::new(
			Arc::clone(&store),
			Arc::clone(&cache),
			Duration::ZERO,
			Duration::from_millis(period_ms),
		);
		Fixture {
			store,
			cache,
			scheduler,
		}
	}

	#[tokio::test(start_paused = true)]
	async fn test_tick_now_loads_everything() {
		let fx = fixture(60_000, 1000).await;
		assert_eq!(fx.scheduler.tick_now().await.unwrap(), 2);
		assert_eq!(fx.cache.size(), 2);
		let stats = fx.scheduler.stats();
		assert_eq!(stats.succeeded, 1);
		assert!(stats.last_success_at.is_some());
	}

	#[tokio::test(start_paused = true)]
	async fn test_refresh_drops_deleted_entities() {
		let fx = fixture(60_000, 1000).await;
		fx.scheduler.tick_now().await.unwrap();
		fx.store.delete("f2").await.unwrap();
		fx.scheduler.tick_now().await.unwrap();
		assert!(fx.cache.get("f2").is_none());
		assert!(fx.cache.get("f1").is_some());
	}

	#[tokio::test(start_paused = true)]
	async fn test_failed_tick_keeps_cache_and_next_tick_recovers() {
		let fx = fixture(60_000, 100).await;
		fx.cache.put("stale", Feature::new("stale"), None);
		fx.store.set_failing(true);

		assert!(fx.scheduler.start());
		tokio::time::sleep(Duration::from_millis(50)).await;
		assert_eq!(fx.scheduler.stats().failed, 1);
		assert!(fx.cache.get("stale").is_some());

		fx.store.set_failing(false);
		tokio::time::sleep(Duration::from_millis(100)).await;
		assert_eq!(fx.scheduler.stats().succeeded, 1);
		assert!(fx.cache.get("stale").is_none());
		assert_eq!(fx.cache.size(), 2);

		fx.scheduler.stop().await;
	}

	#[tokio::test(start_paused = true)]
	async fn test_missed_invalidation_is_bounded_by_period() {
		let fx = fixture(60_000, 200).await;
		let repo = CachingRepository::new(Arc::clone(&fx.store), Arc::clone(&fx.cache));
		fx.scheduler.start();
		tokio::time::sleep(Duration::from_millis(1)).await;
		assert!(!repo.read("f1").await.unwrap().enabled);

		// Write behind the decorator's back.
		fx.store.update(Feature::new("f1").enabled(true)).await.unwrap();
		assert!(!repo.read("f1").await.unwrap().enabled);

		tokio::time::sleep(Duration::from_millis(200)).await;
		assert!(repo.read("f1").await.unwrap().enabled);
		fx.scheduler.stop().await;
	}

	#[tokio::test(start_paused = true)]
	async fn test_stop_before_start_and_twice() {
		let fx = fixture(60_000, 100).await;
		assert!(!fx.scheduler.stop().await);
		assert!(fx.scheduler.start());
		assert!(!fx.scheduler.start());
		assert!(fx.scheduler.stop().await);
		assert!(!fx.scheduler.stop().await);

		let bulk_reads = fx.store.bulk_reads();
		tokio::time::sleep(Duration::from_millis(500)).await;
		assert_eq!(fx.store.bulk_reads(), bulk_reads);
	}
}

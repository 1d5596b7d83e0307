// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bounded, TTL-aware entity cache.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::time::Instant;
use tracing::{debug, trace};

/// A key to entity map with per-entry expiry.
///
/// Implementations never touch a backing store and never fail. Expired entries
/// behave as absent.
pub trait Cache<E>: Send + Sync {
	/// Returns a copy of the live entry for `key`.
	fn get(&self, key: &str) -> Option<E>;

	/// Stores `entity` under `key`. `ttl` overrides the cache's default TTL.
	fn put(&self, key: &str, entity: E, ttl: Option<Duration>);

	fn evict(&self, key: &str);

	fn clear(&self);

	/// Number of live entries.
	fn size(&self) -> usize;

	/// Drops every expired entry and returns how many were removed.
	fn sweep_expired(&self) -> usize {
		0
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
	pub hits: u64,
	pub misses: u64,
	pub inserts: u64,
	/// Entries removed to make room at capacity.
	pub evictions: u64,
	/// Entries removed because their TTL elapsed.
	pub expirations: u64,
}

#[derive(Debug, Default)]
struct Counters {
	hits: AtomicU64,
	misses: AtomicU64,
	inserts: AtomicU64,
	evictions: AtomicU64,
	expirations: AtomicU64,
}

#[derive(Debug, Clone)]
struct CacheEntry<E> {
	value: E,
	inserted_at: Instant,
	ttl: Duration,
}

impl<E> CacheEntry<E> {
	fn is_expired(&self, now: Instant) -> bool {
		now.saturating_duration_since(self.inserted_at) >= self.ttl
	}
}

/// [`Cache`] over a sharded concurrent map.
///
/// Reads and writes hold a shared gate; `clear` takes it exclusively so no
/// insert can interleave with a clear. Inserting a new key at capacity first
/// drops expired entries, then the entry with the oldest insertion time.
#[derive(Debug)]
pub struct InMemoryCache<E> {
	entries: DashMap<String, CacheEntry<E>>,
	gate: RwLock<()>,
	default_ttl: Duration,
	max_entries: usize,
	counters: Counters,
}

impl<E: Clone + Send + Sync> InMemoryCache<E> {
	/// `max_entries` is clamped to at least 1.
	pub fn new(default_ttl: Duration, max_entries: usize) -> Self {
		Self {
			entries: DashMap::new(),
			gate: RwLock::new(()),
			default_ttl,
			max_entries: max_entries.max(1),
			counters: Counters::default(),
		}
	}

	pub fn default_ttl(&self) -> Duration {
		self.default_ttl
	}

	pub fn max_entries(&self) -> usize {
		self.max_entries
	}

	/// Ids of live entries, sorted.
	pub fn keys(&self) -> Vec<String> {
		let _gate = self.gate.read();
		let now = Instant::now();
		let mut keys: Vec<String> = self
			.entries
			.iter()
			.filter(|e| !e.value().is_expired(now))
			.map(|e| e.key().clone())
			.collect();
		keys.sort_unstable();
		keys
	}

	pub fn stats(&self) -> CacheStats {
		CacheStats {
			hits: self.counters.hits.load(Ordering::Relaxed),
			misses: self.counters.misses.load(Ordering::Relaxed),
			inserts: self.counters.inserts.load(Ordering::Relaxed),
			evictions: self.counters.evictions.load(Ordering::Relaxed),
			expirations: self.counters.expirations.load(Ordering::Relaxed),
		}
	}

	fn make_room(&self, now: Instant) {
		let before = self.entries.len();
		self.entries.retain(|_, entry| !entry.is_expired(now));
		let expired = before.saturating_sub(self.entries.len());
		if expired > 0 {
			self.counters
				.expirations
				.fetch_add(expired as u64, Ordering::Relaxed);
		}

		while self.entries.len() >= self.max_entries {
			let oldest = self
				.entries
				.iter()
				.min_by_key(|e| e.value().inserted_at)
				.map(|e| e.key().clone());
			let Some(oldest) = oldest else {
				break;
			};
			if self.entries.remove(&oldest).is_some() {
				self.counters.evictions.fetch_add(1, Ordering::Relaxed);
				trace!(key = %oldest, "evicted oldest cache entry at capacity");
			}
		}
	}
}

impl<E: Clone + Send + Sync> Cache<E> for InMemoryCache<E> {
	fn get(&self, key: &str) -> Option<E> {
		let _gate = self.gate.read();
		let now = Instant::now();

		// The map guard must be released before removing from the same shard.
		let lookup = self
			.entries
			.get(key)
			.map(|entry| (!entry.is_expired(now)).then(|| entry.value.clone()));

		match lookup {
			Some(Some(value)) => {
				self.counters.hits.fetch_add(1, Ordering::Relaxed);
				debug!(key, "cache hit");
				Some(value)
			}
			Some(None) => {
				if self
					.entries
					.remove_if(key, |_, entry| entry.is_expired(now))
					.is_some()
				{
					self.counters.expirations.fetch_add(1, Ordering::Relaxed);
				}
				self.counters.misses.fetch_add(1, Ordering::Relaxed);
				debug!(key, "cache miss (expired)");
				None
			}
			None => {
				self.counters.misses.fetch_add(1, Ordering::Relaxed);
				debug!(key, "cache miss");
				None
			}
		}
	}

	fn put(&self, key: &str, entity: E, ttl: Option<Duration>) {
		let now = Instant::now();
		let entry = CacheEntry {
			value: entity,
			inserted_at: now,
			ttl: ttl.unwrap_or(self.default_ttl),
		};

		let gate = self.gate.read();
		if self.entries.contains_key(key) || self.entries.len() < self.max_entries {
			self.entries.insert(key.to_string(), entry);
		} else {
			// Evict and insert under the exclusive gate so the bound holds.
			drop(gate);
			let _gate = self.gate.write();
			if !self.entries.contains_key(key) {
				self.make_room(now);
			}
			self.entries.insert(key.to_string(), entry);
		}
		self.counters.inserts.fetch_add(1, Ordering::Relaxed);
	}

	fn evict(&self, key: &str) {
		let _gate = self.gate.read();
		if self.entries.remove(key).is_some() {
			trace!(key, "cache entry evicted");
		}
	}

	fn clear(&self) {
		let _gate = self.gate.write();
		self.entries.clear();
		trace!("cache cleared");
	}

	fn size(&self) -> usize {
		let _gate = self.gate.read();
		let now = Instant::now();
		self.entries
			.iter()
			.filter(|e| !e.value().is_expired(now))
			.count()
	}

	fn sweep_expired(&self) -> usize {
		let _gate = self.gate.read();
		let now = Instant::now();
		let before = self.entries.len();
		self.entries.retain(|_, entry| !entry.is_expired(now));
		let removed = before.saturating_sub(self.entries.len());
		if removed > 0 {
			self.counters
				.expirations
				.fetch_add(removed as u64, Ordering::Relaxed);
			debug!(removed, "swept expired cache entries");
		}
		removed
	}
}

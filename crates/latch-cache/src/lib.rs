// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Local caching for Latch repositories.
//!
//! - [`InMemoryCache`]: bounded TTL cache over a sharded concurrent map
//! - [`CachingRepository`]: read-through, write-invalidate decorator
//! - [`RefreshScheduler`]: periodic full reload bounding staleness
//! - [`CacheSweeper`]: periodic removal of expired entries
//!
//! Both background loops share [`PeriodicWorker`].

pub mod cache;
pub mod periodic;
pub mod refresh;
pub mod repository;
pub mod sweeper;

#[cfg(test)]
mod testing;

pub use cache::{Cache, CacheStats, InMemoryCache};
pub use periodic::PeriodicWorker;
pub use refresh::{RefreshScheduler, RefreshStats};
pub use repository::CachingRepository;
pub use sweeper::CacheSweeper;

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

use crate::cache::Cache;
use crate::periodic::PeriodicWorker;

/// Periodically drops expired entries so they do not linger until the next
/// read of their key.
pub struct CacheSweeper<E> {
	cache: Arc<dyn Cache<E>>,
	worker: PeriodicWorker,
}

impl<E: 'static> CacheSweeper<E> {
	pub fn new(name: impl Into<String>, cache: Arc<dyn Cache<E>>, interval: Duration) -> Self {
		Self {
			cache,
			worker: PeriodicWorker::new(name, interval, interval),
		}
	}

	pub fn start(&self) -> bool {
		let cache = Arc::clone(&self.cache);
		self.worker.start(move || {
			let removed = cache.sweep_expired();
			trace!(removed, "cache sweep finished");
			std::future::ready(())
		})
	}

	pub async fn stop(&self) -> bool {
		self.worker.stop().await
	}

	pub fn is_running(&self) -> bool {
		self.worker.is_running()
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;

use async_trait::async_trait;
use dashmap::DashMap;
use latch_core::ExecutionContext;

use crate::error::ListenerError;
use crate::listener::FeatureListener;

/// Counts positive toggle checks per feature.
#[derive(Debug, Default)]
pub struct UsageMetrics {
	hits: DashMap<String, u64>,
}

impl UsageMetrics {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn hits(&self, id: &str) -> u64 {
		self.hits.get(id).map(|h| *h).unwrap_or(0)
	}

	pub fn total(&self) -> u64 {
		self.hits.iter().map(|entry| *entry.value()).sum()
	}

	pub fn snapshot(&self) -> BTreeMap<String, u64> {
		self.hits
			.iter()
			.map(|entry| (entry.key().clone(), *entry.value()))
			.collect()
	}

	pub fn reset(&self) {
		self.hits.clear();
	}
}

#[async_trait]
impl FeatureListener for UsageMetrics {
	async fn on_feature_used(
		&self,
		id: &str,
		_context: &ExecutionContext,
	) -> Result<(), ListenerError> {
		*self.hits.entry(id.to_string()).or_insert(0) += 1;
		Ok(())
	}

	async fn on_delete(&self, id: &str) -> Result<(), ListenerError> {
		self.hits.remove(id);
		Ok(())
	}

	async fn on_delete_all(&self) -> Result<(), ListenerError> {
		self.reset();
		Ok(())
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Listener dispatch configuration section.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_WORKERS: usize = 4;
const DEFAULT_QUEUE_CAPACITY: usize = 1024;
const DEFAULT_TASK_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NotifierConfigLayer {
	pub workers: Option<usize>,
	pub queue_capacity: Option<usize>,
	pub task_timeout_ms: Option<u64>,
}

impl NotifierConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.workers.is_some() {
			self.workers = other.workers;
		}
		if other.queue_capacity.is_some() {
			self.queue_capacity = other.queue_capacity;
		}
		if other.task_timeout_ms.is_some() {
			self.task_timeout_ms = other.task_timeout_ms;
		}
	}

	pub fn finalize(self) -> NotifierConfig {
		NotifierConfig {
			workers: self.workers.unwrap_or(DEFAULT_WORKERS),
			queue_capacity: self.queue_capacity.unwrap_or(DEFAULT_QUEUE_CAPACITY),
			task_timeout_ms: self.task_timeout_ms.unwrap_or(DEFAULT_TASK_TIMEOUT_MS),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotifierConfig {
	pub workers: usize,
	pub queue_capacity: usize,
	pub task_timeout_ms: u64,
}

impl NotifierConfig {
	pub fn task_timeout(&self) -> Duration {
		Duration::from_millis(self.task_timeout_ms)
	}
}

impl Default for NotifierConfig {
	fn default() -> Self {
		NotifierConfigLayer::default().finalize()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_values() {
		let config = NotifierConfig::default();
		assert_eq!(config.workers, 4);
		assert_eq!(config.queue_capacity, 1024);
		assert_eq!(config.task_timeout(), Duration::from_secs(5));
	}

	#[test]
	fn test_merge_keeps_unset_fields() {
		let mut base = NotifierConfigLayer {
			workers: Some(2),
			queue_capacity: Some(16),
			task_timeout_ms: None,
		};
		base.merge(NotifierConfigLayer {
			workers: Some(8),
			..Default::default()
		});
		assert_eq!(base.workers, Some(8));
		assert_eq!(base.queue_capacity, Some(16));
	}
}

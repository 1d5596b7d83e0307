// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Entity cache configuration section.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_TTL_MS: u64 = 60_000;
const DEFAULT_MAX_ENTRIES: usize = 10_000;
const DEFAULT_SWEEP_INTERVAL_MS: u64 = 30_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CacheConfigLayer {
	pub enabled: Option<bool>,
	pub default_ttl_ms: Option<u64>,
	pub max_entries: Option<usize>,
	pub sweep_interval_ms: Option<u64>,
}

impl CacheConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.enabled.is_some() {
			self.enabled = other.enabled;
		}
		if other.default_ttl_ms.is_some() {
			self.default_ttl_ms = other.default_ttl_ms;
		}
		if other.max_entries.is_some() {
			self.max_entries = other.max_entries;
		}
		if other.sweep_interval_ms.is_some() {
			self.sweep_interval_ms = other.sweep_interval_ms;
		}
	}

	pub fn finalize(self) -> CacheConfig {
		CacheConfig {
			enabled: self.enabled.unwrap_or(true),
			default_ttl_ms: self.default_ttl_ms.unwrap_or(DEFAULT_TTL_MS),
			max_entries: self.max_entries.unwrap_or(DEFAULT_MAX_ENTRIES),
			sweep_interval_ms: self.sweep_interval_ms.unwrap_or(DEFAULT_SWEEP_INTERVAL_MS),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
	pub enabled: bool,
	pub default_ttl_ms: u64,
	pub max_entries: usize,
	/// 0 disables the background expiry sweep.
	pub sweep_interval_ms: u64,
}

impl CacheConfig {
	pub fn default_ttl(&self) -> Duration {
		Duration::from_millis(self.default_ttl_ms)
	}

	pub fn sweep_interval(&self) -> Option<Duration> {
		(self.sweep_interval_ms > 0).then(|| Duration::from_millis(self.sweep_interval_ms))
	}
}

impl Default for CacheConfig {
	fn default() -> Self {
		CacheConfigLayer::default().finalize()
	}
}
